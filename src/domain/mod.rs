//! Domain layer types and invariants.

pub mod abbrlink;
pub mod entities;
pub mod error;
pub mod front_matter;
pub mod types;
