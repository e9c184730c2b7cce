use thiserror::Error;

/// Raised when text or a stored code names no known domain value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("unknown {kind} `{value}`")]
    UnknownValue { kind: &'static str, value: String },
}

impl DomainError {
    pub fn unknown(kind: &'static str, value: impl ToString) -> Self {
        Self::UnknownValue {
            kind,
            value: value.to_string(),
        }
    }
}
