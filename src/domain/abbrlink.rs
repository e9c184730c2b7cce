//! Deterministic short identifiers ("abbrlinks") derived from timestamps.
//!
//! An abbrlink is a CRC checksum over the digits of a unix timestamp. The
//! timestamp has every `.` replaced with `0` first so fractional timestamps
//! keep a stable, digits-only shape. Two algorithms are supported:
//!
//! - `crc32`: standard CRC-32 over the UTF-8 bytes.
//! - `crc16`: bit-serial CRC-16 of the ARC family (init `0xFFFF`, reflected poly `0xA001`,
//!   i.e. the MODBUS parameters).
//!
//! Both can be rendered as decimal or lowercase hex without a prefix.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use time::OffsetDateTime;

const CRC16_INIT: u32 = 0xFFFF;
const CRC16_POLY: u32 = 0xA001;
/// Number of hex digits kept from the CRC16 register rendering.
const CRC16_DIGITS: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbbrlinkError {
    #[error("unsupported abbrlink algorithm `{0}`")]
    UnsupportedAlgorithm(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbbrlinkAlgorithm {
    Crc16,
    Crc32,
}

impl AbbrlinkAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            AbbrlinkAlgorithm::Crc16 => "crc16",
            AbbrlinkAlgorithm::Crc32 => "crc32",
        }
    }
}

impl FromStr for AbbrlinkAlgorithm {
    type Err = AbbrlinkError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "crc16" => Ok(Self::Crc16),
            "crc32" => Ok(Self::Crc32),
            other => Err(AbbrlinkError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Output rendering. Anything other than `hex` is treated as decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Representation {
    #[default]
    Decimal,
    Hex,
}

impl Representation {
    pub fn as_str(self) -> &'static str {
        match self {
            Representation::Decimal => "dec",
            Representation::Hex => "hex",
        }
    }

    pub fn from_setting(value: &str) -> Self {
        if value == "hex" {
            Self::Hex
        } else {
            Self::Decimal
        }
    }
}

impl FromStr for Representation {
    type Err = std::convert::Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_setting(value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Abbrlink(String);

impl Abbrlink {
    pub fn compute(
        timestamp: &str,
        algorithm: AbbrlinkAlgorithm,
        representation: Representation,
    ) -> Self {
        let normalized = timestamp.replace('.', "0");
        let hex = representation == Representation::Hex;
        let value = match algorithm {
            AbbrlinkAlgorithm::Crc16 => crc16_identifier(&normalized, hex),
            AbbrlinkAlgorithm::Crc32 => crc32_identifier(&normalized, hex),
        };
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Abbrlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Abbrlink configuration as stored in settings: free-form strings resolved on each call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbbrlinkSettings {
    pub algorithm: String,
    pub representation: String,
}

impl Default for AbbrlinkSettings {
    fn default() -> Self {
        Self {
            algorithm: AbbrlinkAlgorithm::Crc32.as_str().to_string(),
            representation: Representation::Decimal.as_str().to_string(),
        }
    }
}

impl AbbrlinkSettings {
    pub fn new(algorithm: impl Into<String>, representation: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            representation: representation.into(),
        }
    }

    pub fn generate(&self, timestamp: &str) -> Result<Abbrlink, AbbrlinkError> {
        generate(timestamp, &self.algorithm, &self.representation)
    }
}

/// Generate an abbrlink from loosely-typed settings values.
pub fn generate(
    timestamp: &str,
    algorithm: &str,
    representation: &str,
) -> Result<Abbrlink, AbbrlinkError> {
    let algorithm = algorithm.parse::<AbbrlinkAlgorithm>()?;
    let representation = Representation::from_setting(representation);
    Ok(Abbrlink::compute(timestamp, algorithm, representation))
}

/// Render an instant as `seconds.micros`, the timestamp shape fed to [`generate`].
pub fn unix_timestamp_string(instant: OffsetDateTime) -> String {
    format!("{}.{:06}", instant.unix_timestamp(), instant.microsecond())
}

fn crc32_identifier(input: &str, hex: bool) -> String {
    let checksum = crc32fast::hash(input.as_bytes());
    if hex {
        format!("{checksum:x}")
    } else {
        checksum.to_string()
    }
}

/// Raw CRC-16 register after feeding every character's code point.
///
/// The register is wider than 16 bits so code points above `0xFFFF` carry
/// through the shifts instead of being truncated.
pub(crate) fn crc16_register(input: &str) -> u32 {
    let mut register = CRC16_INIT;
    for ch in input.chars() {
        register ^= u32::from(ch);
        for _ in 0..8 {
            let low_bit = register & 1;
            register >>= 1;
            if low_bit == 1 {
                register ^= CRC16_POLY;
            }
        }
    }
    register
}

fn crc16_identifier(input: &str, hex: bool) -> String {
    let rendered = format!("{:x}", crc16_register(input));
    let digits: String = rendered.chars().take(CRC16_DIGITS).collect();
    if hex {
        return digits;
    }
    // `digits` is at most four hex characters and never empty.
    u32::from_str_radix(&digits, 16)
        .map(|value| value.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_matches_reference_check_value() {
        let id = Abbrlink::compute("123456789", AbbrlinkAlgorithm::Crc32, Representation::Decimal);
        assert_eq!(id.as_str(), "3421780262");

        let hex = Abbrlink::compute("123456789", AbbrlinkAlgorithm::Crc32, Representation::Hex);
        assert_eq!(hex.as_str(), "cbf43926");
    }

    #[test]
    fn crc16_matches_modbus_register() {
        // CRC-16 with init 0xFFFF and poly 0xA001 is CRC-16/MODBUS: check value 0x4B37.
        assert_eq!(crc16_register("123456789"), 0x4B37);

        let hex = Abbrlink::compute("123456789", AbbrlinkAlgorithm::Crc16, Representation::Hex);
        assert_eq!(hex.as_str(), "4b37");

        let dec = Abbrlink::compute("123456789", AbbrlinkAlgorithm::Crc16, Representation::Decimal);
        assert_eq!(dec.as_str(), "19255");
    }

    #[test]
    fn dots_are_replaced_before_hashing() {
        let dotted = Abbrlink::compute("1700000000.5", AbbrlinkAlgorithm::Crc32, Representation::Hex);
        let zeroed = Abbrlink::compute("170000000005", AbbrlinkAlgorithm::Crc32, Representation::Hex);
        assert_eq!(dotted, zeroed);
    }

    #[test]
    fn crc16_short_register_keeps_unpadded_digits() {
        // An empty input leaves the register at its initial value.
        assert_eq!(crc16_identifier("", true), "ffff");
        assert_eq!(crc16_identifier("", false), "65535");

        let register = crc16_register("1");
        let expected = format!("{register:x}");
        assert!(expected.len() <= 4);
        assert_eq!(crc16_identifier("1", true), expected);
        assert_eq!(crc16_identifier("1", false), register.to_string());
    }

    #[test]
    fn generation_is_deterministic() {
        for timestamp in ["1697600000.123456", "0", "42.42", "1234567890123"] {
            for algorithm in ["crc16", "crc32"] {
                for representation in ["dec", "hex"] {
                    let first = generate(timestamp, algorithm, representation).expect("supported");
                    let second = generate(timestamp, algorithm, representation).expect("supported");
                    assert_eq!(first, second);
                    assert!(!first.as_str().is_empty());
                }
            }
        }
    }

    #[test]
    fn unsupported_algorithm_is_an_error() {
        let err = generate("1700000000.1", "md5", "hex").expect_err("md5 unsupported");
        assert_eq!(err, AbbrlinkError::UnsupportedAlgorithm("md5".to_string()));
    }

    #[test]
    fn unknown_representation_defaults_to_decimal() {
        let id = generate("123456789", "crc32", "whatever").expect("supported");
        assert_eq!(id.as_str(), "3421780262");
    }

    #[test]
    fn timestamp_string_has_microsecond_fraction() {
        let instant = time::macros::datetime!(2024-01-02 03:04:05.000007 UTC);
        assert_eq!(unix_timestamp_string(instant), "1704164645.000007");
    }
}
