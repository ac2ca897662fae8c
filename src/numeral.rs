//! Numeral-base formatting
//!
//! Every operand and answer is shown as an upper-case base-N digit string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Display radix for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum NumeralBase {
    Binary,
    Octal,
    #[default]
    Decimal,
    Hex,
}

impl NumeralBase {
    pub const ALL: [NumeralBase; 4] = [
        NumeralBase::Binary,
        NumeralBase::Octal,
        NumeralBase::Decimal,
        NumeralBase::Hex,
    ];

    pub fn radix(self) -> u32 {
        match self {
            NumeralBase::Binary => 2,
            NumeralBase::Octal => 8,
            NumeralBase::Decimal => 10,
            NumeralBase::Hex => 16,
        }
    }

    pub fn from_radix(radix: u32) -> Result<Self, ConfigError> {
        match radix {
            2 => Ok(NumeralBase::Binary),
            8 => Ok(NumeralBase::Octal),
            10 => Ok(NumeralBase::Decimal),
            16 => Ok(NumeralBase::Hex),
            other => Err(ConfigError::InvalidBase(other)),
        }
    }

    /// Render `value` in this base, upper-case letters above 9
    pub fn format(self, value: u64) -> String {
        let radix = self.radix() as u64;
        if value == 0 {
            return "0".to_string();
        }

        let mut digits = Vec::with_capacity(64);
        let mut v = value;
        while v > 0 {
            digits.push(DIGITS[(v % radix) as usize]);
            v /= radix;
        }
        digits.reverse();
        // Only ASCII digits were pushed
        String::from_utf8(digits).unwrap_or_default()
    }

    /// Parse a base-N digit string (case-insensitive, surrounding whitespace ignored)
    pub fn parse(self, text: &str) -> Option<u64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        u64::from_str_radix(text, self.radix()).ok()
    }

    /// Canonical form for comparing player input against answers
    pub fn normalize(text: &str) -> String {
        text.trim().to_uppercase()
    }
}

impl fmt::Display for NumeralBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "base {}", self.radix())
    }
}

impl TryFrom<u32> for NumeralBase {
    type Error = ConfigError;

    fn try_from(radix: u32) -> Result<Self, Self::Error> {
        Self::from_radix(radix)
    }
}

impl From<NumeralBase> for u32 {
    fn from(base: NumeralBase) -> Self {
        base.radix()
    }
}

impl FromStr for NumeralBase {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bin" | "binary" => Ok(NumeralBase::Binary),
            "oct" | "octal" => Ok(NumeralBase::Octal),
            "dec" | "decimal" => Ok(NumeralBase::Decimal),
            "hex" | "hexadecimal" => Ok(NumeralBase::Hex),
            other => {
                let radix = other
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidBase(0))?;
                Self::from_radix(radix)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_known_values() {
        assert_eq!(NumeralBase::Binary.format(10), "1010");
        assert_eq!(NumeralBase::Binary.format(0), "0");
        assert_eq!(NumeralBase::Octal.format(64), "100");
        assert_eq!(NumeralBase::Decimal.format(255), "255");
        assert_eq!(NumeralBase::Hex.format(255), "FF");
        assert_eq!(NumeralBase::Hex.format(10), "A");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(NumeralBase::Hex.parse("ff"), Some(255));
        assert_eq!(NumeralBase::Hex.parse(" 1A "), Some(26));
        assert_eq!(NumeralBase::Binary.parse("102"), None);
        assert_eq!(NumeralBase::Decimal.parse(""), None);
    }

    #[test]
    fn test_from_radix_rejects_other_bases() {
        assert_eq!(NumeralBase::from_radix(3), Err(ConfigError::InvalidBase(3)));
        assert_eq!("16".parse::<NumeralBase>(), Ok(NumeralBase::Hex));
        assert_eq!("octal".parse::<NumeralBase>(), Ok(NumeralBase::Octal));
        assert!("seven".parse::<NumeralBase>().is_err());
    }

    #[test]
    fn test_serde_uses_radix() {
        let json = serde_json::to_string(&NumeralBase::Octal).unwrap();
        assert_eq!(json, "8");
        let base: NumeralBase = serde_json::from_str("2").unwrap();
        assert_eq!(base, NumeralBase::Binary);
        assert!(serde_json::from_str::<NumeralBase>("5").is_err());
    }

    proptest! {
        #[test]
        fn prop_format_parse_round_trip(value in any::<u64>(), idx in 0usize..4) {
            let base = NumeralBase::ALL[idx];
            let text = base.format(value);
            prop_assert_eq!(u64::from_str_radix(&text, base.radix()).ok(), Some(value));
            prop_assert_eq!(text.to_uppercase(), text);
        }
    }
}
