//! Instruction byte strings.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;

/// A validated instruction encoding as lowercase hex digits.
///
/// Always an even number of digits: odd-length input is left-padded with `0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct HexInstruction(String);

impl HexInstruction {
    /// Parses a hex string.
    ///
    /// An optional `0x` prefix and any internal whitespace are removed, so
    /// `0x13051500`, `13051500` and `13 05 15 00` are all accepted.
    pub fn parse(input: &str) -> Result<Self> {
        let lowered = input.trim().to_ascii_lowercase();
        let stripped = lowered.strip_prefix("0x").unwrap_or(&lowered);
        let mut digits: String = stripped.chars().filter(|c| !c.is_whitespace()).collect();

        if digits.is_empty() {
            return Err(Error::invalid_hex(input, "no hex digits"));
        }
        if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(Error::invalid_hex(input, format!("invalid hex digit {:?}", bad)));
        }
        if digits.len() % 2 == 1 {
            digits.insert(0, '0');
        }

        Ok(Self(digits))
    }

    /// Returns the normalized hex digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of encoded bytes.
    pub fn len(&self) -> usize {
        self.0.len() / 2
    }

    /// Always false: a parsed encoding has at least one byte.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes the digits into bytes, most significant first.
    pub fn bytes(&self) -> Vec<u8> {
        self.0
            .as_bytes()
            .chunks(2)
            .map(|pair| {
                let hi = (pair[0] as char).to_digit(16).unwrap_or(0);
                let lo = (pair[1] as char).to_digit(16).unwrap_or(0);
                (hi * 16 + lo) as u8
            })
            .collect()
    }

    /// Renders the bytes in reverse order, space separated.
    ///
    /// A word written as `00a00513` becomes `13 05 a0 00`, the little-endian
    /// byte sequence a disassembler expects for that word.
    pub fn to_le_byte_string(&self) -> String {
        self.bytes()
            .iter()
            .rev()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for HexInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes() {
        assert_eq!(HexInstruction::parse("0x13051500").unwrap().as_str(), "13051500");
        assert_eq!(HexInstruction::parse("13 05 15 00").unwrap().as_str(), "13051500");
        assert_eq!(HexInstruction::parse("ABC").unwrap().as_str(), "0abc");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            HexInstruction::parse(""),
            Err(Error::InvalidHexEncoding { .. })
        ));
        assert!(matches!(
            HexInstruction::parse("0x"),
            Err(Error::InvalidHexEncoding { .. })
        ));
        let err = HexInstruction::parse("12zz").unwrap_err();
        assert!(err.to_string().contains("'z'"), "unexpected message: {}", err);
    }

    #[test]
    fn test_bytes_and_le_rendering() {
        let hex = HexInstruction::parse("00a00513").unwrap();
        assert_eq!(hex.len(), 4);
        assert_eq!(hex.bytes(), vec![0x00, 0xa0, 0x05, 0x13]);
        assert_eq!(hex.to_le_byte_string(), "13 05 a0 00");
    }
}
