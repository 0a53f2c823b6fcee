//! Disassembly line parsing.
//!
//! Tools echo different prefixes before the mnemonic. cstool prints the
//! offset and the raw bytes (`0  13 05 15 00  addi a0, a0, 1`), others print
//! nothing. The parser skips any leading run of one- or two-digit hex tokens
//! (optionally ending in `,` or `:`) and takes the next token as mnemonic.

use crate::error::ParseFailure;
use crate::token::{canonicalize, canonicalize_to_text, CanonicalToken};
use serde::Serialize;
use std::fmt;

/// An instruction line split into mnemonic and canonical operands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedInstruction {
    /// Mnemonic (lowercase).
    pub mnemonic: String,
    /// Canonical operands in source order.
    pub operands: Vec<CanonicalToken>,
}

impl ParsedInstruction {
    /// Builds a parsed instruction from a mnemonic and raw operand text.
    pub fn new(mnemonic: &str, raw_operands: &str) -> Self {
        Self {
            mnemonic: mnemonic.to_lowercase(),
            operands: canonicalize(raw_operands),
        }
    }
}

impl fmt::Display for ParsedInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operands.is_empty() {
            write!(f, "{}", self.mnemonic)
        } else {
            write!(f, "{} {}", self.mnemonic, canonicalize_to_text(&self.operands))
        }
    }
}

/// Returns true if `token` looks like an offset or byte marker.
fn is_byte_token(token: &str) -> bool {
    let trimmed = token.trim_matches(|c: char| c == ',' || c == ':');
    (1..=2).contains(&trimmed.len()) && trimmed.chars().all(|c| c.is_ascii_hexdigit())
}

/// Splits the first parseable line of `output` into `(mnemonic, raw_operands)`.
///
/// The mnemonic is lowercased; the operand string is the remaining tokens
/// joined by single spaces. Lines that are blank or consist only of byte
/// tokens are skipped. Returns `None` if no line yields a mnemonic.
pub fn split_line(output: &str) -> Option<(String, String)> {
    for line in output.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(idx) = parts.iter().position(|part| !is_byte_token(part)) else {
            continue;
        };

        let mnemonic = parts[idx].to_lowercase();
        let operands = parts[idx + 1..].join(" ");
        return Some((mnemonic, operands));
    }
    None
}

/// Parses one tool's raw output into a [`ParsedInstruction`].
///
/// `tool` labels the output in the [`ParseFailure`] returned when no line
/// yields a mnemonic.
pub fn parse(output: &str, tool: &str) -> Result<ParsedInstruction, ParseFailure> {
    split_line(output)
        .map(|(mnemonic, operands)| ParsedInstruction::new(&mnemonic, &operands))
        .ok_or_else(|| ParseFailure::new(tool, output))
}
