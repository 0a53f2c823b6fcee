//! Test case sources.
//!
//! A case file holds one instruction per line:
//!
//! ```text
//! <hex-bytes> [# <expected-output> [| <note>]]
//! ```
//!
//! Blank lines and lines starting with `#` are not cases.

use crate::error::{Error, Result};
use crate::hex::HexInstruction;
use serde::Serialize;

/// One instruction to disassemble with both tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawCase {
    /// Instruction encoding.
    pub hex: HexInstruction,
    /// Reference output recorded when the case was written, if any.
    pub expected: Option<String>,
    /// Free-text note.
    pub note: Option<String>,
}

impl RawCase {
    /// Creates a case with no recorded output or note.
    pub fn new(hex: HexInstruction) -> Self {
        Self {
            hex,
            expected: None,
            note: None,
        }
    }

    /// Sets the recorded reference output.
    pub fn with_expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = non_empty(expected.into());
        self
    }

    /// Sets the note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = non_empty(note.into());
        self
    }

    /// Renders the case back into the line grammar.
    pub fn to_line(&self) -> String {
        let mut line = self.hex.to_string();
        if self.expected.is_some() || self.note.is_some() {
            line.push_str("  # ");
            line.push_str(self.expected.as_deref().unwrap_or(""));
        }
        if let Some(note) = &self.note {
            line.push_str(" | ");
            line.push_str(note);
        }
        line
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Returns true if `line` holds a case rather than a comment or blank.
pub fn is_case_line(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty() && !line.starts_with('#')
}

/// Parses one line of a case file.
///
/// Returns `Ok(None)` for blank and comment lines. The expected column is
/// everything after the first `#`; a `|` inside it separates the note.
pub fn parse_case_line(line: &str) -> Result<Option<RawCase>> {
    if !is_case_line(line) {
        return Ok(None);
    }
    let line = line.trim();

    let (hex_part, rest) = match line.split_once('#') {
        Some((hex, rest)) => (hex, Some(rest)),
        None => (line, None),
    };

    let mut case = RawCase::new(HexInstruction::parse(hex_part)?);
    if let Some(rest) = rest {
        match rest.split_once('|') {
            Some((expected, note)) => {
                case = case.with_expected(expected).with_note(note);
            }
            None => case = case.with_expected(rest),
        }
    }

    Ok(Some(case))
}

/// Parses a whole case file, preserving order.
///
/// The first malformed line aborts parsing with its 1-based line number.
pub fn parse_cases(text: &str) -> Result<Vec<RawCase>> {
    let mut cases = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        match parse_case_line(line) {
            Ok(Some(case)) => cases.push(case),
            Ok(None) => {}
            Err(err) => return Err(Error::invalid_case_line(idx + 1, err.to_string())),
        }
    }
    Ok(cases)
}
