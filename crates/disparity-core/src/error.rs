//! Error types for disparity-core.

use serde::Serialize;
use thiserror::Error;

/// A disassembler produced no line the parser could read a mnemonic from.
///
/// This is stored inside case results as well as returned as an error, so it
/// carries the offending tool's label and its raw output.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{tool} produced no parseable output: {output:?}")]
pub struct ParseFailure {
    /// Label of the tool whose output failed to parse.
    pub tool: String,
    /// Raw standard output of that tool.
    pub output: String,
}

impl ParseFailure {
    /// Creates a new parse failure for `tool`.
    pub fn new(tool: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            output: output.into(),
        }
    }
}

/// Core error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Disassembly text could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseFailure),

    /// Malformed instruction byte string.
    #[error("invalid hex encoding {input:?}: {reason}")]
    InvalidHexEncoding { input: String, reason: String },

    /// A case source line that could not be turned into a case.
    #[error("line {line}: {reason}")]
    InvalidCaseLine { line: usize, reason: String },
}

impl Error {
    /// Creates a new InvalidHexEncoding error.
    pub fn invalid_hex(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHexEncoding {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new InvalidCaseLine error.
    pub fn invalid_case_line(line: usize, reason: impl Into<String>) -> Self {
        Self::InvalidCaseLine {
            line,
            reason: reason.into(),
        }
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
