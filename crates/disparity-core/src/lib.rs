//! # disparity-core
//!
//! Canonicalization and classification engine for checking a disassembler's
//! text output against a reference disassembler, one instruction at a time.
//!
//! The pipeline, leaf first:
//! - [`line`]: split a raw output line into mnemonic and operand text
//! - [`token`]: canonicalize operands into [`CanonicalToken`]s
//! - [`compare`]: canonical or whitespace-normalized equality
//! - [`verdict`]: assign a [`Verdict`] to one case
//! - [`summary`]: fold case results into a [`RunSummary`]
//!
//! Everything here is pure; running the tools is left to the caller.
//!
//! ```
//! use disparity_core::{canonicalize, CanonicalToken, Classifier, ToolOutput, Verdict};
//!
//! assert_eq!(canonicalize("0x10"), canonicalize("16"));
//! assert_eq!(
//!     canonicalize("-4(sp)"),
//!     vec![CanonicalToken::memory(-4, CanonicalToken::sym("sp"))]
//! );
//!
//! let verdict = Classifier::default().classify(
//!     &ToolOutput::success("lui sp, 0"),
//!     &ToolOutput::success("lui\tsp,0"),
//!     None,
//! );
//! assert_eq!(verdict, Ok(Verdict::Match));
//! ```

pub mod case;
pub mod compare;
pub mod error;
pub mod hex;
pub mod line;
pub mod summary;
pub mod token;
pub mod verdict;

pub use case::{parse_case_line, parse_cases, RawCase};
pub use compare::{normalize_whitespace, Comparator, CompareMode};
pub use error::{Error, ParseFailure, Result};
pub use hex::HexInstruction;
pub use line::{parse, ParsedInstruction};
pub use summary::{summarize, CaseOutcome, CaseResult, OverallTotals, RunSummary};
pub use token::{canonicalize, canonicalize_to_text, CanonicalToken};
pub use verdict::{classify, Classifier, ToolOutput, Verdict, TIMEOUT_EXIT_CODE};
