//! Pairwise comparison of two tools' outputs.

use crate::error::ParseFailure;
use crate::line::{parse, ParsedInstruction};
use serde::Serialize;

/// How two outputs are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareMode {
    /// Parse both outputs and compare mnemonic plus canonical operands.
    #[default]
    Canonical,
    /// Compare raw text with whitespace runs collapsed.
    Normalized,
    /// Compare raw text exactly, after trimming surrounding whitespace.
    Exact,
}

impl CompareMode {
    /// Selects a mode from the run's strict-match and ignore-whitespace toggles.
    ///
    /// Strict matching pins the full text; otherwise outputs are compared
    /// semantically.
    pub fn from_toggles(strict_match: bool, ignore_whitespace: bool) -> Self {
        match (strict_match, ignore_whitespace) {
            (false, _) => Self::Canonical,
            (true, true) => Self::Normalized,
            (true, false) => Self::Exact,
        }
    }

    /// Returns true if this mode parses outputs before comparing.
    pub fn is_canonical(self) -> bool {
        self == Self::Canonical
    }
}

/// Collapses every run of whitespace to a single space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Canonical equality: same mnemonic and the same operands in the same order.
pub fn instructions_equal(a: &ParsedInstruction, b: &ParsedInstruction) -> bool {
    a.mnemonic.to_lowercase() == b.mnemonic.to_lowercase() && a.operands == b.operands
}

/// Raw equality after whitespace normalization.
pub fn text_equal(a: &str, b: &str) -> bool {
    normalize_whitespace(a) == normalize_whitespace(b)
}

/// Compares the outputs of two tools in a fixed mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct Comparator {
    mode: CompareMode,
}

impl Comparator {
    /// Creates a comparator for `mode`.
    pub fn new(mode: CompareMode) -> Self {
        Self { mode }
    }

    /// Returns the comparison mode.
    pub fn mode(&self) -> CompareMode {
        self.mode
    }

    /// Compares the reference tool's output with the tool under test's.
    ///
    /// `labels` names the two tools in a [`ParseFailure`]. Only canonical mode
    /// can fail; the text modes always produce an answer.
    pub fn outputs_equal(
        &self,
        reference: &str,
        candidate: &str,
        labels: (&str, &str),
    ) -> Result<bool, ParseFailure> {
        match self.mode {
            CompareMode::Canonical => {
                let reference = parse(reference, labels.0)?;
                let candidate = parse(candidate, labels.1)?;
                Ok(instructions_equal(&reference, &candidate))
            }
            CompareMode::Normalized => Ok(text_equal(reference, candidate)),
            CompareMode::Exact => Ok(reference.trim() == candidate.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: (&str, &str) = ("reference", "candidate");

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  lui\tsp,   0 \n"), "lui sp, 0");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_mode_from_toggles() {
        assert_eq!(CompareMode::from_toggles(false, true), CompareMode::Canonical);
        assert_eq!(CompareMode::from_toggles(false, false), CompareMode::Canonical);
        assert_eq!(CompareMode::from_toggles(true, true), CompareMode::Normalized);
        assert_eq!(CompareMode::from_toggles(true, false), CompareMode::Exact);
    }

    #[test]
    fn test_canonical_ignores_cosmetics() {
        let cmp = Comparator::new(CompareMode::Canonical);
        assert!(cmp.outputs_equal("lui sp, 0", "lui\tsp,0", LABELS).unwrap());
        assert!(cmp.outputs_equal("ADDI a0, a0, 0x10", "addi a0,a0,16", LABELS).unwrap());
        assert!(cmp.outputs_equal("lw a0, -0x4(sp)", "lw a0,-4(SP)", LABELS).unwrap());
    }

    #[test]
    fn test_canonical_operand_order_matters() {
        let cmp = Comparator::new(CompareMode::Canonical);
        assert!(!cmp.outputs_equal("mv a0, a1", "mv a1, a0", LABELS).unwrap());
        assert!(!cmp.outputs_equal("jal ra, 4", "jal ra, 8", LABELS).unwrap());
    }

    #[test]
    fn test_canonical_tags_matter() {
        let cmp = Comparator::new(CompareMode::Canonical);
        // Immediate 4 versus memory 4(sp).
        assert!(!cmp.outputs_equal("lw a0, 4", "lw a0, 4(sp)", LABELS).unwrap());
    }

    #[test]
    fn test_canonical_parse_failure_names_tool() {
        let cmp = Comparator::new(CompareMode::Canonical);
        let err = cmp.outputs_equal("nop", "  \n", LABELS).unwrap_err();
        assert_eq!(err.tool, "candidate");
        let err = cmp.outputs_equal("", "nop", LABELS).unwrap_err();
        assert_eq!(err.tool, "reference");
    }

    #[test]
    fn test_text_modes() {
        let normalized = Comparator::new(CompareMode::Normalized);
        assert!(normalized.outputs_equal("lui  sp, 0", "lui sp,\t0", LABELS).unwrap());
        assert!(normalized.outputs_equal("lui  sp, 0", "lui sp, 0", LABELS).unwrap());
        assert!(!normalized.outputs_equal("lui sp, 0", "lui sp,0", LABELS).unwrap());
        assert!(normalized.outputs_equal("", "", LABELS).unwrap());

        let exact = Comparator::new(CompareMode::Exact);
        assert!(exact.outputs_equal(" lui sp, 0\n", "lui sp, 0", LABELS).unwrap());
        assert!(!exact.outputs_equal("lui  sp, 0", "lui sp, 0", LABELS).unwrap());
    }
}
