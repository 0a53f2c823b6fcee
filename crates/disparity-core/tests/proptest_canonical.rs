//! Property-based tests for the canonicalization and classification engine.
//!
//! These tests verify invariants that hold for any input:
//! - Canonicalization is deterministic and stable under re-rendering
//! - Numeric operands compare equal regardless of base
//! - A failed command always wins over every other classification rule
//! - Aggregated counts add up to the number of cases

use proptest::prelude::*;
use std::time::Duration;

use disparity_core::{
    canonicalize, canonicalize_to_text, parse, summarize, CanonicalToken, CaseOutcome, CaseResult,
    Classifier, CompareMode, HexInstruction, ParseFailure, RawCase, ToolOutput, Verdict,
};

// =============================================================================
// Strategies
// =============================================================================

fn register() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("zero".to_string()),
        Just("ra".to_string()),
        Just("SP".to_string()),
        "[as][0-7]",
        "[ft][0-9]",
        "x[0-9]{1,2}",
    ]
}

fn integer() -> impl Strategy<Value = String> {
    (any::<i32>(), any::<bool>()).prop_map(|(v, hex)| {
        let magnitude = (v as i64).unsigned_abs();
        let sign = if v < 0 { "-" } else { "" };
        if hex {
            format!("{}0x{:x}", sign, magnitude)
        } else {
            format!("{}{}", sign, magnitude)
        }
    })
}

fn operand() -> impl Strategy<Value = String> {
    prop_oneof![
        register(),
        integer(),
        (integer(), register()).prop_map(|(d, r)| format!("{}({})", d, r)),
        "[a-z_.][a-z0-9_.]{0,8}",
    ]
}

fn operand_list() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(operand(), 0..5),
        prop::sample::select(vec![",", ", ", " ", ",\t", " ,  "]),
    )
        .prop_map(|(ops, sep)| ops.join(sep))
}

fn tool_output() -> impl Strategy<Value = ToolOutput> {
    (
        prop_oneof![Just(0), Just(1), Just(124), any::<i32>()],
        "[a-z]{1,6}( [a-z0-9, ()-]{0,16})?",
    )
        .prop_map(|(code, text)| ToolOutput {
            exit_code: code,
            stdout: text,
            stderr: String::new(),
            duration: Duration::ZERO,
        })
}

fn compare_mode() -> impl Strategy<Value = CompareMode> {
    prop_oneof![
        Just(CompareMode::Canonical),
        Just(CompareMode::Normalized),
        Just(CompareMode::Exact),
    ]
}

fn outcome() -> impl Strategy<Value = CaseOutcome> {
    prop_oneof![
        prop::sample::select(Verdict::ALL.to_vec()).prop_map(CaseOutcome::Verdict),
        Just(CaseOutcome::Unparseable(ParseFailure::new("candidate", ""))),
    ]
}

// =============================================================================
// Canonicalizer Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Rendering canonical tokens and canonicalizing again is a fixed point.
    #[test]
    fn canonicalize_is_idempotent(ops in operand_list()) {
        let tokens = canonicalize(&ops);
        let again = canonicalize(&canonicalize_to_text(&tokens));
        prop_assert_eq!(tokens, again);
    }

    /// Same input, same output.
    #[test]
    fn canonicalize_is_deterministic(ops in ".{0,40}") {
        prop_assert_eq!(canonicalize(&ops), canonicalize(&ops));
    }

    /// Canonicalizing arbitrary text never panics.
    #[test]
    fn canonicalize_never_panics(ops in any::<String>()) {
        let _ = canonicalize(&ops);
    }

    /// Hex and decimal spellings of the same value are equal.
    #[test]
    fn numeric_base_invariance(v in any::<i64>()) {
        let magnitude = v.unsigned_abs();
        let sign = if v < 0 { "-" } else { "" };
        let hex = canonicalize(&format!("{}0x{:x}", sign, magnitude));
        let dec = canonicalize(&format!("{}{}", sign, magnitude));
        prop_assert_eq!(&hex, &dec);
        prop_assert_eq!(hex, vec![CanonicalToken::imm(v as i128)]);
    }

    /// Negating the text negates the immediate.
    #[test]
    fn negation_negates(v in 0u32..u32::MAX) {
        let pos = canonicalize(&format!("0x{:x}", v));
        let neg = canonicalize(&format!("-0x{:x}", v));
        prop_assert_eq!(pos, vec![CanonicalToken::imm(v as i128)]);
        prop_assert_eq!(neg, vec![CanonicalToken::imm(-(v as i128))]);
    }

    /// Memory operands keep their displacement and always have a symbolic base.
    #[test]
    fn memory_base_is_symbolic(d in any::<i16>(), r in register()) {
        let tokens = canonicalize(&format!("{}({})", d, r));
        prop_assert_eq!(tokens.len(), 1);
        match &tokens[0] {
            CanonicalToken::Memory { offset, base } => {
                prop_assert_eq!(*offset, d as i128);
                prop_assert!(base.is_symbolic());
            }
            other => prop_assert!(false, "expected memory token, got {:?}", other),
        }
    }

    /// Parsing arbitrary output never panics, and success always yields a mnemonic.
    #[test]
    fn parse_never_panics(text in any::<String>()) {
        if let Ok(parsed) = parse(&text, "tool") {
            prop_assert!(!parsed.mnemonic.is_empty());
        }
    }
}

// =============================================================================
// Classifier and Aggregator Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// A non-zero exit code always yields CommandFailure.
    #[test]
    fn command_failure_takes_precedence(
        reference in tool_output(),
        candidate in tool_output(),
        recorded in prop::option::of("[a-z ,0-9]{0,12}"),
        mode in compare_mode(),
    ) {
        let verdict = Classifier::new(mode).classify(&reference, &candidate, recorded.as_deref());
        if reference.exit_code != 0 || candidate.exit_code != 0 {
            prop_assert_eq!(verdict, Ok(Verdict::CommandFailure));
        } else {
            prop_assert_ne!(verdict, Ok(Verdict::CommandFailure));
        }
    }

    /// Identical successful outputs with no record always match.
    #[test]
    fn identical_outputs_match(text in "[g-z][a-z]{1,5} [a-z0-9]{1,4}, [a-z0-9]{1,4}", mode in compare_mode()) {
        let out = ToolOutput::success(text);
        prop_assert_eq!(Classifier::new(mode).classify(&out, &out, None), Ok(Verdict::Match));
    }

    /// Per-bucket counts sum to the number of cases.
    #[test]
    fn aggregator_conservation(outcomes in prop::collection::vec(outcome(), 0..64)) {
        let n = outcomes.len();
        let results: Vec<CaseResult> = outcomes
            .into_iter()
            .enumerate()
            .map(|(i, outcome)| CaseResult {
                case: RawCase::new(HexInstruction::parse(&format!("{:04x}", i)).unwrap()),
                reference: ToolOutput::default(),
                candidate: ToolOutput::default(),
                outcome,
                duration: Duration::ZERO,
            })
            .collect();

        let summary = summarize("prop", results, Duration::ZERO);
        let verdicts: usize = Verdict::ALL.iter().map(|v| summary.count(*v)).sum();
        prop_assert_eq!(summary.total_cases, n);
        prop_assert_eq!(verdicts + summary.parse_failures, n);
        prop_assert_eq!(summary.failures().len(), summary.failure_count());
        prop_assert_eq!(summary.matches + summary.failure_count(), n);
    }
}
