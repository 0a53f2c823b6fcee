#![no_main]

use arbitrary::Arbitrary;
use disparity_core::{Classifier, CompareMode, ToolOutput, Verdict};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum FuzzedMode {
    Canonical,
    Normalized,
    Exact,
}

#[derive(Debug, Arbitrary)]
struct FuzzedCase {
    mode: FuzzedMode,
    reference_exit: i32,
    reference_stdout: String,
    candidate_exit: i32,
    candidate_stdout: String,
    recorded: Option<String>,
}

fuzz_target!(|case: FuzzedCase| {
    let mode = match case.mode {
        FuzzedMode::Canonical => CompareMode::Canonical,
        FuzzedMode::Normalized => CompareMode::Normalized,
        FuzzedMode::Exact => CompareMode::Exact,
    };

    let reference = ToolOutput {
        exit_code: case.reference_exit,
        stdout: case.reference_stdout,
        ..ToolOutput::default()
    };
    let candidate = ToolOutput {
        exit_code: case.candidate_exit,
        stdout: case.candidate_stdout,
        ..ToolOutput::default()
    };

    let verdict = Classifier::new(mode).classify(&reference, &candidate, case.recorded.as_deref());

    if case.reference_exit != 0 || case.candidate_exit != 0 {
        assert_eq!(verdict, Ok(Verdict::CommandFailure));
    }
    if verdict.is_err() {
        assert_eq!(mode, CompareMode::Canonical);
    }
});
