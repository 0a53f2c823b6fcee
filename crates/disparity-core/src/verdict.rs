//! Outcome classification for a single case.

use crate::case::RawCase;
use crate::compare::{text_equal, Comparator, CompareMode};
use crate::error::ParseFailure;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Exit code reported for a tool invocation that hit its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// The four-way outcome of one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Both tools succeeded and agree.
    Match,
    /// Both tools succeeded and disagree.
    Mismatch,
    /// At least one tool exited non-zero or timed out.
    CommandFailure,
    /// The recorded expectation no longer matches the reference tool.
    DocumentationDrift,
}

impl Verdict {
    /// Every verdict, in reporting order.
    pub const ALL: [Verdict; 4] = [
        Verdict::Match,
        Verdict::Mismatch,
        Verdict::CommandFailure,
        Verdict::DocumentationDrift,
    ];

    /// Short machine-readable name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Mismatch => "mismatch",
            Self::CommandFailure => "command_failure",
            Self::DocumentationDrift => "documentation_drift",
        }
    }

    /// Returns true for every verdict except [`Verdict::Match`].
    pub fn is_failure(self) -> bool {
        self != Self::Match
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of running one disassembler on one case.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ToolOutput {
    /// Process exit status; [`TIMEOUT_EXIT_CODE`] on timeout.
    pub exit_code: i32,
    /// Standard output, trimmed.
    pub stdout: String,
    /// Standard error, trimmed.
    pub stderr: String,
    /// Wall-clock time of the invocation.
    pub duration: Duration,
}

impl ToolOutput {
    /// Creates a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    /// Creates a failed output.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stderr: stderr.into(),
            ..Self::default()
        }
    }

    /// Sets the measured duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns true if the tool exited with status 0.
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns true if the invocation hit its timeout.
    pub fn timed_out(&self) -> bool {
        self.exit_code == TIMEOUT_EXIT_CODE
    }
}

/// Returns true if a recorded expectation has gone stale.
///
/// An absent or blank record never drifts.
pub fn is_documentation_drift(recorded: Option<&str>, reference_stdout: &str) -> bool {
    match recorded {
        Some(expected) if !expected.trim().is_empty() => !text_equal(expected, reference_stdout),
        _ => false,
    }
}

/// Assigns verdicts to cases.
///
/// Rules, first match wins:
/// 1. either exit code non-zero: [`Verdict::CommandFailure`]
/// 2. recorded expectation differs from the reference output:
///    [`Verdict::DocumentationDrift`]
/// 3. outputs compare equal in the configured mode: [`Verdict::Match`]
/// 4. otherwise [`Verdict::Mismatch`]
#[derive(Debug, Clone)]
pub struct Classifier {
    comparator: Comparator,
    reference_label: String,
    candidate_label: String,
}

impl Classifier {
    /// Creates a classifier that labels the tools `reference` and `candidate`.
    pub fn new(mode: CompareMode) -> Self {
        Self::with_labels(mode, "reference", "candidate")
    }

    /// Creates a classifier with custom tool labels for parse failures.
    pub fn with_labels(
        mode: CompareMode,
        reference_label: impl Into<String>,
        candidate_label: impl Into<String>,
    ) -> Self {
        Self {
            comparator: Comparator::new(mode),
            reference_label: reference_label.into(),
            candidate_label: candidate_label.into(),
        }
    }

    /// Returns the comparison mode.
    pub fn mode(&self) -> CompareMode {
        self.comparator.mode()
    }

    /// Classifies one case from both tools' outputs.
    ///
    /// Fails only in canonical mode, when both tools succeeded, the record did
    /// not drift, and one of the outputs has no parseable line.
    pub fn classify(
        &self,
        reference: &ToolOutput,
        candidate: &ToolOutput,
        recorded: Option<&str>,
    ) -> Result<Verdict, ParseFailure> {
        if !reference.succeeded() || !candidate.succeeded() {
            return Ok(Verdict::CommandFailure);
        }

        if is_documentation_drift(recorded, &reference.stdout) {
            return Ok(Verdict::DocumentationDrift);
        }

        let equal = self.comparator.outputs_equal(
            &reference.stdout,
            &candidate.stdout,
            (&self.reference_label, &self.candidate_label),
        )?;

        Ok(if equal {
            Verdict::Match
        } else {
            Verdict::Mismatch
        })
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(CompareMode::default())
    }
}

/// Classifies `case` against its recorded expectation in `mode`.
pub fn classify(
    case: &RawCase,
    reference: &ToolOutput,
    candidate: &ToolOutput,
    mode: CompareMode,
) -> Result<Verdict, ParseFailure> {
    Classifier::new(mode).classify(reference, candidate, case.expected.as_deref())
}
