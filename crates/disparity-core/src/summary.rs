//! Case results and run-level aggregation.

use crate::case::RawCase;
use crate::error::ParseFailure;
use crate::verdict::{ToolOutput, Verdict};
use serde::Serialize;
use std::time::Duration;

/// What happened to one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseOutcome {
    /// The case was classified.
    Verdict(Verdict),
    /// Canonical comparison could not parse one tool's output.
    Unparseable(ParseFailure),
}

impl CaseOutcome {
    /// Returns the verdict, if the case was classified.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Self::Verdict(v) => Some(*v),
            Self::Unparseable(_) => None,
        }
    }

    /// Returns true unless the case is a [`Verdict::Match`].
    pub fn is_failure(&self) -> bool {
        self.verdict() != Some(Verdict::Match)
    }

    /// Short machine-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Verdict(v) => v.as_str(),
            Self::Unparseable(_) => "parse_failure",
        }
    }
}

impl From<Result<Verdict, ParseFailure>> for CaseOutcome {
    fn from(result: Result<Verdict, ParseFailure>) -> Self {
        match result {
            Ok(verdict) => Self::Verdict(verdict),
            Err(failure) => Self::Unparseable(failure),
        }
    }
}

/// One executed case.
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    /// The input case.
    pub case: RawCase,
    /// Output of the reference tool.
    pub reference: ToolOutput,
    /// Output of the tool under test.
    pub candidate: ToolOutput,
    /// Classification.
    pub outcome: CaseOutcome,
    /// Wall-clock time for the whole case.
    pub duration: Duration,
}

impl CaseResult {
    /// Returns the verdict, if the case was classified.
    pub fn verdict(&self) -> Option<Verdict> {
        self.outcome.verdict()
    }

    /// Returns true unless the case matched.
    pub fn is_failure(&self) -> bool {
        self.outcome.is_failure()
    }

    /// Recorded expected output, or an empty string.
    pub fn expected(&self) -> &str {
        self.case.expected.as_deref().unwrap_or("")
    }
}

/// Aggregate results for one architecture run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Architecture name.
    pub arch_name: String,
    /// Number of cases.
    pub total_cases: usize,
    /// Cases with [`Verdict::Match`].
    pub matches: usize,
    /// Cases with [`Verdict::Mismatch`].
    pub mismatches: usize,
    /// Cases with [`Verdict::CommandFailure`].
    pub command_failures: usize,
    /// Cases with [`Verdict::DocumentationDrift`].
    pub documentation_drifts: usize,
    /// Cases whose output could not be parsed.
    pub parse_failures: usize,
    /// Wall-clock time for the run.
    pub execution_time: Duration,
    /// Every case, in execution order.
    pub results: Vec<CaseResult>,
}

/// Folds ordered case results into a summary.
pub fn summarize(
    arch_name: impl Into<String>,
    results: Vec<CaseResult>,
    execution_time: Duration,
) -> RunSummary {
    let mut summary = RunSummary {
        arch_name: arch_name.into(),
        total_cases: results.len(),
        matches: 0,
        mismatches: 0,
        command_failures: 0,
        documentation_drifts: 0,
        parse_failures: 0,
        execution_time,
        results: Vec::new(),
    };

    for result in &results {
        match &result.outcome {
            CaseOutcome::Verdict(Verdict::Match) => summary.matches += 1,
            CaseOutcome::Verdict(Verdict::Mismatch) => summary.mismatches += 1,
            CaseOutcome::Verdict(Verdict::CommandFailure) => summary.command_failures += 1,
            CaseOutcome::Verdict(Verdict::DocumentationDrift) => {
                summary.documentation_drifts += 1
            }
            CaseOutcome::Unparseable(_) => summary.parse_failures += 1,
        }
    }

    summary.results = results;
    summary
}

impl RunSummary {
    /// Number of cases with the given verdict.
    pub fn count(&self, verdict: Verdict) -> usize {
        match verdict {
            Verdict::Match => self.matches,
            Verdict::Mismatch => self.mismatches,
            Verdict::CommandFailure => self.command_failures,
            Verdict::DocumentationDrift => self.documentation_drifts,
        }
    }

    /// Fraction of cases that matched, 0.0 for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total_cases == 0 {
            0.0
        } else {
            self.matches as f64 / self.total_cases as f64
        }
    }

    /// Every non-matching case, in execution order.
    ///
    /// Callers that display failures may truncate; this list never is.
    pub fn failures(&self) -> Vec<&CaseResult> {
        self.results.iter().filter(|r| r.is_failure()).collect()
    }

    /// Number of non-matching cases, drift and parse failures included.
    pub fn failure_count(&self) -> usize {
        self.total_cases - self.matches
    }

    /// Number of cases whose recorded expectation drifted.
    pub fn drift_count(&self) -> usize {
        self.documentation_drifts
    }

    /// Failures that are not documentation drift.
    pub fn disagreement_count(&self) -> usize {
        self.failure_count() - self.documentation_drifts
    }

    /// Whether the run passes a release gate.
    ///
    /// Mismatches, command failures and parse failures always fail the gate;
    /// drift fails it only when `drift_blocks` is set.
    pub fn is_passing(&self, drift_blocks: bool) -> bool {
        self.disagreement_count() == 0 && (!drift_blocks || self.documentation_drifts == 0)
    }

    /// Adds up several architecture runs.
    pub fn merge_totals<'a>(summaries: impl IntoIterator<Item = &'a RunSummary>) -> OverallTotals {
        OverallTotals::from_summaries(summaries)
    }
}

/// Totals across several architecture runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverallTotals {
    /// Number of architectures.
    pub architectures: usize,
    /// Total cases.
    pub total_cases: usize,
    /// Total matches.
    pub matches: usize,
    /// Total mismatches.
    pub mismatches: usize,
    /// Total command failures.
    pub command_failures: usize,
    /// Total documentation drifts.
    pub documentation_drifts: usize,
    /// Total parse failures.
    pub parse_failures: usize,
    /// Summed execution time.
    pub execution_time: Duration,
}

impl OverallTotals {
    /// Adds up a set of summaries.
    pub fn from_summaries<'a>(summaries: impl IntoIterator<Item = &'a RunSummary>) -> Self {
        summaries.into_iter().fold(Self::default(), |mut acc, s| {
            acc.architectures += 1;
            acc.total_cases += s.total_cases;
            acc.matches += s.matches;
            acc.mismatches += s.mismatches;
            acc.command_failures += s.command_failures;
            acc.documentation_drifts += s.documentation_drifts;
            acc.parse_failures += s.parse_failures;
            acc.execution_time += s.execution_time;
            acc
        })
    }

    /// Fraction of all cases that matched, 0.0 when there are none.
    pub fn success_rate(&self) -> f64 {
        if self.total_cases == 0 {
            0.0
        } else {
            self.matches as f64 / self.total_cases as f64
        }
    }
}
