//! Human-readable and JSON reports.

use crate::config::ArchConfig;
use crate::error::{HarnessError, Result};
use crate::runner::ArchRun;
use disparity_core::{CaseOutcome, CaseResult, OverallTotals, RunSummary};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::Path;

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

fn percent(rate: f64) -> f64 {
    rate * 100.0
}

/// Renders one architecture's results.
///
/// At most `show_failures` failures are listed; the rest are summarized in a
/// trailing "... and N more failures" line.
pub fn render_summary(run: &ArchRun, show_failures: usize, show_details: bool) -> String {
    SummaryReport {
        run,
        show_failures,
        show_details,
    }
    .to_string()
}

/// Renders every captured detail of one case.
pub fn render_case_detail(result: &CaseResult) -> String {
    CaseDetail(result).to_string()
}

/// Renders totals across several architectures.
pub fn render_overall(totals: &OverallTotals) -> String {
    OverallReport(totals).to_string()
}

/// Renders the `list` table: one line per architecture with its case count.
pub fn render_arch_listing<'a>(
    configs: impl IntoIterator<Item = (&'a ArchConfig, usize)>,
) -> String {
    ArchListing(configs.into_iter().collect()).to_string()
}

struct SummaryReport<'a> {
    run: &'a ArchRun,
    show_failures: usize,
    show_details: bool,
}

impl fmt::Display for SummaryReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let summary = &self.run.summary;
        let skipped = self.run.skipped;
        let show_failures = self.show_failures;

        writeln!(f, "\n{}", RULE)?;
        writeln!(f, "Results for {}:", summary.arch_name)?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Total cases:         {}", summary.total_cases)?;
        writeln!(
            f,
            "Matches:             {} ({:.1}%)",
            summary.matches,
            percent(summary.success_rate())
        )?;
        writeln!(f, "Mismatches:          {}", summary.mismatches)?;
        writeln!(f, "Command failures:    {}", summary.command_failures)?;
        writeln!(f, "Documentation drift: {}", summary.documentation_drifts)?;
        if summary.parse_failures > 0 {
            writeln!(f, "Parse failures:      {}", summary.parse_failures)?;
        }
        if skipped > 0 {
            writeln!(f, "Skipped (fail-fast): {}", skipped)?;
        }
        writeln!(
            f,
            "Execution time:      {}ms",
            summary.execution_time.as_millis()
        )?;

        let failures = summary.failures();
        if !failures.is_empty() && show_failures > 0 {
            writeln!(
                f,
                "\nFailures (showing first {}):",
                show_failures.min(failures.len())
            )?;
            writeln!(f, "{}", THIN_RULE)?;

            for (i, result) in failures.iter().take(show_failures).enumerate() {
                writeln!(f, "\n{}. {} ({})", i + 1, result.case.hex, result.outcome.label())?;
                if self.show_details {
                    write!(f, "{}", CaseDetail(result))?;
                } else {
                    write_case_brief(f, result)?;
                }
            }
        }

        if failures.len() > show_failures {
            writeln!(
                f,
                "\n... and {} more failures",
                failures.len() - show_failures
            )?;
        }

        writeln!(
            f,
            "\nOverall success rate: {:.1}%",
            percent(summary.success_rate())
        )?;
        if summary.total_cases > 0 && summary.failure_count() == 0 && skipped == 0 {
            writeln!(f, "All tests passed!")?;
        }
        Ok(())
    }
}

fn write_case_brief(f: &mut fmt::Formatter<'_>, result: &CaseResult) -> fmt::Result {
    if let Some(expected) = &result.case.expected {
        writeln!(f, "   Expected:  {}", expected)?;
    }
    if let Some(note) = &result.case.note {
        writeln!(f, "   Note:      {}", note)?;
    }
    writeln!(f, "   Candidate: {}", result.candidate.stdout)?;
    writeln!(f, "   Reference: {}", result.reference.stdout)?;
    if let CaseOutcome::Unparseable(failure) = &result.outcome {
        writeln!(f, "   Error:     {}", failure)?;
    }
    Ok(())
}

struct CaseDetail<'a>(&'a CaseResult);

impl fmt::Display for CaseDetail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(f, "Instruction: {}", result.case.hex)?;
        if let Some(expected) = &result.case.expected {
            writeln!(f, "  Expected:   {}", expected)?;
        }
        writeln!(f, "  Candidate:  {}", result.candidate.stdout)?;
        writeln!(f, "  Reference:  {}", result.reference.stdout)?;
        if let Some(note) = &result.case.note {
            writeln!(f, "  Note:       {}", note)?;
        }
        if result.candidate.exit_code != 0 {
            writeln!(f, "  Candidate exit code: {}", result.candidate.exit_code)?;
        }
        if result.reference.exit_code != 0 {
            writeln!(f, "  Reference exit code: {}", result.reference.exit_code)?;
        }
        if !result.candidate.stderr.is_empty() {
            writeln!(f, "  Candidate stderr: {}", result.candidate.stderr)?;
        }
        if !result.reference.stderr.is_empty() {
            writeln!(f, "  Reference stderr: {}", result.reference.stderr)?;
        }
        if let CaseOutcome::Unparseable(failure) = &result.outcome {
            writeln!(f, "  Parse failure: {}", failure)?;
        }
        if !result.duration.is_zero() {
            writeln!(f, "  Execution time: {}ms", result.duration.as_millis())?;
        }
        Ok(())
    }
}

struct OverallReport<'a>(&'a OverallTotals);

impl fmt::Display for OverallReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let totals = self.0;
        writeln!(f, "\n{}", RULE)?;
        writeln!(f, "Overall Summary")?;
        writeln!(f, "{}", RULE)?;
        writeln!(f, "Architectures tested: {}", totals.architectures)?;
        writeln!(f, "Total test cases:     {}", totals.total_cases)?;
        writeln!(
            f,
            "Total matches:        {} ({:.1}%)",
            totals.matches,
            percent(totals.success_rate())
        )?;
        writeln!(f, "Total mismatches:     {}", totals.mismatches)?;
        writeln!(f, "Total failures:       {}", totals.command_failures)?;
        writeln!(f, "Total drifts:         {}", totals.documentation_drifts)?;
        writeln!(f, "Total parse failures: {}", totals.parse_failures)?;
        writeln!(
            f,
            "Total time:           {}ms",
            totals.execution_time.as_millis()
        )
    }
}

struct ArchListing<'a>(Vec<(&'a ArchConfig, usize)>);

impl fmt::Display for ArchListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Available architectures:")?;
        writeln!(f, "{}", &THIN_RULE[..40])?;
        for (config, cases) in &self.0 {
            writeln!(
                f,
                "  {:<15} ({:3} cases) - {}",
                config.name, cases, config.description
            )?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    totals: OverallTotals,
    architectures: Vec<JsonArch<'a>>,
}

#[derive(Serialize)]
struct JsonArch<'a> {
    skipped: usize,
    success_rate: f64,
    #[serde(flatten)]
    summary: &'a RunSummary,
}

/// Writes a machine-readable report of every run, failures untruncated.
pub fn write_json_report(path: &Path, runs: &[ArchRun]) -> Result<()> {
    let report = JsonReport {
        totals: RunSummary::merge_totals(runs.iter().map(|r| &r.summary)),
        architectures: runs
            .iter()
            .map(|r| JsonArch {
                skipped: r.skipped,
                success_rate: r.summary.success_rate(),
                summary: &r.summary,
            })
            .collect(),
    };
    let text = serde_json::to_string_pretty(&report).map_err(|e| HarnessError::json(path, e))?;
    fs::write(path, text).map_err(|e| HarnessError::io(path, e))
}
