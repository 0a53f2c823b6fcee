//! Refreshing recorded expectations from the reference tool.

use crate::config::ArchConfig;
use crate::error::{HarnessError, Result};
use crate::tool::ToolSpec;
use disparity_core::{normalize_whitespace, parse_case_line};
use std::fs;
use std::time::Duration;
use tracing::{debug, warn};

/// Separates the expected column from the note in a case line.
const NOTE_SEPARATOR: char = '|';

/// What a recording pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordStats {
    /// Cases whose expected column was rewritten.
    pub updated: usize,
    /// Cases whose expected column already matched.
    pub unchanged: usize,
    /// Cases left as they were: the reference tool failed, or its output
    /// cannot be stored in the expected column.
    pub failed: usize,
}

/// Rewrites the expected column of `config`'s case file with `reference`'s
/// current output.
///
/// Comment and blank lines are kept verbatim, as are notes. The whole file is
/// parsed before anything runs, so a bad line leaves the file untouched.
/// Output containing `|` would read back as a note, so such cases are
/// counted as failed instead of recorded.
pub fn record_expected(
    config: &ArchConfig,
    reference: &ToolSpec,
    timeout: Duration,
) -> Result<RecordStats> {
    let path = &config.cases_file;
    let text = fs::read_to_string(path)
        .map_err(|e| HarnessError::case_source(path, e.to_string()))?;

    let mut parsed = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let case = parse_case_line(line).map_err(|e| {
            HarnessError::case_source(path, format!("line {}: {}", idx + 1, e))
        })?;
        parsed.push((line, case));
    }

    let mut stats = RecordStats::default();
    let mut out = String::with_capacity(text.len());

    for (line, case) in parsed {
        let Some(case) = case else {
            out.push_str(line);
            out.push('\n');
            continue;
        };

        let output = reference.run(&config.tool_input(&case.hex), timeout);
        if !output.succeeded() {
            warn!(hex = %case.hex, exit_code = output.exit_code, "reference tool failed; keeping line");
            stats.failed += 1;
            out.push_str(line);
            out.push('\n');
            continue;
        }

        let recorded = normalize_whitespace(&output.stdout);
        if recorded.contains(NOTE_SEPARATOR) {
            warn!(hex = %case.hex, %recorded, "output contains the note separator; keeping line");
            stats.failed += 1;
            out.push_str(line);
            out.push('\n');
            continue;
        }
        if case.expected.as_deref().map(normalize_whitespace) == Some(recorded.clone()) {
            stats.unchanged += 1;
            out.push_str(line);
        } else {
            debug!(hex = %case.hex, %recorded, "updating expected output");
            stats.updated += 1;
            out.push_str(&case.with_expected(recorded).to_line());
        }
        out.push('\n');
    }

    if stats.updated > 0 {
        fs::write(path, out).map_err(|e| HarnessError::io(path, e))?;
    }
    Ok(stats)
}
