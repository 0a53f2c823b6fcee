//! Parallel case execution.
//!
//! Cases run on a dedicated rayon pool. Results are collected by case index,
//! so the summary is in file order no matter which worker finishes first.

use crate::config::ArchConfig;
use crate::error::{HarnessError, Result};
use crate::tool::ToolSpec;
use disparity_core::{summarize, CaseResult, Classifier, CompareMode, RawCase, RunSummary};
use rayon::prelude::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default per-invocation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything a run needs besides the architecture config.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Reference disassembler executable.
    pub reference_bin: PathBuf,
    /// Executable under test.
    pub candidate_bin: PathBuf,
    /// Run at most this many cases.
    pub limit: Option<usize>,
    /// Stop dispatching after the first non-matching case.
    pub fail_fast: bool,
    /// How outputs are compared.
    pub mode: CompareMode,
    /// Per-invocation timeout.
    pub timeout: Duration,
    /// Worker count; `None` uses rayon's default.
    pub jobs: Option<usize>,
}

impl RunParams {
    /// Creates parameters with default settings.
    pub fn new(reference_bin: impl Into<PathBuf>, candidate_bin: impl Into<PathBuf>) -> Self {
        Self {
            reference_bin: reference_bin.into(),
            candidate_bin: candidate_bin.into(),
            limit: None,
            fail_fast: false,
            mode: CompareMode::default(),
            timeout: DEFAULT_TIMEOUT,
            jobs: None,
        }
    }

    /// Runs at most `limit` cases from the top of the file.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Stops dispatching cases after the first failure.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Sets how outputs are compared.
    pub fn with_mode(mut self, mode: CompareMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the per-invocation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the worker count; `None` uses rayon's default.
    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Checks that both executables exist.
    pub fn check_binaries(&self) -> Result<()> {
        for (role, path) in [
            ("reference", &self.reference_bin),
            ("candidate", &self.candidate_bin),
        ] {
            if !path.is_file() {
                return Err(HarnessError::config(format!(
                    "{} binary not found: {}",
                    role,
                    path.display()
                )));
            }
        }
        if self.timeout.is_zero() {
            return Err(HarnessError::config("timeout must be greater than zero"));
        }
        if self.jobs == Some(0) {
            return Err(HarnessError::config("job count must be at least 1"));
        }
        Ok(())
    }
}

/// Outcome of running one architecture.
#[derive(Debug, Clone, Serialize)]
pub struct ArchRun {
    /// Results of every case that ran.
    pub summary: RunSummary,
    /// Cases never started because of fail-fast.
    pub skipped: usize,
}

impl ArchRun {
    /// Whether the run passes; see [`RunSummary::is_passing`].
    pub fn is_passing(&self, drift_blocks: bool) -> bool {
        self.summary.is_passing(drift_blocks)
    }
}

/// Tools and classifier shared by every case of a run.
struct CaseContext<'a> {
    config: &'a ArchConfig,
    reference: ToolSpec,
    candidate: ToolSpec,
    classifier: Classifier,
    timeout: Duration,
}

/// Runs one case with both tools and classifies it.
pub fn run_case(
    config: &ArchConfig,
    case: &RawCase,
    reference: &ToolSpec,
    candidate: &ToolSpec,
    classifier: &Classifier,
    timeout: Duration,
) -> CaseResult {
    let start = Instant::now();
    let input = config.tool_input(&case.hex);

    let candidate_out = candidate.run(&input, timeout);
    let reference_out = reference.run(&input, timeout);

    let outcome = classifier
        .classify(&reference_out, &candidate_out, case.expected.as_deref())
        .into();

    CaseResult {
        case: case.clone(),
        reference: reference_out,
        candidate: candidate_out,
        outcome,
        duration: start.elapsed(),
    }
}

impl CaseContext<'_> {
    fn run(&self, case: &RawCase) -> CaseResult {
        run_case(
            self.config,
            case,
            &self.reference,
            &self.candidate,
            &self.classifier,
            self.timeout,
        )
    }
}

/// Runs every case of one architecture.
///
/// Validates binaries, the config and the whole case file before any case
/// starts. With fail-fast, cases already running finish and the rest are
/// counted in [`ArchRun::skipped`].
pub fn run_arch(config: &ArchConfig, params: &RunParams) -> Result<ArchRun> {
    params.check_binaries()?;
    config.ensure_valid()?;

    let mut cases = config.load_cases()?;
    if let Some(limit) = params.limit {
        cases.truncate(limit);
    }

    if cases.is_empty() {
        warn!(arch = %config.name, file = %config.cases_file.display(), "no test cases found");
        return Ok(ArchRun {
            summary: summarize(&config.name, Vec::new(), Duration::ZERO),
            skipped: 0,
        });
    }

    let reference = config.reference_tool(&params.reference_bin);
    let candidate = config.candidate_tool(&params.candidate_bin);
    let classifier = Classifier::with_labels(params.mode, reference.label(), candidate.label());
    let ctx = CaseContext {
        config,
        reference,
        candidate,
        classifier,
        timeout: params.timeout,
    };

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = params.jobs {
        builder = builder.num_threads(jobs);
    }
    let pool = builder.build()?;

    info!(
        arch = %config.name,
        cases = cases.len(),
        file = %config.cases_file.display(),
        "running cases"
    );

    let total = cases.len();
    let stop = AtomicBool::new(false);
    let done = AtomicUsize::new(0);
    let start = Instant::now();

    let slots: Vec<Option<CaseResult>> = pool.install(|| {
        cases
            .par_iter()
            .map(|case| {
                if params.fail_fast && stop.load(Ordering::SeqCst) {
                    return None;
                }
                let result = ctx.run(case);
                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                if result.is_failure() {
                    info!(
                        "[{:>3}/{}] {} ({})",
                        n,
                        total,
                        case.hex,
                        result.outcome.label()
                    );
                    if params.fail_fast {
                        stop.store(true, Ordering::SeqCst);
                    }
                } else {
                    debug!("[{:>3}/{}] {} ok", n, total, case.hex);
                }
                Some(result)
            })
            .collect()
    });

    let skipped = slots.iter().filter(|s| s.is_none()).count();
    let results: Vec<CaseResult> = slots.into_iter().flatten().collect();
    if skipped > 0 {
        info!(arch = %config.name, skipped, "fail-fast stopped the run");
    }

    Ok(ArchRun {
        summary: summarize(&config.name, results, start.elapsed()),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let params = RunParams::new("a", "b");
        assert_eq!(params.timeout, DEFAULT_TIMEOUT);
        assert_eq!(params.mode, CompareMode::Canonical);
        assert!(!params.fail_fast);
        assert!(params.limit.is_none());
    }

    #[test]
    fn test_missing_binaries_rejected() {
        let params = RunParams::new("/nonexistent/cstool", "/nonexistent/robustone");
        let err = params.check_binaries().unwrap_err();
        assert!(matches!(err, HarnessError::Configuration(_)));
        assert!(err.to_string().contains("reference binary not found"));
    }
}
