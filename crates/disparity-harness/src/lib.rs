//! # disparity-harness
//!
//! Runs two disassemblers over per-architecture case files and classifies
//! every case with [`disparity_core`].
//!
//! - [`config`]: `architectures/<arch>/config.json` loading and discovery
//! - [`exec`] and [`tool`]: process invocation with a timeout
//! - [`runner`]: parallel, order-preserving case execution
//! - [`report`]: text and JSON reports
//! - [`record`]: refresh recorded expectations from the reference tool

pub mod config;
pub mod error;
pub mod exec;
pub mod record;
pub mod report;
pub mod runner;
pub mod tool;

pub use config::{count_cases, create_sample_config, discover, ArchConfig};
pub use error::{HarnessError, Result};
pub use exec::run_command;
pub use record::{record_expected, RecordStats};
pub use report::{
    render_arch_listing, render_case_detail, render_overall, render_summary, write_json_report,
};
pub use runner::{run_arch, run_case, ArchRun, RunParams, DEFAULT_TIMEOUT};
pub use tool::ToolSpec;
