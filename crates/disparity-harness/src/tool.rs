//! Disassembler invocation specs.

use crate::exec::{binary_exists, run_command};
use disparity_core::ToolOutput;
use std::path::PathBuf;
use std::time::Duration;

/// How to invoke one disassembler for a given architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    /// Path to the executable.
    pub program: PathBuf,
    /// Architecture identifier passed as the first argument.
    pub arch: String,
    /// Extra flags appended after the instruction bytes.
    pub flags: Vec<String>,
}

impl ToolSpec {
    /// Creates a spec with no extra flags.
    pub fn new(program: impl Into<PathBuf>, arch: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            arch: arch.into(),
            flags: Vec::new(),
        }
    }

    /// Sets the extra flags.
    pub fn with_flags(mut self, flags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.flags = flags.into_iter().map(Into::into).collect();
        self
    }

    /// Command-line arguments for disassembling `hex`.
    pub fn argv(&self, hex: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(2 + self.flags.len());
        args.push(self.arch.clone());
        args.push(hex.to_string());
        args.extend(self.flags.iter().cloned());
        args
    }

    /// Short name used in reports and parse failures.
    pub fn label(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Returns true if the executable exists.
    pub fn exists(&self) -> bool {
        binary_exists(&self.program)
    }

    /// Disassembles `hex`.
    pub fn run(&self, hex: &str, timeout: Duration) -> ToolOutput {
        run_command(&self.program, &self.argv(hex), timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argv_order() {
        let spec = ToolSpec::new("/opt/cstool", "riscv32").with_flags(["-d", "-r"]);
        assert_eq!(spec.argv("13051500"), vec!["riscv32", "13051500", "-d", "-r"]);
    }

    #[test]
    fn test_label_is_file_name() {
        let spec = ToolSpec::new("third_party/capstone/cstool/cstool", "riscv32");
        assert_eq!(spec.label(), "cstool");
        assert!(!spec.exists());
    }
}
