//! Per-architecture configuration.
//!
//! Each architecture lives in its own directory under the test root:
//!
//! ```text
//! <root>/architectures/<arch>/config.json
//! <root>/architectures/<arch>/test_cases.txt
//! ```

use crate::error::{HarnessError, Result};
use crate::tool::ToolSpec;
use disparity_core::{case::is_case_line, parse_cases, HexInstruction, RawCase};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of an architecture's configuration.
pub const CONFIG_FILE: &str = "config.json";

/// Default case file name, relative to the config directory.
pub const DEFAULT_CASES_FILE: &str = "test_cases.txt";

/// Directory under the test root that holds one subdirectory per architecture.
pub const ARCHITECTURES_DIR: &str = "architectures";

fn default_category() -> String {
    "general".to_string()
}

/// On-disk form. Every field is optional; missing values are filled in by
/// [`ArchConfig::from_json`].
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "cstool_arch")]
    reference_arch: Option<String>,
    #[serde(default, alias = "robustone_arch")]
    candidate_arch: Option<String>,
    #[serde(default)]
    cases_file: Option<PathBuf>,
    #[serde(default, alias = "cstool_flags")]
    reference_flags: Vec<String>,
    #[serde(default, alias = "robustone_flags")]
    candidate_flags: Vec<String>,
    #[serde(default)]
    description: String,
    #[serde(default = "default_category")]
    category: String,
    #[serde(default)]
    swap_bytes: bool,
}

/// Configuration for one architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchConfig {
    /// Architecture name.
    pub name: String,
    /// Identifier passed to the reference tool.
    pub reference_arch: String,
    /// Identifier passed to the tool under test.
    pub candidate_arch: String,
    /// Case file, resolved against the config directory.
    pub cases_file: PathBuf,
    /// Extra flags for the reference tool.
    pub reference_flags: Vec<String>,
    /// Extra flags for the tool under test.
    pub candidate_flags: Vec<String>,
    /// Free-text description.
    pub description: String,
    /// Grouping label.
    pub category: String,
    /// Pass each instruction word as space-separated little-endian bytes.
    pub swap_bytes: bool,
}

impl ArchConfig {
    /// Loads a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_json(&text, dir).map_err(|e| HarnessError::json(path, e))
    }

    /// Parses config JSON. `dir` is the directory holding the config; it
    /// names the architecture when `name` is absent and anchors `cases_file`.
    pub fn from_json(text: &str, dir: &Path) -> std::result::Result<Self, serde_json::Error> {
        let file: ConfigFile = serde_json::from_str(text)?;

        let name = file.name.unwrap_or_else(|| {
            dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        });
        let cases_file = file
            .cases_file
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CASES_FILE));
        let cases_file = if cases_file.is_absolute() {
            cases_file
        } else {
            dir.join(cases_file)
        };

        Ok(Self {
            reference_arch: file.reference_arch.unwrap_or_else(|| name.clone()),
            candidate_arch: file.candidate_arch.unwrap_or_else(|| name.clone()),
            name,
            cases_file,
            reference_flags: file.reference_flags,
            candidate_flags: file.candidate_flags,
            description: file.description,
            category: file.category,
            swap_bytes: file.swap_bytes,
        })
    }

    /// Returns every problem with this config. Empty means valid.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.name.trim().is_empty() {
            issues.push("architecture name is empty".to_string());
        }
        if self.reference_arch.trim().is_empty() {
            issues.push("reference architecture is empty".to_string());
        }
        if self.candidate_arch.trim().is_empty() {
            issues.push("candidate architecture is empty".to_string());
        }
        if !self.cases_file.is_file() {
            issues.push(format!(
                "test cases file not found: {}",
                self.cases_file.display()
            ));
        }
        for flag in &self.reference_flags {
            if flag.trim().is_empty() {
                issues.push(format!("invalid reference flag: {:?}", flag));
            }
        }
        for flag in &self.candidate_flags {
            if flag.trim().is_empty() {
                issues.push(format!("invalid candidate flag: {:?}", flag));
            }
        }

        issues
    }

    /// Fails with a configuration error listing every issue.
    pub fn ensure_valid(&self) -> Result<()> {
        let issues = self.validate();
        if issues.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::config(format!(
                "invalid configuration for {}: {}",
                self.name,
                issues.join("; ")
            )))
        }
    }

    /// Reads and parses the case file.
    pub fn load_cases(&self) -> Result<Vec<RawCase>> {
        let text = fs::read_to_string(&self.cases_file)
            .map_err(|e| HarnessError::case_source(&self.cases_file, e.to_string()))?;
        parse_cases(&text).map_err(|e| HarnessError::case_source(&self.cases_file, e.to_string()))
    }

    /// The reference tool for this architecture.
    pub fn reference_tool(&self, program: &Path) -> ToolSpec {
        ToolSpec::new(program, &self.reference_arch).with_flags(self.reference_flags.iter().cloned())
    }

    /// The tool under test for this architecture.
    pub fn candidate_tool(&self, program: &Path) -> ToolSpec {
        ToolSpec::new(program, &self.candidate_arch).with_flags(self.candidate_flags.iter().cloned())
    }

    /// Instruction text handed to both tools.
    pub fn tool_input(&self, hex: &HexInstruction) -> String {
        if self.swap_bytes {
            hex.to_le_byte_string()
        } else {
            hex.as_str().to_string()
        }
    }
}

/// Path of the config file for `arch` under `root`.
pub fn config_path(root: &Path, arch: &str) -> PathBuf {
    root.join(ARCHITECTURES_DIR).join(arch).join(CONFIG_FILE)
}

/// Finds every loadable architecture config under `root`, keyed by name.
///
/// Directories are visited in sorted order. A config that fails to load is
/// logged and skipped.
pub fn discover(root: &Path) -> BTreeMap<String, ArchConfig> {
    let mut configs = BTreeMap::new();
    let arch_dir = root.join(ARCHITECTURES_DIR);

    let entries = match fs::read_dir(&arch_dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %arch_dir.display(), %err, "no architectures directory");
            return configs;
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();

    for dir in dirs {
        let path = dir.join(CONFIG_FILE);
        if !path.is_file() {
            continue;
        }
        match ArchConfig::load(&path) {
            Ok(config) => {
                debug!(arch = %config.name, path = %path.display(), "loaded config");
                configs.insert(config.name.clone(), config);
            }
            Err(err) => warn!(path = %path.display(), %err, "skipping config"),
        }
    }

    configs
}

/// Writes a sample `config.json` and an empty case file for a new
/// architecture into `dir`. Refuses to overwrite an existing config.
pub fn create_sample_config(name: &str, dir: &Path) -> Result<PathBuf> {
    if name.trim().is_empty() {
        return Err(HarnessError::config("architecture name is empty"));
    }

    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() {
        return Err(HarnessError::config(format!(
            "{} already exists",
            config_path.display()
        )));
    }

    fs::create_dir_all(dir).map_err(|e| HarnessError::io(dir, e))?;

    let sample = serde_json::json!({
        "name": name,
        "reference_arch": name,
        "candidate_arch": name,
        "cases_file": DEFAULT_CASES_FILE,
        "reference_flags": [],
        "candidate_flags": [],
        "description": format!("Test configuration for {} architecture", name),
        "category": "general",
        "swap_bytes": false,
    });
    let text = serde_json::to_string_pretty(&sample).map_err(|e| HarnessError::json(&config_path, e))?;
    fs::write(&config_path, text + "\n").map_err(|e| HarnessError::io(&config_path, e))?;

    let cases_path = dir.join(DEFAULT_CASES_FILE);
    if !cases_path.exists() {
        let header = format!(
            "# {} test cases\n# Format: <hex_bytes> [# <expected_output> [| <note>]]\n\n",
            name
        );
        fs::write(&cases_path, header).map_err(|e| HarnessError::io(&cases_path, e))?;
    }

    Ok(config_path)
}

/// Number of case lines in a case file, without validating them.
pub fn count_cases(path: &Path) -> Result<usize> {
    let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
    Ok(text.lines().filter(|l| is_case_line(l)).count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_directory() {
        let config = ArchConfig::from_json("{}", Path::new("/tests/architectures/riscv32")).unwrap();
        assert_eq!(config.name, "riscv32");
        assert_eq!(config.reference_arch, "riscv32");
        assert_eq!(config.candidate_arch, "riscv32");
        assert_eq!(
            config.cases_file,
            Path::new("/tests/architectures/riscv32/test_cases.txt")
        );
        assert_eq!(config.category, "general");
        assert!(!config.swap_bytes);
    }

    #[test]
    fn test_legacy_keys() {
        let json = r#"{
            "name": "riscv32",
            "robustone_arch": "riscv32e",
            "cstool_arch": "riscv32",
            "robustone_flags": ["--detailed"],
            "cstool_flags": ["-d"]
        }"#;
        let config = ArchConfig::from_json(json, Path::new("/t")).unwrap();
        assert_eq!(config.candidate_arch, "riscv32e");
        assert_eq!(config.reference_arch, "riscv32");
        assert_eq!(config.candidate_flags, vec!["--detailed"]);
        assert_eq!(config.reference_flags, vec!["-d"]);
    }

    #[test]
    fn test_absolute_cases_file() {
        let json = r#"{"name": "x", "cases_file": "/data/cases.txt"}"#;
        let config = ArchConfig::from_json(json, Path::new("/t")).unwrap();
        assert_eq!(config.cases_file, Path::new("/data/cases.txt"));
    }

    #[test]
    fn test_non_string_flag_is_rejected() {
        let json = r#"{"name": "x", "reference_flags": [1]}"#;
        assert!(ArchConfig::from_json(json, Path::new("/t")).is_err());
    }

    #[test]
    fn test_validate_reports_every_issue() {
        let json = r#"{"name": "x", "candidate_arch": "", "reference_flags": [" "]}"#;
        let config = ArchConfig::from_json(json, Path::new("/nonexistent")).unwrap();
        let issues = config.validate();
        assert_eq!(issues.len(), 3, "{:?}", issues);
        assert!(issues.iter().any(|i| i.contains("candidate architecture")));
        assert!(issues.iter().any(|i| i.contains("not found")));
        assert!(issues.iter().any(|i| i.contains("reference flag")));
        assert!(matches!(
            config.ensure_valid(),
            Err(HarnessError::Configuration(_))
        ));
    }

    #[test]
    fn test_tool_input_swaps_bytes() {
        let mut config = ArchConfig::from_json("{}", Path::new("/t/rv")).unwrap();
        let hex = HexInstruction::parse("00a00513").unwrap();
        assert_eq!(config.tool_input(&hex), "00a00513");
        config.swap_bytes = true;
        assert_eq!(config.tool_input(&hex), "13 05 a0 00");
    }

    #[test]
    fn test_tools_carry_arch_and_flags() {
        let json = r#"{"name": "rv", "cstool_flags": ["-d"]}"#;
        let config = ArchConfig::from_json(json, Path::new("/t")).unwrap();
        let tool = config.reference_tool(Path::new("/bin/cstool"));
        assert_eq!(tool.argv("13"), vec!["rv", "13", "-d"]);
        assert!(config.candidate_tool(Path::new("/bin/x")).flags.is_empty());
    }
}
