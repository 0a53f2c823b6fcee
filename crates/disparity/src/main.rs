//! disparity - differential tests for a disassembler
//!
//! Usage:
//!   disparity run [--arch <name>]...      Compare both tools on every case
//!   disparity list                        List configured architectures
//!   disparity init <name>                 Create a new architecture config
//!   disparity validate                    Check configs and case files
//!   disparity compare --arch <name> <hex> Compare a single instruction
//!   disparity record --arch <name>        Refresh recorded expectations

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use disparity_core::{parse, Classifier, CompareMode, HexInstruction, RunSummary, ToolOutput};
use disparity_harness::{
    config, count_cases, create_sample_config, discover, record_expected, render_arch_listing,
    render_overall, render_summary, run_arch, write_json_report, ArchConfig, RunParams,
    DEFAULT_TIMEOUT,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Exit code for an unknown architecture or an empty test root.
const EXIT_USAGE: i32 = 2;

#[derive(Parser)]
#[command(name = "disparity")]
#[command(about = "Differential testing of a disassembler against a reference disassembler", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Test root holding architectures/<arch>/config.json
    #[arg(long, global = true, default_value = "test")]
    root: PathBuf,

    /// Reference disassembler executable
    #[arg(long, global = true, default_value = "third_party/capstone/cstool/cstool")]
    reference_bin: PathBuf,

    /// Disassembler under test
    #[arg(long, global = true, default_value = "target/debug/robustone")]
    candidate_bin: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run test cases and compare both tools
    Run(RunArgs),
    /// List configured architectures
    List,
    /// Create a sample configuration for a new architecture
    Init {
        /// Architecture name
        name: String,
    },
    /// Validate every configuration and case file
    Validate,
    /// Compare a single instruction
    Compare {
        /// Architecture name
        #[arg(long)]
        arch: String,
        /// Instruction bytes in hex
        hex: String,
        #[command(flatten)]
        compare: CompareArgs,
    },
    /// Rewrite recorded expected outputs from the reference tool
    Record {
        /// Architecture name
        #[arg(long)]
        arch: String,
        /// Per-invocation timeout in seconds
        #[arg(long, value_parser = parse_timeout)]
        timeout: Option<Duration>,
    },
}

#[derive(Args)]
struct CompareArgs {
    /// Compare raw text instead of canonical operands
    #[arg(long)]
    strict_match: bool,

    /// With --strict-match, also require identical whitespace
    #[arg(long)]
    keep_whitespace: bool,

    /// Per-invocation timeout in seconds
    #[arg(long, value_parser = parse_timeout)]
    timeout: Option<Duration>,
}

impl CompareArgs {
    fn mode(&self) -> CompareMode {
        CompareMode::from_toggles(self.strict_match, !self.keep_whitespace)
    }

    fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }
}

#[derive(Args)]
struct RunArgs {
    /// Architecture to test (repeatable; default: all)
    #[arg(long)]
    arch: Vec<String>,

    /// Test every configured architecture
    #[arg(long)]
    all: bool,

    /// Run at most this many cases per architecture
    #[arg(long)]
    limit: Option<usize>,

    /// Stop after the first failing case
    #[arg(long)]
    fail_fast: bool,

    /// Number of failures to show per architecture
    #[arg(long, default_value = "10")]
    show_failures: usize,

    /// Show every captured detail of each failure
    #[arg(long)]
    show_details: bool,

    /// Treat documentation drift as a failure
    #[arg(long)]
    drift_fails: bool,

    /// Worker threads (default: one per CPU)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Write a JSON report to this path
    #[arg(long)]
    json: Option<PathBuf>,

    #[command(flatten)]
    compare: CompareArgs,
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if secs <= 0.0 {
        return Err("timeout must be positive".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match &cli.command {
        Commands::Run(args) => cmd_run(&cli, args)?,
        Commands::List => cmd_list(&cli.root),
        Commands::Init { name } => cmd_init(&cli.root, name)?,
        Commands::Validate => cmd_validate(&cli.root),
        Commands::Compare { arch, hex, compare } => cmd_compare(&cli, arch, hex, compare)?,
        Commands::Record { arch, timeout } => {
            cmd_record(&cli, arch, timeout.unwrap_or(DEFAULT_TIMEOUT))?
        }
    };

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

fn banner(title: &str) {
    let rule = "=".repeat(60);
    println!("\n{}\n{}\n{}", rule, title, rule);
}

fn no_configs(root: &Path) {
    eprintln!(
        "No architecture configurations found under {}",
        root.join(config::ARCHITECTURES_DIR).display()
    );
    eprintln!("Create one with: disparity init <arch_name>");
}

fn lookup<'a>(configs: &'a BTreeMap<String, ArchConfig>, name: &str) -> Option<&'a ArchConfig> {
    let found = configs.get(name);
    if found.is_none() {
        eprintln!("Unknown architecture: '{}'", name);
        let names: Vec<&str> = configs.keys().map(String::as_str).collect();
        eprintln!("Available: {}", names.join(", "));
    }
    found
}

fn run_params(cli: &Cli) -> RunParams {
    RunParams::new(&cli.reference_bin, &cli.candidate_bin)
}

fn cmd_run(cli: &Cli, args: &RunArgs) -> Result<i32> {
    let configs = discover(&cli.root);
    if configs.is_empty() {
        no_configs(&cli.root);
        return Ok(EXIT_USAGE);
    }

    let selected: Vec<&ArchConfig> = if args.all || args.arch.is_empty() {
        configs.values().collect()
    } else {
        let mut selected = Vec::new();
        for name in &args.arch {
            match lookup(&configs, name) {
                Some(config) => selected.push(config),
                None => return Ok(EXIT_USAGE),
            }
        }
        selected
    };
    debug!(
        archs = ?selected.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        "selected architectures"
    );

    let params = run_params(cli)
        .with_limit(args.limit)
        .with_fail_fast(args.fail_fast)
        .with_mode(args.compare.mode())
        .with_timeout(args.compare.timeout())
        .with_jobs(args.jobs);
    params
        .check_binaries()
        .context("Failed to prepare binaries")?;

    let mut code = 0;
    let mut runs = Vec::new();

    for config in &selected {
        banner(&format!("Testing architecture: {}", config.name));
        match run_arch(config, &params) {
            Ok(run) => {
                print!(
                    "{}",
                    render_summary(&run, args.show_failures, args.show_details)
                );
                if !run.is_passing(args.drift_fails) {
                    code = 1;
                }
                runs.push(run);
            }
            Err(err) => {
                error!(arch = %config.name, "{}", err);
                println!("Error testing {}: {}", config.name, err);
                code = 1;
            }
        }
    }

    if selected.len() > 1 {
        print!(
            "{}",
            render_overall(&RunSummary::merge_totals(runs.iter().map(|r| &r.summary)))
        );
    }

    if let Some(path) = &args.json {
        write_json_report(path, &runs)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        info!(path = %path.display(), "wrote JSON report");
    }

    Ok(code)
}

fn cmd_list(root: &Path) -> i32 {
    let configs = discover(root);
    if configs.is_empty() {
        println!("No architecture configurations found.");
        println!("Create one with: disparity init <arch_name>");
        return 0;
    }

    let listing = configs
        .values()
        .map(|c| (c, count_cases(&c.cases_file).unwrap_or(0)));
    print!("{}", render_arch_listing(listing));
    0
}

fn cmd_init(root: &Path, name: &str) -> Result<i32> {
    let arch_dir = root.join(config::ARCHITECTURES_DIR).join(name);
    let config_path = create_sample_config(name, &arch_dir)
        .with_context(|| format!("Failed to create architecture '{}'", name))?;
    let cases_path = arch_dir.join(config::DEFAULT_CASES_FILE);

    println!("Created architecture configuration:");
    println!("  Config: {}", config_path.display());
    println!("  Cases:  {}", cases_path.display());
    println!("\nNext steps:");
    println!("  1. Add test cases to {}", cases_path.display());
    println!("  2. Run tests with: disparity run --arch {}", name);
    Ok(0)
}

fn cmd_validate(root: &Path) -> i32 {
    let configs = discover(root);
    if configs.is_empty() {
        no_configs(root);
        return EXIT_USAGE;
    }

    let mut code = 0;
    for config in configs.values() {
        let mut issues = config.validate();
        if issues.is_empty() {
            if let Err(err) = config.load_cases() {
                issues.push(err.to_string());
            }
        }

        if issues.is_empty() {
            println!("  ok    {}", config.name);
        } else {
            code = 1;
            println!("  FAIL  {}", config.name);
            for issue in issues {
                println!("          - {}", issue);
            }
        }
    }
    code
}

fn describe(label: &str, output: &ToolOutput) {
    println!("  {}:", label);
    println!("    exit code: {}", output.exit_code);
    println!("    output:    {}", output.stdout);
    if !output.stderr.is_empty() {
        println!("    stderr:    {}", output.stderr);
    }
    match parse(&output.stdout, label) {
        Ok(parsed) => println!("    canonical: {}", parsed),
        Err(err) => println!("    canonical: <{}>", err),
    }
}

fn cmd_compare(cli: &Cli, arch: &str, hex: &str, args: &CompareArgs) -> Result<i32> {
    let configs = discover(&cli.root);
    let Some(config) = lookup(&configs, arch) else {
        return Ok(EXIT_USAGE);
    };

    let params = run_params(cli);
    params
        .check_binaries()
        .context("Failed to prepare binaries")?;

    let hex = HexInstruction::parse(hex).context("Invalid instruction bytes")?;
    let input = config.tool_input(&hex);
    let reference = config.reference_tool(&params.reference_bin);
    let candidate = config.candidate_tool(&params.candidate_bin);

    let reference_out = reference.run(&input, args.timeout());
    let candidate_out = candidate.run(&input, args.timeout());

    println!("Instruction: {} ({})", hex, config.name);
    describe(&reference.label(), &reference_out);
    describe(&candidate.label(), &candidate_out);

    let classifier = Classifier::with_labels(args.mode(), reference.label(), candidate.label());
    match classifier.classify(&reference_out, &candidate_out, None) {
        Ok(verdict) => {
            println!("Verdict: {}", verdict);
            Ok(if verdict.is_failure() { 1 } else { 0 })
        }
        Err(failure) => {
            println!("Verdict: parse_failure ({})", failure);
            Ok(1)
        }
    }
}

fn cmd_record(cli: &Cli, arch: &str, timeout: Duration) -> Result<i32> {
    let configs = discover(&cli.root);
    let Some(config) = lookup(&configs, arch) else {
        return Ok(EXIT_USAGE);
    };

    if !cli.reference_bin.is_file() {
        bail!("reference binary not found: {}", cli.reference_bin.display());
    }
    config.ensure_valid()?;

    let reference = config.reference_tool(&cli.reference_bin);
    let stats = record_expected(config, &reference, timeout)
        .with_context(|| format!("Failed to record {}", config.cases_file.display()))?;

    println!(
        "Recorded {}: {} updated, {} unchanged, {} failed",
        config.name, stats.updated, stats.unchanged, stats.failed
    );
    Ok(if stats.failed > 0 { 1 } else { 0 })
}
