//! CLI argument parsing using clap derive API
//!
//! Purely declarative with no side effects or I/O. Unknown subcommands are
//! captured by the `External` variant and resolved as plugins by `main`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// NegaLog -- detect missing logs in your log files.
///
/// Define what logs SHOULD exist, and NegaLog reports what's missing:
/// sequence gaps (start without matching end), periodic absence (missing
/// heartbeats), and conditional absence (trigger without consequence).
#[derive(Parser, Debug)]
#[command(name = "negalog", version, about, long_about = None)]
pub struct Cli {
    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze logs for missing entries.
    Analyze(AnalyzeArgs),

    /// Validate a configuration file without running analysis.
    Validate(ValidateArgs),

    /// Detect the timestamp format of a log file.
    Detect(DetectArgs),

    /// Diagnose common configuration issues.
    Diagnose(DiagnoseArgs),

    /// Print version information.
    Version,

    /// External plugin command (negalog-<command>).
    #[command(external_subcommand)]
    External(Vec<String>),
}

// ---- analyze ----

/// Analyze log files according to rules defined in the configuration file.
///
/// Exit codes: 0 no missing logs, 1 missing logs detected, 2 configuration
/// or runtime error.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the configuration file.
    pub config: PathBuf,

    /// Output format.
    #[arg(short, long, default_value = "text")]
    pub output: OutputFormat,

    /// Limit analysis to a time window ending now (e.g. 2h, 30m).
    #[arg(long)]
    pub time_range: Option<String>,

    /// Run specific rule(s) only (can be repeated).
    #[arg(long = "rule")]
    pub rules: Vec<String>,

    /// Show rule descriptions, source locations and stats.
    #[arg(short, long)]
    pub verbose: bool,

    /// Summary only, no details.
    #[arg(short, long)]
    pub quiet: bool,

    /// Webhook endpoint URL (in addition to configured webhooks).
    #[arg(long)]
    pub webhook_url: Option<String>,

    /// Bearer token for webhook auth.
    #[arg(long)]
    pub webhook_token: Option<String>,

    /// When to fire the webhook (on_issues|always|never).
    #[arg(long, default_value = "on_issues")]
    pub webhook_trigger: String,
}

// ---- validate ----

/// Validate a NegaLog configuration file.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the configuration file.
    pub config: PathBuf,
}

// ---- detect ----

/// Analyze a log file to automatically detect its timestamp format.
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Path to the log file.
    pub log_file: PathBuf,

    /// Output format.
    #[arg(short, long, default_value = "text")]
    pub output: OutputFormat,

    /// Number of lines to sample.
    #[arg(short = 'n', long = "sample", default_value_t = 100)]
    pub sample_size: usize,

    /// Show all detected formats, not just the best match.
    #[arg(long)]
    pub all: bool,

    /// Write a starter config to this file (will not overwrite).
    #[arg(short = 'w', long)]
    pub write_config: Option<PathBuf>,
}

// ---- diagnose ----

/// Check a configuration for common problems without running analysis.
#[derive(Args, Debug)]
pub struct DiagnoseArgs {
    /// Path to the configuration file.
    pub config: PathBuf,

    /// Show detailed diagnostic output.
    #[arg(short, long)]
    pub verbose: bool,
}
