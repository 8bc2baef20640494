//! CLI-specific error types and exit code mapping

use negalog_analysis::AnalysisError;
use negalog_core::error::{ConfigError, NegalogError};
use negalog_report::ReportError;

/// CLI-specific error type.
///
/// Every terminal failure maps to exit code 2; the "issues detected"
/// exit code 1 is not an error and is returned by the analyze command
/// directly.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Analysis pipeline failure (source I/O, cancellation, engine setup).
    #[error("{0}")]
    Analysis(#[from] AnalysisError),

    /// Report rendering failure.
    #[error("{0}")]
    Report(#[from] ReportError),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// Wrapped domain error from negalog-core.
    #[error("{0}")]
    Core(#[from] NegalogError),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                          |
    /// |------|----------------------------------|
    /// | 0    | Success, no missing logs         |
    /// | 1    | Missing logs detected            |
    /// | 2    | Configuration or runtime error   |
    pub fn exit_code(&self) -> i32 {
        2
    }
}
