//! `version` subcommand.

use crate::error::CliError;

/// Print version information.
pub fn execute() -> Result<i32, CliError> {
    println!("negalog {}", env!("CARGO_PKG_VERSION"));
    Ok(0)
}
