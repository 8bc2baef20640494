//! `validate` subcommand -- check a configuration file without analyzing.

use negalog_analysis::source::expand_globs;
use negalog_core::config::Config;

use crate::cli::ValidateArgs;
use crate::error::CliError;

/// Load and validate the configuration, then report what was found.
/// Missing log files are warnings only.
pub fn execute(args: ValidateArgs) -> Result<i32, CliError> {
    println!("Validating {}...", args.config.display());

    let config = Config::load(&args.config)?;

    println!();
    println!("Configuration valid!");
    println!("  Log sources: {} pattern(s)", config.log_sources.len());
    println!("  Rules:       {}", config.rules.len());

    println!();
    println!("Rules:");
    for (i, rule) in config.rules.iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, rule.kind, rule.name);
        if !rule.description.is_empty() {
            println!("     {}", rule.description);
        }
    }

    match expand_globs(&config.log_sources) {
        Err(e) => {
            println!();
            println!("Warning: Error expanding log source patterns: {e}");
        }
        Ok(files) => {
            let existing: Vec<&String> = files
                .iter()
                .filter(|f| std::path::Path::new(f.as_str()).is_file())
                .collect();
            println!();
            if existing.is_empty() {
                println!("Warning: No files match log source patterns");
            } else {
                println!("Log files matched: {}", existing.len());
                for file in existing {
                    println!("  - {file}");
                }
            }
        }
    }

    Ok(0)
}
