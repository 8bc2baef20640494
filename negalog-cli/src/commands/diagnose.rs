//! `diagnose` subcommand -- check a configuration for common problems.
//!
//! Runs a series of non-fatal checks (config file, log sources, timestamp
//! pattern against real lines, rules, webhooks) and prints them with
//! ok/warning/error markers and suggestions. Diagnostics are informational:
//! the command always exits 0 so it can run in CI without blocking.

use std::path::Path;

use negalog_analysis::detect::Detector;
use negalog_analysis::source::expand_globs;
use negalog_analysis::timestamp::TimestampExtractor;
use negalog_core::config::{Config, RuleKind};

use crate::cli::DiagnoseArgs;
use crate::error::CliError;

/// Outcome of a single diagnostic check.
#[derive(Debug, PartialEq, Eq)]
enum Status {
    Ok,
    Warning,
    Error,
}

impl Status {
    fn marker(&self) -> &'static str {
        match self {
            Self::Ok => "[ok]",
            Self::Warning => "[warning]",
            Self::Error => "[error]",
        }
    }
}

/// Result of a single diagnostic check.
struct Diagnostic {
    check: String,
    status: Status,
    message: String,
    details: Vec<String>,
    suggests: Vec<String>,
}

impl Diagnostic {
    fn new(check: impl Into<String>, status: Status, message: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            status,
            message: message.into(),
            details: Vec::new(),
            suggests: Vec::new(),
        }
    }

    fn with_suggests(mut self, suggests: Vec<String>) -> Self {
        self.suggests = suggests;
        self
    }
}

/// Run all diagnostics and print the results. Never fails the process.
pub fn execute(args: DiagnoseArgs) -> Result<i32, CliError> {
    let mut results = Vec::new();

    check_config_file(&args.config, &mut results);

    // Stop early when the config cannot even be parsed
    let config = match Config::load(&args.config) {
        Ok(config) => {
            results.push(Diagnostic::new(
                "Config Parse",
                Status::Ok,
                "Configuration parses and validates",
            ));
            Some(config)
        }
        Err(e) => {
            results.push(
                Diagnostic::new("Config Parse", Status::Error, e.to_string()).with_suggests(vec![
                    "Fix the reported field and re-run".to_owned(),
                    "Use 'negalog detect <log-file>' to generate a starter config".to_owned(),
                ]),
            );
            None
        }
    };

    if let Some(config) = &config {
        check_log_sources(config, &mut results);
        check_timestamp_pattern(config, args.verbose, &mut results);
        check_rules(config, &mut results);
        check_webhooks(config, &mut results);
    }

    print_diagnostics(&results, args.verbose);
    Ok(0)
}

fn check_config_file(path: &Path, results: &mut Vec<Diagnostic>) {
    let diag = match std::fs::metadata(path) {
        Err(_) => Diagnostic::new(
            "Config File",
            Status::Error,
            format!("Config file not found: {}", path.display()),
        )
        .with_suggests(vec![
            "Check the file path is correct".to_owned(),
            "Use 'negalog detect <log-file> --write-config config.yaml' to generate one"
                .to_owned(),
        ]),
        Ok(metadata) if metadata.is_dir() => {
            Diagnostic::new("Config File", Status::Error, "Path is a directory, not a file")
        }
        Ok(metadata) if metadata.len() == 0 => {
            Diagnostic::new("Config File", Status::Error, "Config file is empty")
        }
        Ok(metadata) => Diagnostic::new(
            "Config File",
            Status::Ok,
            format!("Found ({} bytes)", metadata.len()),
        ),
    };
    results.push(diag);
}

fn check_log_sources(config: &Config, results: &mut Vec<Diagnostic>) {
    let mut accessible = 0usize;

    for source in &config.log_sources {
        let check = format!("Log Source: {source}");
        let Ok(files) = expand_globs(std::slice::from_ref(source)) else {
            results.push(Diagnostic::new(check, Status::Error, "Invalid glob pattern"));
            continue;
        };

        let existing: Vec<&String> = files
            .iter()
            .filter(|f| Path::new(f.as_str()).is_file())
            .collect();

        if existing.is_empty() {
            results.push(
                Diagnostic::new(check, Status::Warning, "Matches no existing files")
                    .with_suggests(vec![
                        "Check if the log files exist at this path".to_owned(),
                        "Verify the glob pattern syntax".to_owned(),
                    ]),
            );
        } else {
            accessible += existing.len();
            let mut diag = Diagnostic::new(
                check,
                Status::Ok,
                format!("Matches {} file(s)", existing.len()),
            );
            diag.details = existing.iter().map(|f| (*f).clone()).collect();
            results.push(diag);
        }
    }

    if accessible == 0 {
        results.push(
            Diagnostic::new(
                "Log Files Summary",
                Status::Error,
                "No accessible log files found",
            )
            .with_suggests(vec![
                "Ensure at least one log file exists and is readable".to_owned(),
            ]),
        );
    }
}

fn check_timestamp_pattern(config: &Config, verbose: bool, results: &mut Vec<Diagnostic>) {
    let Some(pattern) = config.timestamp_format.compiled_pattern() else {
        // Config::load compiles the pattern; reaching here means validation
        // was skipped, which the parse check already reported
        return;
    };

    let mut diag = Diagnostic::new("Timestamp Format", Status::Ok, "Timestamp pattern is valid");
    diag.details = vec![
        format!("Pattern: {}", config.timestamp_format.pattern),
        format!("Layout: {}", config.timestamp_format.layout),
    ];
    results.push(diag);

    let extractor =
        TimestampExtractor::new(pattern.clone(), config.timestamp_format.layout.clone());

    // Test the pattern against the first few lines of the first real file
    let Some(log_file) = first_existing_file(config) else {
        return;
    };
    let file_name = Path::new(&log_file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| log_file.clone());
    let check = format!("Pattern Test: {file_name}");

    let Ok(content) = std::fs::read_to_string(&log_file) else {
        results.push(Diagnostic::new(check, Status::Warning, "Cannot read file"));
        return;
    };

    let lines: Vec<&str> = content.lines().filter(|l| !l.is_empty()).take(10).collect();
    let mut match_count = 0usize;
    let mut sample_match = None;
    let mut sample_fail = None;
    for line in &lines {
        if extractor.extract(line).is_some() {
            match_count += 1;
            sample_match.get_or_insert_with(|| (*line).to_owned());
        } else {
            sample_fail.get_or_insert_with(|| (*line).to_owned());
        }
    }

    let diag = if match_count == 0 {
        let mut suggests = vec![
            "The timestamp pattern may not match your log format".to_owned(),
            format!("Use 'negalog detect {log_file}' to find the correct pattern"),
        ];
        // Suggest the auto-detected format directly
        if let Ok(detected) = Detector::new().with_sample_size(10).detect_from_file(&log_file) {
            if let Some(best) = detected.best_match() {
                suggests.push(format!("Detected format: {}", best.format.name));
                suggests.push(format!("Suggested pattern: {}", best.format.pattern_str));
                suggests.push(format!("Suggested layout: {}", best.format.layout));
            }
        }
        let mut diag = Diagnostic::new(
            check,
            Status::Error,
            "Pattern matches no lines in log file",
        )
        .with_suggests(suggests);
        if let Some(fail) = sample_fail {
            diag.details = vec!["Sample line that didn't match:".to_owned(), truncate(&fail, 80)];
        }
        diag
    } else if match_count * 2 < lines.len() {
        Diagnostic::new(
            check,
            Status::Warning,
            format!("Pattern matches only {match_count}/{} sample lines", lines.len()),
        )
    } else {
        let mut diag = Diagnostic::new(
            check,
            Status::Ok,
            format!("Pattern matches {match_count}/{} sample lines", lines.len()),
        );
        if verbose {
            if let Some(m) = sample_match {
                diag.details = vec!["Sample match:".to_owned(), truncate(&m, 80)];
            }
        }
        diag
    };
    results.push(diag);
}

fn check_rules(config: &Config, results: &mut Vec<Diagnostic>) {
    for rule in &config.rules {
        let check = format!("Rule: {}", rule.name);
        let summary = match rule.kind {
            RuleKind::Sequence => format!(
                "sequence, timeout {}",
                negalog_core::duration::format_duration(rule.effective_timeout())
            ),
            RuleKind::Periodic => format!(
                "periodic, max gap {}",
                negalog_core::duration::format_duration(rule.effective_max_gap())
            ),
            RuleKind::Conditional => format!(
                "conditional, timeout {}",
                negalog_core::duration::format_duration(rule.effective_timeout())
            ),
        };
        results.push(Diagnostic::new(check, Status::Ok, summary));
    }
}

fn check_webhooks(config: &Config, results: &mut Vec<Diagnostic>) {
    for webhook in &config.webhooks {
        let check = format!("Webhook: {}", webhook.display_name());
        if webhook.token.is_empty() && webhook.url.starts_with("https://") {
            results.push(Diagnostic::new(
                check,
                Status::Warning,
                "No auth token configured",
            ));
        } else {
            results.push(Diagnostic::new(check, Status::Ok, "Configured"));
        }
    }
}

fn first_existing_file(config: &Config) -> Option<String> {
    for source in &config.log_sources {
        if let Ok(files) = expand_globs(std::slice::from_ref(source)) {
            if let Some(file) = files.into_iter().find(|f| Path::new(f.as_str()).is_file()) {
                return Some(file);
            }
        }
    }
    None
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_owned();
    }
    let truncated: String = s.chars().take(max_chars).collect();
    format!("{truncated}...")
}

fn print_diagnostics(results: &[Diagnostic], verbose: bool) {
    println!("=== NegaLog Diagnostics ===");
    println!();

    for diag in results {
        println!("{} {}: {}", diag.status.marker(), diag.check, diag.message);
        if verbose || diag.status != Status::Ok {
            for detail in &diag.details {
                println!("    {detail}");
            }
        }
        for suggest in &diag.suggests {
            println!("    -> {suggest}");
        }
    }

    let errors = results.iter().filter(|d| d.status == Status::Error).count();
    let warnings = results
        .iter()
        .filter(|d| d.status == Status::Warning)
        .count();
    println!();
    println!(
        "{} check(s), {} error(s), {} warning(s)",
        results.len(),
        errors,
        warnings
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_from_yaml(yaml: &str) -> Config {
        let mut config: Config = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();
        config
    }

    #[test]
    fn test_truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 80), "short");
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        let long = "x".repeat(100);
        let out = truncate(&long, 80);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 83);
    }

    #[test]
    fn test_check_config_file_reports_missing() {
        let mut results = Vec::new();
        check_config_file(Path::new("/nonexistent/negalog.yaml"), &mut results);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, Status::Error);
    }

    #[test]
    fn test_check_log_sources_warns_on_unmatched() {
        let config = config_from_yaml(
            r#"
log_sources: ['/nonexistent/negalog-*.log']
rules:
  - name: hb
    type: periodic
    pattern: HEARTBEAT
"#,
        );
        let mut results = Vec::new();
        check_log_sources(&config, &mut results);
        // 패턴 경고 + 요약 에러
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].status, Status::Warning);
        assert_eq!(results[1].status, Status::Error);
    }

    #[test]
    fn test_pattern_test_reports_matching_lines() {
        let mut log = NamedTempFile::new().unwrap();
        writeln!(log, "[2024-01-15 10:00:00] one").unwrap();
        writeln!(log, "[2024-01-15 10:00:01] two").unwrap();
        log.flush().unwrap();

        let config = config_from_yaml(&format!(
            r#"
log_sources: ['{}']
rules:
  - name: hb
    type: periodic
    pattern: HEARTBEAT
"#,
            log.path().display()
        ));

        let mut results = Vec::new();
        check_timestamp_pattern(&config, false, &mut results);
        // 형식 체크 + 패턴 테스트
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].status, Status::Ok);
        assert!(results[1].message.contains("2/2"));
    }

    #[test]
    fn test_pattern_test_flags_mismatched_format() {
        let mut log = NamedTempFile::new().unwrap();
        writeln!(log, "2024-01-15T10:00:00 iso line, not bracketed").unwrap();
        log.flush().unwrap();

        let config = config_from_yaml(&format!(
            r#"
log_sources: ['{}']
rules:
  - name: hb
    type: periodic
    pattern: HEARTBEAT
"#,
            log.path().display()
        ));

        let mut results = Vec::new();
        check_timestamp_pattern(&config, false, &mut results);
        let test = &results[1];
        assert_eq!(test.status, Status::Error);
        // 자동 감지 제안이 포함되어야 함
        assert!(test.suggests.iter().any(|s| s.contains("Suggested pattern")));
    }

    #[test]
    fn test_check_rules_summarizes_each_rule() {
        let config = config_from_yaml(
            r#"
log_sources: ['/var/log/app.log']
rules:
  - name: seq
    type: sequence
    start_pattern: 'START id=(\w+)'
    end_pattern: 'END id=(\w+)'
    correlation_field: 1
  - name: hb
    type: periodic
    pattern: HEARTBEAT
"#,
        );
        let mut results = Vec::new();
        check_rules(&config, &mut results);
        assert_eq!(results.len(), 2);
        assert!(results[0].message.contains("timeout 1m"));
        assert!(results[1].message.contains("max gap 5m"));
    }
}
