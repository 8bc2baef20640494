//! `detect` subcommand -- auto-detect the timestamp format of a log file.
//!
//! Samples lines from the file, ranks the catalog formats by confidence and
//! prints a ready-to-use configuration snippet. Optionally writes a starter
//! config file (never overwriting an existing one).

use std::path::Path;

use serde_json::json;

use negalog_analysis::detect::{DetectionResult, Detector};

use crate::cli::{DetectArgs, OutputFormat};
use crate::error::CliError;

/// Run timestamp format detection on a log file.
pub fn execute(args: DetectArgs) -> Result<i32, CliError> {
    if !args.log_file.is_file() {
        return Err(CliError::Command(format!(
            "log file not found: {}",
            args.log_file.display()
        )));
    }

    let result = Detector::new()
        .with_sample_size(args.sample_size)
        .detect_from_file(&args.log_file)?;

    if let Some(path) = &args.write_config {
        write_starter_config(&result, path)?;
        println!("Starter config written to {}", path.display());
        println!();
    }

    match args.output {
        OutputFormat::Json => output_json(&result, &args),
        OutputFormat::Text => {
            output_text(&result, &args);
            Ok(0)
        }
    }
}

fn output_text(result: &DetectionResult, args: &DetectArgs) {
    println!("=== Timestamp Format Detection ===");
    println!();
    println!("File: {}", args.log_file.display());
    println!("Lines sampled: {}", result.sampled_lines);
    println!("Lines with timestamps: {}", result.parsed_lines);
    println!();

    let Some(best) = result.best_match() else {
        println!("No timestamp format detected.");
        println!();
        println!("Tip: The file may use an uncommon format.");
        println!("Check the first few lines manually to identify the timestamp pattern.");
        return;
    };

    println!("Detected Format: {}", best.format.name);
    println!(
        "Confidence: {:.1}% ({}/{} lines matched)",
        best.confidence * 100.0,
        best.match_count,
        result.sampled_lines
    );
    println!();
    println!("Sample match:\n  {}", best.sample_line);
    println!(
        "Parsed as: {}",
        best.parsed_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!();

    if let Some(note) = &result.ambiguity_note {
        println!("WARNING: {note}");
        println!();
    }

    println!("--- Configuration snippet (copy to your config file) ---");
    println!();
    println!("timestamp_format:");
    println!("  pattern: '{}'", best.format.pattern_str);
    println!("  layout: \"{}\"", best.format.layout);
    println!();

    if args.all && result.matches.len() > 1 {
        println!("--- Alternative formats detected ---");
        for (i, m) in result.matches.iter().skip(1).enumerate() {
            println!(
                "{}. {} ({:.1}% confidence)",
                i + 2,
                m.format.name,
                m.confidence * 100.0
            );
            println!("   pattern: '{}'", m.format.pattern_str);
            println!("   layout: \"{}\"", m.format.layout);
        }
        println!();
    }
}

fn output_json(result: &DetectionResult, args: &DetectArgs) -> Result<i32, CliError> {
    let matches: Vec<_> = result
        .matches
        .iter()
        .take(if args.all { result.matches.len() } else { 1 })
        .map(|m| {
            json!({
                "name": m.format.name,
                "pattern": m.format.pattern_str,
                "layout": m.format.layout,
                "confidence": m.confidence,
                "match_count": m.match_count,
                "sample_line": m.sample_line,
                "ambiguous": m.format.ambiguous,
            })
        })
        .collect();

    let output = json!({
        "file": args.log_file.display().to_string(),
        "matches": matches,
        "sampled_lines": result.sampled_lines,
        "parsed_lines": result.parsed_lines,
        "ambiguity_note": result.ambiguity_note,
    });

    println!(
        "{}",
        serde_json::to_string_pretty(&output).map_err(negalog_report::ReportError::from)?
    );
    Ok(0)
}

/// Write a starter configuration based on the best detected format.
/// Refuses to overwrite an existing file.
fn write_starter_config(result: &DetectionResult, path: &Path) -> Result<(), CliError> {
    let Some(best) = result.best_match() else {
        return Err(CliError::Command(
            "cannot write config: no timestamp format detected".to_owned(),
        ));
    };

    if path.exists() {
        return Err(CliError::Command(format!(
            "refusing to overwrite existing file: {}",
            path.display()
        )));
    }

    let content = format!(
        r#"# NegaLog starter configuration (generated by 'negalog detect')
log_sources:
  - /var/log/myapp/*.log

timestamp_format:
  pattern: '{}'
  layout: "{}"

rules:
  - name: example-heartbeat
    type: periodic
    description: Expect a heartbeat at least every five minutes
    pattern: 'HEARTBEAT'
    max_gap: 5m
"#,
        best.format.pattern_str, best.format.layout
    );

    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn detection_from(lines: &[&str]) -> DetectionResult {
        let lines: Vec<String> = lines.iter().map(|s| (*s).to_owned()).collect();
        Detector::new().detect_from_lines(&lines)
    }

    #[test]
    fn test_write_starter_config_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("starter.yaml");
        let result = detection_from(&["[2024-01-15 10:00:00] event"]);

        write_starter_config(&result, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("timestamp_format:"));
        assert!(content.contains("%Y-%m-%d %H:%M:%S"));
    }

    #[test]
    fn test_write_starter_config_refuses_overwrite() {
        let mut existing = NamedTempFile::new().unwrap();
        writeln!(existing, "keep me").unwrap();

        let result = detection_from(&["[2024-01-15 10:00:00] event"]);
        let err = write_starter_config(&result, existing.path()).unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));

        let content = std::fs::read_to_string(existing.path()).unwrap();
        assert_eq!(content, "keep me\n");
    }

    #[test]
    fn test_write_starter_config_requires_a_match() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("starter.yaml");
        let result = detection_from(&["no timestamps anywhere"]);

        let err = write_starter_config(&result, &path).unwrap_err();
        assert!(err.to_string().contains("no timestamp format detected"));
        assert!(!path.exists());
    }
}
