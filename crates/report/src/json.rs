//! JSON 렌더러
//!
//! quiet 모드에서는 요약만, 그 외에는 보고서 전체를 pretty JSON으로
//! 출력합니다.

use std::io::Write;

use crate::error::ReportError;
use crate::report::{FormatOptions, Report};

/// JSON 보고서 렌더러
pub struct JsonFormatter {
    opts: FormatOptions,
}

impl JsonFormatter {
    /// 새 JSON 렌더러를 생성합니다.
    pub fn new(opts: FormatOptions) -> Self {
        Self { opts }
    }

    /// 보고서를 JSON으로 렌더링합니다.
    pub fn format(&self, report: &Report, w: &mut dyn Write) -> Result<(), ReportError> {
        if self.opts.quiet {
            serde_json::to_writer_pretty(&mut *w, &report.summary)?;
        } else {
            serde_json::to_writer_pretty(&mut *w, report)?;
        }
        writeln!(w)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};

    use crate::report::{Metadata, Summary};

    fn sample_report() -> Report {
        Report {
            summary: Summary {
                rules_checked: 1,
                rules_with_issues: 0,
                total_issues: 0,
                lines_processed: 42,
            },
            results: Vec::new(),
            metadata: Metadata {
                config_file: "negalog.yaml".to_owned(),
                sources: vec!["app.log".to_owned()],
                time_range: None,
                analyzed_at: Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
                duration: Duration::from_secs(1),
            },
        }
    }

    #[test]
    fn full_output_is_valid_json_with_wire_names() {
        let mut buf = Vec::new();
        JsonFormatter::new(FormatOptions::default())
            .format(&sample_report(), &mut buf)
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["Summary"]["LinesProcessed"], 42);
        assert_eq!(value["Metadata"]["ConfigFile"], "negalog.yaml");
        assert!(value["Results"].is_array());
    }

    #[test]
    fn quiet_output_is_summary_only() {
        let mut buf = Vec::new();
        JsonFormatter::new(FormatOptions {
            quiet: true,
            ..FormatOptions::default()
        })
        .format(&sample_report(), &mut buf)
        .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["RulesChecked"], 1);
        assert!(value.get("Results").is_none());
        assert!(value.get("Metadata").is_none());
    }

    #[test]
    fn output_ends_with_newline() {
        let mut buf = Vec::new();
        JsonFormatter::new(FormatOptions::default())
            .format(&sample_report(), &mut buf)
            .unwrap();
        assert_eq!(buf.last(), Some(&b'\n'));
    }
}
