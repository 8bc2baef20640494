//! 텍스트 렌더러 — 사람이 읽는 분석 보고서
//!
//! quiet 모드는 한 줄 요약만, verbose 모드는 규칙 설명과 출처 위치,
//! 처리 통계까지 출력합니다.

use std::io::Write;

use negalog_analysis::engine::{Issue, IssueType, RuleResult};
use negalog_core::duration::format_duration;

use crate::report::{FormatOptions, Report};

/// 시각 표시 형식 (시:분:초)
const TIME_FORMAT: &str = "%H:%M:%S";

/// 텍스트 보고서 렌더러
pub struct TextFormatter {
    opts: FormatOptions,
}

impl TextFormatter {
    /// 새 텍스트 렌더러를 생성합니다.
    pub fn new(opts: FormatOptions) -> Self {
        Self { opts }
    }

    /// 보고서를 텍스트로 렌더링합니다.
    pub fn format(&self, report: &Report, w: &mut dyn Write) -> std::io::Result<()> {
        if self.opts.quiet {
            return self.format_quiet(report, w);
        }
        self.format_full(report, w)
    }

    fn format_quiet(&self, report: &Report, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "NegaLog: {} rules checked, {} with issues, {} total issues",
            report.summary.rules_checked,
            report.summary.rules_with_issues,
            report.summary.total_issues
        )
    }

    fn format_full(&self, report: &Report, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(w, "=== NegaLog Analysis Report ===")?;
        writeln!(w)?;

        for result in &report.results {
            self.format_rule_result(result, w)?;
        }

        writeln!(w, "---")?;
        writeln!(
            w,
            "Summary: {} rules checked, {} rules with issues, {} total issues",
            report.summary.rules_checked,
            report.summary.rules_with_issues,
            report.summary.total_issues
        )?;

        if self.opts.verbose {
            writeln!(w, "Lines processed: {}", report.summary.lines_processed)?;
            writeln!(w, "Duration: {}", format_duration(report.metadata.duration))?;
        }

        Ok(())
    }

    fn format_rule_result(&self, result: &RuleResult, w: &mut dyn Write) -> std::io::Result<()> {
        writeln!(
            w,
            "[{}] {}",
            result.rule_type.to_string().to_uppercase(),
            result.rule_name
        )?;

        if !result.description.is_empty() && self.opts.verbose {
            writeln!(w, "  {}", result.description)?;
        }

        if !result.has_issues() {
            writeln!(w, "  No issues detected")?;
            writeln!(w)?;
            return Ok(());
        }

        writeln!(w, "  Missing: {} issue(s)", result.issues.len())?;
        for issue in &result.issues {
            self.format_issue(issue, w)?;
        }
        writeln!(w)?;
        Ok(())
    }

    fn format_issue(&self, issue: &Issue, w: &mut dyn Write) -> std::io::Result<()> {
        let ctx = &issue.context;
        match issue.kind {
            IssueType::MissingEnd => {
                let start = ctx
                    .start_time
                    .map(|t| t.format(TIME_FORMAT).to_string())
                    .unwrap_or_default();
                let timeout = ctx.timeout.map(format_duration).unwrap_or_default();
                match &ctx.correlation_id {
                    Some(id) => writeln!(
                        w,
                        "  - id={id}: started at {start}, no end (timeout: {timeout})"
                    )?,
                    None => {
                        writeln!(w, "  - started at {start}, no end (timeout: {timeout})")?
                    }
                }
                self.format_source_location(issue, w)?;
            }
            IssueType::GapExceeded => {
                let start = ctx
                    .start_time
                    .map(|t| t.format(TIME_FORMAT).to_string())
                    .unwrap_or_default();
                let end = ctx
                    .end_time
                    .map(|t| t.format(TIME_FORMAT).to_string())
                    .unwrap_or_default();
                let actual = ctx.actual_gap.map(format_duration).unwrap_or_default();
                let expected = ctx.expected_gap.map(format_duration).unwrap_or_default();
                writeln!(
                    w,
                    "  - Gap of {actual} between {start} and {end} (max allowed: {expected})"
                )?;
                self.format_source_location(issue, w)?;
            }
            IssueType::MissingConsequence => {
                let start = ctx
                    .start_time
                    .map(|t| t.format(TIME_FORMAT).to_string())
                    .unwrap_or_default();
                let timeout = ctx.timeout.map(format_duration).unwrap_or_default();
                match &ctx.correlation_id {
                    Some(id) => writeln!(
                        w,
                        "  - trigger id={id} at {start}: no consequence (timeout: {timeout})"
                    )?,
                    None => writeln!(
                        w,
                        "  - trigger at {start}: no consequence (timeout: {timeout})"
                    )?,
                }
                self.format_source_location(issue, w)?;
            }
            IssueType::BelowMinOccurrences => {
                writeln!(
                    w,
                    "  - Only {} occurrences (minimum required: {})",
                    ctx.occurrences.unwrap_or(0),
                    ctx.min_required.unwrap_or(0)
                )?;
            }
        }
        Ok(())
    }

    fn format_source_location(&self, issue: &Issue, w: &mut dyn Write) -> std::io::Result<()> {
        if self.opts.verbose && !issue.context.source.is_empty() {
            writeln!(
                w,
                "    Source: {}:{}",
                issue.context.source, issue.context.line_num
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::{TimeZone, Utc};
    use negalog_analysis::engine::{IssueContext, RuleKind, RuleStats};

    use crate::report::{Metadata, Summary};

    fn sample_report() -> Report {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap();
        Report {
            summary: Summary {
                rules_checked: 2,
                rules_with_issues: 1,
                total_issues: 2,
                lines_processed: 100,
            },
            results: vec![
                RuleResult {
                    rule_name: "backup".to_owned(),
                    rule_type: RuleKind::Sequence,
                    description: "nightly backup completes".to_owned(),
                    issues: vec![Issue {
                        kind: IssueType::MissingEnd,
                        description: "Sequence started but not completed within 1m".to_owned(),
                        context: IssueContext {
                            correlation_id: Some("job42".to_owned()),
                            start_time: Some(
                                Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
                            ),
                            source: "app.log".to_owned(),
                            line_num: 7,
                            timeout: Some(Duration::from_secs(60)),
                            ..IssueContext::default()
                        },
                    }],
                    stats: RuleStats::default(),
                },
                RuleResult {
                    rule_name: "heartbeat".to_owned(),
                    rule_type: RuleKind::Periodic,
                    description: String::new(),
                    issues: vec![Issue {
                        kind: IssueType::BelowMinOccurrences,
                        description: "Only 3 occurrences found (minimum required: 10)".to_owned(),
                        context: IssueContext {
                            occurrences: Some(3),
                            min_required: Some(10),
                            ..IssueContext::default()
                        },
                    }],
                    stats: RuleStats::default(),
                },
            ],
            metadata: Metadata {
                config_file: "negalog.yaml".to_owned(),
                sources: vec!["app.log".to_owned()],
                time_range: None,
                analyzed_at: at,
                duration: Duration::from_millis(1500),
            },
        }
    }

    fn render(opts: FormatOptions, report: &Report) -> String {
        let mut buf = Vec::new();
        TextFormatter::new(opts).format(report, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn full_output_has_header_rules_and_summary() {
        let out = render(FormatOptions::default(), &sample_report());
        assert!(out.contains("=== NegaLog Analysis Report ==="));
        assert!(out.contains("[SEQUENCE] backup"));
        assert!(out.contains("[PERIODIC] heartbeat"));
        assert!(out.contains("id=job42: started at 10:00:00, no end (timeout: 1m)"));
        assert!(out.contains("Only 3 occurrences (minimum required: 10)"));
        assert!(out.contains("Summary: 2 rules checked, 1 rules with issues, 2 total issues"));
    }

    #[test]
    fn quiet_output_is_single_line() {
        let out = render(
            FormatOptions {
                quiet: true,
                ..FormatOptions::default()
            },
            &sample_report(),
        );
        assert_eq!(out.lines().count(), 1);
        assert!(out.contains("NegaLog: 2 rules checked, 1 with issues, 2 total issues"));
    }

    #[test]
    fn verbose_output_includes_source_and_stats() {
        let out = render(
            FormatOptions {
                verbose: true,
                ..FormatOptions::default()
            },
            &sample_report(),
        );
        assert!(out.contains("nightly backup completes"));
        assert!(out.contains("Source: app.log:7"));
        assert!(out.contains("Lines processed: 100"));
        assert!(out.contains("Duration: 1s500ms"));
    }

    #[test]
    fn non_verbose_hides_source_location() {
        let out = render(FormatOptions::default(), &sample_report());
        assert!(!out.contains("Source: app.log:7"));
        assert!(!out.contains("nightly backup completes"));
    }

    #[test]
    fn clean_rule_reports_no_issues() {
        let mut report = sample_report();
        report.results[0].issues.clear();
        report.results[1].issues.clear();
        report.summary.total_issues = 0;
        report.summary.rules_with_issues = 0;

        let out = render(FormatOptions::default(), &report);
        assert!(out.contains("No issues detected"));
    }

    #[test]
    fn gap_issue_renders_both_bounds() {
        let mut report = sample_report();
        report.results[1].issues = vec![Issue {
            kind: IssueType::GapExceeded,
            description: String::new(),
            context: IssueContext {
                start_time: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 2, 0).unwrap()),
                end_time: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 15, 0).unwrap()),
                source: "hb.log".to_owned(),
                line_num: 2,
                actual_gap: Some(Duration::from_secs(13 * 60)),
                expected_gap: Some(Duration::from_secs(5 * 60)),
                ..IssueContext::default()
            },
        }];

        let out = render(FormatOptions::default(), &report);
        assert!(out.contains("Gap of 13m between 10:02:00 and 10:15:00 (max allowed: 5m)"));
    }
}
