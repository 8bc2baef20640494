//! 주기 엔진 — 주기 신호의 간격 초과 및 발생 횟수 미달 탐지
//!
//! 매칭된 모든 발생을 순서대로 기록했다가 finalize에서 연속 쌍의 간격을
//! 검사합니다. 마지막 발생만 저장하지 않고 전부 저장하므로 모든 간격이
//! 발견 가능하며, 메모리는 매칭 수에 비례합니다.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use negalog_core::config::{RuleConfig, RuleKind};
use negalog_core::duration::format_duration;
use negalog_core::types::ParsedRecord;

use super::types::{Issue, IssueContext, IssueType, RuleResult, RuleStats};
use crate::error::AnalysisError;

/// 주기 패턴에 매칭된 발생 하나
#[derive(Debug, Clone)]
struct PeriodicMatch {
    timestamp: DateTime<Utc>,
    source: String,
    line_num: u64,
}

/// 마지막 발생의 직렬화 가능한 스냅샷
///
/// 간격 탐지를 이어가는 데는 마지막 발생만 있으면 됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodicState {
    /// 마지막 매칭 시각
    pub last_match: DateTime<Utc>,
    /// 출처 파일
    pub source: String,
    /// 줄 번호
    pub line_num: u64,
}

/// 주기 탐지 엔진
#[derive(Debug)]
pub struct PeriodicEngine {
    name: String,
    description: String,
    max_gap: TimeDelta,
    max_gap_std: Duration,
    min_occurrences: usize,
    pattern: Regex,

    matches: Vec<PeriodicMatch>,
    stats: RuleStats,
}

impl PeriodicEngine {
    /// 검증된 주기 규칙으로부터 엔진을 생성합니다.
    pub fn from_rule(rule: &RuleConfig) -> Result<Self, AnalysisError> {
        if rule.kind != RuleKind::Periodic {
            return Err(AnalysisError::Rule {
                rule: rule.name.clone(),
                reason: "not a periodic rule".to_owned(),
            });
        }

        let Some(pattern) = rule.compiled_pattern().cloned() else {
            return Err(AnalysisError::Rule {
                rule: rule.name.clone(),
                reason: "pattern not compiled (config must be validated first)".to_owned(),
            });
        };

        let max_gap_std = rule.effective_max_gap();
        let max_gap = TimeDelta::from_std(max_gap_std).map_err(|_| AnalysisError::Rule {
            rule: rule.name.clone(),
            reason: "max_gap out of range".to_owned(),
        })?;

        Ok(Self {
            name: rule.name.clone(),
            description: rule.description.clone(),
            max_gap,
            max_gap_std,
            min_occurrences: rule.min_occurrences,
            pattern,
            matches: Vec::new(),
            stats: RuleStats::default(),
        })
    }

    /// 규칙 이름을 반환합니다.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 레코드 하나를 처리합니다.
    pub fn process(&mut self, record: &ParsedRecord) {
        self.stats.lines_processed += 1;
        if self.stats.start_time.is_none() {
            self.stats.start_time = Some(Utc::now());
        }

        if self.pattern.is_match(&record.raw) {
            self.matches.push(PeriodicMatch {
                timestamp: record.timestamp,
                source: record.source.clone(),
                line_num: record.line_num,
            });
            self.stats.lines_matched += 1;
        }
    }

    /// 분석을 종료하고 간격/횟수 이슈를 생성합니다.
    ///
    /// 엔진 상태를 비우므로 reset 없이 다시 호출하면 빈 결과가 됩니다.
    pub fn finalize(&mut self) -> RuleResult {
        self.stats.end_time = Some(Utc::now());

        let matches = std::mem::take(&mut self.matches);
        let mut issues = Vec::new();

        // 연속 쌍의 간격 검사 — 발생이 0개 또는 1개면 간격 이슈 없음
        for pair in matches.windows(2) {
            let (prev, curr) = (&pair[0], &pair[1]);
            let gap = curr.timestamp - prev.timestamp;
            if gap > self.max_gap {
                let gap_std = gap.to_std().unwrap_or_default();
                issues.push(Issue {
                    kind: IssueType::GapExceeded,
                    description: format!(
                        "Gap of {} between occurrences (max allowed: {})",
                        format_duration(gap_std),
                        format_duration(self.max_gap_std)
                    ),
                    context: IssueContext {
                        start_time: Some(prev.timestamp),
                        end_time: Some(curr.timestamp),
                        source: prev.source.clone(),
                        line_num: prev.line_num,
                        actual_gap: Some(gap_std),
                        expected_gap: Some(self.max_gap_std),
                        ..IssueContext::default()
                    },
                });
            }
        }

        // 최소 발생 횟수 검사 (0이면 비활성)
        if self.min_occurrences > 0 && matches.len() < self.min_occurrences {
            issues.push(Issue {
                kind: IssueType::BelowMinOccurrences,
                description: format!(
                    "Only {} occurrences found (minimum required: {})",
                    matches.len(),
                    self.min_occurrences
                ),
                context: IssueContext {
                    occurrences: Some(matches.len()),
                    min_required: Some(self.min_occurrences),
                    ..IssueContext::default()
                },
            });
        }

        RuleResult {
            rule_name: self.name.clone(),
            rule_type: RuleKind::Periodic,
            description: self.description.clone(),
            issues,
            stats: self.stats.clone(),
        }
    }

    /// 재사용을 위해 상태를 초기화합니다.
    pub fn reset(&mut self) {
        self.matches.clear();
        self.stats = RuleStats::default();
    }

    /// 마지막 발생을 직렬화 가능한 형태로 내보냅니다. 발생이 없으면 `None`.
    pub fn export_state(&self) -> Option<PeriodicState> {
        self.matches.last().map(|last| PeriodicState {
            last_match: last.timestamp,
            source: last.source.clone(),
            line_num: last.line_num,
        })
    }

    /// 내보낸 상태를 첫 발생으로 복원하여 간격 탐지를 이어갑니다.
    pub fn import_state(&mut self, state: PeriodicState) {
        self.matches.insert(
            0,
            PeriodicMatch {
                timestamp: state.last_match,
                source: state.source,
                line_num: state.line_num,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{periodic_rule, record, record_at};

    fn engine(max_gap: &str, min_occurrences: usize) -> PeriodicEngine {
        PeriodicEngine::from_rule(&periodic_rule("hb", max_gap, min_occurrences)).unwrap()
    }

    #[test]
    fn regular_heartbeats_produce_no_issues() {
        let mut engine = engine("5m", 0);
        engine.process(&record("10:00:00", "HEARTBEAT ok"));
        engine.process(&record("10:04:00", "HEARTBEAT ok"));
        engine.process(&record("10:08:00", "HEARTBEAT ok"));
        assert!(engine.finalize().issues.is_empty());
    }

    #[test]
    fn gap_over_threshold_is_reported() {
        let mut engine = engine("5m", 0);
        engine.process(&record_at("10:00:00", "HEARTBEAT ok", 1));
        engine.process(&record_at("10:02:00", "HEARTBEAT ok", 2));
        engine.process(&record_at("10:15:00", "HEARTBEAT ok", 3));

        let result = engine.finalize();
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.kind, IssueType::GapExceeded);
        // 간격의 출처는 선행 이벤트
        assert_eq!(issue.context.line_num, 2);
        assert_eq!(
            issue.context.actual_gap,
            Some(std::time::Duration::from_secs(780))
        );
        assert_eq!(
            issue.context.expected_gap,
            Some(std::time::Duration::from_secs(300))
        );
    }

    #[test]
    fn every_excessive_gap_is_reported_exactly_once() {
        let mut engine = engine("1m", 0);
        engine.process(&record("10:00:00", "HEARTBEAT"));
        engine.process(&record("10:05:00", "HEARTBEAT"));
        engine.process(&record("10:05:30", "HEARTBEAT"));
        engine.process(&record("10:10:00", "HEARTBEAT"));

        let result = engine.finalize();
        assert_eq!(result.issues.len(), 2);
        assert!(result
            .issues
            .iter()
            .all(|i| i.kind == IssueType::GapExceeded));
    }

    #[test]
    fn gap_at_exact_threshold_is_allowed() {
        let mut engine = engine("5m", 0);
        engine.process(&record("10:00:00", "HEARTBEAT"));
        engine.process(&record("10:05:00", "HEARTBEAT"));
        assert!(engine.finalize().issues.is_empty());
    }

    #[test]
    fn zero_matches_no_gap_issues() {
        let mut engine = engine("5m", 0);
        engine.process(&record("10:00:00", "unrelated line"));
        assert!(engine.finalize().issues.is_empty());
    }

    #[test]
    fn single_match_no_gap_issues() {
        let mut engine = engine("5m", 0);
        engine.process(&record("10:00:00", "HEARTBEAT"));
        assert!(engine.finalize().issues.is_empty());
    }

    #[test]
    fn undercount_reported_with_counts() {
        let mut engine = engine("5m", 10);
        engine.process(&record("10:00:00", "HEARTBEAT"));
        engine.process(&record("10:02:00", "HEARTBEAT"));
        engine.process(&record("10:04:00", "HEARTBEAT"));

        let result = engine.finalize();
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.kind, IssueType::BelowMinOccurrences);
        assert_eq!(issue.context.occurrences, Some(3));
        assert_eq!(issue.context.min_required, Some(10));
    }

    #[test]
    fn zero_matches_with_min_occurrences_still_reported() {
        let mut engine = engine("5m", 1);
        let result = engine.finalize();
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].context.occurrences, Some(0));
    }

    #[test]
    fn gap_and_undercount_both_reported() {
        let mut engine = engine("5m", 10);
        engine.process(&record("10:00:00", "HEARTBEAT a"));
        engine.process(&record("10:02:00", "HEARTBEAT b"));
        engine.process(&record("10:15:00", "HEARTBEAT c"));

        let result = engine.finalize();
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[0].kind, IssueType::GapExceeded);
        assert_eq!(result.issues[1].kind, IssueType::BelowMinOccurrences);
    }

    #[test]
    fn stats_track_matched_lines() {
        let mut engine = engine("5m", 0);
        engine.process(&record("10:00:00", "HEARTBEAT"));
        engine.process(&record("10:00:01", "noise"));
        engine.process(&record("10:00:02", "HEARTBEAT"));

        let result = engine.finalize();
        assert_eq!(result.stats.lines_processed, 3);
        assert_eq!(result.stats.lines_matched, 2);
    }

    #[test]
    fn export_state_returns_last_match() {
        let mut engine = engine("5m", 0);
        assert!(engine.export_state().is_none());

        engine.process(&record_at("10:00:00", "HEARTBEAT", 1));
        engine.process(&record_at("10:02:00", "HEARTBEAT", 2));

        let state = engine.export_state().unwrap();
        assert_eq!(state.line_num, 2);
    }

    #[test]
    fn imported_state_feeds_gap_detection() {
        let mut previous = engine("5m", 0);
        previous.process(&record("10:00:00", "HEARTBEAT"));
        let state = previous.export_state().unwrap();

        let mut next = engine("5m", 0);
        next.import_state(state);
        next.process(&record("10:15:00", "HEARTBEAT"));

        let result = next.finalize();
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueType::GapExceeded);
    }
}
