//! 시퀀스 엔진 — 시작-없는-끝 탐지
//!
//! 시작 이벤트를 상관 ID별로 추적하고, 타임아웃 내에 대응하는 종료
//! 이벤트가 오는지 확인합니다. finalize 시점에 열려 있는 시퀀스가 모두
//! `missing_end` 이슈가 됩니다.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use negalog_core::config::{RuleConfig, RuleKind};
use negalog_core::duration::format_duration;
use negalog_core::types::ParsedRecord;

use super::types::{Issue, IssueContext, IssueType, RuleResult, RuleStats};
use crate::error::AnalysisError;

/// 종료를 기다리는 열린 시퀀스
#[derive(Debug, Clone)]
struct OpenSequence {
    start_time: DateTime<Utc>,
    source: String,
    line_num: u64,
}

/// 열린 시퀀스의 직렬화 가능한 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceState {
    /// 상관 ID
    pub correlation_id: String,
    /// 시작 시각
    pub start_time: DateTime<Utc>,
    /// 출처 파일
    pub source: String,
    /// 줄 번호
    pub line_num: u64,
}

/// 시퀀스 탐지 엔진
///
/// 상태는 상관 ID → 열린 시퀀스의 정렬 맵입니다. `BTreeMap`이므로
/// finalize가 만드는 이슈 순서는 실행 간에 결정적입니다.
#[derive(Debug)]
pub struct SequenceEngine {
    name: String,
    description: String,
    timeout: TimeDelta,
    timeout_std: Duration,
    corr_field: usize,
    start_pattern: Regex,
    end_pattern: Regex,

    open_sequences: BTreeMap<String, OpenSequence>,
    stats: RuleStats,
}

impl SequenceEngine {
    /// 검증된 시퀀스 규칙으로부터 엔진을 생성합니다.
    pub fn from_rule(rule: &RuleConfig) -> Result<Self, AnalysisError> {
        if rule.kind != RuleKind::Sequence {
            return Err(AnalysisError::Rule {
                rule: rule.name.clone(),
                reason: "not a sequence rule".to_owned(),
            });
        }

        let (Some(start_pattern), Some(end_pattern)) = (
            rule.compiled_start_pattern().cloned(),
            rule.compiled_end_pattern().cloned(),
        ) else {
            return Err(AnalysisError::Rule {
                rule: rule.name.clone(),
                reason: "patterns not compiled (config must be validated first)".to_owned(),
            });
        };

        let timeout_std = rule.effective_timeout();
        let timeout = TimeDelta::from_std(timeout_std).map_err(|_| AnalysisError::Rule {
            rule: rule.name.clone(),
            reason: "timeout out of range".to_owned(),
        })?;

        Ok(Self {
            name: rule.name.clone(),
            description: rule.description.clone(),
            timeout,
            timeout_std,
            corr_field: rule.correlation_field,
            start_pattern,
            end_pattern,
            open_sequences: BTreeMap::new(),
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

        if let Some(caps) = self.start_pattern.captures(&record.raw) {
            // 상관 그룹이 이 매치에 없으면 매치를 무시
            if let Some(id) = caps.get(self.corr_field) {
                // 같은 id의 재시작은 이전 시작을 대체 (last-writer-wins)
                self.open_sequences.insert(
                    id.as_str().to_owned(),
                    OpenSequence {
                        start_time: record.timestamp,
                        source: record.source.clone(),
                        line_num: record.line_num,
                    },
                );
                self.stats.lines_matched += 1;
            }
        }

        if let Some(caps) = self.end_pattern.captures(&record.raw) {
            if let Some(id) = caps.get(self.corr_field) {
                let id = id.as_str();
                if let Some(open) = self.open_sequences.get(id) {
                    let elapsed = record.timestamp - open.start_time;
                    if elapsed <= self.timeout {
                        // 타임아웃 내 완료 (경계 포함)
                        self.open_sequences.remove(id);
                    }
                    // 타임아웃을 넘긴 종료는 시퀀스를 닫지 않음 — finalize에서 보고됨
                }
            }
        }
    }

    /// 분석을 종료하고 남은 열린 시퀀스를 이슈로 변환합니다.
    ///
    /// 엔진 상태를 비우므로 reset 없이 다시 호출하면 빈 결과가 됩니다.
    pub fn finalize(&mut self) -> RuleResult {
        self.stats.end_time = Some(Utc::now());

        let open = std::mem::take(&mut self.open_sequences);
        let mut issues = Vec::with_capacity(open.len());
        for (correlation_id, seq) in open {
            issues.push(Issue {
                kind: IssueType::MissingEnd,
                description: format!(
                    "Sequence started but not completed within {}",
                    format_duration(self.timeout_std)
                ),
                context: IssueContext {
                    correlation_id: Some(correlation_id),
                    start_time: Some(seq.start_time),
                    source: seq.source,
                    line_num: seq.line_num,
                    timeout: Some(self.timeout_std),
                    ..IssueContext::default()
                },
            });
        }

        RuleResult {
            rule_name: self.name.clone(),
            rule_type: RuleKind::Sequence,
            description: self.description.clone(),
            issues,
            stats: self.stats.clone(),
        }
    }

    /// 재사용을 위해 상태를 초기화합니다.
    pub fn reset(&mut self) {
        self.open_sequences.clear();
        self.stats = RuleStats::default();
    }

    /// 열린 시퀀스를 직렬화 가능한 형태로 내보냅니다.
    pub fn export_state(&self) -> Vec<SequenceState> {
        self.open_sequences
            .iter()
            .map(|(correlation_id, seq)| SequenceState {
                correlation_id: correlation_id.clone(),
                start_time: seq.start_time,
                source: seq.source.clone(),
                line_num: seq.line_num,
            })
            .collect()
    }

    /// 내보낸 상태를 복원합니다.
    pub fn import_state(&mut self, states: Vec<SequenceState>) {
        for state in states {
            self.open_sequences.insert(
                state.correlation_id,
                OpenSequence {
                    start_time: state.start_time,
                    source: state.source,
                    line_num: state.line_num,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::{record, sequence_rule};

    fn engine(timeout: &str) -> SequenceEngine {
        SequenceEngine::from_rule(&sequence_rule("seq", timeout)).unwrap()
    }

    #[test]
    fn completed_sequence_produces_no_issue() {
        let mut engine = engine("60s");
        engine.process(&record("10:00:00", "START id=abc"));
        engine.process(&record("10:00:30", "END id=abc"));

        let result = engine.finalize();
        assert!(result.issues.is_empty());
        assert_eq!(result.stats.lines_processed, 2);
        assert_eq!(result.stats.lines_matched, 1);
    }

    #[test]
    fn missing_end_reported_at_finalize() {
        let mut engine = engine("60s");
        engine.process(&record("10:00:00", "START id=abc"));

        let result = engine.finalize();
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.kind, IssueType::MissingEnd);
        assert_eq!(issue.context.correlation_id.as_deref(), Some("abc"));
        assert_eq!(issue.context.line_num, 1);
        assert_eq!(
            issue.context.timeout,
            Some(std::time::Duration::from_secs(60))
        );
    }

    #[test]
    fn end_at_exact_timeout_boundary_closes_sequence() {
        let mut engine = engine("60s");
        engine.process(&record("10:00:00", "START id=abc"));
        engine.process(&record("10:01:00", "END id=abc"));
        assert!(engine.finalize().issues.is_empty());
    }

    #[test]
    fn end_after_timeout_leaves_sequence_open() {
        let mut engine = engine("60s");
        engine.process(&record("10:00:00", "START id=abc"));
        engine.process(&record("10:01:01", "END id=abc"));

        let result = engine.finalize();
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].context.correlation_id.as_deref(), Some("abc"));
    }

    #[test]
    fn end_without_start_is_ignored() {
        let mut engine = engine("60s");
        engine.process(&record("10:00:00", "END id=ghost"));
        assert!(engine.finalize().issues.is_empty());
    }

    #[test]
    fn restart_replaces_prior_open_entry() {
        let mut engine = engine("60s");
        engine.process(&record("10:00:00", "START id=abc"));
        engine.process(&record("10:05:00", "START id=abc"));
        // 두 번째 시작 기준으로 타임아웃 내 종료
        engine.process(&record("10:05:30", "END id=abc"));
        assert!(engine.finalize().issues.is_empty());
    }

    #[test]
    fn independent_ids_tracked_separately() {
        let mut engine = engine("60s");
        engine.process(&record("10:00:00", "START id=a"));
        engine.process(&record("10:00:01", "START id=b"));
        engine.process(&record("10:00:30", "END id=a"));

        let result = engine.finalize();
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].context.correlation_id.as_deref(), Some("b"));
    }

    #[test]
    fn finalize_order_is_deterministic() {
        let mut engine = engine("60s");
        engine.process(&record("10:00:00", "START id=zeta"));
        engine.process(&record("10:00:01", "START id=alpha"));
        engine.process(&record("10:00:02", "START id=mid"));

        let ids: Vec<String> = engine
            .finalize()
            .issues
            .iter()
            .filter_map(|i| i.context.correlation_id.clone())
            .collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn finalize_twice_without_reset_is_empty() {
        let mut engine = engine("60s");
        engine.process(&record("10:00:00", "START id=abc"));
        assert_eq!(engine.finalize().issues.len(), 1);
        assert!(engine.finalize().issues.is_empty());
    }

    #[test]
    fn reset_then_same_stream_matches_fresh_engine() {
        let stream = [
            record("10:00:00", "START id=a"),
            record("10:00:10", "START id=b"),
            record("10:00:20", "END id=a"),
        ];

        let mut reused = engine("60s");
        for r in &stream {
            reused.process(r);
        }
        let _ = reused.finalize();
        reused.reset();
        for r in &stream {
            reused.process(r);
        }
        let reused_result = reused.finalize();

        let mut fresh = engine("60s");
        for r in &stream {
            fresh.process(r);
        }
        let fresh_result = fresh.finalize();

        assert_eq!(reused_result.issues, fresh_result.issues);
        assert_eq!(
            reused_result.stats.lines_processed,
            fresh_result.stats.lines_processed
        );
    }

    #[test]
    fn export_import_state_roundtrip() {
        let mut engine_a = engine("60s");
        engine_a.process(&record("10:00:00", "START id=abc"));
        let state = engine_a.export_state();
        assert_eq!(state.len(), 1);
        assert_eq!(state[0].correlation_id, "abc");

        let mut engine_b = engine("60s");
        engine_b.import_state(state);
        engine_b.process(&record("10:00:30", "END id=abc"));
        assert!(engine_b.finalize().issues.is_empty());
    }
}
