//! 조건 엔진 — 트리거 후 기대 이벤트 부재 탐지
//!
//! 트리거 이벤트를 대기 목록에 쌓고, 기대 이벤트가 타임아웃 내에 오면
//! 해소합니다. 상관 그룹이 설정되면 ID가 같은 대기 트리거가 모두
//! 해소되고, 설정되지 않으면 기대 이벤트 하나가 타임아웃 내의 가장
//! 오래된 트리거 하나만 해소합니다.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use negalog_core::config::{RuleConfig, RuleKind};
use negalog_core::duration::format_duration;
use negalog_core::types::ParsedRecord;

use super::types::{Issue, IssueContext, IssueType, RuleResult, RuleStats};
use crate::error::AnalysisError;

/// 기대 이벤트를 기다리는 트리거
#[derive(Debug, Clone)]
struct PendingTrigger {
    /// 상관 ID (상관 그룹이 없으면 빈 문자열)
    correlation_id: String,
    timestamp: DateTime<Utc>,
    source: String,
    line_num: u64,
}

/// 대기 트리거의 직렬화 가능한 스냅샷
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerState {
    /// 상관 ID (없으면 빈 문자열)
    #[serde(default)]
    pub correlation_id: String,
    /// 트리거 시각
    pub timestamp: DateTime<Utc>,
    /// 출처 파일
    pub source: String,
    /// 줄 번호
    pub line_num: u64,
}

/// 조건 탐지 엔진
#[derive(Debug)]
pub struct ConditionalEngine {
    name: String,
    description: String,
    timeout: TimeDelta,
    timeout_std: Duration,
    /// 0이면 상관 없음, 1 이상이면 캡처 그룹 인덱스
    corr_field: usize,
    trigger_pattern: Regex,
    expected_pattern: Regex,

    /// 대기 트리거 (삽입 순서 = 시간 순서)
    triggers: Vec<PendingTrigger>,
    stats: RuleStats,
}

impl ConditionalEngine {
    /// 검증된 조건 규칙으로부터 엔진을 생성합니다.
    pub fn from_rule(rule: &RuleConfig) -> Result<Self, AnalysisError> {
        if rule.kind != RuleKind::Conditional {
            return Err(AnalysisError::Rule {
                rule: rule.name.clone(),
                reason: "not a conditional rule".to_owned(),
            });
        }

        let (Some(trigger_pattern), Some(expected_pattern)) = (
            rule.compiled_trigger_pattern().cloned(),
            rule.compiled_expected_pattern().cloned(),
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
            trigger_pattern,
            expected_pattern,
            triggers: Vec::new(),
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

        if let Some(caps) = self.trigger_pattern.captures(&record.raw) {
            let correlation_id = if self.corr_field > 0 {
                caps.get(self.corr_field)
                    .map(|m| m.as_str().to_owned())
                    .unwrap_or_default()
            } else {
                String::new()
            };

            self.triggers.push(PendingTrigger {
                correlation_id,
                timestamp: record.timestamp,
                source: record.source.clone(),
                line_num: record.line_num,
            });
            self.stats.lines_matched += 1;
        }

        if let Some(caps) = self.expected_pattern.captures(&record.raw) {
            let correlation_id = if self.corr_field > 0 {
                caps.get(self.corr_field)
                    .map(|m| m.as_str().to_owned())
                    .unwrap_or_default()
            } else {
                String::new()
            };
            self.remove_satisfied(&correlation_id, record.timestamp);
        }
    }

    /// 기대 이벤트로 해소되는 대기 트리거를 제거합니다.
    ///
    /// 상관 그룹이 있으면: ID가 같고 경과 시간이 타임아웃 이내인 트리거를
    /// 모두 제거합니다. 상관 그룹이 없으면: 타임아웃 이내의 가장 오래된
    /// 트리거 하나만 제거하고 나머지는 그대로 둡니다.
    fn remove_satisfied(&mut self, correlation_id: &str, event_time: DateTime<Utc>) {
        if self.corr_field > 0 {
            let timeout = self.timeout;
            self.triggers.retain(|t| {
                !(t.correlation_id == correlation_id && event_time - t.timestamp <= timeout)
            });
        } else if let Some(pos) = self
            .triggers
            .iter()
            .position(|t| event_time - t.timestamp <= self.timeout)
        {
            self.triggers.remove(pos);
        }
    }

    /// 분석을 종료하고 남은 대기 트리거를 이슈로 변환합니다.
    ///
    /// finalize 시점에 아직 타임아웃이 지나지 않은 트리거도 부재로
    /// 보고됩니다 — finalize는 입력의 끝을 의미합니다.
    /// 엔진 상태를 비우므로 reset 없이 다시 호출하면 빈 결과가 됩니다.
    pub fn finalize(&mut self) -> RuleResult {
        self.stats.end_time = Some(Utc::now());

        let triggers = std::mem::take(&mut self.triggers);
        let mut issues = Vec::with_capacity(triggers.len());
        for trigger in triggers {
            let description = if trigger.correlation_id.is_empty() {
                format!(
                    "Trigger event without expected consequence within {}",
                    format_duration(self.timeout_std)
                )
            } else {
                format!(
                    "Trigger event (id={}) without expected consequence within {}",
                    trigger.correlation_id,
                    format_duration(self.timeout_std)
                )
            };

            issues.push(Issue {
                kind: IssueType::MissingConsequence,
                description,
                context: IssueContext {
                    correlation_id: if trigger.correlation_id.is_empty() {
                        None
                    } else {
                        Some(trigger.correlation_id)
                    },
                    start_time: Some(trigger.timestamp),
                    source: trigger.source,
                    line_num: trigger.line_num,
                    timeout: Some(self.timeout_std),
                    ..IssueContext::default()
                },
            });
        }

        RuleResult {
            rule_name: self.name.clone(),
            rule_type: RuleKind::Conditional,
            description: self.description.clone(),
            issues,
            stats: self.stats.clone(),
        }
    }

    /// 재사용을 위해 상태를 초기화합니다.
    pub fn reset(&mut self) {
        self.triggers.clear();
        self.stats = RuleStats::default();
    }

    /// 대기 트리거를 직렬화 가능한 형태로 내보냅니다.
    pub fn export_state(&self) -> Vec<TriggerState> {
        self.triggers
            .iter()
            .map(|t| TriggerState {
                correlation_id: t.correlation_id.clone(),
                timestamp: t.timestamp,
                source: t.source.clone(),
                line_num: t.line_num,
            })
            .collect()
    }

    /// 내보낸 상태를 복원합니다.
    pub fn import_state(&mut self, states: Vec<TriggerState>) {
        for state in states {
            self.triggers.push(PendingTrigger {
                correlation_id: state.correlation_id,
                timestamp: state.timestamp,
                source: state.source,
                line_num: state.line_num,
            });
        }
    }
}
