//! 규칙 엔진 — 세 탐지 전략의 공통 인터페이스
//!
//! # 아키텍처
//! - [`SequenceEngine`]: 시작-없는-끝 탐지 (상관 ID별 열린 시퀀스 추적)
//! - [`PeriodicEngine`]: 주기 신호 간격 초과 / 발생 횟수 미달 탐지
//! - [`ConditionalEngine`]: 트리거 후 기대 이벤트 부재 탐지
//! - [`types`]: 이슈, 규칙 결과, 실행 통계
//!
//! 세 엔진은 [`Engine`] 열거형으로 묶여 열거 디스패치됩니다. 오케스트레이터는
//! 단일 스레드이므로 엔진 상태에 잠금이 없습니다. 모든 엔진은 규칙별 지역
//! 상태만 가지며, 레코드 간 또는 엔진 간 공유 가변 상태는 없습니다.

pub mod conditional;
pub mod periodic;
pub mod sequence;
pub mod types;

pub use conditional::{ConditionalEngine, TriggerState};
pub use periodic::{PeriodicEngine, PeriodicState};
pub use sequence::{SequenceEngine, SequenceState};
pub use types::{Issue, IssueContext, IssueType, RuleKind, RuleResult, RuleStats};

use negalog_core::config::RuleConfig;
use negalog_core::types::ParsedRecord;

use crate::error::AnalysisError;

/// 규칙 엔진 — 종류별 엔진의 태그된 합
///
/// 핫패스(`process`)에서 가상 호출 대신 match 디스패치를 사용합니다.
#[derive(Debug)]
pub enum Engine {
    /// 시퀀스 탐지
    Sequence(SequenceEngine),
    /// 주기 탐지
    Periodic(PeriodicEngine),
    /// 조건 탐지
    Conditional(ConditionalEngine),
}

impl Engine {
    /// 검증된 규칙으로부터 종류에 맞는 엔진을 생성합니다.
    pub fn from_rule(rule: &RuleConfig) -> Result<Self, AnalysisError> {
        match rule.kind {
            RuleKind::Sequence => SequenceEngine::from_rule(rule).map(Self::Sequence),
            RuleKind::Periodic => PeriodicEngine::from_rule(rule).map(Self::Periodic),
            RuleKind::Conditional => ConditionalEngine::from_rule(rule).map(Self::Conditional),
        }
    }

    /// 규칙 이름을 반환합니다.
    pub fn name(&self) -> &str {
        match self {
            Self::Sequence(e) => e.name(),
            Self::Periodic(e) => e.name(),
            Self::Conditional(e) => e.name(),
        }
    }

    /// 규칙 종류를 반환합니다.
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Sequence(_) => RuleKind::Sequence,
            Self::Periodic(_) => RuleKind::Periodic,
            Self::Conditional(_) => RuleKind::Conditional,
        }
    }

    /// 레코드 하나를 처리합니다. 정규식 불일치는 정상 경로이며 실패하지
    /// 않습니다.
    pub fn process(&mut self, record: &ParsedRecord) {
        match self {
            Self::Sequence(e) => e.process(record),
            Self::Periodic(e) => e.process(record),
            Self::Conditional(e) => e.process(record),
        }
    }

    /// 분석을 종료하고 결과를 반환합니다. 남은 상태는 비워집니다.
    pub fn finalize(&mut self) -> RuleResult {
        match self {
            Self::Sequence(e) => e.finalize(),
            Self::Periodic(e) => e.finalize(),
            Self::Conditional(e) => e.finalize(),
        }
    }

    /// 재사용을 위해 상태를 초기화합니다.
    pub fn reset(&mut self) {
        match self {
            Self::Sequence(e) => e.reset(),
            Self::Periodic(e) => e.reset(),
            Self::Conditional(e) => e.reset(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! 엔진 테스트 공용 헬퍼

    use chrono::{DateTime, NaiveDateTime, Utc};

    use negalog_core::config::RuleConfig;
    use negalog_core::types::ParsedRecord;

    pub(crate) fn ts(time: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(&format!("2024-01-15 {time}"), "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    pub(crate) fn record(time: &str, raw: &str) -> ParsedRecord {
        record_at(time, raw, 1)
    }

    pub(crate) fn record_at(time: &str, raw: &str, line_num: u64) -> ParsedRecord {
        ParsedRecord {
            raw: raw.to_owned(),
            timestamp: ts(time),
            source: "test.log".to_owned(),
            line_num,
        }
    }

    fn rule_from_yaml(yaml: &str) -> RuleConfig {
        let mut rule: RuleConfig = serde_yaml::from_str(yaml).expect("rule yaml parses");
        rule.validate().expect("rule validates");
        rule
    }

    pub(crate) fn sequence_rule(name: &str, timeout: &str) -> RuleConfig {
        rule_from_yaml(&format!(
            r#"
name: {name}
type: sequence
start_pattern: 'START id=(\w+)'
end_pattern: 'END id=(\w+)'
correlation_field: 1
timeout: {timeout}
"#
        ))
    }

    pub(crate) fn periodic_rule(name: &str, max_gap: &str, min_occurrences: usize) -> RuleConfig {
        rule_from_yaml(&format!(
            r#"
name: {name}
type: periodic
pattern: 'HEARTBEAT'
max_gap: {max_gap}
min_occurrences: {min_occurrences}
"#
        ))
    }

    pub(crate) fn conditional_rule(name: &str, corr_field: usize, timeout: &str) -> RuleConfig {
        if corr_field > 0 {
            rule_from_yaml(&format!(
                r#"
name: {name}
type: conditional
trigger_pattern: 'ERROR code=(\d+)'
expected_pattern: 'ALERT code=(\d+)'
correlation_field: {corr_field}
timeout: {timeout}
"#
            ))
        } else {
            rule_from_yaml(&format!(
                r#"
name: {name}
type: conditional
trigger_pattern: 'ERROR'
expected_pattern: 'ALERT'
timeout: {timeout}
"#
            ))
        }
    }
}
