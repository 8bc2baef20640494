//! 엔진 결과 타입 — 이슈, 규칙 결과, 실행 통계
//!
//! 보고서 와이어 포맷(JSON)과 직렬화 이름을 공유하므로 serde 이름은
//! PascalCase이며 이슈 종류는 snake_case 문자열입니다.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use negalog_core::duration;

pub use negalog_core::config::RuleKind;

/// 탐지된 이슈의 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueType {
    /// 시퀀스 시작 후 타임아웃 내 종료 부재
    MissingEnd,
    /// 주기 신호의 간격 초과
    GapExceeded,
    /// 트리거 후 기대 이벤트 부재
    MissingConsequence,
    /// 최소 발생 횟수 미달
    BelowMinOccurrences,
}

impl std::fmt::Display for IssueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingEnd => write!(f, "missing_end"),
            Self::GapExceeded => write!(f, "gap_exceeded"),
            Self::MissingConsequence => write!(f, "missing_consequence"),
            Self::BelowMinOccurrences => write!(f, "below_min_occurrences"),
        }
    }
}

/// 탐지된 이슈 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Issue {
    /// 이슈 종류
    #[serde(rename = "Type")]
    pub kind: IssueType,
    /// 사람이 읽는 요약
    pub description: String,
    /// 발생 지점/시각 등의 상세 맥락
    pub context: IssueContext,
}

/// 이슈의 상세 맥락
///
/// 이슈 종류에 따라 채워지는 필드가 다르며, 비어 있는 선택 필드는 JSON
/// 출력에서 생략됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IssueContext {
    /// 상관 ID (있을 경우)
    #[serde(
        rename = "CorrelationID",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub correlation_id: Option<String>,
    /// 유발 이벤트 시각
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// 기대 이벤트가 실제 관측된 시각 (간격 이슈의 경우 간격 끝)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// 유발 이벤트의 출처 파일
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    /// 유발 이벤트의 줄 번호 (1-기반)
    #[serde(default, skip_serializing_if = "is_zero")]
    pub line_num: u64,
    /// 설정된 타임아웃
    #[serde(default, skip_serializing_if = "Option::is_none", with = "duration::opt")]
    pub timeout: Option<Duration>,
    /// 실제 관측된 간격
    #[serde(default, skip_serializing_if = "Option::is_none", with = "duration::opt")]
    pub actual_gap: Option<Duration>,
    /// 허용된 최대 간격
    #[serde(default, skip_serializing_if = "Option::is_none", with = "duration::opt")]
    pub expected_gap: Option<Duration>,
    /// 실제 발생 횟수
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occurrences: Option<usize>,
    /// 요구된 최소 발생 횟수
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_required: Option<usize>,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// 규칙 하나의 실행 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleResult {
    /// 규칙 이름
    pub rule_name: String,
    /// 규칙 종류
    pub rule_type: RuleKind,
    /// 규칙 설명
    pub description: String,
    /// 탐지된 이슈 목록
    pub issues: Vec<Issue>,
    /// 실행 통계
    pub stats: RuleStats,
}

impl RuleResult {
    /// 이슈가 하나라도 있는지 확인합니다.
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// 규칙 실행 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RuleStats {
    /// 검사한 라인 수
    pub lines_processed: u64,
    /// 규칙 패턴에 매칭된 라인 수
    pub lines_matched: u64,
    /// 처리 시작 시각 (첫 레코드 처리 시점)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    /// 처리 종료 시각 (finalize 시점)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}
