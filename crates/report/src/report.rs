//! 보고서 데이터 모델
//!
//! `analyze -o json` 출력과 웹훅 페이로드가 공유하는 와이어 포맷입니다.
//! 필드 이름은 PascalCase이며, 기간은 사람 친화적 문자열(`1m30s`),
//! 시각은 RFC 3339로 직렬화됩니다.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use negalog_analysis::analyzer::AnalysisResult;
use negalog_analysis::engine::RuleResult;
use negalog_core::types::TimeRange;

/// 분석 보고서 — 요약, 규칙별 결과, 메타데이터
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Report {
    /// 집계 요약
    pub summary: Summary,
    /// 규칙별 결과
    pub results: Vec<RuleResult>,
    /// 실행 메타데이터
    pub metadata: Metadata,
}

/// 집계 요약
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Summary {
    /// 실행된 규칙 수
    pub rules_checked: usize,
    /// 이슈를 탐지한 규칙 수
    pub rules_with_issues: usize,
    /// 전체 이슈 수
    pub total_issues: usize,
    /// 분석된 라인 수
    pub lines_processed: u64,
}

/// 실행 메타데이터
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Metadata {
    /// 사용된 설정 파일 경로
    pub config_file: String,
    /// 분석된 로그 파일 목록
    pub sources: Vec<String>,
    /// 적용된 시간 범위 필터 (있을 경우)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_range: Option<ReportTimeRange>,
    /// 분석 수행 시각
    pub analyzed_at: DateTime<Utc>,
    /// 분석 소요 시간
    #[serde(with = "duration_str")]
    pub duration: Duration,
}

/// 보고서의 시간 범위 표현
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReportTimeRange {
    /// 범위 시작
    pub start: DateTime<Utc>,
    /// 범위 끝
    pub end: DateTime<Utc>,
}

impl From<TimeRange> for ReportTimeRange {
    fn from(range: TimeRange) -> Self {
        Self {
            start: range.start,
            end: range.end,
        }
    }
}

/// 필수 Duration 필드용 serde 어댑터
mod duration_str {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    use negalog_core::duration::{format_duration, parse_duration};

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_duration(*value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

impl Report {
    /// 분석 결과와 설정 파일 경로로 보고서를 만듭니다.
    pub fn from_analysis(result: &AnalysisResult, config_file: impl Into<String>) -> Self {
        let duration = (result.metadata.finished_at - result.metadata.started_at)
            .to_std()
            .unwrap_or_default();

        Self {
            summary: Summary {
                rules_checked: result.results.len(),
                rules_with_issues: result.rules_with_issues(),
                total_issues: result.total_issues(),
                lines_processed: result.metadata.lines_processed,
            },
            results: result.results.clone(),
            metadata: Metadata {
                config_file: config_file.into(),
                sources: result.metadata.sources.clone(),
                time_range: result.metadata.time_range.map(ReportTimeRange::from),
                analyzed_at: result.metadata.finished_at,
                duration,
            },
        }
    }

    /// 이슈가 하나라도 있는지 확인합니다.
    pub fn has_issues(&self) -> bool {
        self.summary.total_issues > 0
    }
}

/// 렌더러 동작 옵션
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// 상세 출력 (규칙 설명, 출처 위치, 통계 포함)
    pub verbose: bool,
    /// 요약만 출력
    pub quiet: bool,
}
