//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 파싱된 로그 레코드
///
/// 소스가 생성하는 스트리밍 단위입니다. 타임스탬프가 추출된 로그 한 줄과
/// 출처 메타데이터(파일 경로, 줄 번호)를 담습니다. 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedRecord {
    /// 원본 라인 텍스트
    pub raw: String,
    /// 추출된 타임스탬프 (UTC 절대 시각)
    pub timestamp: DateTime<Utc>,
    /// 출처 파일 경로
    pub source: String,
    /// 출처 파일 내 1-기반 줄 번호
    pub line_num: u64,
}

impl fmt::Display for ParsedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} [{}] {}", self.source, self.line_num, self.timestamp, self.raw)
    }
}

/// 분석 시간 범위 필터
///
/// 경계는 양쪽 모두 포함입니다 (`start <= t <= end`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// 범위 시작
    pub start: DateTime<Utc>,
    /// 범위 끝
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// 주어진 시각이 범위 내에 있는지 확인합니다.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }
}
