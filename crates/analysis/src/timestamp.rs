//! 타임스탬프 추출기 — 정규식 + 레이아웃으로 로그 라인에서 시각을 뽑아냅니다.
//!
//! 추출 실패는 에러가 아닙니다. 패턴 불일치, 캡처 그룹 부재, 파싱 실패
//! 모두 `None`을 반환하며 소스 레이어가 해당 라인을 건너뜁니다.

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

/// Unix epoch 초 단위 타임스탬프를 나타내는 특수 레이아웃 태그
pub const LAYOUT_UNIX_SECONDS: &str = "UNIX_SECONDS";
/// Unix epoch 밀리초 단위 타임스탬프를 나타내는 특수 레이아웃 태그
pub const LAYOUT_UNIX_MILLIS: &str = "UNIX_MILLIS";

/// 허용하는 최대 Unix 초 값 (2100-01-01T00:00:00Z). 범위를 벗어나면
/// 타임스탬프가 아닌 숫자로 간주하고 버립니다.
const MAX_UNIX_SECONDS: i64 = 4_102_444_800;

/// 타임스탬프 추출기
///
/// 설정된 정규식의 첫 번째 캡처 그룹을 타임스탬프 문자열로 사용하고,
/// 레이아웃(chrono strftime 또는 특수 태그)으로 파싱합니다.
#[derive(Debug, Clone)]
pub struct TimestampExtractor {
    pattern: Regex,
    layout: String,
}

impl TimestampExtractor {
    /// 새 추출기를 생성합니다. 정규식은 호출자가 미리 컴파일하여 전달합니다.
    pub fn new(pattern: Regex, layout: impl Into<String>) -> Self {
        Self {
            pattern,
            layout: layout.into(),
        }
    }

    /// 라인에서 타임스탬프를 추출합니다.
    ///
    /// 패턴이 매칭되지 않거나, 캡처 그룹 1이 없거나, 캡처된 문자열이
    /// 레이아웃으로 파싱되지 않으면 `None`을 반환합니다.
    pub fn extract(&self, line: &str) -> Option<DateTime<Utc>> {
        let caps = self.pattern.captures(line)?;
        let ts_str = caps.get(1)?.as_str();
        parse_timestamp(ts_str, &self.layout)
    }
}

/// 타임스탬프 문자열을 레이아웃에 따라 파싱합니다.
///
/// 특수 태그(`UNIX_SECONDS`, `UNIX_MILLIS`)는 `[0, 4102444800]` 초 범위를
/// 벗어나면 거부합니다. 그 외 레이아웃은 chrono strftime으로 해석합니다.
pub fn parse_timestamp(ts_str: &str, layout: &str) -> Option<DateTime<Utc>> {
    match layout {
        LAYOUT_UNIX_SECONDS => {
            let secs: i64 = ts_str.parse().ok()?;
            if !(0..=MAX_UNIX_SECONDS).contains(&secs) {
                return None;
            }
            DateTime::from_timestamp(secs, 0)
        }
        LAYOUT_UNIX_MILLIS => {
            let millis: i64 = ts_str.parse().ok()?;
            let secs = millis / 1000;
            if !(0..=MAX_UNIX_SECONDS).contains(&secs) {
                return None;
            }
            DateTime::from_timestamp_millis(millis)
        }
        _ => parse_calendar(ts_str, layout),
    }
}

/// 달력 타임스탬프를 파싱합니다.
///
/// 오프셋 지시자(`%z`/`%:z`)가 있는 레이아웃은 오프셋을 보존한 채 UTC로
/// 변환합니다. 오프셋이 없으면 UTC로 간주합니다. 연도가 없는 레이아웃
/// (BSD syslog)은 합성 연도 0으로 재시도합니다 — 연도를 추측하지 않으며,
/// 단일 연도 내 입력의 순서만 보존합니다.
fn parse_calendar(ts_str: &str, layout: &str) -> Option<DateTime<Utc>> {
    if layout.contains("%:z") || layout.contains("%z") {
        return DateTime::parse_from_str(ts_str, layout)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(ts_str, layout) {
        return Some(naive.and_utc());
    }

    // 연도 없는 레이아웃: 합성 연도 0을 덧붙여 재시도
    let padded = format!("{ts_str} 0000");
    let fmt = format!("{layout} %Y");
    NaiveDateTime::parse_from_str(&padded, &fmt)
        .ok()
        .map(|naive| naive.and_utc())
}
