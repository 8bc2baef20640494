//! 기간 표기 — `30s`, `5m`, `1h30m` 형태의 사람 친화적 기간 파싱/포맷
//!
//! 허용 문법: `정수 + 단위` 세그먼트 1개 이상의 연속.
//! 단위는 `ns`, `us`, `ms`, `s`, `m`, `h`만 허용합니다.

use std::time::Duration;

/// 사람 친화적 기간 문자열을 파싱합니다.
///
/// ```
/// use std::time::Duration;
/// use negalog_core::duration::parse_duration;
///
/// assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
/// assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
/// ```
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("empty duration".to_owned());
    }

    let bytes = s.as_bytes();
    let mut total = Duration::ZERO;
    let mut i = 0;

    while i < s.len() {
        let digits_start = i;
        while i < s.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == digits_start {
            return Err(format!("expected a number in duration '{input}'"));
        }
        let value: u64 = s[digits_start..i]
            .parse()
            .map_err(|_| format!("number out of range in duration '{input}'"))?;

        let unit_start = i;
        while i < s.len() && !bytes[i].is_ascii_digit() {
            i += 1;
        }
        let segment = match &s[unit_start..i] {
            "ns" => Duration::from_nanos(value),
            "us" => Duration::from_micros(value),
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => value
                .checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(|| format!("duration '{input}' overflows"))?,
            "h" => value
                .checked_mul(3600)
                .map(Duration::from_secs)
                .ok_or_else(|| format!("duration '{input}' overflows"))?,
            "" => return Err(format!("missing unit in duration '{input}'")),
            other => {
                return Err(format!(
                    "unknown unit '{other}' in duration '{input}' (use ns, us, ms, s, m, h)"
                ))
            }
        };
        total = total
            .checked_add(segment)
            .ok_or_else(|| format!("duration '{input}' overflows"))?;
    }

    Ok(total)
}

/// 기간을 간결한 사람 친화적 문자열로 포맷합니다.
///
/// 시/분/초 단위로 분해하며 0인 구성 요소는 생략합니다.
/// 1초 미만의 잔여는 밀리초로 표시합니다.
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_owned();
    }

    let total_secs = d.as_secs();
    let millis = d.subsec_millis();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    if secs > 0 {
        out.push_str(&format!("{secs}s"));
    }
    if millis > 0 {
        out.push_str(&format!("{millis}ms"));
    }
    if out.is_empty() {
        // 밀리초 미만의 극히 짧은 기간
        out.push_str("0s");
    }
    out
}

/// `Option<Duration>` 필드용 serde 어댑터 — 문자열 표기로 직렬화/역직렬화합니다.
pub mod opt {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_duration, parse_duration};

    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(d) => serializer.serialize_some(&format_duration(*d)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => parse_duration(&s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}
