//! 내장 타임스탬프 형식 카탈로그
//!
//! 감지기가 시도하는 형식 목록입니다. 대략 구체적인 패턴이 앞에 오도록
//! 정렬되어 있으며, 신뢰도가 같은 형식들의 최종 tie-break은 카탈로그
//! 순서를 따릅니다.

use regex::Regex;

use crate::timestamp::{LAYOUT_UNIX_MILLIS, LAYOUT_UNIX_SECONDS};

/// 타임스탬프 형식 — 이름, 캡처 정규식, 파싱 레이아웃의 묶음
#[derive(Debug, Clone)]
pub struct TimestampFormat {
    /// 사람이 읽는 형식 이름
    pub name: &'static str,
    /// 컴파일된 정규식
    pub pattern: Regex,
    /// 설정 출력용 패턴 문자열
    pub pattern_str: &'static str,
    /// chrono 레이아웃 또는 특수 태그
    pub layout: &'static str,
    /// 예시 타임스탬프
    pub examples: &'static [&'static str],
    /// 달력 해석이 모호한 형식 (MM/DD vs DD/MM)
    pub ambiguous: bool,
}

struct FormatSpec {
    name: &'static str,
    pattern: &'static str,
    layout: &'static str,
    examples: &'static [&'static str],
    ambiguous: bool,
}

const FORMAT_SPECS: &[FormatSpec] = &[
    FormatSpec {
        name: "ISO 8601 with timezone",
        pattern: r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}[+-]\d{2}:\d{2})",
        layout: "%Y-%m-%dT%H:%M:%S%:z",
        examples: &["2024-01-15T10:30:00+00:00", "2024-01-15T10:30:00-05:00"],
        ambiguous: false,
    },
    FormatSpec {
        name: "ISO 8601 with Z (UTC)",
        pattern: r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}Z)",
        layout: "%Y-%m-%dT%H:%M:%SZ",
        examples: &["2024-01-15T10:30:00Z"],
        ambiguous: false,
    },
    FormatSpec {
        name: "ISO 8601 with milliseconds and timezone",
        pattern: r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}[+-]\d{2}:\d{2})",
        layout: "%Y-%m-%dT%H:%M:%S%.3f%:z",
        examples: &["2024-01-15T10:30:00.123+00:00"],
        ambiguous: false,
    },
    FormatSpec {
        name: "ISO 8601 with milliseconds and Z",
        pattern: r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z)",
        layout: "%Y-%m-%dT%H:%M:%S%.3fZ",
        examples: &["2024-01-15T10:30:00.123Z"],
        ambiguous: false,
    },
    FormatSpec {
        name: "ISO 8601 with milliseconds",
        pattern: r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3})",
        layout: "%Y-%m-%dT%H:%M:%S%.3f",
        examples: &["2024-01-15T10:30:00.123"],
        ambiguous: false,
    },
    FormatSpec {
        name: "ISO 8601",
        pattern: r"^(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})",
        layout: "%Y-%m-%dT%H:%M:%S",
        examples: &["2024-01-15T10:30:00"],
        ambiguous: false,
    },
    FormatSpec {
        name: "Bracketed datetime",
        pattern: r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]",
        layout: "%Y-%m-%d %H:%M:%S",
        examples: &["[2024-01-15 10:30:00]"],
        ambiguous: false,
    },
    FormatSpec {
        name: "Syslog with year",
        pattern: r"^(\w{3}\s+\d{1,2}\s+\d{4}\s+\d{2}:\d{2}:\d{2})",
        layout: "%b %e %Y %H:%M:%S",
        examples: &["Jun 14 2024 15:16:01"],
        ambiguous: false,
    },
    FormatSpec {
        name: "Syslog (BSD)",
        pattern: r"^(\w{3}\s+\d{1,2}\s+\d{2}:\d{2}:\d{2})",
        layout: "%b %e %H:%M:%S",
        examples: &["Jun 14 15:16:01", "Jan  5 09:30:00"],
        ambiguous: false,
    },
    FormatSpec {
        name: "Apache/NGINX CLF",
        pattern: r"\[(\d{2}/\w{3}/\d{4}:\d{2}:\d{2}:\d{2}\s+[+-]\d{4})\]",
        layout: "%d/%b/%Y:%H:%M:%S %z",
        examples: &["[15/Jun/2024:10:30:00 +0000]"],
        ambiguous: false,
    },
    FormatSpec {
        name: "Apache error log",
        pattern: r"^\[(\w{3} \w{3} \d{2} \d{2}:\d{2}:\d{2} \d{4})\]",
        layout: "%a %b %d %H:%M:%S %Y",
        examples: &["[Sun Dec 04 04:47:44 2005]"],
        ambiguous: false,
    },
    FormatSpec {
        name: "Spark/Hadoop short date",
        pattern: r"^(\d{2}/\d{2}/\d{2} \d{2}:\d{2}:\d{2})",
        layout: "%y/%m/%d %H:%M:%S",
        examples: &["17/06/09 20:10:40"],
        ambiguous: false,
    },
    FormatSpec {
        name: "HDFS compact",
        pattern: r"^(\d{6} \d{6})",
        layout: "%y%m%d %H%M%S",
        examples: &["081109 203615"],
        ambiguous: false,
    },
    FormatSpec {
        name: "Python logging",
        pattern: r"^(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2},\d{3})",
        layout: "%Y-%m-%d %H:%M:%S,%3f",
        examples: &["2024-01-15 10:30:00,123"],
        ambiguous: false,
    },
    FormatSpec {
        name: "Log4j/Java logging",
        pattern: r"^(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}\.\d{3})",
        layout: "%Y-%m-%d %H:%M:%S%.3f",
        examples: &["2024-01-15 10:30:00.123"],
        ambiguous: false,
    },
    FormatSpec {
        name: "Datetime (space-separated)",
        pattern: r"^(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2})",
        layout: "%Y-%m-%d %H:%M:%S",
        examples: &["2024-01-15 10:30:00"],
        ambiguous: false,
    },
    FormatSpec {
        name: "Kubernetes JSON timestamp",
        pattern: r#""time":"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+Z)""#,
        layout: "%Y-%m-%dT%H:%M:%S%.fZ",
        examples: &[r#""time":"2024-01-15T10:30:00.123456789Z""#],
        ambiguous: false,
    },
    FormatSpec {
        name: "Unix timestamp (seconds)",
        pattern: r"^(\d{10})(?:\s|$|\])",
        layout: LAYOUT_UNIX_SECONDS,
        examples: &["1705315800"],
        ambiguous: false,
    },
    FormatSpec {
        name: "Unix timestamp (milliseconds)",
        pattern: r"^(\d{13})(?:\s|$|\])",
        layout: LAYOUT_UNIX_MILLIS,
        examples: &["1705315800000"],
        ambiguous: false,
    },
    FormatSpec {
        name: "US date format (MM/DD/YYYY)",
        pattern: r"^(\d{2}/\d{2}/\d{4}\s+\d{2}:\d{2}:\d{2})",
        layout: "%m/%d/%Y %H:%M:%S",
        examples: &["01/15/2024 10:30:00"],
        ambiguous: true,
    },
];

/// 내장 형식 목록을 컴파일하여 반환합니다.
pub fn default_formats() -> Vec<TimestampFormat> {
    FORMAT_SPECS
        .iter()
        .map(|spec| TimestampFormat {
            name: spec.name,
            // 내장 패턴은 컴파일 타임 상수이며 테스트로 전수 검증됨
            pattern: Regex::new(spec.pattern).expect("builtin format pattern must compile"),
            pattern_str: spec.pattern,
            layout: spec.layout,
            examples: spec.examples,
            ambiguous: spec.ambiguous,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timestamp::parse_timestamp;

    #[test]
    fn all_builtin_patterns_compile() {
        let formats = default_formats();
        assert!(formats.len() >= 19);
    }

    #[test]
    fn every_example_matches_and_parses() {
        for format in default_formats() {
            for example in format.examples {
                let caps = format
                    .pattern
                    .captures(example)
                    .unwrap_or_else(|| panic!("{}: no match for {example:?}", format.name));
                let ts_str = caps.get(1).expect("capture group 1").as_str();
                assert!(
                    parse_timestamp(ts_str, format.layout).is_some(),
                    "{}: failed to parse {ts_str:?} with layout {:?}",
                    format.name,
                    format.layout
                );
            }
        }
    }

    #[test]
    fn only_us_date_format_is_ambiguous() {
        let formats = default_formats();
        let ambiguous: Vec<&str> = formats
            .iter()
            .filter(|f| f.ambiguous)
            .map(|f| f.name)
            .collect();
        assert_eq!(ambiguous, vec!["US date format (MM/DD/YYYY)"]);
    }

    #[test]
    fn unix_seconds_pattern_requires_boundary() {
        let formats = default_formats();
        let unix = formats
            .iter()
            .find(|f| f.name == "Unix timestamp (seconds)")
            .unwrap();
        assert!(unix.pattern.is_match("1705315800 event"));
        assert!(unix.pattern.is_match("1705315800"));
        assert!(unix.pattern.is_match("1705315800] bracketed"));
        // 11자리 숫자는 10자리 경계를 만족하지 않음
        assert!(!unix.pattern.is_match("17053158001 event"));
    }
}
