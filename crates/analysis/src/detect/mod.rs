//! 타임스탬프 형식 자동 감지
//!
//! 알 수 없는 로그 파일에서 앞부분 라인을 표본으로 뽑아 카탈로그의 모든
//! 형식과 대조하고, 파싱에 성공한 라인 비율을 신뢰도로 하는 순위를
//! 만듭니다. 모호한 형식(MM/DD vs DD/MM)이 1위이면 경고 노트를 붙입니다.

mod formats;

pub use formats::{default_formats, TimestampFormat};

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::AnalysisError;
use crate::timestamp::parse_timestamp;

/// 기본 표본 크기 (파일 앞부분에서 읽는 라인 수)
pub const DEFAULT_SAMPLE_SIZE: usize = 100;

/// 모호한 형식이 1위일 때 붙는 경고 노트
const AMBIGUITY_NOTE: &str = "This format has date ordering ambiguity (MM/DD vs DD/MM). \
     Verify the layout matches your log format. \
     For European format (DD/MM/YYYY), use layout: \"%d/%m/%Y %H:%M:%S\"";

/// 하나의 형식 매칭 결과
#[derive(Debug, Clone)]
pub struct FormatMatch {
    /// 매칭된 형식
    pub format: TimestampFormat,
    /// 신뢰도 [0.0, 1.0] — 파싱된 라인 ÷ 표본 라인
    pub confidence: f64,
    /// 파싱에 성공한 라인 수
    pub match_count: usize,
    /// 매칭된 예시 라인 (표본에서 처음 매칭된 것)
    pub sample_line: String,
    /// 예시 라인에서 파싱된 시각
    pub parsed_time: DateTime<Utc>,
}

/// 감지 결과
#[derive(Debug, Clone, Default)]
pub struct DetectionResult {
    /// 매칭된 형식들 (신뢰도 내림차순)
    pub matches: Vec<FormatMatch>,
    /// 표본 라인 수 (빈 라인/주석 제외)
    pub sampled_lines: usize,
    /// 최선 매칭 기준 파싱된 라인 수
    pub parsed_lines: usize,
    /// 달력 해석 모호성 경고 (있을 경우)
    pub ambiguity_note: Option<String>,
}

impl DetectionResult {
    /// 최고 신뢰도 매칭을 반환합니다.
    pub fn best_match(&self) -> Option<&FormatMatch> {
        self.matches.first()
    }

    /// 매칭된 형식이 하나라도 있는지 확인합니다.
    pub fn has_match(&self) -> bool {
        !self.matches.is_empty()
    }
}

/// 타임스탬프 형식 감지기
pub struct Detector {
    formats: Vec<TimestampFormat>,
    sample_size: usize,
}

impl Detector {
    /// 내장 카탈로그로 감지기를 생성합니다.
    pub fn new() -> Self {
        Self {
            formats: default_formats(),
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    /// 표본 크기를 설정합니다. 최소 1이 보장됩니다.
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size.max(1);
        self
    }

    /// 파일을 표본 추출하여 형식을 감지합니다.
    pub fn detect_from_file(&self, path: impl AsRef<Path>) -> Result<DetectionResult, AnalysisError> {
        let lines = self.sample_file(path.as_ref())?;
        Ok(self.detect_from_lines(&lines))
    }

    /// 미리 수집한 라인들에서 형식을 감지합니다.
    ///
    /// 빈 라인과 `#`으로 시작하는 라인은 표본에서 제외됩니다. 신뢰도는
    /// 제외 후 남은 라인 수를 분모로 계산합니다.
    pub fn detect_from_lines(&self, lines: &[String]) -> DetectionResult {
        let considered: Vec<&str> = lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();

        let mut result = DetectionResult {
            sampled_lines: considered.len(),
            ..DetectionResult::default()
        };

        if considered.is_empty() {
            return result;
        }

        // 카탈로그 순서대로 형식별 매칭 수를 집계
        struct FormatStats {
            match_count: usize,
            sample_line: String,
            parsed_time: DateTime<Utc>,
        }
        let mut stats: Vec<Option<FormatStats>> = Vec::new();
        stats.resize_with(self.formats.len(), || None);

        for line in &considered {
            for (idx, format) in self.formats.iter().enumerate() {
                let Some(caps) = format.pattern.captures(line) else {
                    continue;
                };
                let Some(ts_str) = caps.get(1).map(|m| m.as_str()) else {
                    continue;
                };
                let Some(parsed_time) = parse_timestamp(ts_str, format.layout) else {
                    continue;
                };

                if let Some(stat) = &mut stats[idx] {
                    stat.match_count += 1;
                } else {
                    stats[idx] = Some(FormatStats {
                        match_count: 1,
                        sample_line: (*line).to_owned(),
                        parsed_time,
                    });
                }
            }
        }

        for (idx, stat) in stats.into_iter().enumerate() {
            let Some(stat) = stat else { continue };
            result.matches.push(FormatMatch {
                format: self.formats[idx].clone(),
                confidence: stat.match_count as f64 / considered.len() as f64,
                match_count: stat.match_count,
                sample_line: stat.sample_line,
                parsed_time: stat.parsed_time,
            });
        }

        // 신뢰도 내림차순, 동률은 패턴 길이 내림차순 (길수록 구체적),
        // 그래도 동률이면 안정 정렬이 카탈로그 순서를 보존
        result.matches.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.format.pattern_str.len().cmp(&a.format.pattern_str.len()))
        });

        if let Some(best) = result.matches.first() {
            result.parsed_lines = best.match_count;
            if best.format.ambiguous {
                result.ambiguity_note = Some(AMBIGUITY_NOTE.to_owned());
            }
        }

        result
    }

    /// 파일 앞부분에서 표본 라인을 읽습니다.
    ///
    /// 빈 라인과 주석(`#`)은 표본에 포함하지 않습니다.
    fn sample_file(&self, path: &Path) -> Result<Vec<String>, AnalysisError> {
        let file = File::open(path).map_err(|e| AnalysisError::Source {
            path: path.display().to_string(),
            reason: format!("failed to open: {e}"),
        })?;

        let mut lines = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| AnalysisError::Source {
                path: path.display().to_string(),
                reason: format!("read failed: {e}"),
            })?;
            let trimmed = line.trim();
            if !trimmed.is_empty() && !trimmed.starts_with('#') {
                lines.push(line);
            }
            if lines.len() >= self.sample_size {
                break;
            }
        }

        Ok(lines)
    }
}

impl Default for Detector {
    fn default() -> Self {
        Self::new()
    }
}
