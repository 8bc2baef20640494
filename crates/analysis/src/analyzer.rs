//! 분석 오케스트레이터 — 레코드 스트림을 모든 엔진에 공급합니다.
//!
//! 규칙 목록에서 엔진을 만들고, 소스에서 레코드를 EOF까지 pull하면서
//! 시간 범위 필터를 적용한 뒤 각 엔진에 순서대로 전달합니다. EOF에서
//! 모든 엔진을 finalize하여 규칙별 결과를 모읍니다.
//!
//! 실패 의미론: 소스 I/O 에러는 치명적이며 분석을 중단합니다. 엔진 내부의
//! 정규식 불일치는 에러가 아닙니다. 취소는 레코드 pull 사이에서 관측되어
//! 그대로 전파됩니다.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use negalog_core::config::Config;
use negalog_core::types::TimeRange;

use crate::engine::{Engine, RuleResult};
use crate::error::AnalysisError;
use crate::source::RecordSource;

/// 분석 실행 메타데이터
#[derive(Debug, Clone)]
pub struct AnalysisMetadata {
    /// 레코드가 관측된 소스 파일 목록 (관측 순서)
    pub sources: Vec<String>,
    /// 적용된 시간 범위 필터 (있을 경우)
    pub time_range: Option<TimeRange>,
    /// 분석 시작 시각 (벽시계)
    pub started_at: DateTime<Utc>,
    /// 분석 종료 시각 (벽시계)
    pub finished_at: DateTime<Utc>,
    /// 처리된 라인 수 (시간 필터 통과분)
    pub lines_processed: u64,
}

/// 분석 전체 결과
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// 규칙별 결과 (엔진 구성 순서)
    pub results: Vec<RuleResult>,
    /// 실행 메타데이터
    pub metadata: AnalysisMetadata,
}

impl AnalysisResult {
    /// 전체 이슈 수를 반환합니다.
    pub fn total_issues(&self) -> usize {
        self.results.iter().map(|r| r.issues.len()).sum()
    }

    /// 이슈를 탐지한 규칙 수를 반환합니다.
    pub fn rules_with_issues(&self) -> usize {
        self.results.iter().filter(|r| r.has_issues()).count()
    }

    /// 이슈가 하나라도 있는지 확인합니다.
    pub fn has_issues(&self) -> bool {
        self.total_issues() > 0
    }
}

/// 분석기 빌더
///
/// 시간 범위, 규칙 이름 필터, 취소 토큰을 설정한 뒤 [`build`](Self::build)로
/// 엔진을 구성합니다. 필터 적용 후 엔진이 하나도 없으면 거부됩니다.
#[derive(Default)]
pub struct AnalyzerBuilder {
    time_range: Option<TimeRange>,
    rule_filter: Vec<String>,
    cancel: Option<CancellationToken>,
}

impl AnalyzerBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 시간 범위 필터를 설정합니다. 범위 밖 레코드는 건너뜁니다.
    pub fn time_range(mut self, range: TimeRange) -> Self {
        self.time_range = Some(range);
        self
    }

    /// 실행할 규칙 이름들을 제한합니다. 비어 있으면 모든 규칙을 실행합니다.
    pub fn rule_filter(mut self, names: Vec<String>) -> Self {
        self.rule_filter = names;
        self
    }

    /// 외부 취소 토큰을 연결합니다.
    pub fn cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// 설정의 규칙들로부터 분석기를 구성합니다.
    pub fn build(self, config: &Config) -> Result<Analyzer, AnalysisError> {
        let mut engines = Vec::with_capacity(config.rules.len());
        for rule in &config.rules {
            if !self.rule_filter.is_empty() && !self.rule_filter.contains(&rule.name) {
                continue;
            }
            engines.push(Engine::from_rule(rule)?);
        }

        if engines.is_empty() {
            return Err(AnalysisError::NoRules);
        }

        Ok(Analyzer {
            engines,
            time_range: self.time_range,
            cancel: self.cancel.unwrap_or_default(),
        })
    }
}

/// 분석 오케스트레이터
///
/// 엔진 집합과 소스를 소유하는 유일한 쓰기 주체입니다. 레코드는 한 번
/// 소비되고 각 엔진에 불변 참조로 전달됩니다.
#[derive(Debug)]
pub struct Analyzer {
    engines: Vec<Engine>,
    time_range: Option<TimeRange>,
    cancel: CancellationToken,
}

impl Analyzer {
    /// 구성된 엔진 수를 반환합니다.
    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    /// 소스를 EOF까지 분석하고 규칙별 결과를 반환합니다.
    pub fn analyze(
        &mut self,
        source: &mut dyn RecordSource,
    ) -> Result<AnalysisResult, AnalysisError> {
        let started_at = Utc::now();

        // 이전 실행의 잔여 상태 제거
        for engine in &mut self.engines {
            engine.reset();
        }

        debug!(engines = self.engines.len(), "starting analysis");

        let mut sources_seen: Vec<String> = Vec::new();
        let mut lines_processed: u64 = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }

            let Some(record) = source.next_record()? else {
                break;
            };

            if !sources_seen.iter().any(|s| s == &record.source) {
                sources_seen.push(record.source.clone());
            }

            if let Some(range) = &self.time_range {
                if !range.contains(record.timestamp) {
                    continue;
                }
            }

            lines_processed += 1;

            for engine in &mut self.engines {
                engine.process(&record);
            }
        }

        let results: Vec<RuleResult> = self.engines.iter_mut().map(Engine::finalize).collect();

        debug!(
            lines = lines_processed,
            issues = results.iter().map(|r| r.issues.len()).sum::<usize>(),
            "analysis finished"
        );

        Ok(AnalysisResult {
            results,
            metadata: AnalysisMetadata {
                sources: sources_seen,
                time_range: self.time_range,
                started_at,
                finished_at: Utc::now(),
                lines_processed,
            },
        })
    }
}
