//! 분석 파이프라인 에러 타입
//!
//! [`AnalysisError`]는 소스 읽기, 엔진 구성, 취소 등 파이프라인 내부의
//! 에러 상황을 표현합니다. `From<AnalysisError> for NegalogError` 변환이
//! 구현되어 있어 상위 레이어에서 `?` 연산자로 자연스럽게 전파됩니다.
//!
//! 타임스탬프가 없는 라인과 엔진 내부의 정규식 불일치는 에러가 아니라
//! 정상적인 "이벤트 없음" 경로이며 이 타입으로 표현되지 않습니다.

use negalog_core::error::NegalogError;

/// 분석 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// 소스 읽기/열기 실패
    #[error("source error: {path}: {reason}")]
    Source {
        /// 문제가 된 파일 경로 또는 패턴
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 최대 길이를 초과한 라인
    #[error("line too long in {path} near line {line_num} (limit {limit} bytes)")]
    LineTooLong {
        /// 문제가 된 파일 경로
        path: String,
        /// 대략적인 줄 번호 (1-기반)
        line_num: u64,
        /// 설정된 최대 라인 크기 (바이트)
        limit: usize,
    },

    /// 규칙으로부터 엔진을 구성하지 못함
    #[error("rule '{rule}': {reason}")]
    Rule {
        /// 문제가 된 규칙 이름
        rule: String,
        /// 실패 사유
        reason: String,
    },

    /// 필터 적용 후 실행할 규칙이 없음
    #[error("no rules to execute (check the rule filter)")]
    NoRules,

    /// 외부 취소 신호 관측
    #[error("cancelled")]
    Cancelled,

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AnalysisError> for NegalogError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Cancelled => NegalogError::Cancelled,
            AnalysisError::Io(e) => NegalogError::Io(e),
            other => NegalogError::Analysis(other.to_string()),
        }
    }
}
