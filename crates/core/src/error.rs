//! 에러 타입 — 도메인별 에러 정의

/// NegaLog 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum NegalogError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 분석 파이프라인 에러
    #[error("analysis error: {0}")]
    Analysis(String),

    /// 외부 취소 신호 관측
    #[error("cancelled")]
    Cancelled,

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 내부 불변식 위반 — 정상 동작 중에는 발생하지 않아야 함
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일 읽기 실패
    #[error("failed to read config file {path}: {reason}")]
    FileRead {
        /// 설정 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed {
        /// 실패 사유
        reason: String,
    },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 규칙 정의 에러
    #[error("rule '{rule}': {reason}")]
    Rule {
        /// 문제가 된 규칙 이름
        rule: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 웹훅 정의 에러
    #[error("webhook '{webhook}': {reason}")]
    Webhook {
        /// 문제가 된 웹훅 이름 (이름이 없으면 URL)
        webhook: String,
        /// 검증 실패 사유
        reason: String,
    },
}
