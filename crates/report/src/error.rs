//! 보고서 에러 타입

/// 보고서 렌더링/전달 에러
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// JSON 직렬화 실패
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 출력 쓰기 실패
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
