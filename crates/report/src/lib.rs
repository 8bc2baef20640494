//! NegaLog 보고서 — 분석 결과의 와이어 포맷, 렌더링, 웹훅 전달
//!
//! # 모듈 구성
//!
//! - [`report`]: 보고서 데이터 모델 (`-o json`과 웹훅이 공유하는 와이어 포맷)
//! - [`text`]: 사람이 읽는 텍스트 렌더러
//! - [`json`]: JSON 렌더러
//! - [`webhook`]: HTTP POST 웹훅 클라이언트
//! - [`error`]: 도메인 에러 타입

pub mod error;
pub mod json;
pub mod report;
pub mod text;
pub mod webhook;

// --- 주요 타입 re-export ---

pub use error::ReportError;
pub use json::JsonFormatter;
pub use report::{FormatOptions, Metadata, Report, ReportTimeRange, Summary};
pub use text::TextFormatter;
pub use webhook::{SendOptions, WebhookClient, WebhookResponse};
