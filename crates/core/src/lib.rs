//! NegaLog 공통 코어 — 설정, 에러, 도메인 타입
//!
//! # 모듈 구성
//!
//! - [`config`]: negalog.yaml 설정 파싱 및 검증 (정규식 사전 컴파일 포함)
//! - [`duration`]: 사람 친화적 기간 표기 (`30s`, `5m`, `1h30m`) 파싱/포맷
//! - [`error`]: 도메인 에러 타입
//! - [`types`]: 전 크레이트가 공유하는 데이터 구조 (로그 레코드, 시간 범위)

pub mod config;
pub mod duration;
pub mod error;
pub mod types;

// --- 주요 타입 re-export ---

pub use config::{Config, RuleConfig, RuleKind, TimestampConfig, WebhookConfig, WebhookTrigger};
pub use duration::{format_duration, parse_duration};
pub use error::{ConfigError, NegalogError};
pub use types::{ParsedRecord, TimeRange};
