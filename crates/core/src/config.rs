//! 설정 관리 — negalog.yaml 파싱 및 검증
//!
//! 설정은 선언적 YAML 파일 하나로 주어집니다. [`Config::load`]가 파일을 읽고,
//! 환경 변수 오버라이드를 적용한 뒤 [`Config::validate`]로 검증합니다.
//! 검증 단계에서 모든 정규식을 미리 컴파일하여 설정 구조체에 캐싱하므로
//! 분석 핫패스에서는 정규식 컴파일이 일어나지 않습니다.
//!
//! # YAML 스키마
//! ```yaml
//! log_sources:
//!   - /var/log/app/*.log
//! timestamp_format:
//!   pattern: '^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]'
//!   layout: "%Y-%m-%d %H:%M:%S"
//! rules:
//!   - name: backup-completes
//!     type: sequence
//!     start_pattern: 'BACKUP START id=(\w+)'
//!     end_pattern: 'BACKUP END id=(\w+)'
//!     correlation_field: 1
//!     timeout: 1h
//! webhooks:
//!   - url: https://hooks.example.com/negalog
//!     token: ${WEBHOOK_TOKEN}
//! ```

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::duration;
use crate::error::ConfigError;

/// 시퀀스/조건 규칙의 기본 타임아웃
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// 주기 규칙의 기본 최대 간격
pub const DEFAULT_MAX_GAP: Duration = Duration::from_secs(300);
/// 웹훅 HTTP 요청 기본 타임아웃
pub const DEFAULT_WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
/// 기본 타임스탬프 패턴 — 대괄호 datetime `[YYYY-MM-DD HH:MM:SS]`
pub const DEFAULT_TIMESTAMP_PATTERN: &str = r"^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]";
/// 기본 타임스탬프 레이아웃
pub const DEFAULT_TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// 타임스탬프 레이아웃을 로드 시점에 오버라이드하는 환경 변수
pub const ENV_TIMESTAMP_LAYOUT: &str = "NEGALOG_TIMESTAMP_LAYOUT";

/// NegaLog 통합 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 로그 소스 목록 (파일 경로 또는 glob 패턴, 순서 유지)
    #[serde(default)]
    pub log_sources: Vec<String>,
    /// 타임스탬프 추출 설정
    #[serde(default)]
    pub timestamp_format: TimestampConfig,
    /// 탐지 규칙 목록 (순서 유지)
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
    /// 웹훅 목록 (선택)
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
}

impl Config {
    /// 설정 파일을 읽고 검증합니다.
    ///
    /// 환경 변수 오버라이드([`ENV_TIMESTAMP_LAYOUT`])는 파싱 직후,
    /// 검증 전에 적용됩니다.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut cfg: Config =
            serde_yaml::from_str(&data).map_err(|e| ConfigError::ParseFailed {
                reason: e.to_string(),
            })?;

        cfg.apply_environment_overrides();
        cfg.validate()?;

        Ok(cfg)
    }

    /// 환경 변수 오버라이드를 적용합니다.
    pub fn apply_environment_overrides(&mut self) {
        if let Ok(layout) = env::var(ENV_TIMESTAMP_LAYOUT) {
            if !layout.is_empty() {
                self.timestamp_format.layout = layout;
            }
        }
    }

    /// 설정 전체를 검증하고 정규식을 컴파일합니다.
    ///
    /// 규칙의 기본값(타임아웃, 최대 간격)과 웹훅 기본값도 이 단계에서
    /// 채워집니다. 검증을 통과한 설정은 이후 불변으로 취급됩니다.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.log_sources.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "log_sources".to_owned(),
                reason: "at least one log source is required".to_owned(),
            });
        }

        self.timestamp_format.validate()?;

        if self.rules.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "rules".to_owned(),
                reason: "at least one rule is required".to_owned(),
            });
        }

        for rule in &mut self.rules {
            rule.validate()?;
        }

        for webhook in &mut self.webhooks {
            webhook.validate()?;
        }

        Ok(())
    }
}

/// 타임스탬프 추출 설정
///
/// `pattern`은 캡처 그룹을 1개 이상 가져야 하며, 첫 번째 캡처 그룹이
/// 타임스탬프 문자열로 사용됩니다. `layout`은 chrono strftime 레이아웃
/// 또는 특수 태그(`UNIX_SECONDS`, `UNIX_MILLIS`)입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimestampConfig {
    /// 타임스탬프 부분을 캡처하는 정규식
    pub pattern: String,
    /// 캡처된 문자열의 파싱 레이아웃
    pub layout: String,
    /// 컴파일된 정규식 (검증 시 채워짐)
    #[serde(skip)]
    compiled: Option<Regex>,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_TIMESTAMP_PATTERN.to_owned(),
            layout: DEFAULT_TIMESTAMP_LAYOUT.to_owned(),
            compiled: None,
        }
    }
}

impl TimestampConfig {
    /// 패턴과 레이아웃을 검증하고 정규식을 컴파일합니다.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.pattern.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "timestamp_format.pattern".to_owned(),
                reason: "pattern is required".to_owned(),
            });
        }

        let re = Regex::new(&self.pattern).map_err(|e| ConfigError::InvalidValue {
            field: "timestamp_format.pattern".to_owned(),
            reason: format!("invalid regex: {e}"),
        })?;

        if re.captures_len() < 2 {
            return Err(ConfigError::InvalidValue {
                field: "timestamp_format.pattern".to_owned(),
                reason: "pattern must have at least one capture group for the timestamp"
                    .to_owned(),
            });
        }

        self.compiled = Some(re);

        if self.layout.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "timestamp_format.layout".to_owned(),
                reason: "layout is required".to_owned(),
            });
        }

        Ok(())
    }

    /// 컴파일된 정규식을 반환합니다 (검증 전에는 `None`).
    pub fn compiled_pattern(&self) -> Option<&Regex> {
        self.compiled.as_ref()
    }
}

/// 규칙 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// 시작-끝 쌍 추적 (start-without-end 탐지)
    Sequence,
    /// 주기 신호의 간격 초과 탐지
    Periodic,
    /// 트리거 이후 기대 이벤트 부재 탐지
    Conditional,
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequence => write!(f, "sequence"),
            Self::Periodic => write!(f, "periodic"),
            Self::Conditional => write!(f, "conditional"),
        }
    }
}

/// 컴파일된 규칙 정규식 캐시
#[derive(Debug, Clone, Default)]
struct CompiledRule {
    start: Option<Regex>,
    end: Option<Regex>,
    pattern: Option<Regex>,
    trigger: Option<Regex>,
    expected: Option<Regex>,
}

/// 탐지 규칙 하나의 정의
///
/// `type` 필드가 규칙 종류를 결정하며, 종류별 필드만 채워집니다.
/// 시퀀스: `start_pattern`/`end_pattern`/`correlation_field`/`timeout`.
/// 주기: `pattern`/`max_gap`/`min_occurrences`.
/// 조건: `trigger_pattern`/`expected_pattern`/`correlation_field`/`timeout`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// 규칙 이름 (보고서에 표시, 필터 키)
    pub name: String,
    /// 규칙 종류
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// 규칙 설명 (선택)
    #[serde(default)]
    pub description: String,

    // --- 시퀀스 규칙 필드 ---
    /// 시퀀스 시작 패턴
    #[serde(default)]
    pub start_pattern: String,
    /// 시퀀스 종료 패턴
    #[serde(default)]
    pub end_pattern: String,
    /// 상관 ID 캡처 그룹 인덱스 (1-기반; 조건 규칙에서 0은 상관 없음)
    #[serde(default)]
    pub correlation_field: usize,
    /// 시작-끝 / 트리거-기대 사이의 최대 허용 시간
    #[serde(default, with = "duration::opt")]
    pub timeout: Option<Duration>,

    // --- 주기 규칙 필드 ---
    /// 주기 신호 매칭 패턴
    #[serde(default)]
    pub pattern: String,
    /// 연속 발생 사이의 최대 허용 간격
    #[serde(default, with = "duration::opt")]
    pub max_gap: Option<Duration>,
    /// 최소 발생 횟수 (0이면 검사 안 함)
    #[serde(default)]
    pub min_occurrences: usize,

    // --- 조건 규칙 필드 ---
    /// 트리거 패턴
    #[serde(default)]
    pub trigger_pattern: String,
    /// 기대 이벤트 패턴
    #[serde(default)]
    pub expected_pattern: String,

    /// 컴파일된 정규식 (검증 시 채워짐)
    #[serde(skip)]
    compiled: CompiledRule,
}

impl RuleConfig {
    /// 규칙을 검증하고 정규식을 컴파일하며 기본값을 채웁니다.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "rules[].name".to_owned(),
                reason: "name is required".to_owned(),
            });
        }

        match self.kind {
            RuleKind::Sequence => self.validate_sequence(),
            RuleKind::Periodic => self.validate_periodic(),
            RuleKind::Conditional => self.validate_conditional(),
        }
    }

    fn validate_sequence(&mut self) -> Result<(), ConfigError> {
        let start = self.compile_field("start_pattern", &self.start_pattern)?;
        let end = self.compile_field("end_pattern", &self.end_pattern)?;

        if self.correlation_field < 1 {
            return Err(self.rule_error(
                "correlation_field must be >= 1 (capture group index)".to_owned(),
            ));
        }
        self.check_group_arity("start_pattern", &start)?;
        self.check_group_arity("end_pattern", &end)?;

        self.compiled.start = Some(start);
        self.compiled.end = Some(end);
        if self.timeout.is_none() {
            self.timeout = Some(DEFAULT_TIMEOUT);
        }
        Ok(())
    }

    fn validate_periodic(&mut self) -> Result<(), ConfigError> {
        let pattern = self.compile_field("pattern", &self.pattern)?;
        self.compiled.pattern = Some(pattern);
        if self.max_gap.is_none() {
            self.max_gap = Some(DEFAULT_MAX_GAP);
        }
        Ok(())
    }

    fn validate_conditional(&mut self) -> Result<(), ConfigError> {
        let trigger = self.compile_field("trigger_pattern", &self.trigger_pattern)?;
        let expected = self.compile_field("expected_pattern", &self.expected_pattern)?;

        if self.correlation_field > 0 {
            self.check_group_arity("trigger_pattern", &trigger)?;
            self.check_group_arity("expected_pattern", &expected)?;
        }

        self.compiled.trigger = Some(trigger);
        self.compiled.expected = Some(expected);
        if self.timeout.is_none() {
            self.timeout = Some(DEFAULT_TIMEOUT);
        }
        Ok(())
    }

    fn compile_field(&self, field: &str, pattern: &str) -> Result<Regex, ConfigError> {
        if pattern.is_empty() {
            return Err(self.rule_error(format!("{field} is required for {} rules", self.kind)));
        }
        Regex::new(pattern)
            .map_err(|e| self.rule_error(format!("invalid {field}: {e}")))
    }

    fn check_group_arity(&self, field: &str, re: &Regex) -> Result<(), ConfigError> {
        let groups = re.captures_len() - 1;
        if groups < self.correlation_field {
            return Err(self.rule_error(format!(
                "{field} has only {groups} capture groups, but correlation_field is {}",
                self.correlation_field
            )));
        }
        Ok(())
    }

    fn rule_error(&self, reason: String) -> ConfigError {
        ConfigError::Rule {
            rule: self.name.clone(),
            reason,
        }
    }

    /// 실효 타임아웃 (검증 후에는 기본값이 채워져 있음)
    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }

    /// 실효 최대 간격 (검증 후에는 기본값이 채워져 있음)
    pub fn effective_max_gap(&self) -> Duration {
        self.max_gap.unwrap_or(DEFAULT_MAX_GAP)
    }

    /// 시퀀스 시작 패턴의 컴파일 결과
    pub fn compiled_start_pattern(&self) -> Option<&Regex> {
        self.compiled.start.as_ref()
    }

    /// 시퀀스 종료 패턴의 컴파일 결과
    pub fn compiled_end_pattern(&self) -> Option<&Regex> {
        self.compiled.end.as_ref()
    }

    /// 주기 패턴의 컴파일 결과
    pub fn compiled_pattern(&self) -> Option<&Regex> {
        self.compiled.pattern.as_ref()
    }

    /// 트리거 패턴의 컴파일 결과
    pub fn compiled_trigger_pattern(&self) -> Option<&Regex> {
        self.compiled.trigger.as_ref()
    }

    /// 기대 이벤트 패턴의 컴파일 결과
    pub fn compiled_expected_pattern(&self) -> Option<&Regex> {
        self.compiled.expected.as_ref()
    }
}

/// 웹훅 발사 조건
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookTrigger {
    /// 이슈가 탐지된 경우에만 (기본값)
    #[default]
    OnIssues,
    /// 분석이 끝날 때마다
    Always,
    /// 발사 안 함
    Never,
}

impl WebhookTrigger {
    /// 문자열에서 발사 조건을 파싱합니다. 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "on_issues" => Some(Self::OnIssues),
            "always" => Some(Self::Always),
            "never" => Some(Self::Never),
            _ => None,
        }
    }

    /// 이 조건에서 웹훅을 발사해야 하는지 결정합니다.
    pub fn should_fire(&self, has_issues: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::OnIssues => has_issues,
        }
    }
}

/// 웹훅 엔드포인트 정의
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// 식별용 이름 (선택)
    #[serde(default)]
    pub name: String,
    /// 엔드포인트 URL (http/https)
    pub url: String,
    /// Bearer 토큰 (선택; `${NAME}`/`$NAME` 형태는 환경에서 확장)
    #[serde(default)]
    pub token: String,
    /// 발사 조건
    #[serde(default)]
    pub trigger: WebhookTrigger,
    /// HTTP 요청 타임아웃
    #[serde(default, with = "duration::opt")]
    pub timeout: Option<Duration>,
}

impl WebhookConfig {
    /// 웹훅 설정을 검증하고 기본값과 토큰 확장을 적용합니다.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(self.webhook_error("url is required".to_owned()));
        }

        let parsed = Url::parse(&self.url)
            .map_err(|e| self.webhook_error(format!("invalid url: {e}")))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(self.webhook_error(format!(
                "url scheme must be http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if parsed.host_str().is_none() {
            return Err(self.webhook_error("url must have a host".to_owned()));
        }

        self.token = expand_env_token(&self.token);

        if self.timeout.is_none() {
            self.timeout = Some(DEFAULT_WEBHOOK_TIMEOUT);
        }

        Ok(())
    }

    /// 로그/출력용 표시 이름 (이름이 없으면 URL)
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.url
        } else {
            &self.name
        }
    }

    /// 실효 타임아웃 (검증 후에는 기본값이 채워져 있음)
    pub fn effective_timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_WEBHOOK_TIMEOUT)
    }

    fn webhook_error(&self, reason: String) -> ConfigError {
        ConfigError::Webhook {
            webhook: self.display_name().to_owned(),
            reason,
        }
    }
}

/// `${NAME}` 또는 `$NAME` 형태의 토큰을 환경 변수로 확장합니다.
///
/// 해당 형태가 아니면 원문을 그대로 반환하고, 변수가 없으면 빈 문자열이
/// 됩니다.
fn expand_env_token(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }

    if let Some(inner) = token.strip_prefix("${").and_then(|t| t.strip_suffix('}')) {
        return env::var(inner).unwrap_or_default();
    }

    if let Some(name) = token.strip_prefix('$') {
        return env::var(name).unwrap_or_default();
    }

    token.to_owned()
}
