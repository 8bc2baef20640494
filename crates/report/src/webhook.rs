//! 웹훅 클라이언트 — 분석 보고서를 HTTP 엔드포인트로 전달합니다.
//!
//! 전달 실패는 분석을 실패시키지 않습니다. 모든 결과(성공/실패)를
//! [`WebhookResponse`]로 반환하며, 호출자(CLI)가 stderr에 기록합니다.

use std::time::{Duration, Instant};

use tracing::debug;

use negalog_core::config::DEFAULT_WEBHOOK_TIMEOUT;

use crate::report::Report;

/// 웹훅 요청의 User-Agent 헤더 값
const USER_AGENT: &str = "negalog-webhook";
/// 응답 본문 최대 크기 (1 MiB)
const MAX_RESPONSE_BODY: usize = 1024 * 1024;

/// 웹훅 전송 옵션
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// 엔드포인트 URL
    pub url: String,
    /// Bearer 토큰 (비어 있으면 인증 헤더 없음)
    pub token: String,
    /// 요청 타임아웃 (`None`이면 기본 10초)
    pub timeout: Option<Duration>,
}

/// 웹훅 요청 결과
#[derive(Debug)]
pub struct WebhookResponse {
    /// HTTP 상태 코드 (요청이 나가지 못했으면 `None`)
    pub status: Option<u16>,
    /// 응답 본문 (최대 1 MiB)
    pub body: String,
    /// 요청 소요 시간
    pub duration: Duration,
    /// 실패 사유 (성공이면 `None`)
    pub error: Option<String>,
}

impl WebhookResponse {
    /// 전송이 성공(2xx)했는지 확인합니다.
    pub fn success(&self) -> bool {
        self.error.is_none()
            && self
                .status
                .is_some_and(|code| (200..300).contains(&code))
    }

    fn failed(error: String, status: Option<u16>, started: Instant) -> Self {
        Self {
            status,
            body: String::new(),
            duration: started.elapsed(),
            error: Some(error),
        }
    }
}

/// 웹훅 클라이언트
pub struct WebhookClient {
    client: reqwest::Client,
}

impl WebhookClient {
    /// 새 클라이언트를 생성합니다.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// 보고서를 엔드포인트에 POST합니다.
    ///
    /// 직렬화/네트워크/상태 코드 에러는 모두 [`WebhookResponse::error`]로
    /// 보고되며 패닉하거나 에러를 반환하지 않습니다.
    pub async fn send(&self, report: &Report, opts: &SendOptions) -> WebhookResponse {
        let started = Instant::now();

        let payload = match serde_json::to_vec(report) {
            Ok(payload) => payload,
            Err(e) => {
                return WebhookResponse::failed(
                    format!("failed to serialize report: {e}"),
                    None,
                    started,
                );
            }
        };

        let timeout = opts.timeout.unwrap_or(DEFAULT_WEBHOOK_TIMEOUT);
        let mut request = self
            .client
            .post(&opts.url)
            .timeout(timeout)
            .header("content-type", "application/json")
            .header("user-agent", USER_AGENT)
            .body(payload);

        if !opts.token.is_empty() {
            request = request.bearer_auth(&opts.token);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return WebhookResponse::failed(format!("request failed: {e}"), None, started);
            }
        };

        let status = response.status().as_u16();
        debug!(url = %opts.url, status, "webhook delivered");

        let body = match response.text().await {
            Ok(mut body) => {
                if body.len() > MAX_RESPONSE_BODY {
                    // UTF-8 문자 경계에서만 자를 수 있음
                    let mut cut = MAX_RESPONSE_BODY;
                    while !body.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    body.truncate(cut);
                }
                body
            }
            Err(e) => {
                return WebhookResponse::failed(
                    format!("failed to read response: {e}"),
                    Some(status),
                    started,
                );
            }
        };

        let error = if status >= 400 {
            Some(format!("webhook returned status {status}"))
        } else {
            None
        };

        WebhookResponse {
            status: Some(status),
            body,
            duration: started.elapsed(),
            error,
        }
    }
}

impl Default for WebhookClient {
    fn default() -> Self {
        Self::new()
    }
}
