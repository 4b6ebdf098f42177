//! 재시도 TR 요청 계층.
//!
//! 모든 TR 호출은 `RequestLayer::post_transaction`을 거칩니다.
//!
//! - 200: 본문(JSON)과 응답 헤더 반환
//! - 429/500/502/503/504: 일시 오류, 대기 후 재시도
//! - 그 외 상태: 즉시 `Transaction` 에러
//!
//! 대기 시간은 `Retry-After` 헤더가 숫자면 그 값을 그대로 쓰고, 아니면
//! `min(상한, backoff) + jitter`입니다. backoff는 일시 오류마다 두 배가 됩니다.

use crate::auth::TokenManager;
use crate::config::KiwoomConfig;
use crate::error::{truncate_body, KiwoomError, Result};
use crate::transport::{HttpTransport, CONTENT_TYPE_JSON};
use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// 재시도 대상 HTTP 상태.
pub const TRANSIENT_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// 일시 오류 상태인지 확인.
pub fn is_transient_status(status: u16) -> bool {
    TRANSIENT_STATUSES.contains(&status)
}

/// 재시도 정책.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// 최대 시도 횟수
    pub max_attempts: u32,
    /// 첫 backoff
    pub base_backoff: Duration,
    /// backoff 상한
    pub max_backoff: Duration,
    /// jitter 상한
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_backoff: Duration::from_millis(600),
            max_backoff: Duration::from_secs(15),
            max_jitter: Duration::from_millis(300),
        }
    }
}

/// `Retry-After` 헤더 값 파싱 (초 단위 숫자만 인정).
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
}

/// 일시 오류 후 대기 시간.
pub fn retry_delay(
    retry_after: Option<&str>,
    backoff: Duration,
    policy: &RetryPolicy,
    jitter: Duration,
) -> Duration {
    match retry_after.and_then(parse_retry_after) {
        Some(delay) => delay,
        None => backoff.min(policy.max_backoff) + jitter.min(policy.max_jitter),
    }
}

/// 다음 backoff (두 배, 상한 적용).
pub fn next_backoff(backoff: Duration, policy: &RetryPolicy) -> Duration {
    backoff.saturating_mul(2).min(policy.max_backoff)
}

/// `[0, max]` 구간 균등 jitter.
fn sample_jitter(max: Duration) -> Duration {
    if max.is_zero() {
        return Duration::ZERO;
    }
    let secs = rand::thread_rng().gen_range(0.0..=max.as_secs_f64());
    Duration::from_secs_f64(secs)
}

/// 대기 추상화.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// 지정한 시간만큼 대기합니다.
    async fn pause(&self, duration: Duration);
}

/// `tokio::time::sleep` 기반 대기.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// TR 응답.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionResponse {
    /// 응답 본문
    pub body: Value,
    /// 응답 헤더 (이름은 소문자)
    pub headers: HashMap<String, String>,
}

impl TransactionResponse {
    /// 연속조회 여부 (`cont-yn`).
    pub fn cont_yn(&self) -> Option<&str> {
        self.headers.get("cont-yn").map(String::as_str)
    }

    /// 연속조회 키 (`next-key`).
    pub fn next_key(&self) -> Option<&str> {
        self.headers.get("next-key").map(String::as_str)
    }
}

/// 인증 + 재시도 TR 요청 계층.
pub struct RequestLayer {
    config: Arc<KiwoomConfig>,
    transport: Arc<dyn HttpTransport>,
    tokens: Arc<TokenManager>,
    pacer: Arc<dyn Pacer>,
    policy: RetryPolicy,
}

impl RequestLayer {
    /// 기본 정책과 `TokioPacer`로 요청 계층 생성.
    pub fn new(
        config: Arc<KiwoomConfig>,
        transport: Arc<dyn HttpTransport>,
        tokens: Arc<TokenManager>,
    ) -> Self {
        Self {
            config,
            transport,
            tokens,
            pacer: Arc::new(TokioPacer),
            policy: RetryPolicy::default(),
        }
    }

    /// 재시도 정책 지정.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 대기 구현 지정.
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// 현재 대기 구현.
    pub fn pacer(&self) -> Arc<dyn Pacer> {
        Arc::clone(&self.pacer)
    }

    /// 토큰 관리자.
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// 재시도 정책.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// 인증된 TR POST 요청.
    ///
    /// 시도마다 토큰 관리자에서 토큰을 받아 `authorization: Bearer` 헤더로 보냅니다.
    /// 토큰 발급 실패와 전송 계층 에러는 재시도하지 않고 그대로 반환합니다.
    pub async fn post_transaction(
        &self,
        api_id: &str,
        endpoint: &str,
        payload: &Value,
        cont_yn: &str,
        next_key: &str,
    ) -> Result<TransactionResponse> {
        let url = self.config.url(endpoint);
        let mut backoff = self.policy.base_backoff;

        for attempt in 1..=self.policy.max_attempts {
            let token = self.tokens.access_token().await?;
            let headers = [
                ("Content-Type", CONTENT_TYPE_JSON.to_string()),
                ("authorization", format!("Bearer {}", token)),
                ("cont-yn", cont_yn.to_string()),
                ("next-key", next_key.to_string()),
                ("api-id", api_id.to_string()),
            ];

            let response = self
                .transport
                .post_json(&url, &headers, payload, self.config.request_timeout)
                .await?;

            if response.status == 200 {
                debug!(api_id, attempt, "Transaction succeeded");
                let body: Value = serde_json::from_str(&response.body).map_err(|e| {
                    KiwoomError::Parse(format!("[{}] invalid JSON body: {}", api_id, e))
                })?;
                return Ok(TransactionResponse {
                    body,
                    headers: response.headers,
                });
            }

            if !is_transient_status(response.status) {
                warn!(api_id, status = response.status, "Transaction rejected");
                return Err(KiwoomError::Transaction {
                    api_id: api_id.to_string(),
                    status: response.status,
                    body: truncate_body(&response.body),
                });
            }

            if attempt == self.policy.max_attempts {
                break;
            }

            let jitter = sample_jitter(self.policy.max_jitter);
            let delay = retry_delay(response.header("retry-after"), backoff, &self.policy, jitter);
            warn!(
                api_id,
                status = response.status,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Transient response, retrying"
            );

            self.pacer.pause(delay).await;
            backoff = next_backoff(backoff, &self.policy);
        }

        Err(KiwoomError::RetryExhausted {
            api_id: api_id.to_string(),
            attempts: self.policy.max_attempts,
        })
    }
}
