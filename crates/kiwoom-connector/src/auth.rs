//! 키움 OAuth 접근토큰 관리.
//!
//! 처리 기능:
//! - 접근토큰 발급 (au10001, POST /oauth2/token) 및 캐시 저장
//! - 접근토큰 폐기 (au10002, POST /oauth2/revoke)
//! - 캐시 재사용: 저장소 TTL이 만료를 대신합니다
//!
//! 토큰 값은 어떤 로그에도 남기지 않습니다.

use crate::config::KiwoomConfig;
use crate::endpoints::{API_REVOKE, API_TOKEN, ENDPOINT_REVOKE, ENDPOINT_TOKEN};
use crate::error::{truncate_body, KiwoomError, Result};
use crate::token_store::{CachedToken, TokenStore, MIN_TOKEN_TTL_SECS};
use crate::transport::{HttpTransport, CONTENT_TYPE_JSON};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use kiwoom_core::{kst, now_kst};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// `expires_dt` 형식 (KST 기준).
pub const EXPIRES_DT_FORMAT: &str = "%Y%m%d%H%M%S";

/// 만료 시각에서 빼는 안전 여유 (초).
pub const TOKEN_SAFETY_MARGIN_SECS: i64 = 30;

/// 발급 응답.
#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_dt: Option<String>,
}

/// 발급 결과 메타데이터 (토큰 값은 포함하지 않음).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIssued {
    /// 토큰 타입
    pub token_type: String,
    /// 발급자가 알려준 만료 시각 (YYYYMMDDHHMMSS, KST)
    pub expires_dt: String,
    /// 캐시에 저장한 TTL (초)
    pub ttl_secs: u64,
}

/// `expires_dt`로부터 캐시 TTL 계산.
///
/// `max(60, (expires_dt - now) - 30)`초. 파싱 실패는 `TokenIssuance` 에러입니다.
pub fn ttl_from_expires_dt(expires_dt: &str, now: DateTime<FixedOffset>) -> Result<u64> {
    let naive = NaiveDateTime::parse_from_str(expires_dt.trim(), EXPIRES_DT_FORMAT).map_err(|e| {
        KiwoomError::TokenIssuance(format!("invalid expires_dt '{}': {}", expires_dt, e))
    })?;

    let expires_at = kst()
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| KiwoomError::TokenIssuance(format!("invalid expires_dt '{}'", expires_dt)))?;

    let remaining = (expires_at - now).num_seconds() - TOKEN_SAFETY_MARGIN_SECS;
    Ok(remaining.max(MIN_TOKEN_TTL_SECS as i64) as u64)
}

/// 캐시 기반 접근토큰 관리자.
///
/// 같은 캐시 키를 쓰는 프로세스가 동시에 여러 개 돌면 발급이 중복될 수 있으며,
/// 이를 막는 잠금은 두지 않습니다.
pub struct TokenManager {
    config: Arc<KiwoomConfig>,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn TokenStore>,
    cache_key: String,
}

impl TokenManager {
    /// 새 토큰 관리자 생성.
    pub fn new(
        config: Arc<KiwoomConfig>,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn TokenStore>,
        cache_key: impl Into<String>,
    ) -> Self {
        Self {
            config,
            transport,
            store,
            cache_key: cache_key.into(),
        }
    }

    /// 캐시 키.
    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// 유효한 접근토큰 반환, 캐시에 없으면 발급.
    pub async fn access_token(&self) -> Result<String> {
        if let Some(token) = self.cached_token().await? {
            debug!(key = %self.cache_key, "Using cached Kiwoom token");
            return Ok(token);
        }

        info!(key = %self.cache_key, "No cached Kiwoom token found, requesting new token...");
        self.issue_token().await?;

        // 저장 호출 성공만 믿지 않고 다시 읽어 확인
        match self.cached_token().await? {
            Some(token) => Ok(token),
            None => {
                error!(key = %self.cache_key, "Issued token not found in cache after write");
                Err(KiwoomError::TokenIssuance(
                    "token issuance succeeded but token not found in cache".to_string(),
                ))
            }
        }
    }

    /// 캐시된 토큰 조회. 레코드가 깨졌거나 토큰이 비었으면 `None`.
    async fn cached_token(&self) -> Result<Option<String>> {
        let Some(raw) = self.store.get(&self.cache_key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<CachedToken>(&raw) {
            Ok(cached) if !cached.token.is_empty() => Ok(Some(cached.token)),
            Ok(_) => Ok(None),
            Err(e) => {
                warn!(key = %self.cache_key, error = %e, "Ignoring malformed cached token record");
                Ok(None)
            }
        }
    }

    /// 접근토큰 발급 후 캐시에 저장 (au10001).
    pub async fn issue_token(&self) -> Result<TokenIssued> {
        self.config.validate()?;

        info!(
            api_id = API_TOKEN,
            "Requesting new Kiwoom access token... (AppKey: {}...)",
            self.config.app_key_prefix()
        );

        let body = json!({
            "grant_type": "client_credentials",
            "appkey": self.config.app_key,
            "secretkey": self.config.secret_key.expose_secret(),
        });

        let response = self
            .transport
            .post_json(
                &self.config.url(ENDPOINT_TOKEN),
                &[("Content-Type", CONTENT_TYPE_JSON.to_string())],
                &body,
                self.config.token_timeout,
            )
            .await?;

        if !response.is_success() {
            error!(api_id = API_TOKEN, status = response.status, "Token request failed");
            return Err(KiwoomError::TokenIssuance(format!(
                "HTTP {} body={}",
                response.status,
                truncate_body(&response.body)
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            KiwoomError::TokenIssuance(format!("failed to parse token response: {}", e))
        })?;

        let (token, expires_dt) = match (parsed.token, parsed.expires_dt) {
            (Some(token), Some(expires_dt)) if !token.is_empty() && !expires_dt.is_empty() => {
                (token, expires_dt)
            }
            _ => {
                // 응답 본문에 토큰이 있을 수 있으므로 본문은 남기지 않음
                return Err(KiwoomError::TokenIssuance(
                    "token or expires_dt missing in response".to_string(),
                ));
            }
        };
        let token_type = parsed
            .token_type
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Bearer".to_string());

        let ttl_secs = ttl_from_expires_dt(&expires_dt, now_kst())?;

        let record = CachedToken {
            token,
            token_type: token_type.clone(),
        };
        self.store
            .set(&self.cache_key, &serde_json::to_string(&record)?, ttl_secs)
            .await?;

        info!(ttl = ttl_secs, expires_dt = %expires_dt, "Kiwoom token saved to cache");

        Ok(TokenIssued {
            token_type,
            expires_dt,
            ttl_secs,
        })
    }

    /// 접근토큰 폐기 (au10002).
    ///
    /// 발급자 쪽에서만 폐기하며 캐시는 건드리지 않습니다.
    pub async fn revoke_token(&self, token: &str) -> Result<Value> {
        self.config.validate()?;

        info!(api_id = API_REVOKE, "Revoking Kiwoom access token...");

        let body = json!({
            "appkey": self.config.app_key,
            "secretkey": self.config.secret_key.expose_secret(),
            "token": token,
        });

        let response = self
            .transport
            .post_json(
                &self.config.url(ENDPOINT_REVOKE),
                &[("Content-Type", CONTENT_TYPE_JSON.to_string())],
                &body,
                self.config.token_timeout,
            )
            .await?;

        if !response.is_success() {
            return Err(KiwoomError::Transaction {
                api_id: API_REVOKE.to_string(),
                status: response.status,
                body: truncate_body(&response.body),
            });
        }

        let value: Value = serde_json::from_str(&response.body)?;
        info!("Kiwoom access token revoked");
        Ok(value)
    }
}
