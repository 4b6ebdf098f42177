//! 키움 REST API 설정.
//!
//! 앱키/시크릿키를 사용한 client_credentials 인증이 필요합니다.
//! 커넥터는 환경변수를 직접 읽지 않으며, 실행 시점에 한 번 만든 설정을
//! `Arc`로 공유합니다.

use crate::error::{KiwoomError, Result};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// 토큰 발급/폐기 요청 타임아웃 기본값 (초).
pub const DEFAULT_TOKEN_TIMEOUT_SECS: u64 = 10;

/// TR 요청 타임아웃 기본값 (초).
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

/// 키움 API 설정.
#[derive(Debug)]
pub struct KiwoomConfig {
    /// API 호스트 (예: "https://api.kiwoom.com")
    pub host: String,
    /// 앱키
    pub app_key: String,
    /// 시크릿키
    pub secret_key: SecretString,
    /// 토큰 요청 타임아웃
    pub token_timeout: Duration,
    /// TR 요청 타임아웃
    pub request_timeout: Duration,
}

impl KiwoomConfig {
    /// 새 설정 생성. 호스트 끝의 `/`는 제거합니다.
    pub fn new(
        host: impl Into<String>,
        app_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        let host: String = host.into();
        let secret_key: String = secret_key.into();
        Self {
            host: host.trim().trim_end_matches('/').to_string(),
            app_key: app_key.into(),
            secret_key: SecretString::new(secret_key.into_boxed_str()),
            token_timeout: Duration::from_secs(DEFAULT_TOKEN_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// 토큰 요청 타임아웃 설정.
    pub fn with_token_timeout(mut self, timeout: Duration) -> Self {
        self.token_timeout = timeout;
        self
    }

    /// TR 요청 타임아웃 설정.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// 필수 값 검증.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(KiwoomError::Config("API host is not set".to_string()));
        }
        if self.app_key.trim().is_empty() {
            return Err(KiwoomError::Config("app key is not set".to_string()));
        }
        if self.secret_key.expose_secret().trim().is_empty() {
            return Err(KiwoomError::Config("secret key is not set".to_string()));
        }
        Ok(())
    }

    /// 엔드포인트 전체 URL.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.host, endpoint)
    }

    /// 앱키 앞부분 (로그용).
    pub fn app_key_prefix(&self) -> String {
        self.app_key.chars().take(8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = KiwoomConfig::new("https://api.kiwoom.com/", "app", "secret");
        assert_eq!(config.host, "https://api.kiwoom.com");
        assert_eq!(config.url("/oauth2/token"), "https://api.kiwoom.com/oauth2/token");
        assert_eq!(config.token_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_values() {
        assert!(KiwoomConfig::new("", "app", "secret").validate().is_err());
        assert!(KiwoomConfig::new("https://h", " ", "secret").validate().is_err());
        assert!(KiwoomConfig::new("https://h", "app", "").validate().is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let config = KiwoomConfig::new("https://h", "app", "super-secret-value");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-value"));
    }

    #[test]
    fn test_app_key_prefix() {
        let config = KiwoomConfig::new("https://h", "ABCDEFGHIJKLMNOP", "s");
        assert_eq!(config.app_key_prefix(), "ABCDEFGH");
    }
}
