//! 커넥터 에러 타입.

use kiwoom_core::CoreError;
use thiserror::Error;

/// 에러 메시지에 포함할 응답 본문 최대 길이 (문자 수).
pub const ERROR_BODY_LIMIT: usize = 800;

/// 키움 API 연동 에러.
#[derive(Debug, Error)]
pub enum KiwoomError {
    /// 필수 설정 누락 (호스트, 인증 정보)
    #[error("Configuration error: {0}")]
    Config(String),

    /// 토큰 발급 응답 이상 또는 캐시 저장 확인 실패
    #[error("Token issuance failed: {0}")]
    TokenIssuance(String),

    /// 재시도 대상이 아닌 HTTP 상태
    #[error("[{api_id}] HTTP {status} body={body}")]
    Transaction {
        api_id: String,
        status: u16,
        body: String,
    },

    /// 재시도 횟수 소진
    #[error("[{api_id}] retry exhausted after {attempts} attempts")]
    RetryExhausted { api_id: String, attempts: u32 },

    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    Network(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 응답 파싱 에러
    #[error("Parse error: {0}")]
    Parse(String),

    /// 토큰 캐시 저장소 에러
    #[error("Token store error: {0}")]
    Store(String),
}

impl KiwoomError {
    /// 배치 전체를 중단시켜야 하는 인증 계열 에러인지 확인.
    ///
    /// 토큰을 얻지 못하면 이후 모든 요청이 같은 이유로 실패하므로
    /// 토큰 캐시 저장소 에러도 포함합니다.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            KiwoomError::Config(_) | KiwoomError::TokenIssuance(_) | KiwoomError::Store(_)
        )
    }

    /// HTTP 상태 코드 (해당하는 경우).
    pub fn status(&self) -> Option<u16> {
        match self {
            KiwoomError::Transaction { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// 응답 본문을 에러 메시지용으로 자릅니다 (한글 경계 안전).
pub fn truncate_body(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}

impl From<reqwest::Error> for KiwoomError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            KiwoomError::Timeout(err.to_string())
        } else {
            KiwoomError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for KiwoomError {
    fn from(err: serde_json::Error) -> Self {
        KiwoomError::Parse(err.to_string())
    }
}

impl From<redis::RedisError> for KiwoomError {
    fn from(err: redis::RedisError) -> Self {
        KiwoomError::Store(err.to_string())
    }
}

impl From<CoreError> for KiwoomError {
    fn from(err: CoreError) -> Self {
        KiwoomError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, KiwoomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body_is_char_safe() {
        let body = "가".repeat(1000);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), ERROR_BODY_LIMIT);

        assert_eq!(truncate_body("short"), "short");
    }

    #[test]
    fn test_transaction_error_message() {
        let err = KiwoomError::Transaction {
            api_id: "ka10086".to_string(),
            status: 400,
            body: "bad".to_string(),
        };
        assert_eq!(err.to_string(), "[ka10086] HTTP 400 body=bad");
        assert_eq!(err.status(), Some(400));
        assert!(!err.is_auth_error());
    }

    #[test]
    fn test_auth_error_classification() {
        assert!(KiwoomError::Config("missing host".to_string()).is_auth_error());
        assert!(KiwoomError::TokenIssuance("HTTP 401".to_string()).is_auth_error());
        assert!(KiwoomError::Store("connection refused".to_string()).is_auth_error());
        assert!(!KiwoomError::Timeout("ka10086".to_string()).is_auth_error());
        assert!(!KiwoomError::RetryExhausted {
            api_id: "ka10001".to_string(),
            attempts: 8
        }
        .is_auth_error());
    }
}
