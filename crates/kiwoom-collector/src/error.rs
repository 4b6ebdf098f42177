//! 에러 타입 정의.

use kiwoom_connector::KiwoomError;
use kiwoom_core::CoreError;
use thiserror::Error;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 키움 API 에러
    #[error("Kiwoom API error: {0}")]
    Api(#[from] KiwoomError),

    /// 데이터베이스 에러
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 잘못된 입력 (테이블명, 저장 불가 값 등)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
