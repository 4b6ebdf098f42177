//! 키움 REST API 연동.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - 접근토큰 발급/폐기와 TTL 캐시 (Redis)
//! - 일시 오류 재시도 TR 요청 계층 (backoff + jitter, `Retry-After` 준수)
//! - 종목 리스트, 일별주가, 일봉차트, 기본정보 조회
//!
//! HTTP 전송, 토큰 저장소, 대기는 trait으로 분리되어 있어 테스트에서
//! `testing` 모듈의 구현으로 바꿔 끼울 수 있습니다. 이 모듈은 `testing`
//! feature를 켠 경우에만 포함됩니다.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod records;
pub mod request;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod token_store;
pub mod transport;

/// 엔드포인트 및 API ID.
pub mod endpoints {
    /// 접근토큰 발급
    pub const ENDPOINT_TOKEN: &str = "/oauth2/token";
    /// 접근토큰 폐기
    pub const ENDPOINT_REVOKE: &str = "/oauth2/revoke";
    /// 종목정보 (ka10099, ka10001)
    pub const ENDPOINT_STKINFO: &str = "/api/dostk/stkinfo";
    /// 시세 (ka10086)
    pub const ENDPOINT_MRKCOND: &str = "/api/dostk/mrkcond";
    /// 차트 (ka10081)
    pub const ENDPOINT_CHART: &str = "/api/dostk/chart";

    pub const API_TOKEN: &str = "au10001";
    pub const API_REVOKE: &str = "au10002";
    pub const API_STOCK_LIST: &str = "ka10099";
    pub const API_DAILY_PRICE: &str = "ka10086";
    pub const API_DAILY_CHART: &str = "ka10081";
    pub const API_STOCK_INFO: &str = "ka10001";
}

pub use auth::{ttl_from_expires_dt, TokenIssued, TokenManager};
pub use client::KiwoomClient;
pub use config::KiwoomConfig;
pub use error::*;
pub use records::{ChartBar, DailyPriceRecord, Fundamentals};
pub use request::{Pacer, RequestLayer, RetryPolicy, TokioPacer, TransactionResponse};
pub use token_store::{
    CachedToken, MemoryTokenStore, RedisTokenConfig, RedisTokenStore, TokenStore,
    DEFAULT_TOKEN_KEY,
};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport};
