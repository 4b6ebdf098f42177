//! 환경변수 기반 설정 모듈.
//!
//! 프로세스 환경은 이곳에서만 읽습니다. 실행 시작 시 `.env`를 먼저 로드합니다.

use crate::error::CollectorError;
use crate::Result;
use kiwoom_connector::{KiwoomConfig, RedisTokenConfig, DEFAULT_TOKEN_KEY};
use kiwoom_core::{Market, PriceUnit};
use std::sync::Arc;
use std::time::Duration;

/// 기본 저장 테이블.
pub const DEFAULT_TABLE: &str = "kr_daily_price";

/// Collector 전체 설정
#[derive(Debug)]
pub struct CollectorConfig {
    /// 키움 API 설정
    pub kiwoom: Arc<KiwoomConfig>,
    /// 토큰 캐시 Redis 설정
    pub redis: RedisTokenConfig,
    /// 토큰 캐시 키
    pub token_key: String,
    /// 데이터베이스 URL (저장할 때만 필요)
    pub database_url: Option<String>,
    /// 스냅샷 수집 설정
    pub snapshot: SnapshotConfig,
}

/// 스냅샷 수집 설정
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotConfig {
    /// 대상 시장 (순서대로 조회)
    pub markets: Vec<Market>,
    /// 일별주가 표시 구분
    pub price_unit: PriceUnit,
    /// 종목 간 대기 (밀리초)
    pub code_delay_ms: u64,
    /// 저장 테이블
    pub table: String,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            markets: Market::DEFAULT.to_vec(),
            price_unit: PriceUnit::Quantity,
            code_delay_ms: 120,
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl SnapshotConfig {
    /// 종목 간 대기를 Duration으로 반환
    pub fn code_delay(&self) -> Duration {
        Duration::from_millis(self.code_delay_ms)
    }
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 로드
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| {
                CollectorError::Config(format!("{} 환경변수가 설정되지 않았습니다", key))
            })
        };

        let kiwoom = Arc::new(KiwoomConfig::new(
            required("KIWOOM_HOST")?,
            required("KIWOOM_APP_KEY")?,
            required("KIWOOM_SECRET_KEY")?,
        ));

        let redis = match var("REDIS_URL") {
            Some(url) => RedisTokenConfig::from_url(&url)
                .map_err(|e| CollectorError::Config(format!("REDIS_URL: {}", e)))?,
            None => RedisTokenConfig::from_parts(
                &var("REDIS_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                parse_or(var("REDIS_PORT"), 6379),
                var("REDIS_USER").as_deref(),
                var("REDIS_PW").as_deref(),
            ),
        };

        let markets = match var("SNAPSHOT_MARKETS") {
            Some(raw) => {
                let markets = Market::parse_list(&raw)
                    .map_err(|e| CollectorError::Config(format!("SNAPSHOT_MARKETS: {}", e)))?;
                if markets.is_empty() {
                    return Err(CollectorError::Config(
                        "SNAPSHOT_MARKETS 값이 비어 있습니다".to_string(),
                    ));
                }
                markets
            }
            None => Market::DEFAULT.to_vec(),
        };

        let price_unit = match var("SNAPSHOT_PRICE_UNIT") {
            Some(raw) => raw
                .parse()
                .map_err(|e| CollectorError::Config(format!("SNAPSHOT_PRICE_UNIT: {}", e)))?,
            None => PriceUnit::default(),
        };

        Ok(Self {
            kiwoom,
            redis,
            token_key: var("KIWOOM_TOKEN_KEY").unwrap_or_else(|| DEFAULT_TOKEN_KEY.to_string()),
            database_url: var("PG_DSN").or_else(|| var("DATABASE_URL")),
            snapshot: SnapshotConfig {
                markets,
                price_unit,
                code_delay_ms: parse_or(var("SNAPSHOT_CODE_DELAY_MS"), 120),
                table: var("SNAPSHOT_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            },
        })
    }

    /// 저장용 데이터베이스 URL (없으면 설정 에러)
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url.as_deref().ok_or_else(|| {
            CollectorError::Config("PG_DSN 또는 DATABASE_URL 환경변수가 설정되지 않았습니다".to_string())
        })
    }
}

/// 값을 파싱 (실패 시 기본값 사용)
fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<CollectorConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CollectorConfig::from_lookup(|key| env.get(key).cloned())
    }

    const BASE: [(&str, &str); 3] = [
        ("KIWOOM_HOST", "https://api.kiwoom.com"),
        ("KIWOOM_APP_KEY", "app"),
        ("KIWOOM_SECRET_KEY", "secret"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&BASE).unwrap();
        assert_eq!(config.kiwoom.host, "https://api.kiwoom.com");
        assert_eq!(config.redis.address(), "127.0.0.1:6379");
        assert_eq!(config.redis.connection_info().redis.password, None);
        assert_eq!(config.token_key, "forecast:oauth:access_token");
        assert_eq!(config.database_url, None);
        assert_eq!(config.snapshot, SnapshotConfig::default());
        assert_eq!(config.snapshot.code_delay(), Duration::from_millis(120));
        assert!(config.require_database_url().is_err());
    }

    #[test]
    fn test_missing_credentials() {
        let err = load(&BASE[..2]).unwrap_err();
        assert!(matches!(err, CollectorError::Config(msg) if msg.contains("KIWOOM_SECRET_KEY")));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("REDIS_HOST", "cache"),
            ("REDIS_PORT", "6380"),
            ("REDIS_USER", "app"),
            ("REDIS_PW", "p@ss/w#rd"),
            ("KIWOOM_TOKEN_KEY", "custom:key"),
            ("DATABASE_URL", "postgres://db/fallback"),
            ("SNAPSHOT_MARKETS", "10"),
            ("SNAPSHOT_PRICE_UNIT", "1"),
            ("SNAPSHOT_CODE_DELAY_MS", "abc"),
            ("SNAPSHOT_TABLE", "market.daily"),
        ]);
        let config = load(&pairs).unwrap();
        assert_eq!(config.redis.address(), "cache:6380");
        let redis = &config.redis.connection_info().redis;
        assert_eq!(redis.username.as_deref(), Some("app"));
        assert_eq!(redis.password.as_deref(), Some("p@ss/w#rd"));
        assert_eq!(config.token_key, "custom:key");
        assert_eq!(config.require_database_url().unwrap(), "postgres://db/fallback");
        assert_eq!(config.snapshot.markets, vec![Market::Kosdaq]);
        assert_eq!(config.snapshot.price_unit, PriceUnit::Amount);
        assert_eq!(config.snapshot.code_delay_ms, 120);
        assert_eq!(config.snapshot.table, "market.daily");
    }

    #[test]
    fn test_pg_dsn_wins_and_redis_url() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("PG_DSN", "postgres://db/primary"),
            ("DATABASE_URL", "postgres://db/fallback"),
            ("REDIS_URL", "redis://other:6379/2"),
        ]);
        let config = load(&pairs).unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://db/primary"));
        assert_eq!(config.redis.address(), "other:6379");
        assert_eq!(config.redis.connection_info().redis.db, 2);
    }

    #[test]
    fn test_invalid_redis_url_rejected() {
        let mut pairs = BASE.to_vec();
        pairs.push(("REDIS_URL", "not a url"));
        assert!(matches!(load(&pairs), Err(CollectorError::Config(msg)) if msg.contains("REDIS_URL")));
    }

    #[test]
    fn test_duplicate_markets_collapsed() {
        let mut pairs = BASE.to_vec();
        pairs.push(("SNAPSHOT_MARKETS", "0,0,10,0"));
        let config = load(&pairs).unwrap();
        assert_eq!(config.snapshot.markets, vec![Market::Kospi, Market::Kosdaq]);
    }

    #[test]
    fn test_unknown_market_rejected() {
        let mut pairs = BASE.to_vec();
        pairs.push(("SNAPSHOT_MARKETS", "0,50"));
        assert!(matches!(load(&pairs), Err(CollectorError::Config(_))));
    }
}
