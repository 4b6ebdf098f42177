//! 일별 스냅샷 저장.
//!
//! `(code, ymd)` 기준 업서트입니다. 대상 테이블 스키마:
//!
//! ```sql
//! CREATE TABLE kr_daily_price (
//!     code          text    NOT NULL,
//!     ymd           date    NOT NULL,
//!     open          bigint  NOT NULL,
//!     high          bigint  NOT NULL,
//!     low           bigint  NOT NULL,
//!     close         bigint  NOT NULL,
//!     volume        bigint  NOT NULL,
//!     market_cap    bigint  NOT NULL,
//!     listed_shares bigint  NOT NULL,
//!     name          text,
//!     PRIMARY KEY (code, ymd)
//! );
//! ```

use crate::error::CollectorError;
use crate::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use kiwoom_core::DailyRow;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info, instrument};

/// 쿼리당 행 수.
pub const UPSERT_CHUNK_SIZE: usize = 1_000;

/// 스냅샷 행 저장소
#[async_trait]
pub trait RowSink: Send + Sync {
    /// 행을 업서트하고 처리한 행 수를 반환합니다.
    async fn upsert_daily_rows(&self, rows: &[DailyRow], table: &str) -> Result<u64>;
}

/// 테이블명 검증 (`name` 또는 `schema.name`, 영문/숫자/밑줄).
pub fn validate_table_name(table: &str) -> Result<()> {
    let parts: Vec<&str> = table.split('.').collect();
    let valid = parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        });

    if valid {
        Ok(())
    } else {
        Err(CollectorError::InvalidInput(format!(
            "invalid table name: {:?}",
            table
        )))
    }
}

/// 업서트 SQL (테이블명은 검증된 값만 사용).
fn upsert_sql(table: &str) -> String {
    format!(
        r#"
        INSERT INTO {table}
            (code, ymd, open, high, low, close, volume, market_cap, listed_shares, name)
        SELECT * FROM UNNEST(
            $1::text[], $2::date[],
            $3::bigint[], $4::bigint[], $5::bigint[], $6::bigint[], $7::bigint[],
            $8::bigint[], $9::bigint[], $10::text[]
        )
        ON CONFLICT (code, ymd) DO UPDATE SET
            open = EXCLUDED.open,
            high = EXCLUDED.high,
            low = EXCLUDED.low,
            close = EXCLUDED.close,
            volume = EXCLUDED.volume,
            market_cap = EXCLUDED.market_cap,
            listed_shares = EXCLUDED.listed_shares,
            name = EXCLUDED.name
        "#
    )
}

fn to_bigint(value: u64, field: &str, code: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| {
        CollectorError::InvalidInput(format!("{} out of range for {}: {}", field, code, value))
    })
}

/// PostgreSQL 업서트 저장소
#[derive(Clone)]
pub struct PgWriter {
    pool: PgPool,
}

impl PgWriter {
    /// 기존 풀로 생성
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 데이터베이스 연결
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(database_url)
            .await?;
        info!("데이터베이스 연결 성공");
        Ok(Self { pool })
    }

    /// 연결 풀 종료
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RowSink for PgWriter {
    #[instrument(skip(self, rows), fields(count = rows.len()))]
    async fn upsert_daily_rows(&self, rows: &[DailyRow], table: &str) -> Result<u64> {
        validate_table_name(table)?;
        if rows.is_empty() {
            return Ok(0);
        }

        let sql = upsert_sql(table);
        let mut affected = 0u64;

        // UNNEST 패턴으로 일괄 업서트
        for chunk in rows.chunks(UPSERT_CHUNK_SIZE) {
            let codes: Vec<&str> = chunk.iter().map(|r| r.code.as_str()).collect();
            let dates: Vec<NaiveDate> = chunk.iter().map(|r| r.date).collect();
            let mut opens = Vec::with_capacity(chunk.len());
            let mut highs = Vec::with_capacity(chunk.len());
            let mut lows = Vec::with_capacity(chunk.len());
            let mut closes = Vec::with_capacity(chunk.len());
            let mut volumes = Vec::with_capacity(chunk.len());
            let mut market_caps = Vec::with_capacity(chunk.len());
            let mut listed_shares = Vec::with_capacity(chunk.len());
            for r in chunk {
                opens.push(to_bigint(r.open, "open", &r.code)?);
                highs.push(to_bigint(r.high, "high", &r.code)?);
                lows.push(to_bigint(r.low, "low", &r.code)?);
                closes.push(to_bigint(r.close, "close", &r.code)?);
                volumes.push(to_bigint(r.volume, "volume", &r.code)?);
                market_caps.push(to_bigint(r.market_cap, "market_cap", &r.code)?);
                listed_shares.push(to_bigint(r.listed_shares, "listed_shares", &r.code)?);
            }
            let names: Vec<&str> = chunk.iter().map(|r| r.name.as_str()).collect();

            let result = sqlx::query(&sql)
                .bind(&codes)
                .bind(&dates)
                .bind(&opens)
                .bind(&highs)
                .bind(&lows)
                .bind(&closes)
                .bind(&volumes)
                .bind(&market_caps)
                .bind(&listed_shares)
                .bind(&names)
                .execute(&self.pool)
                .await?;

            affected += result.rows_affected();
        }

        info!(table = table, upserted = affected, "일별 시세 업서트 완료");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_validation() {
        for ok in ["kr_daily_price", "market.kr_daily_price", "_t1"] {
            assert!(validate_table_name(ok).is_ok(), "{}", ok);
        }
        for bad in ["", "1table", "kr daily", "t; DROP TABLE x", "a.b.c", "a.", "\"quoted\""] {
            assert!(validate_table_name(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_upsert_sql_updates_every_column() {
        let sql = upsert_sql("kr_daily_price");
        assert!(sql.contains("INSERT INTO kr_daily_price"));
        assert!(sql.contains("ON CONFLICT (code, ymd)"));
        for column in [
            "open", "high", "low", "close", "volume", "market_cap", "listed_shares", "name",
        ] {
            assert!(sql.contains(&format!("{column} = EXCLUDED.{column}")), "{}", column);
        }
    }

    #[test]
    fn test_bigint_range() {
        assert_eq!(to_bigint(42, "open", "005930").unwrap(), 42);
        assert!(to_bigint(u64::MAX, "market_cap", "005930").is_err());
    }
}
