//! 보통주 일별 스냅샷 수집 모듈.
//!
//! 1. 종목 리스트 조회 및 필터 (ka10099)
//! 2. 종목별 일별주가 (ka10086), 데이터가 없으면 건너뜀
//! 3. 종목별 기본정보 (ka10001) 병합
//!
//! 종목 리스트 조회 실패와 인증/토큰 캐시 에러는 배치 전체 실패이고,
//! 그 밖의 종목별 실패는 보고서에 기록한 뒤 다음 종목으로 넘어갑니다.
//! 저장은 호출자가 합니다.

use crate::config::SnapshotConfig;
use crate::{CollectionStats, Result};
use chrono::NaiveDate;
use kiwoom_connector::{KiwoomClient, KiwoomError};
use kiwoom_core::{today_kst, DailyRow, Instrument, Market, PriceUnit};
use std::time::{Duration, Instant};

/// 진행 로그 주기 (종목 수).
const PROGRESS_EVERY: usize = 100;

/// 수집 옵션
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotOptions {
    /// 대상 시장 (순서대로 조회)
    pub markets: Vec<Market>,
    /// 조회 일자 (없으면 오늘, KST)
    pub query_date: Option<NaiveDate>,
    /// 일별주가 표시 구분
    pub price_unit: PriceUnit,
    /// 종목 간 대기
    pub per_code_delay: Duration,
}

impl Default for SnapshotOptions {
    fn default() -> Self {
        Self {
            markets: Market::DEFAULT.to_vec(),
            query_date: None,
            price_unit: PriceUnit::Quantity,
            per_code_delay: Duration::from_millis(120),
        }
    }
}

impl SnapshotOptions {
    /// 설정에서 옵션 생성
    pub fn from_config(config: &SnapshotConfig) -> Self {
        Self {
            markets: config.markets.clone(),
            query_date: None,
            price_unit: config.price_unit,
            per_code_delay: config.code_delay(),
        }
    }

    /// 조회 일자 지정
    pub fn with_query_date(mut self, date: Option<NaiveDate>) -> Self {
        self.query_date = date;
        self
    }
}

/// 종목 하나의 수집 결과
#[derive(Debug, Clone, PartialEq)]
pub enum CodeOutcome {
    /// 행 생성
    Collected(DailyRow),
    /// 해당 일자 데이터 없음
    NoData,
    /// 조회 또는 변환 실패
    Failed(String),
}

/// 종목별 실패 기록
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeFailure {
    /// 종목코드
    pub code: String,
    /// 에러 메시지
    pub error: String,
}

/// 수집 결과 보고서
#[derive(Debug, Clone)]
pub struct SnapshotReport {
    /// 조회 일자
    pub query_date: NaiveDate,
    /// 생성된 행 (종목 리스트 순서)
    pub rows: Vec<DailyRow>,
    /// 종목별 실패
    pub failures: Vec<CodeFailure>,
    /// 통계
    pub stats: CollectionStats,
}

/// 일별 스냅샷 수집
pub async fn collect_daily_snapshot(
    client: &KiwoomClient,
    options: &SnapshotOptions,
) -> Result<SnapshotReport> {
    let start = Instant::now();
    let mut stats = CollectionStats::new();
    let query_date = options.query_date.unwrap_or_else(today_kst);

    tracing::info!(
        markets = ?options.markets,
        query_date = %query_date,
        "일별 스냅샷 수집 시작"
    );

    let stocks = client.fetch_stock_list(&options.markets).await?;
    stats.total = stocks.len();
    tracing::info!(codes = stocks.len(), query_date = %query_date, "필터 후 대상 종목");

    let pacer = client.pacer();
    let mut rows = Vec::with_capacity(stocks.len());
    let mut failures = Vec::new();

    for (idx, instrument) in stocks.iter().enumerate() {
        let outcome = match collect_code(client, instrument, query_date, options.price_unit).await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(
                    code = %instrument.code,
                    processed = idx,
                    collected = rows.len(),
                    error = %e,
                    "인증 실패로 수집 중단"
                );
                return Err(e);
            }
        };

        match outcome {
            CodeOutcome::Collected(row) => {
                stats.success += 1;
                rows.push(row);
            }
            CodeOutcome::NoData => {
                stats.empty += 1;
                tracing::debug!(code = %instrument.code, "데이터 없음");
            }
            CodeOutcome::Failed(error) => {
                stats.errors += 1;
                tracing::error!(code = %instrument.code, error = %error, "종목 수집 실패");
                failures.push(CodeFailure {
                    code: instrument.code.clone(),
                    error,
                });
            }
        }

        let done = idx + 1;
        if done % PROGRESS_EVERY == 0 {
            tracing::info!(
                progress = format!("{}/{}", done, stocks.len()),
                collected = rows.len(),
                "수집 진행"
            );
        }

        pacer.pause(options.per_code_delay).await;
    }

    stats.elapsed = start.elapsed();

    Ok(SnapshotReport {
        query_date,
        rows,
        failures,
        stats,
    })
}

/// 종목 하나 수집.
///
/// 종목별 에러는 `CodeOutcome::Failed`로 바꾸고, 인증/토큰 캐시 에러는
/// 남은 종목도 모두 실패하므로 `Err`로 돌려줍니다.
pub async fn collect_code(
    client: &KiwoomClient,
    instrument: &Instrument,
    query_date: NaiveDate,
    price_unit: PriceUnit,
) -> Result<CodeOutcome> {
    let code = instrument.code.as_str();

    let daily = match client.fetch_daily_price(code, query_date, price_unit).await {
        Ok(Some(daily)) => daily,
        Ok(None) => return Ok(CodeOutcome::NoData),
        Err(e) => return code_failure(e),
    };

    let fundamentals = match client.fetch_fundamentals(code).await {
        Ok(f) => f.or_name(&instrument.name),
        Err(e) => return code_failure(e),
    };

    match daily.to_daily_row(code, query_date, &fundamentals) {
        Ok(row) => Ok(CodeOutcome::Collected(row)),
        Err(e) => Ok(CodeOutcome::Failed(e.to_string())),
    }
}

fn code_failure(err: KiwoomError) -> Result<CodeOutcome> {
    if err.is_auth_error() {
        return Err(err.into());
    }
    Ok(CodeOutcome::Failed(err.to_string()))
}
