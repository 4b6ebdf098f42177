//! 키움 시세 TR 클라이언트.
//!
//! | API ID  | 용도 |
//! |---------|------|
//! | ka10099 | 종목 리스트 (시장별) |
//! | ka10086 | 일별주가 (조회일 1건) |
//! | ka10081 | 일봉차트 최신 1건 (수동 대체 조회) |
//! | ka10001 | 주식기본정보 (상장주식수, 시가총액) |

use crate::auth::TokenManager;
use crate::config::KiwoomConfig;
use crate::endpoints::*;
use crate::error::Result;
use crate::records::{ChartBar, DailyPriceRecord, Fundamentals};
use crate::request::{Pacer, RequestLayer};
use crate::token_store::TokenStore;
use crate::transport::HttpTransport;
use chrono::NaiveDate;
use kiwoom_core::{filter_instruments, today_kst, Instrument, Market, PriceUnit, DATE_FORMAT};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 시장별 종목 리스트 조회 후 대기 시간.
pub const LIST_PAUSE: Duration = Duration::from_millis(150);

/// 키움 REST 클라이언트.
pub struct KiwoomClient {
    requests: RequestLayer,
}

impl KiwoomClient {
    /// 구성 요소로 클라이언트 생성.
    pub fn new(
        config: Arc<KiwoomConfig>,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn TokenStore>,
        cache_key: impl Into<String>,
    ) -> Self {
        let tokens = Arc::new(TokenManager::new(
            Arc::clone(&config),
            Arc::clone(&transport),
            store,
            cache_key,
        ));
        Self {
            requests: RequestLayer::new(config, transport, tokens),
        }
    }

    /// 요청 계층을 직접 지정해 생성.
    pub fn from_request_layer(requests: RequestLayer) -> Self {
        Self { requests }
    }

    /// 대기 구현 교체.
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.requests = self.requests.with_pacer(pacer);
        self
    }

    /// 요청 계층.
    pub fn requests(&self) -> &RequestLayer {
        &self.requests
    }

    /// 요청 계층의 대기 구현.
    pub fn pacer(&self) -> Arc<dyn Pacer> {
        self.requests.pacer()
    }

    /// 단일 페이지 TR 호출.
    async fn call(&self, api_id: &str, endpoint: &str, payload: Value) -> Result<Value> {
        let response = self
            .requests
            .post_transaction(api_id, endpoint, &payload, "N", "")
            .await?;
        Ok(response.body)
    }

    /// 보통주 종목 리스트 조회 (ka10099).
    ///
    /// 시장 순서대로 조회해 이어 붙인 뒤 종목 필터를 적용합니다.
    /// 여러 시장에 중복된 종목코드는 한 번만 반환합니다.
    pub async fn fetch_stock_list(&self, markets: &[Market]) -> Result<Vec<Instrument>> {
        let mut all_items = Vec::new();

        for market in markets {
            let body = self
                .call(
                    API_STOCK_LIST,
                    ENDPOINT_STKINFO,
                    json!({ "mrkt_tp": market.wire_code() }),
                )
                .await?;

            let items = match body.get("list") {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            };

            let before = all_items.len();
            for item in items {
                match serde_json::from_value::<Instrument>(item) {
                    Ok(instrument) => all_items.push(instrument),
                    Err(e) => warn!(%market, error = %e, "Skipping malformed list item"),
                }
            }
            debug!(%market, count = all_items.len() - before, "Stock list fetched");

            self.pacer().pause(LIST_PAUSE).await;
        }

        let total = all_items.len();
        let mut filtered = filter_instruments(all_items);

        // 같은 종목코드는 처음 나온 것만 유지
        let mut seen = HashSet::new();
        let before_dedup = filtered.len();
        filtered.retain(|instrument| seen.insert(instrument.code.clone()));
        if filtered.len() < before_dedup {
            debug!(dropped = before_dedup - filtered.len(), "Repeated codes dropped");
        }

        info!(total, kept = filtered.len(), "Stock list filtered");

        Ok(filtered)
    }

    /// 일별주가 조회 (ka10086). 해당 일자 데이터가 없으면 `None`.
    pub async fn fetch_daily_price(
        &self,
        code: &str,
        date: NaiveDate,
        unit: PriceUnit,
    ) -> Result<Option<DailyPriceRecord>> {
        let body = self
            .call(
                API_DAILY_PRICE,
                ENDPOINT_MRKCOND,
                json!({
                    "stk_cd": code,
                    "qry_dt": date.format(DATE_FORMAT).to_string(),
                    "indc_tp": unit.wire_code(),
                }),
            )
            .await?;

        first_record(&body, "daly_stkpc")
    }

    /// 일봉차트 최신 1건 조회 (ka10081). 수정주가 기준.
    ///
    /// `base_date`가 없으면 오늘(KST)을 기준일로 씁니다.
    pub async fn fetch_latest_by_chart(
        &self,
        code: &str,
        base_date: Option<NaiveDate>,
    ) -> Result<Option<ChartBar>> {
        let base_date = base_date.unwrap_or_else(today_kst);
        let body = self
            .call(
                API_DAILY_CHART,
                ENDPOINT_CHART,
                json!({
                    "stk_cd": code,
                    "base_dt": base_date.format(DATE_FORMAT).to_string(),
                    "upd_stkpc_tp": "1",
                }),
            )
            .await?;

        first_record(&body, "stk_dt_pole_chart_qry")
    }

    /// 주식기본정보 조회 (ka10001).
    pub async fn fetch_fundamentals(&self, code: &str) -> Result<Fundamentals> {
        let body = self
            .call(API_STOCK_INFO, ENDPOINT_STKINFO, json!({ "stk_cd": code }))
            .await?;
        Ok(Fundamentals::from_body(&body)?)
    }

    /// 접근토큰 폐기 (au10002).
    pub async fn revoke_token(&self, token: &str) -> Result<Value> {
        self.requests.tokens().revoke_token(token).await
    }
}

/// 배열 필드의 첫 항목. 필드가 없거나 비었으면 `None`.
fn first_record<T: DeserializeOwned>(body: &Value, field: &str) -> Result<Option<T>> {
    match body.get(field).and_then(Value::as_array).and_then(|rows| rows.first()) {
        Some(first) => Ok(Some(serde_json::from_value(first.clone())?)),
        None => Ok(None),
    }
}
