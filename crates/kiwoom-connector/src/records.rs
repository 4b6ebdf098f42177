//! TR 응답 레코드.
//!
//! 시세 필드는 부호나 쉼표가 섞인 문자열로 오므로 `Value`로 받아 두고,
//! 행으로 변환할 때 정규화합니다.

use chrono::NaiveDate;
use kiwoom_core::{
    magnitude, parse_date, scaled_magnitude, CoreError, CoreResult, DailyRow,
    LISTED_SHARES_SCALE, MARKET_CAP_SCALE,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 일별주가(ka10086) `daly_stkpc` 항목.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyPriceRecord {
    /// 일자 (YYYYMMDD)
    #[serde(default)]
    pub date: Value,
    /// 시가
    #[serde(default)]
    pub open_pric: Value,
    /// 고가
    #[serde(default)]
    pub high_pric: Value,
    /// 저가
    #[serde(default)]
    pub low_pric: Value,
    /// 종가
    #[serde(default)]
    pub close_pric: Value,
    /// 거래량
    #[serde(default)]
    pub trde_qty: Value,
}

impl DailyPriceRecord {
    /// 기본정보와 병합해 스냅샷 행 생성.
    ///
    /// 행의 일자는 응답 일자가 아닌 조회 일자입니다.
    pub fn to_daily_row(
        &self,
        code: &str,
        date: NaiveDate,
        fundamentals: &Fundamentals,
    ) -> CoreResult<DailyRow> {
        Ok(DailyRow {
            code: code.to_string(),
            date,
            open: magnitude(&self.open_pric)?,
            high: magnitude(&self.high_pric)?,
            low: magnitude(&self.low_pric)?,
            close: magnitude(&self.close_pric)?,
            volume: magnitude(&self.trde_qty)?,
            listed_shares: fundamentals.listed_shares,
            market_cap: fundamentals.market_cap,
            name: fundamentals.name.clone().unwrap_or_default(),
        })
    }
}

/// 일봉차트(ka10081) `stk_dt_pole_chart_qry` 항목.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartBar {
    /// 일자 (YYYYMMDD)
    #[serde(default)]
    pub dt: Value,
    /// 시가
    #[serde(default)]
    pub open_pric: Value,
    /// 고가
    #[serde(default)]
    pub high_pric: Value,
    /// 저가
    #[serde(default)]
    pub low_pric: Value,
    /// 현재가 (종가)
    #[serde(default)]
    pub cur_prc: Value,
    /// 거래량
    #[serde(default)]
    pub trde_qty: Value,
}

impl ChartBar {
    /// 봉 일자.
    pub fn date(&self) -> CoreResult<NaiveDate> {
        let raw = match &self.dt {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => return Err(CoreError::InvalidDate(other.to_string())),
        };
        parse_date(&raw).ok_or(CoreError::InvalidDate(raw))
    }

    /// 기본정보와 병합해 스냅샷 행 생성 (봉 일자 기준).
    pub fn to_daily_row(&self, code: &str, fundamentals: &Fundamentals) -> CoreResult<DailyRow> {
        Ok(DailyRow {
            code: code.to_string(),
            date: self.date()?,
            open: magnitude(&self.open_pric)?,
            high: magnitude(&self.high_pric)?,
            low: magnitude(&self.low_pric)?,
            close: magnitude(&self.cur_prc)?,
            volume: magnitude(&self.trde_qty)?,
            listed_shares: fundamentals.listed_shares,
            market_cap: fundamentals.market_cap,
            name: fundamentals.name.clone().unwrap_or_default(),
        })
    }
}

/// 주식기본정보(ka10001)에서 뽑은 값 (단위 환산 후).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fundamentals {
    /// 상장주식수 (주)
    pub listed_shares: u64,
    /// 시가총액 (원)
    pub market_cap: u64,
    /// 종목명
    pub name: Option<String>,
}

impl Fundamentals {
    /// ka10001 응답 본문에서 추출.
    ///
    /// `flo_stk`은 천주, `mac`은 억원 단위입니다.
    pub fn from_body(body: &Value) -> CoreResult<Self> {
        let field = |key: &str| body.get(key).cloned().unwrap_or(Value::Null);

        let name = body
            .get("stk_nm")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            listed_shares: scaled_magnitude(&field("flo_stk"), LISTED_SHARES_SCALE)?,
            market_cap: scaled_magnitude(&field("mac"), MARKET_CAP_SCALE)?,
            name,
        })
    }

    /// 종목명이 없으면 대체 이름 사용.
    pub fn or_name(mut self, fallback: &str) -> Self {
        if self.name.is_none() && !fallback.trim().is_empty() {
            self.name = Some(fallback.trim().to_string());
        }
        self
    }
}
