//! 시장 구분 및 가격 표시 구분.
//!
//! - `Market` - 종목 리스트 조회 대상 시장 (코스피/코스닥)
//! - `PriceUnit` - 일별 주가 조회의 표시 구분 (수량/금액)

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 종목 리스트 조회 대상 시장.
///
/// 수집 대상은 코스피와 코스닥 두 시장뿐입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// 코스피 (mrkt_tp = "0")
    Kospi,
    /// 코스닥 (mrkt_tp = "10")
    Kosdaq,
}

impl Market {
    /// 기본 수집 대상 (코스피, 코스닥 순).
    pub const DEFAULT: [Market; 2] = [Market::Kospi, Market::Kosdaq];

    /// API 요청에 사용하는 시장 코드.
    pub fn wire_code(&self) -> &'static str {
        match self {
            Market::Kospi => "0",
            Market::Kosdaq => "10",
        }
    }

    /// 쉼표로 구분된 시장 목록 파싱 (예: "0,10").
    ///
    /// 중복은 처음 나온 위치만 남깁니다.
    pub fn parse_list(s: &str) -> Result<Vec<Market>, CoreError> {
        let mut markets = Vec::new();
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let market: Market = token.parse()?;
            if !markets.contains(&market) {
                markets.push(market);
            }
        }
        Ok(markets)
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::Kospi => write!(f, "kospi"),
            Market::Kosdaq => write!(f, "kosdaq"),
        }
    }
}

impl FromStr for Market {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "kospi" => Ok(Market::Kospi),
            "10" | "kosdaq" => Ok(Market::Kosdaq),
            _ => Err(CoreError::UnknownMarket(s.to_string())),
        }
    }
}

/// 일별 주가 조회의 표시 구분 (`indc_tp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    /// 수량 (indc_tp = "0")
    #[default]
    Quantity,
    /// 금액, 백만원 단위 (indc_tp = "1")
    Amount,
}

impl PriceUnit {
    /// API 요청에 사용하는 코드.
    pub fn wire_code(&self) -> &'static str {
        match self {
            PriceUnit::Quantity => "0",
            PriceUnit::Amount => "1",
        }
    }
}

impl FromStr for PriceUnit {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "quantity" => Ok(PriceUnit::Quantity),
            "1" | "amount" => Ok(PriceUnit::Amount),
            _ => Err(CoreError::UnknownPriceUnit(s.to_string())),
        }
    }
}
