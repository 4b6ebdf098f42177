//! 일별 스냅샷 행.

use crate::clock::DATE_FORMAT;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 종목별 일별 시세와 기본정보를 병합한 저장 단위.
///
/// 모든 숫자 필드는 음수가 아닌 정수이며, 상장주식수는 주 단위,
/// 시가총액은 원 단위로 환산된 값입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRow {
    /// 종목코드
    pub code: String,
    /// 기준 일자
    pub date: NaiveDate,
    /// 시가
    pub open: u64,
    /// 고가
    pub high: u64,
    /// 저가
    pub low: u64,
    /// 종가
    pub close: u64,
    /// 거래량
    pub volume: u64,
    /// 상장주식수 (주)
    pub listed_shares: u64,
    /// 시가총액 (원)
    pub market_cap: u64,
    /// 종목명
    pub name: String,
}

impl DailyRow {
    /// `YYYYMMDD` 형식의 기준 일자.
    pub fn date_key(&self) -> String {
        self.date.format(DATE_FORMAT).to_string()
    }
}
