//! 한국 표준시 시계 헬퍼.
//!
//! 발급 서버의 만료 시각과 조회 일자는 모두 KST 기준입니다.
//! 시간대 데이터베이스 대신 고정 UTC+9 오프셋을 사용합니다.

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// API 조회 일자 형식.
pub const DATE_FORMAT: &str = "%Y%m%d";

const KST_OFFSET_SECS: i32 = 9 * 3600;

/// 고정 UTC+9 오프셋.
pub fn kst() -> FixedOffset {
    // 상수 오프셋이므로 항상 Some
    FixedOffset::east_opt(KST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// 현재 KST 시각.
pub fn now_kst() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&kst())
}

/// 오늘 날짜 (KST).
pub fn today_kst() -> NaiveDate {
    now_kst().date_naive()
}

/// `YYYYMMDD` 문자열을 날짜로 변환합니다.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}
