//! 코어 에러 타입.

use thiserror::Error;

/// 도메인 값 해석 에러.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// 숫자로 해석할 수 없는 필드 값
    #[error("숫자 변환 실패: {0}")]
    InvalidNumber(String),

    /// 지원하지 않는 시장 구분
    #[error("지원하지 않는 시장: {0}")]
    UnknownMarket(String),

    /// 지원하지 않는 가격 표시 구분
    #[error("지원하지 않는 표시 구분: {0}")]
    UnknownPriceUnit(String),

    /// 잘못된 날짜 형식 (YYYYMMDD 기대)
    #[error("잘못된 날짜: {0}")]
    InvalidDate(String),
}

/// 코어 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;
