//! # Kiwoom Core
//!
//! 일별 시세 수집기의 핵심 도메인 타입을 제공합니다.
//!
//! 이 크레이트는 I/O 없이 다음을 제공합니다:
//! - 시장 구분, 종목, 일별 스냅샷 행 타입
//! - 보통주 판별 휴리스틱 (종목 필터)
//! - 응답 숫자 필드 정규화 및 단위 환산
//! - 한국 표준시(고정 UTC+9) 시계 헬퍼
//! - 로깅 인프라

pub mod classifier;
pub mod clock;
pub mod error;
pub mod logging;
pub mod numeric;
pub mod types;

pub use classifier::{filter_instruments, is_common_stock, is_non_common_stock, is_valid_code};
pub use clock::{kst, now_kst, parse_date, today_kst, DATE_FORMAT};
pub use error::*;
pub use logging::*;
pub use numeric::{magnitude, normalize_int, scaled_magnitude, LISTED_SHARES_SCALE, MARKET_CAP_SCALE};
pub use types::*;
