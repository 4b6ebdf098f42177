//! 수집기 전반에서 사용되는 공통 타입.

mod daily_row;
mod instrument;
mod market;

pub use daily_row::*;
pub use instrument::*;
pub use market::*;
