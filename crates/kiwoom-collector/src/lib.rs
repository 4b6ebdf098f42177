//! 키움 REST API 기반 일별 시세 스냅샷 수집기.
//!
//! 이 crate는 배치 실행용 바이너리와 라이브러리를 제공합니다:
//! - 환경변수 설정 로드
//! - 보통주 일별 스냅샷 수집 (종목 리스트 → 일별주가 → 기본정보)
//! - PostgreSQL 업서트

pub mod config;
pub mod error;
pub mod modules;
pub mod sink;
pub mod stats;

pub use config::{CollectorConfig, SnapshotConfig};
pub use error::{CollectorError, Result};
pub use sink::{PgWriter, RowSink};
pub use stats::CollectionStats;
