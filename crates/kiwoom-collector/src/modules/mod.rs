//! 데이터 수집 모듈.

pub mod daily_snapshot;

pub use daily_snapshot::{
    collect_code, collect_daily_snapshot, CodeFailure, CodeOutcome, SnapshotOptions,
    SnapshotReport,
};
