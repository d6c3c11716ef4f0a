mod domain;
pub mod levels;
mod service;

pub use domain::{
    ledger_sum, AppendGuard, LedgerAppend, LedgerEntry, LedgerSnapshot, PointsTransaction,
    ReasonCode, TransactionId, TransactionKind, UserPoints,
};
pub use levels::{level_for, progress_for, LevelProgress, UserLevel, USER_LEVELS};
pub use service::{PointsEngine, PointsError, PointsRequest};
