// Host-side plumbing: a single-writer worker around the ledger and snapshot files.

pub mod node;
pub mod storage;

use crate::error::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("ledger worker is no longer running")]
    Disconnected,
}
