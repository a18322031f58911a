// Outbound value leaves the ledger through this seam: withdrawals and change.
// The ledger calls it after all internal writes of a call and commits only if it succeeds.

use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub to: Address,
    pub amount: Amount,
}

pub trait FundsTransfer: Send {
    fn transfer(&mut self, to: Address, amount: Amount) -> Result<(), String>;
}

/// Hands value to the hosting environment by logging it; used by the node binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggedTransfers;

impl FundsTransfer for LoggedTransfers {
    fn transfer(&mut self, to: Address, amount: Amount) -> Result<(), String> {
        info!(%to, amount, "outbound transfer");
        Ok(())
    }
}

/// Records every transfer; clones share the record. Can be told to fail.
#[derive(Clone, Debug, Default)]
pub struct RecordingTransfers {
    sent: Arc<Mutex<Vec<Transfer>>>,
    failing: Arc<Mutex<bool>>,
}

impl RecordingTransfers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Transfer> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn total_to(&self, to: &Address) -> Amount {
        self.sent()
            .iter()
            .filter(|t| &t.to == to)
            .map(|t| t.amount)
            .sum()
    }

    pub fn set_failing(&self, failing: bool) {
        if let Ok(mut f) = self.failing.lock() {
            *f = failing;
        }
    }
}

impl FundsTransfer for RecordingTransfers {
    fn transfer(&mut self, to: Address, amount: Amount) -> Result<(), String> {
        if self.failing.lock().map(|f| *f).unwrap_or(false) {
            return Err("recipient rejected transfer".into());
        }
        let mut sent = self.sent.lock().map_err(|_| "transfer log poisoned".to_string())?;
        sent.push(Transfer { to, amount });
        Ok(())
    }
}
