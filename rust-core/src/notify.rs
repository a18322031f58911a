// Notifications are published after a call commits. Sinks observe; they never
// influence whether a call succeeds.

use crate::types::{Address, Amount, FlightKey, FlightStatus, RequestKey};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Notification {
    OperationalStatusChanged {
        operational: bool,
    },
    CallerAuthorized {
        caller: Address,
    },
    CallerDeauthorized {
        caller: Address,
    },
    AirlineAdded {
        airline: Address,
        id: u32,
        elector: Address,
        accepted: bool,
    },
    AirlineVoted {
        airline: Address,
        elector: Address,
        votes: usize,
        accepted: bool,
    },
    AirlineFunded {
        airline: Address,
        stake: Amount,
    },
    FlightAdded {
        key: FlightKey,
        airline: Address,
        code: String,
        departure: u64,
    },
    FlightStatusChanged {
        key: FlightKey,
        status: FlightStatus,
        updated_at: u64,
    },
    InsuranceAdded {
        id: u64,
        flight: FlightKey,
        passenger: Address,
        amount: Amount,
    },
    InsuranceRefunded {
        id: u64,
        passenger: Address,
        credit: Amount,
    },
    CreditWithdrawn {
        passenger: Address,
        amount: Amount,
    },
    OracleRegistered {
        oracle: Address,
        indexes: [u8; 3],
    },
    /// Oracles holding `index` are expected to answer.
    OracleRequestOpened {
        key: RequestKey,
        index: u8,
        airline: Address,
        code: String,
        departure: u64,
    },
    OracleReportReceived {
        oracle: Address,
        index: u8,
        airline: Address,
        code: String,
        departure: u64,
        status: FlightStatus,
    },
    FlightStatusFinalized {
        airline: Address,
        code: String,
        departure: u64,
        status: FlightStatus,
    },
}

pub trait EventSink: Send {
    fn notify(&self, event: &Notification);
}

/// Forwards notifications to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn notify(&self, event: &Notification) {
        match event {
            Notification::AirlineAdded { airline, id, accepted, .. } => {
                info!(%airline, id, accepted, "airline added")
            }
            Notification::AirlineVoted { airline, votes, accepted, .. } => {
                info!(%airline, votes, accepted, "airline voted")
            }
            Notification::FlightStatusFinalized { airline, code, status, .. } => {
                info!(%airline, %code, ?status, "flight status finalized")
            }
            Notification::OracleRequestOpened { index, airline, code, departure, .. } => {
                info!(index, %airline, %code, departure, "oracle request opened")
            }
            other => info!(event = ?other, "ledger event"),
        }
    }
}

/// Keeps every notification in memory; clones share the log.
#[derive(Clone, Debug, Default)]
pub struct Journal {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, pred: impl Fn(&Notification) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for Journal {
    fn notify(&self, event: &Notification) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
