// Flight-delay insurance ledger: single-writer, transactional, observable after commit.

pub mod airline;
pub mod call;
pub mod clock;
pub mod config;
pub mod error;
pub mod flight;
pub mod funds;
pub mod gate;
pub mod insurance;
pub mod ledger;
pub mod notify;
pub mod oracle;
pub mod random;
#[cfg(feature = "node")]
pub mod service;
pub mod store;
pub mod types;

pub use call::{Call, Outcome};
pub use config::GenesisConfig;
pub use error::{LedgerError, Result};
pub use ledger::{Ledger, LedgerBuilder, PersistedSnapshot};
pub use types::{Address, Amount, FlightKey, FlightStatus, RequestKey, ONE_ETHER};

/*
Intentionally avoids:
- async
- global mutable state
- wall clock reads outside `clock`
*/
