// The authoritative ledger. Every mutating call runs against a working copy of the
// state store; the copy replaces committed state only when the call body and its
// outbound transfer both succeed. Notifications go out after the commit.

use crate::clock::{Clock, SystemClock};
use crate::config::GenesisConfig;
use crate::error::{LedgerError, Result};
use crate::funds::{FundsTransfer, LoggedTransfers, Transfer};
use crate::notify::{EventSink, Notification};
use crate::random::{IndexSource, SeededIndexSource};
use crate::store::StateStore;
use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Everything needed to bring a ledger back: committed state plus the index stream.
/// Storage only; the seed would let a reader predict the next request index.
/// Readers get `Ledger::state` instead.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub state: StateStore,
    pub index_seed: u64,
    pub index_position: u128,
}

pub struct Ledger {
    pub(crate) genesis: GenesisConfig,
    pub(crate) state: StateStore,
    indexes: Box<dyn IndexSource>,
    clock: Box<dyn Clock>,
    funds: Box<dyn FundsTransfer>,
    sinks: Vec<Box<dyn EventSink>>,
}

/// Working set of a single call. At most one outbound transfer may be scheduled;
/// a second `pay` fails the call with `DuplicateTransfer`.
pub(crate) struct Tx<'a> {
    pub(crate) state: StateStore,
    pub(crate) genesis: &'a GenesisConfig,
    pub(crate) indexes: &'a mut dyn IndexSource,
    pub(crate) now: u64,
    events: Vec<Notification>,
    payout: Option<Transfer>,
}

impl Tx<'_> {
    pub(crate) fn emit(&mut self, event: Notification) {
        self.events.push(event);
    }

    /// Schedules the call's single outbound transfer; zero amounts are dropped.
    pub(crate) fn pay(&mut self, to: Address, amount: Amount) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        if self.payout.is_some() {
            return Err(LedgerError::DuplicateTransfer);
        }
        self.payout = Some(Transfer { to, amount });
        Ok(())
    }
}

pub struct LedgerBuilder {
    genesis: GenesisConfig,
    restored: Option<StateStore>,
    indexes: Option<Box<dyn IndexSource>>,
    clock: Box<dyn Clock>,
    funds: Box<dyn FundsTransfer>,
    sinks: Vec<Box<dyn EventSink>>,
}

impl LedgerBuilder {
    pub fn index_source(mut self, source: impl IndexSource + 'static) -> Self {
        self.indexes = Some(Box::new(source));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn funds(mut self, funds: impl FundsTransfer + 'static) -> Self {
        self.funds = Box::new(funds);
        self
    }

    pub fn sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Start from a snapshot instead of genesis. Overrides any index source set earlier.
    pub fn restore(mut self, snapshot: PersistedSnapshot) -> Self {
        self.indexes = Some(Box::new(SeededIndexSource::resume(
            snapshot.index_seed,
            snapshot.index_position,
        )));
        self.restored = Some(snapshot.state);
        self
    }

    pub fn build(self) -> Result<Ledger> {
        self.genesis.validate()?;

        let indexes = match self.indexes {
            Some(source) => source,
            None => match self.genesis.oracles.seed {
                Some(seed) => Box::new(SeededIndexSource::new(seed)),
                None => Box::new(SeededIndexSource::from_entropy()),
            },
        };

        let state = match self.restored {
            Some(state) => {
                if state.owner() != self.genesis.owner {
                    return Err(LedgerError::InvalidConfig(
                        "snapshot owner differs from genesis owner".into(),
                    ));
                }
                state
            }
            None => genesis_state(&self.genesis),
        };

        info!(
            owner = %state.owner(),
            airlines = state.airline_count(),
            flights = state.flight_count(),
            "ledger ready"
        );

        Ok(Ledger {
            genesis: self.genesis,
            state,
            indexes,
            clock: self.clock,
            funds: self.funds,
            sinks: self.sinks,
        })
    }
}

fn genesis_state(genesis: &GenesisConfig) -> StateStore {
    let mut state = StateStore::new(genesis.owner);
    for caller in &genesis.authorized_callers {
        state.authorize(*caller);
    }
    let first = state.insert_airline(genesis.first_airline);
    first.funded = true;
    first.accepted = true;
    state
}

impl Ledger {
    pub fn builder(genesis: GenesisConfig) -> LedgerBuilder {
        LedgerBuilder {
            genesis,
            restored: None,
            indexes: None,
            clock: Box::new(SystemClock),
            funds: Box::new(LoggedTransfers),
            sinks: Vec::new(),
        }
    }

    pub fn genesis(&self) -> &GenesisConfig {
        &self.genesis
    }

    /// Committed state; never reflects a call in progress.
    pub fn state(&self) -> &StateStore {
        &self.state
    }

    /// Form written to disk; not for callers.
    pub fn persisted(&self) -> PersistedSnapshot {
        PersistedSnapshot {
            state: self.state.clone(),
            index_seed: self.indexes.seed(),
            index_position: self.indexes.position(),
        }
    }

    pub fn treasury(&self) -> Amount {
        self.state.treasury()
    }

    pub(crate) fn transact<T>(
        &mut self,
        op: &'static str,
        body: impl FnOnce(&mut Tx<'_>) -> Result<T>,
    ) -> Result<T> {
        // Draws made by a failed call are undone with the rest of it.
        let position = self.indexes.position();
        let mut tx = Tx {
            state: self.state.clone(),
            genesis: &self.genesis,
            indexes: self.indexes.as_mut(),
            now: self.clock.now(),
            events: Vec::new(),
            payout: None,
        };

        let res = body(&mut tx);
        let Tx {
            state,
            events,
            payout,
            ..
        } = tx;

        let out = match res {
            Ok(out) => out,
            Err(e) => {
                self.indexes.rewind(position);
                debug!(op, error = %e, "call rejected");
                return Err(e);
            }
        };

        // Internal writes are final in `state`; the transfer is the last effect.
        if let Some(Transfer { to, amount }) = payout
            && let Err(e) = self.funds.transfer(to, amount)
        {
            self.indexes.rewind(position);
            warn!(op, %to, amount, error = %e, "outbound transfer failed, call rolled back");
            return Err(LedgerError::TransferFailed(e));
        }

        self.state = state;
        for event in &events {
            for sink in &self.sinks {
                sink.notify(event);
            }
        }
        Ok(out)
    }
}
