// Airline lifecycle: registration by an operable elector, one-time stake funding,
// and vote-based acceptance once the bootstrap window is exhausted.

use crate::error::{LedgerError, Result};
use crate::ledger::{Ledger, Tx};
use crate::notify::Notification;
use crate::types::{Address, Airline, Amount};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Where a candidate stands after a registration or vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub airline: Address,
    pub id: u32,
    pub votes: usize,
    pub accepted: bool,
}

impl Admission {
    fn of(address: Address, airline: &Airline) -> Self {
        Self {
            airline: address,
            id: airline.id,
            votes: airline.vote_count(),
            accepted: airline.accepted,
        }
    }
}

impl Tx<'_> {
    /// Elector must be registered, accepted and funded. Returns its id.
    fn require_elector(&self, elector: &Address) -> Result<u32> {
        let airline = self
            .state
            .airline(elector)
            .ok_or(LedgerError::AirlineNotFound)?;
        if !airline.accepted {
            return Err(LedgerError::AirlineNotAccepted);
        }
        if !airline.funded {
            return Err(LedgerError::AirlineNotFunded);
        }
        Ok(airline.id)
    }

    pub(crate) fn register_airline(
        &mut self,
        elector: Address,
        candidate: Address,
    ) -> Result<Admission> {
        let elector_id = self.require_elector(&elector)?;
        let genesis = self.genesis;
        let policy = &genesis.airlines;

        if self.state.airline(&candidate).is_some() {
            return self.cast_vote(elector, elector_id, candidate, policy.acceptance_threshold);
        }

        // Count after this insert <= bootstrap window.
        let within_bootstrap = self.state.airline_count() < policy.bootstrap_airlines;
        let airline = self.state.insert_airline(candidate);
        airline.votes.insert(elector_id);
        airline.accepted =
            within_bootstrap || airline.vote_count() > policy.acceptance_threshold as usize;
        let admission = Admission::of(candidate, airline);

        self.emit(Notification::AirlineAdded {
            airline: candidate,
            id: admission.id,
            elector,
            accepted: admission.accepted,
        });
        info!(
            airline = %candidate,
            id = admission.id,
            accepted = admission.accepted,
            "airline registered"
        );
        Ok(admission)
    }

    pub(crate) fn vote_airline(
        &mut self,
        elector: Address,
        candidate: Address,
        threshold: u32,
    ) -> Result<Admission> {
        let elector_id = self.require_elector(&elector)?;
        self.cast_vote(elector, elector_id, candidate, threshold)
    }

    /// Accepted candidates are left alone; a repeat elector is refused.
    fn cast_vote(
        &mut self,
        elector: Address,
        elector_id: u32,
        candidate: Address,
        threshold: u32,
    ) -> Result<Admission> {
        let airline = self
            .state
            .airline_mut(&candidate)
            .ok_or(LedgerError::AirlineNotFound)?;
        if airline.accepted {
            return Ok(Admission::of(candidate, airline));
        }
        if !airline.votes.insert(elector_id) {
            return Err(LedgerError::AlreadyVoted);
        }
        airline.accepted = airline.vote_count() > threshold as usize;
        let admission = Admission::of(candidate, airline);

        self.emit(Notification::AirlineVoted {
            airline: candidate,
            elector,
            votes: admission.votes,
            accepted: admission.accepted,
        });
        debug!(
            airline = %candidate,
            %elector,
            votes = admission.votes,
            threshold,
            accepted = admission.accepted,
            "airline vote recorded"
        );
        Ok(admission)
    }

    /// Escrows exactly the minimum stake; the excess goes back to `payer`.
    pub(crate) fn fund_airline(
        &mut self,
        payer: Address,
        airline: Address,
        stake: Amount,
    ) -> Result<()> {
        let min_stake = self.genesis.airlines.min_stake;
        let record = self
            .state
            .airline_mut(&airline)
            .ok_or(LedgerError::AirlineNotFound)?;
        if record.funded {
            return Err(LedgerError::AlreadyFunded);
        }
        if stake < min_stake {
            return Err(LedgerError::InsufficientStake {
                required: min_stake,
                offered: stake,
            });
        }
        record.funded = true;

        self.state.deposit(min_stake);
        self.pay(payer, stake - min_stake)?;
        self.emit(Notification::AirlineFunded {
            airline,
            stake: min_stake,
        });
        info!(%airline, stake = min_stake, change = stake - min_stake, "airline funded");
        Ok(())
    }
}

impl Ledger {
    pub fn register_airline(&mut self, elector: Address, candidate: Address) -> Result<Admission> {
        self.transact("register_airline", |tx| {
            tx.require_operational()?;
            tx.register_airline(elector, candidate)
        })
    }

    /// Vote with an explicit acceptance threshold (votes must exceed it).
    pub fn vote_airline(
        &mut self,
        elector: Address,
        candidate: Address,
        threshold: u32,
    ) -> Result<Admission> {
        self.transact("vote_airline", |tx| {
            tx.require_operational()?;
            tx.vote_airline(elector, candidate, threshold)
        })
    }

    pub fn fund_airline(&mut self, payer: Address, airline: Address, stake: Amount) -> Result<()> {
        self.transact("fund_airline", |tx| {
            tx.require_operational()?;
            tx.fund_airline(payer, airline, stake)
        })
    }

    /// A plain payment with no operation funds the paying airline.
    pub fn deposit(&mut self, caller: Address, amount: Amount) -> Result<()> {
        self.fund_airline(caller, caller, amount)
    }

    pub fn airline(&self, address: &Address) -> Option<&Airline> {
        self.state.airline(address)
    }

    pub fn is_airline_registered(&self, address: &Address) -> bool {
        self.state.airline(address).is_some()
    }

    pub fn is_airline_operable(&self, address: &Address) -> bool {
        self.state
            .airline(address)
            .is_some_and(Airline::is_operable)
    }

    pub fn airline_count(&self) -> u32 {
        self.state.airline_count()
    }
}
