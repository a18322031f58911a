// Insurance pool: premium escrow, tiered payout credit and passenger withdrawal.

use crate::config::PayoutTier;
use crate::error::{LedgerError, Result};
use crate::ledger::{Ledger, Tx};
use crate::notify::Notification;
use crate::types::{Address, Amount, FlightKey, Insurance, InsuranceState};
use tracing::{debug, info};

/// `amount * pct / 100`, saturating at `Amount::MAX`.
pub fn payout_for(amount: Amount, multiplier_pct: u64) -> Amount {
    let credit = amount as u128 * multiplier_pct as u128 / 100;
    Amount::try_from(credit).unwrap_or(Amount::MAX)
}

impl Tx<'_> {
    pub(crate) fn buy_insurance(
        &mut self,
        flight: FlightKey,
        passenger: Address,
        amount: Amount,
    ) -> Result<u64> {
        if self.state.flight(&flight).is_none() {
            return Err(LedgerError::FlightNotFound);
        }
        let max = self.genesis.insurance.max_premium;
        if amount == 0 || max.is_some_and(|max| amount > max) {
            return Err(LedgerError::PremiumOutOfRange { amount, max });
        }

        let id = self.state.insert_insurance(flight, passenger, amount);
        self.state.deposit(amount);
        self.emit(Notification::InsuranceAdded {
            id,
            flight,
            passenger,
            amount,
        });
        info!(id, %flight, %passenger, amount, "insurance bought");
        Ok(id)
    }

    /// Valid -> Refunded, crediting the passenger. Returns the credited amount.
    pub(crate) fn credit_insuree(&mut self, id: u64, multiplier_pct: u64) -> Result<Amount> {
        let insurance = self
            .state
            .insurance_mut(id)
            .ok_or(LedgerError::InsuranceNotFound)?;
        if insurance.state != InsuranceState::Valid {
            return Err(LedgerError::InsuranceNotValid);
        }
        insurance.state = InsuranceState::Refunded;
        let passenger = insurance.passenger;
        let credit = payout_for(insurance.amount, multiplier_pct);

        let balance = self.state.add_credit(passenger, credit);
        self.emit(Notification::InsuranceRefunded {
            id,
            passenger,
            credit,
        });
        debug!(id, %passenger, credit, balance, "insuree credited");
        Ok(credit)
    }

    /// Credits every Valid insurance on `flight` at its tier multiplier.
    pub(crate) fn credit_flight(&mut self, flight: &FlightKey) -> Result<Vec<u64>> {
        let genesis = self.genesis;
        let due: Vec<(u64, u64)> = self
            .state
            .insurances_for_flight(flight)
            .iter()
            .filter_map(|id| self.state.insurance(*id))
            .filter(|i| i.state == InsuranceState::Valid)
            .map(|i| (i.id, genesis.insurance.tier_for(i.amount).multiplier_pct))
            .collect();

        let mut credited = Vec::with_capacity(due.len());
        for (id, pct) in due {
            self.credit_insuree(id, pct)?;
            credited.push(id);
        }
        if !credited.is_empty() {
            info!(%flight, insurances = credited.len(), "flight payouts credited");
        }
        Ok(credited)
    }

    pub(crate) fn withdraw(&mut self, caller: &Address, passenger: Address) -> Result<Amount> {
        if *caller != passenger {
            self.require_authorized(caller)?;
        }
        let amount = self.state.credit(&passenger);
        if amount == 0 {
            return Err(LedgerError::NoCreditBalance);
        }
        let available = self.state.treasury();
        if !self.state.debit(amount) {
            return Err(LedgerError::TreasuryExhausted {
                required: amount,
                available,
            });
        }
        self.state.take_credit(&passenger);

        self.pay(passenger, amount)?;
        self.emit(Notification::CreditWithdrawn { passenger, amount });
        info!(%passenger, amount, "credit withdrawn");
        Ok(amount)
    }
}

impl Ledger {
    pub fn buy_insurance(
        &mut self,
        caller: Address,
        flight: FlightKey,
        passenger: Address,
        amount: Amount,
    ) -> Result<u64> {
        self.transact("buy_insurance", |tx| {
            tx.require_operational()?;
            tx.require_authorized(&caller)?;
            tx.buy_insurance(flight, passenger, amount)
        })
    }

    pub fn credit_insurees(
        &mut self,
        caller: Address,
        insurance_id: u64,
        multiplier_pct: u64,
    ) -> Result<Amount> {
        self.transact("credit_insurees", |tx| {
            tx.require_operational()?;
            tx.require_authorized(&caller)?;
            tx.credit_insuree(insurance_id, multiplier_pct)
        })
    }

    /// Pays out the passenger's whole credit balance.
    pub fn withdraw(&mut self, caller: Address, passenger: Address) -> Result<Amount> {
        self.transact("withdraw", |tx| {
            tx.require_operational()?;
            tx.withdraw(&caller, passenger)
        })
    }

    /// Payout tier for a premium of `amount`.
    pub fn define_insurance_multiplier(&self, amount: Amount) -> &PayoutTier {
        self.genesis.insurance.tier_for(amount)
    }

    pub fn insurance(&self, id: u64) -> Option<&Insurance> {
        self.state.insurance(id)
    }

    pub fn is_passenger_insured(&self, passenger: &Address, flight: &FlightKey) -> bool {
        self.insurances_of(passenger)
            .iter()
            .any(|i| &i.flight == flight)
    }

    pub fn insurances_of(&self, passenger: &Address) -> Vec<&Insurance> {
        self.state
            .insurances_for_passenger(passenger)
            .iter()
            .filter_map(|id| self.state.insurance(*id))
            .collect()
    }

    pub fn insurances_for(&self, flight: &FlightKey) -> Vec<&Insurance> {
        self.state
            .insurances_for_flight(flight)
            .iter()
            .filter_map(|id| self.state.insurance(*id))
            .collect()
    }

    pub fn credit_of(&self, passenger: &Address) -> Amount {
        self.state.credit(passenger)
    }
}
