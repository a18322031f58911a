// Access/operational guards, applied at the top of each call before any write.

use crate::error::{LedgerError, Result};
use crate::ledger::{Ledger, Tx};
use crate::notify::Notification;
use crate::types::Address;
use tracing::{info, warn};

impl Tx<'_> {
    pub(crate) fn require_operational(&self) -> Result<()> {
        if !self.state.is_operational() {
            return Err(LedgerError::NotOperational);
        }
        Ok(())
    }

    pub(crate) fn require_owner(&self, caller: &Address) -> Result<()> {
        if *caller != self.state.owner() {
            return Err(LedgerError::NotOwner);
        }
        Ok(())
    }

    pub(crate) fn require_authorized(&self, caller: &Address) -> Result<()> {
        if !self.state.is_authorized(caller) {
            return Err(LedgerError::NotAuthorized);
        }
        Ok(())
    }
}

impl Ledger {
    /// Owner-only halt switch; the one call still accepted while halted.
    pub fn set_operational_status(&mut self, caller: Address, operational: bool) -> Result<()> {
        self.transact("set_operational_status", |tx| {
            tx.require_owner(&caller)?;
            if tx.state.is_operational() == operational {
                return Ok(());
            }
            tx.state.set_operational(operational);
            tx.emit(Notification::OperationalStatusChanged { operational });
            if operational {
                info!("ledger resumed");
            } else {
                warn!("ledger halted by owner");
            }
            Ok(())
        })
    }

    pub fn authorize_caller(&mut self, caller: Address, target: Address) -> Result<()> {
        self.transact("authorize_caller", |tx| {
            tx.require_operational()?;
            tx.require_owner(&caller)?;
            if tx.state.authorize(target) {
                tx.emit(Notification::CallerAuthorized { caller: target });
            }
            Ok(())
        })
    }

    pub fn deauthorize_caller(&mut self, caller: Address, target: Address) -> Result<()> {
        self.transact("deauthorize_caller", |tx| {
            tx.require_operational()?;
            tx.require_owner(&caller)?;
            if tx.state.deauthorize(&target) {
                tx.emit(Notification::CallerDeauthorized { caller: target });
            }
            Ok(())
        })
    }

    pub fn is_operational(&self) -> bool {
        self.state.is_operational()
    }

    pub fn is_authorized(&self, caller: &Address) -> bool {
        self.state.is_authorized(caller)
    }
}
