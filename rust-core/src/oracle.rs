// Oracle consensus. Oracles pay a fee for three fixed indexes; a status request is
// addressed to one drawn index, and the first status bucket to reach `min_responses`
// distinct reporters finalizes the flight. A finalized request accepts no more reports.

use crate::error::{LedgerError, Result};
use crate::ledger::{Ledger, Tx};
use crate::notify::Notification;
use crate::random::draw_distinct_indexes;
use crate::types::{
    flight_key, request_key, Address, Amount, FlightStatus, Oracle, OracleRequest, RequestKey,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Returned by `fetch_flight_status`: which request oracles should answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleTicket {
    pub key: RequestKey,
    pub index: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseReceipt {
    /// False when this oracle had already reported the same status.
    pub counted: bool,
    /// Distinct reporters for the submitted status.
    pub reports: usize,
    pub finalized: Option<FlightStatus>,
    /// Insurances credited by this response.
    pub credited: Vec<u64>,
}

impl Tx<'_> {
    pub(crate) fn register_oracle(&mut self, oracle: Address, fee: Amount) -> Result<[u8; 3]> {
        let genesis = self.genesis;
        let policy = &genesis.oracles;
        if self.state.oracle(&oracle).is_some() {
            return Err(LedgerError::OracleAlreadyRegistered);
        }
        if fee < policy.registration_fee {
            return Err(LedgerError::InsufficientFee {
                required: policy.registration_fee,
                offered: fee,
            });
        }
        let required = policy.registration_fee;

        let indexes = draw_distinct_indexes(&mut *self.indexes, policy.index_range);
        self.state.insert_oracle(oracle, Oracle { indexes });
        self.state.deposit(required);
        self.pay(oracle, fee - required)?;

        self.emit(Notification::OracleRegistered { oracle, indexes });
        info!(%oracle, ?indexes, "oracle registered");
        Ok(indexes)
    }

    pub(crate) fn fetch_flight_status(
        &mut self,
        requester: Address,
        airline: Address,
        code: &str,
        departure: u64,
    ) -> Result<OracleTicket> {
        if self.state.flight(&flight_key(&airline, code, departure)).is_none() {
            return Err(LedgerError::FlightNotFound);
        }

        let index = self.indexes.draw(self.genesis.oracles.index_range);
        let key = request_key(index, &airline, code, departure);
        if self.state.request(&key).is_some_and(|r| r.open) {
            debug!(request = %key, index, "request already open");
            return Ok(OracleTicket { key, index });
        }

        self.state.insert_request(
            key,
            OracleRequest::new(index, airline, code, departure, requester),
        );
        self.emit(Notification::OracleRequestOpened {
            key,
            index,
            airline,
            code: code.to_string(),
            departure,
        });
        info!(request = %key, index, %airline, code, departure, "oracle request opened");
        Ok(OracleTicket { key, index })
    }

    pub(crate) fn submit_oracle_response(
        &mut self,
        oracle: Address,
        index: u8,
        airline: Address,
        code: &str,
        departure: u64,
        status_code: u8,
    ) -> Result<ResponseReceipt> {
        let assigned = self
            .state
            .oracle(&oracle)
            .is_some_and(|o| o.has_index(index));
        if !assigned {
            return Err(LedgerError::IndexMismatch);
        }
        let status =
            FlightStatus::from_code(status_code).ok_or(LedgerError::UnknownStatusCode(status_code))?;

        let key = request_key(index, &airline, code, departure);
        let request = self
            .state
            .request_mut(&key)
            .filter(|r| r.open)
            .ok_or(LedgerError::RequestNotOpen)?;
        let counted = request
            .responses
            .entry(status_code)
            .or_default()
            .insert(oracle);
        let reports = request.reports_for(status);

        let mut receipt = ResponseReceipt {
            counted,
            reports,
            finalized: None,
            credited: Vec::new(),
        };
        if !counted {
            debug!(%oracle, request = %key, "repeat report ignored");
            return Ok(receipt);
        }

        self.emit(Notification::OracleReportReceived {
            oracle,
            index,
            airline,
            code: code.to_string(),
            departure,
            status,
        });
        debug!(%oracle, request = %key, ?status, reports, "oracle report received");

        if reports >= self.genesis.oracles.min_responses {
            receipt.credited = self.finalize(&key, status)?;
            receipt.finalized = Some(status);
        }
        Ok(receipt)
    }

    /// Closes the request, writes the flight status and pays out airline-caused delays.
    fn finalize(&mut self, key: &RequestKey, status: FlightStatus) -> Result<Vec<u64>> {
        let request = self
            .state
            .request_mut(key)
            .ok_or(LedgerError::RequestNotOpen)?;
        request.open = false;
        request.finalized = Some(status);
        let airline = request.airline;
        let code = request.code.clone();
        let departure = request.departure;

        let flight = flight_key(&airline, &code, departure);
        let now = self.now;
        self.apply_flight_status(&flight, status, now)?;
        self.emit(Notification::FlightStatusFinalized {
            airline,
            code: code.clone(),
            departure,
            status,
        });
        info!(%airline, %code, departure, ?status, "flight status finalized");

        if status.triggers_payout() {
            self.credit_flight(&flight)
        } else {
            Ok(Vec::new())
        }
    }
}

impl Ledger {
    /// Registers `caller` as an oracle; excess fee is returned.
    pub fn register_oracle(&mut self, caller: Address, fee: Amount) -> Result<[u8; 3]> {
        self.transact("register_oracle", |tx| {
            tx.require_operational()?;
            tx.register_oracle(caller, fee)
        })
    }

    pub fn fetch_flight_status(
        &mut self,
        caller: Address,
        airline: Address,
        code: &str,
        departure: u64,
    ) -> Result<OracleTicket> {
        self.transact("fetch_flight_status", |tx| {
            tx.require_operational()?;
            tx.fetch_flight_status(caller, airline, code, departure)
        })
    }

    pub fn submit_oracle_response(
        &mut self,
        caller: Address,
        index: u8,
        airline: Address,
        code: &str,
        departure: u64,
        status_code: u8,
    ) -> Result<ResponseReceipt> {
        self.transact("submit_oracle_response", |tx| {
            tx.require_operational()?;
            tx.submit_oracle_response(caller, index, airline, code, departure, status_code)
        })
    }

    pub fn oracle_indexes(&self, oracle: &Address) -> Option<[u8; 3]> {
        self.state.oracle(oracle).map(|o| o.indexes)
    }

    pub fn request(&self, key: &RequestKey) -> Option<&OracleRequest> {
        self.state.request(key)
    }
}
