// Serializable call surface. Every mutating ledger operation has a `Call` variant, so
// a host can queue, log and replay calls as JSON.

use crate::airline::Admission;
use crate::error::Result;
use crate::ledger::Ledger;
use crate::oracle::{OracleTicket, ResponseReceipt};
use crate::types::{Address, Amount, FlightKey, FlightStatus};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    SetOperationalStatus {
        caller: Address,
        operational: bool,
    },
    AuthorizeCaller {
        caller: Address,
        target: Address,
    },
    DeauthorizeCaller {
        caller: Address,
        target: Address,
    },
    RegisterAirline {
        elector: Address,
        candidate: Address,
    },
    FundAirline {
        caller: Address,
        airline: Address,
        stake: Amount,
    },
    /// Plain payment with no operation.
    Deposit {
        caller: Address,
        amount: Amount,
    },
    VoteAirline {
        elector: Address,
        candidate: Address,
        threshold: u32,
    },
    RegisterFlight {
        airline: Address,
        code: String,
        departure: u64,
    },
    SetFlightStatus {
        caller: Address,
        flight: FlightKey,
        status: FlightStatus,
        updated_at: u64,
    },
    BuyInsurance {
        caller: Address,
        flight: FlightKey,
        passenger: Address,
        amount: Amount,
    },
    CreditInsurees {
        caller: Address,
        insurance_id: u64,
        multiplier_pct: u64,
    },
    Withdraw {
        caller: Address,
        passenger: Address,
    },
    RegisterOracle {
        caller: Address,
        fee: Amount,
    },
    FetchFlightStatus {
        caller: Address,
        airline: Address,
        code: String,
        departure: u64,
    },
    SubmitOracleResponse {
        caller: Address,
        index: u8,
        airline: Address,
        code: String,
        departure: u64,
        status_code: u8,
    },
}

impl Call {
    pub fn name(&self) -> &'static str {
        match self {
            Call::SetOperationalStatus { .. } => "set_operational_status",
            Call::AuthorizeCaller { .. } => "authorize_caller",
            Call::DeauthorizeCaller { .. } => "deauthorize_caller",
            Call::RegisterAirline { .. } => "register_airline",
            Call::FundAirline { .. } => "fund_airline",
            Call::Deposit { .. } => "deposit",
            Call::VoteAirline { .. } => "vote_airline",
            Call::RegisterFlight { .. } => "register_flight",
            Call::SetFlightStatus { .. } => "set_flight_status",
            Call::BuyInsurance { .. } => "buy_insurance",
            Call::CreditInsurees { .. } => "credit_insurees",
            Call::Withdraw { .. } => "withdraw",
            Call::RegisterOracle { .. } => "register_oracle",
            Call::FetchFlightStatus { .. } => "fetch_flight_status",
            Call::SubmitOracleResponse { .. } => "submit_oracle_response",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Done,
    Admission(Admission),
    Flight { key: FlightKey },
    Insurance { id: u64 },
    Credited { amount: Amount },
    Withdrawn { amount: Amount },
    OracleIndexes { indexes: [u8; 3] },
    Ticket(OracleTicket),
    Response(ResponseReceipt),
}

impl Ledger {
    pub fn apply(&mut self, call: Call) -> Result<Outcome> {
        Ok(match call {
            Call::SetOperationalStatus {
                caller,
                operational,
            } => {
                self.set_operational_status(caller, operational)?;
                Outcome::Done
            }
            Call::AuthorizeCaller { caller, target } => {
                self.authorize_caller(caller, target)?;
                Outcome::Done
            }
            Call::DeauthorizeCaller { caller, target } => {
                self.deauthorize_caller(caller, target)?;
                Outcome::Done
            }
            Call::RegisterAirline { elector, candidate } => {
                Outcome::Admission(self.register_airline(elector, candidate)?)
            }
            Call::FundAirline {
                caller,
                airline,
                stake,
            } => {
                self.fund_airline(caller, airline, stake)?;
                Outcome::Done
            }
            Call::Deposit { caller, amount } => {
                self.deposit(caller, amount)?;
                Outcome::Done
            }
            Call::VoteAirline {
                elector,
                candidate,
                threshold,
            } => Outcome::Admission(self.vote_airline(elector, candidate, threshold)?),
            Call::RegisterFlight {
                airline,
                code,
                departure,
            } => Outcome::Flight {
                key: self.register_flight(airline, &code, departure)?,
            },
            Call::SetFlightStatus {
                caller,
                flight,
                status,
                updated_at,
            } => {
                self.set_flight_status(caller, flight, status, updated_at)?;
                Outcome::Done
            }
            Call::BuyInsurance {
                caller,
                flight,
                passenger,
                amount,
            } => Outcome::Insurance {
                id: self.buy_insurance(caller, flight, passenger, amount)?,
            },
            Call::CreditInsurees {
                caller,
                insurance_id,
                multiplier_pct,
            } => Outcome::Credited {
                amount: self.credit_insurees(caller, insurance_id, multiplier_pct)?,
            },
            Call::Withdraw { caller, passenger } => Outcome::Withdrawn {
                amount: self.withdraw(caller, passenger)?,
            },
            Call::RegisterOracle { caller, fee } => Outcome::OracleIndexes {
                indexes: self.register_oracle(caller, fee)?,
            },
            Call::FetchFlightStatus {
                caller,
                airline,
                code,
                departure,
            } => Outcome::Ticket(self.fetch_flight_status(caller, airline, &code, departure)?),
            Call::SubmitOracleResponse {
                caller,
                index,
                airline,
                code,
                departure,
                status_code,
            } => Outcome::Response(self.submit_oracle_response(
                caller,
                index,
                airline,
                &code,
                departure,
                status_code,
            )?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GenesisConfig;
    use crate::error::LedgerError;
    use crate::random::ScriptedIndexSource;

    const OWNER: Address = Address([0xAA; 32]);
    const FIRST: Address = Address([1; 32]);

    fn ledger() -> Ledger {
        Ledger::builder(GenesisConfig::new(OWNER, FIRST))
            .index_source(ScriptedIndexSource::default())
            .build()
            .unwrap()
    }

    #[test]
    fn calls_parse_from_json() {
        let line = format!(
            r#"{{"op":"register_flight","airline":"0x{FIRST}","code":"ND1309","departure":1700000000}}"#
        );
        let call: Call = serde_json::from_str(&line).unwrap();
        assert_eq!(call.name(), "register_flight");

        let mut l = ledger();
        let Outcome::Flight { key } = l.apply(call).unwrap() else {
            panic!("expected a flight outcome");
        };
        assert!(l.flight(&key).is_some());
    }

    #[test]
    fn apply_surfaces_ledger_errors() {
        let mut l = ledger();
        let call = Call::SetOperationalStatus {
            caller: FIRST,
            operational: false,
        };
        assert_eq!(l.apply(call), Err(LedgerError::NotOwner));

        let outcome = l
            .apply(Call::RegisterAirline {
                elector: FIRST,
                candidate: Address([2; 32]),
            })
            .unwrap();
        assert!(matches!(outcome, Outcome::Admission(a) if a.accepted && a.id == 2));
    }

    #[test]
    fn outcome_is_tagged() {
        let json = serde_json::to_value(Outcome::Insurance { id: 3 }).unwrap();
        assert_eq!(json["outcome"], "insurance");
        assert_eq!(json["id"], 3);
    }
}
