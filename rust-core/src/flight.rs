// Flight registry. Only operable airlines add flights; status moves through
// oracle finalization or the authorized override below.

use crate::error::{LedgerError, Result};
use crate::ledger::{Ledger, Tx};
use crate::notify::Notification;
use crate::types::{flight_key, Address, Flight, FlightKey, FlightStatus};
use tracing::info;

impl Tx<'_> {
    pub(crate) fn register_flight(
        &mut self,
        airline: Address,
        code: &str,
        departure: u64,
    ) -> Result<FlightKey> {
        let record = self
            .state
            .airline(&airline)
            .ok_or(LedgerError::AirlineNotFound)?;
        if !record.accepted {
            return Err(LedgerError::AirlineNotAccepted);
        }
        if !record.funded {
            return Err(LedgerError::AirlineNotFunded);
        }

        let key = flight_key(&airline, code, departure);
        if self.state.flight(&key).is_some() {
            return Err(LedgerError::FlightAlreadyExists);
        }

        let id = self.state.next_flight_id();
        self.state.insert_flight(
            key,
            Flight {
                id,
                airline,
                code: code.to_string(),
                departure,
                status: FlightStatus::Unknown,
                updated_at: self.now,
            },
        );
        if let Some(record) = self.state.airline_mut(&airline) {
            record.flights.push(key);
        }

        self.emit(Notification::FlightAdded {
            key,
            airline,
            code: code.to_string(),
            departure,
        });
        info!(%airline, code, departure, id, flight = %key, "flight registered");
        Ok(key)
    }

    /// Last writer wins; no ordering check on `updated_at`.
    pub(crate) fn apply_flight_status(
        &mut self,
        key: &FlightKey,
        status: FlightStatus,
        updated_at: u64,
    ) -> Result<()> {
        let flight = self
            .state
            .flight_mut(key)
            .ok_or(LedgerError::FlightNotFound)?;
        flight.status = status;
        flight.updated_at = updated_at;

        self.emit(Notification::FlightStatusChanged {
            key: *key,
            status,
            updated_at,
        });
        Ok(())
    }
}

impl Ledger {
    pub fn register_flight(
        &mut self,
        airline: Address,
        code: &str,
        departure: u64,
    ) -> Result<FlightKey> {
        self.transact("register_flight", |tx| {
            tx.require_operational()?;
            tx.register_flight(airline, code, departure)
        })
    }

    pub fn set_flight_status(
        &mut self,
        caller: Address,
        key: FlightKey,
        status: FlightStatus,
        updated_at: u64,
    ) -> Result<()> {
        self.transact("set_flight_status", |tx| {
            tx.require_operational()?;
            tx.require_authorized(&caller)?;
            tx.apply_flight_status(&key, status, updated_at)?;
            info!(flight = %key, ?status, updated_at, "flight status set");
            Ok(())
        })
    }

    pub fn flight(&self, key: &FlightKey) -> Option<&Flight> {
        self.state.flight(key)
    }

    pub fn flight_by(&self, airline: &Address, code: &str, departure: u64) -> Option<&Flight> {
        self.state.flight(&flight_key(airline, code, departure))
    }

    pub fn is_flight_registered(&self, airline: &Address, code: &str, departure: u64) -> bool {
        self.flight_by(airline, code, departure).is_some()
    }

    /// Flights of `airline` in registration order.
    pub fn flights_of(&self, airline: &Address) -> Vec<&Flight> {
        self.state
            .airline(airline)
            .map(|a| a.flights.iter().filter_map(|k| self.state.flight(k)).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::GenesisConfig;
    use crate::notify::Journal;
    use crate::random::ScriptedIndexSource;

    const OWNER: Address = Address([0xAA; 32]);
    const APP: Address = Address([0xA1; 32]);
    const FIRST: Address = Address([1; 32]);
    const T: u64 = 1_700_000_000;

    fn ledger(clock: ManualClock, journal: Journal) -> Ledger {
        let mut genesis = GenesisConfig::new(OWNER, FIRST);
        genesis.authorized_callers.push(APP);
        Ledger::builder(genesis)
            .index_source(ScriptedIndexSource::default())
            .clock(clock)
            .sink(journal)
            .build()
            .unwrap()
    }

    #[test]
    fn registered_flight_resolves_by_key_and_triple() {
        let clock = ManualClock::new(T - 3600);
        let mut l = ledger(clock, Journal::new());
        let key = l.register_flight(FIRST, "222222", T).unwrap();

        assert!(l.is_flight_registered(&FIRST, "222222", T));
        assert!(!l.is_flight_registered(&FIRST, "222222", T + 1));
        let by_key = l.flight(&key).unwrap();
        assert_eq!(by_key, l.flight_by(&FIRST, "222222", T).unwrap());
        assert_eq!(by_key.id, 1);
        assert_eq!(by_key.status, FlightStatus::Unknown);
        assert_eq!(by_key.updated_at, T - 3600);
        assert_eq!(by_key.key(), key);
    }

    #[test]
    fn duplicate_flight_is_rejected() {
        let mut l = ledger(ManualClock::new(0), Journal::new());
        l.register_flight(FIRST, "ND1309", T).unwrap();
        assert_eq!(
            l.register_flight(FIRST, "ND1309", T),
            Err(LedgerError::FlightAlreadyExists)
        );
        let second = l.register_flight(FIRST, "ND1310", T).unwrap();
        assert_eq!(l.flight(&second).unwrap().id, 2);
        let codes: Vec<_> = l.flights_of(&FIRST).iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, ["ND1309", "ND1310"]);
    }

    #[test]
    fn only_operable_airlines_register_flights() {
        let mut l = ledger(ManualClock::new(0), Journal::new());
        let b = Address([2; 32]);
        l.register_airline(FIRST, b).unwrap();
        assert_eq!(
            l.register_flight(b, "X1", T),
            Err(LedgerError::AirlineNotFunded)
        );
        assert_eq!(
            l.register_flight(Address([9; 32]), "X1", T),
            Err(LedgerError::AirlineNotFound)
        );
        assert!(l.flights_of(&b).is_empty());
    }

    #[test]
    fn status_override_requires_authorization() {
        let journal = Journal::new();
        let mut l = ledger(ManualClock::new(0), journal.clone());
        let key = l.register_flight(FIRST, "ND1309", T).unwrap();

        assert_eq!(
            l.set_flight_status(FIRST, key, FlightStatus::OnTime, T),
            Err(LedgerError::NotAuthorized)
        );
        assert_eq!(
            l.set_flight_status(APP, FlightKey([0; 32]), FlightStatus::OnTime, T),
            Err(LedgerError::FlightNotFound)
        );

        l.set_flight_status(APP, key, FlightStatus::LateWeather, T + 60)
            .unwrap();
        // Older timestamp still wins.
        l.set_flight_status(APP, key, FlightStatus::OnTime, T).unwrap();
        let flight = l.flight(&key).unwrap();
        assert_eq!((flight.status, flight.updated_at), (FlightStatus::OnTime, T));
        assert_eq!(
            journal.count(|e| matches!(e, Notification::FlightStatusChanged { .. })),
            2
        );
    }
}
