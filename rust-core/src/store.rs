// Entity tables for the ledger. Plain data: no guards live here, callers check
// preconditions before writing. Ordered maps keep snapshots byte-stable.

use crate::types::{
    Address, Airline, Amount, Flight, FlightKey, Insurance, InsuranceState, Oracle, OracleRequest,
    RequestKey,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateStore {
    owner: Address,
    operational: bool,
    authorized: BTreeSet<Address>,
    airlines: BTreeMap<Address, Airline>,
    airline_count: u32,
    flights: BTreeMap<FlightKey, Flight>,
    flight_count: u64,
    insurances: BTreeMap<u64, Insurance>,
    insurance_count: u64,
    insurances_by_flight: BTreeMap<FlightKey, Vec<u64>>,
    insurances_by_passenger: BTreeMap<Address, Vec<u64>>,
    credits: BTreeMap<Address, Amount>,
    oracles: BTreeMap<Address, Oracle>,
    requests: BTreeMap<RequestKey, OracleRequest>,
    treasury: Amount,
}

impl StateStore {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            operational: true,
            ..Self::default()
        }
    }

    // --- access control ---

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_operational(&self) -> bool {
        self.operational
    }

    pub fn set_operational(&mut self, operational: bool) {
        self.operational = operational;
    }

    pub fn is_authorized(&self, caller: &Address) -> bool {
        self.authorized.contains(caller)
    }

    /// Returns false if the caller was already authorized.
    pub fn authorize(&mut self, caller: Address) -> bool {
        self.authorized.insert(caller)
    }

    /// Returns false if the caller was not authorized.
    pub fn deauthorize(&mut self, caller: &Address) -> bool {
        self.authorized.remove(caller)
    }

    // --- airlines ---

    pub fn airline(&self, address: &Address) -> Option<&Airline> {
        self.airlines.get(address)
    }

    pub fn airline_mut(&mut self, address: &Address) -> Option<&mut Airline> {
        self.airlines.get_mut(address)
    }

    pub fn airline_count(&self) -> u32 {
        self.airline_count
    }

    /// Creates the airline with the next id; the caller ensures it is new.
    pub fn insert_airline(&mut self, address: Address) -> &mut Airline {
        self.airline_count = self.airline_count.saturating_add(1);
        let id = self.airline_count;
        self.airlines.entry(address).or_insert_with(|| Airline::new(id))
    }

    pub fn airlines(&self) -> impl Iterator<Item = (&Address, &Airline)> {
        self.airlines.iter()
    }

    // --- flights ---

    pub fn flight(&self, key: &FlightKey) -> Option<&Flight> {
        self.flights.get(key)
    }

    pub fn flight_mut(&mut self, key: &FlightKey) -> Option<&mut Flight> {
        self.flights.get_mut(key)
    }

    pub fn next_flight_id(&mut self) -> u64 {
        self.flight_count = self.flight_count.saturating_add(1);
        self.flight_count
    }

    pub fn insert_flight(&mut self, key: FlightKey, flight: Flight) {
        self.flights.insert(key, flight);
    }

    pub fn flight_count(&self) -> u64 {
        self.flight_count
    }

    // --- insurances ---

    pub fn insurance(&self, id: u64) -> Option<&Insurance> {
        self.insurances.get(&id)
    }

    pub fn insurance_mut(&mut self, id: u64) -> Option<&mut Insurance> {
        self.insurances.get_mut(&id)
    }

    /// Stores a Valid insurance and links it into the flight and passenger indexes.
    pub fn insert_insurance(&mut self, flight: FlightKey, passenger: Address, amount: Amount) -> u64 {
        self.insurance_count = self.insurance_count.saturating_add(1);
        let id = self.insurance_count;
        self.insurances.insert(
            id,
            Insurance {
                id,
                flight,
                passenger,
                amount,
                state: InsuranceState::Valid,
            },
        );
        self.insurances_by_flight.entry(flight).or_default().push(id);
        self.insurances_by_passenger.entry(passenger).or_default().push(id);
        id
    }

    pub fn insurances_for_flight(&self, flight: &FlightKey) -> &[u64] {
        self.insurances_by_flight
            .get(flight)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn insurances_for_passenger(&self, passenger: &Address) -> &[u64] {
        self.insurances_by_passenger
            .get(passenger)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // --- credits & treasury ---

    pub fn credit(&self, passenger: &Address) -> Amount {
        self.credits.get(passenger).copied().unwrap_or(0)
    }

    pub fn add_credit(&mut self, passenger: Address, amount: Amount) -> Amount {
        let balance = self.credits.entry(passenger).or_insert(0);
        *balance = balance.saturating_add(amount);
        *balance
    }

    /// Zeroes the balance and returns what it held.
    pub fn take_credit(&mut self, passenger: &Address) -> Amount {
        self.credits.remove(passenger).unwrap_or(0)
    }

    pub fn treasury(&self) -> Amount {
        self.treasury
    }

    pub fn deposit(&mut self, amount: Amount) {
        self.treasury = self.treasury.saturating_add(amount);
    }

    /// Debits the treasury; false (and no change) if it cannot cover `amount`.
    pub fn debit(&mut self, amount: Amount) -> bool {
        match self.treasury.checked_sub(amount) {
            Some(rest) => {
                self.treasury = rest;
                true
            }
            None => false,
        }
    }

    // --- oracles ---

    pub fn oracle(&self, address: &Address) -> Option<&Oracle> {
        self.oracles.get(address)
    }

    pub fn insert_oracle(&mut self, address: Address, oracle: Oracle) {
        self.oracles.insert(address, oracle);
    }

    pub fn request(&self, key: &RequestKey) -> Option<&OracleRequest> {
        self.requests.get(key)
    }

    pub fn request_mut(&mut self, key: &RequestKey) -> Option<&mut OracleRequest> {
        self.requests.get_mut(key)
    }

    pub fn insert_request(&mut self, key: RequestKey, request: OracleRequest) {
        self.requests.insert(key, request);
    }
}
