use flightsure_core::clock::ManualClock;
use flightsure_core::funds::RecordingTransfers;
use flightsure_core::notify::{Journal, Notification};
use flightsure_core::random::ScriptedIndexSource;
use flightsure_core::types::InsuranceState;
use flightsure_core::{
    Address, Amount, FlightKey, FlightStatus, GenesisConfig, Ledger, LedgerError, ONE_ETHER,
};

const DEPARTURE: u64 = 1_700_000_000;
const STAKE: Amount = 10 * ONE_ETHER;

fn owner() -> Address {
    Address::from_label("owner")
}

fn app() -> Address {
    Address::from_label("app")
}

fn airline(n: u8) -> Address {
    Address::from_label(&format!("airline-{n}"))
}

fn oracle(n: u8) -> Address {
    Address::from_label(&format!("oracle-{n}"))
}

fn passenger(n: u8) -> Address {
    Address::from_label(&format!("passenger-{n}"))
}

struct World {
    ledger: Ledger,
    funds: RecordingTransfers,
    journal: Journal,
    clock: ManualClock,
}

fn world_with(script: Vec<u8>) -> World {
    let mut genesis = GenesisConfig::new(owner(), airline(1));
    genesis.authorized_callers.push(app());
    let funds = RecordingTransfers::new();
    let journal = Journal::new();
    let clock = ManualClock::new(DEPARTURE - 86_400);
    let ledger = Ledger::builder(genesis)
        .index_source(ScriptedIndexSource::new(script))
        .clock(clock.clone())
        .funds(funds.clone())
        .sink(journal.clone())
        .build()
        .expect("ledger");
    World {
        ledger,
        funds,
        journal,
        clock,
    }
}

fn world() -> World {
    world_with(Vec::new())
}

/// Airlines 1..=4 admitted and funded.
fn bootstrap(w: &mut World) {
    for n in 2..=4 {
        w.ledger.register_airline(airline(1), airline(n)).expect("register");
        w.ledger.fund_airline(airline(n), airline(n), STAKE).expect("fund");
    }
}

/// Oracles 1..=5, each holding index 7; the first fetch is routed to index 7.
fn oracle_world() -> World {
    let mut script = Vec::new();
    for n in 0..5u8 {
        script.extend([7, n, 8 + (n % 2)]);
    }
    script.push(7);
    let mut w = world_with(script);
    for n in 1..=5 {
        let indexes = w.ledger.register_oracle(oracle(n), ONE_ETHER).expect("oracle");
        assert!(indexes.contains(&7));
    }
    w
}

fn report(w: &mut World, n: u8, code: &str, status: FlightStatus) -> Result<(), LedgerError> {
    w.ledger
        .submit_oracle_response(oracle(n), 7, airline(1), code, DEPARTURE, status.code())
        .map(|_| ())
}

#[test]
fn scenario_1_bootstrap_airline_funds_with_minimum_stake() {
    let mut w = world();
    bootstrap(&mut w);
    let a = w.ledger.airline(&airline(2)).unwrap();
    assert!(a.funded);
    assert!(a.accepted);
    assert_eq!(w.ledger.treasury(), 3 * STAKE);
    assert!(w.funds.sent().is_empty());
}

#[test]
fn scenario_2_registered_airline_is_accepted_but_unfunded() {
    let mut w = world();
    w.ledger.register_airline(airline(1), airline(2)).unwrap();
    assert!(w.ledger.is_airline_registered(&airline(2)));
    let b = w.ledger.airline(&airline(2)).unwrap();
    assert!(b.accepted);
    assert!(!b.funded);
    assert!(!w.ledger.is_airline_operable(&airline(2)));
}

#[test]
fn scenario_3_fifth_airline_needs_votes() {
    let mut w = world();
    bootstrap(&mut w);
    let threshold = w.ledger.genesis().airlines.acceptance_threshold;

    let adm = w.ledger.register_airline(airline(1), airline(5)).unwrap();
    assert!(w.ledger.is_airline_registered(&airline(5)));
    assert!(!adm.accepted);

    for elector in 2..=(threshold as u8 + 1) {
        let adm = w.ledger.register_airline(airline(elector), airline(5)).unwrap();
        assert_eq!(adm.accepted, adm.votes > threshold as usize);
    }
    assert!(w.ledger.airline(&airline(5)).unwrap().accepted);
    assert_eq!(w.ledger.airline(&airline(5)).unwrap().vote_count(), threshold as usize + 1);
}

#[test]
fn scenario_4_operable_airline_registers_flight() {
    let mut w = world();
    bootstrap(&mut w);
    let key = w.ledger.register_flight(airline(2), "222222", DEPARTURE).unwrap();
    assert!(w.ledger.is_flight_registered(&airline(2), "222222", DEPARTURE));
    assert_eq!(w.ledger.flight(&key).unwrap().status, FlightStatus::Unknown);
    assert_eq!(w.ledger.flights_of(&airline(2)).len(), 1);
}

#[test]
fn scenario_5_airline_delay_pays_out_to_passenger() {
    let mut w = oracle_world();
    let flight = w.ledger.register_flight(airline(1), "222222", DEPARTURE).unwrap();
    let premium = ONE_ETHER / 2;
    w.ledger
        .buy_insurance(app(), flight, passenger(1), premium)
        .unwrap();
    assert!(w.ledger.is_passenger_insured(&passenger(1), &flight));

    let ticket = w
        .ledger
        .fetch_flight_status(passenger(1), airline(1), "222222", DEPARTURE)
        .unwrap();
    assert_eq!(ticket.index, 7);

    w.clock.set(DEPARTURE + 3_600);
    for n in 1..=3 {
        report(&mut w, n, "222222", FlightStatus::LateAirline).unwrap();
    }

    let pct = w.ledger.define_insurance_multiplier(premium).multiplier_pct;
    let expected = premium * pct / 100;
    assert_eq!(pct, 200);
    assert_eq!(w.ledger.credit_of(&passenger(1)), expected);
    assert_eq!(
        w.ledger.flight(&flight).unwrap().updated_at,
        DEPARTURE + 3_600
    );

    let paid = w.ledger.withdraw(passenger(1), passenger(1)).unwrap();
    assert_eq!(paid, expected);
    assert_eq!(w.ledger.credit_of(&passenger(1)), 0);
    assert_eq!(w.funds.total_to(&passenger(1)), expected);
    assert_eq!(
        w.ledger.withdraw(passenger(1), passenger(1)),
        Err(LedgerError::NoCreditBalance)
    );
}

#[test]
fn acceptance_is_monotonic_and_electors_count_once() {
    let mut w = world();
    bootstrap(&mut w);
    w.ledger.register_airline(airline(1), airline(5)).unwrap();
    assert_eq!(
        w.ledger.register_airline(airline(1), airline(5)),
        Err(LedgerError::AlreadyVoted)
    );
    w.ledger.register_airline(airline(3), airline(5)).unwrap();
    assert!(w.ledger.airline(&airline(5)).unwrap().accepted);

    // Further votes leave the accepted airline untouched.
    let adm = w.ledger.vote_airline(airline(4), airline(5), 100).unwrap();
    assert!(adm.accepted);
    assert_eq!(adm.votes, 2);
}

#[test]
fn funding_is_one_directional() {
    let mut w = world();
    w.ledger.register_airline(airline(1), airline(2)).unwrap();
    assert!(matches!(
        w.ledger.fund_airline(airline(2), airline(2), STAKE / 2),
        Err(LedgerError::InsufficientStake { .. })
    ));
    w.ledger.deposit(airline(2), STAKE).unwrap();
    assert_eq!(
        w.ledger.deposit(airline(2), STAKE),
        Err(LedgerError::AlreadyFunded)
    );
    assert!(w.ledger.airline(&airline(2)).unwrap().funded);
    assert_eq!(w.ledger.treasury(), STAKE);
}

#[test]
fn distinct_triples_give_distinct_flights() {
    let mut w = world();
    bootstrap(&mut w);
    let keys: Vec<FlightKey> = [
        (airline(1), "ND1", DEPARTURE),
        (airline(1), "ND1", DEPARTURE + 1),
        (airline(1), "ND2", DEPARTURE),
        (airline(2), "ND1", DEPARTURE),
    ]
    .into_iter()
    .map(|(a, code, t)| w.ledger.register_flight(a, code, t).unwrap())
    .collect();
    for (i, a) in keys.iter().enumerate() {
        for b in &keys[i + 1..] {
            assert_ne!(a, b);
        }
    }
    assert_eq!(
        w.ledger.register_flight(airline(2), "ND1", DEPARTURE),
        Err(LedgerError::FlightAlreadyExists)
    );
}

#[test]
fn each_insurance_is_credited_once() {
    let mut w = oracle_world();
    let flight = w.ledger.register_flight(airline(1), "ND1309", DEPARTURE).unwrap();
    let small = w.ledger.buy_insurance(app(), flight, passenger(1), 1_000).unwrap();
    let big = w
        .ledger
        .buy_insurance(app(), flight, passenger(2), ONE_ETHER)
        .unwrap();
    // Manually refunded ahead of consensus.
    w.ledger.credit_insurees(app(), small, 100).unwrap();

    w.ledger
        .fetch_flight_status(passenger(1), airline(1), "ND1309", DEPARTURE)
        .unwrap();
    for n in 1..=3 {
        report(&mut w, n, "ND1309", FlightStatus::LateAirline).unwrap();
    }

    assert_eq!(w.ledger.credit_of(&passenger(1)), 1_000);
    assert_eq!(w.ledger.credit_of(&passenger(2)), 2 * ONE_ETHER);
    assert_eq!(
        w.ledger.insurance(big).unwrap().state,
        InsuranceState::Refunded
    );
    assert_eq!(
        w.ledger.credit_insurees(app(), big, 150),
        Err(LedgerError::InsuranceNotValid)
    );
}

#[test]
fn consensus_finalizes_once() {
    let mut w = oracle_world();
    let flight = w.ledger.register_flight(airline(1), "ND1309", DEPARTURE).unwrap();
    w.ledger.buy_insurance(app(), flight, passenger(1), 1_000).unwrap();
    w.ledger
        .fetch_flight_status(passenger(1), airline(1), "ND1309", DEPARTURE)
        .unwrap();

    report(&mut w, 1, "ND1309", FlightStatus::LateAirline).unwrap();
    report(&mut w, 2, "ND1309", FlightStatus::LateAirline).unwrap();
    report(&mut w, 3, "ND1309", FlightStatus::LateAirline).unwrap();
    assert_eq!(
        report(&mut w, 4, "ND1309", FlightStatus::LateAirline),
        Err(LedgerError::RequestNotOpen)
    );
    assert_eq!(
        report(&mut w, 5, "ND1309", FlightStatus::OnTime),
        Err(LedgerError::RequestNotOpen)
    );

    assert_eq!(w.ledger.credit_of(&passenger(1)), 1_500);
    let finalized = w
        .journal
        .count(|e| matches!(e, Notification::FlightStatusFinalized { .. }));
    let refunded = w
        .journal
        .count(|e| matches!(e, Notification::InsuranceRefunded { .. }));
    assert_eq!((finalized, refunded), (1, 1));
}

#[test]
fn halted_ledger_blocks_withdrawal_until_resumed() {
    let mut w = oracle_world();
    let flight = w.ledger.register_flight(airline(1), "ND1309", DEPARTURE).unwrap();
    let id = w.ledger.buy_insurance(app(), flight, passenger(1), 1_000).unwrap();
    w.ledger.credit_insurees(app(), id, 150).unwrap();

    w.ledger.set_operational_status(owner(), false).unwrap();
    assert_eq!(
        w.ledger.withdraw(passenger(1), passenger(1)),
        Err(LedgerError::NotOperational)
    );
    w.ledger.set_operational_status(owner(), true).unwrap();
    assert_eq!(w.ledger.withdraw(passenger(1), passenger(1)), Ok(1_500));
}
