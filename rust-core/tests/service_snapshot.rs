#![cfg(feature = "node")]

use flightsure_core::random::SeededIndexSource;
use flightsure_core::service::node::{NodeConfig, NodeHandle};
use flightsure_core::service::storage::{SnapshotStore, SNAPSHOT_FILE};
use flightsure_core::service::NodeError;
use flightsure_core::{Address, Call, GenesisConfig, Ledger, LedgerError, Outcome, ONE_ETHER};
use std::path::Path;

const DEPARTURE: u64 = 1_700_000_000;

fn genesis() -> GenesisConfig {
    let mut genesis = GenesisConfig::new(Address::from_label("owner"), Address::from_label("air-1"));
    genesis.authorized_callers.push(Address::from_label("app"));
    genesis.oracles.seed = Some(42);
    genesis
}

fn start(dir: &Path) -> NodeHandle {
    NodeHandle::start(
        Ledger::builder(genesis()),
        NodeConfig {
            data_dir: Some(dir.to_path_buf()),
        },
    )
    .expect("start node")
}

fn register_oracle(node: &NodeHandle, label: &str) -> [u8; 3] {
    match node
        .submit(Call::RegisterOracle {
            caller: Address::from_label(label),
            fee: ONE_ETHER,
        })
        .expect("register oracle")
    {
        Outcome::OracleIndexes { indexes } => indexes,
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn restart_restores_state_and_index_stream() {
    let dir = tempfile::tempdir().unwrap();
    let air = Address::from_label("air-1");

    let node = start(dir.path());
    let Outcome::Flight { key } = node
        .submit(Call::RegisterFlight {
            airline: air,
            code: "ND1309".into(),
            departure: DEPARTURE,
        })
        .unwrap()
    else {
        panic!("expected flight");
    };
    register_oracle(&node, "oracle-1");
    let before = node.snapshot();
    node.shutdown().unwrap();
    assert!(dir.path().join(SNAPSHOT_FILE).exists());

    let node = start(dir.path());
    let after = node.snapshot();
    assert_eq!(after, before);
    assert!(after.flight(&key).is_some());
    let resumed = register_oracle(&node, "oracle-2");
    node.shutdown().unwrap();

    // Same seed, no restart: the second oracle draws the same indexes.
    let mut reference = Ledger::builder(genesis())
        .index_source(SeededIndexSource::new(42))
        .build()
        .unwrap();
    reference.register_oracle(Address::from_label("oracle-1"), ONE_ETHER).unwrap();
    let expected = reference
        .register_oracle(Address::from_label("oracle-2"), ONE_ETHER)
        .unwrap();
    assert_eq!(resumed, expected);
}

#[test]
fn rejected_calls_leave_the_snapshot_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let node = start(dir.path());
    let before = node.snapshot();

    let err = node
        .submit(Call::BuyInsurance {
            caller: Address::from_label("stranger"),
            flight: flightsure_core::FlightKey([0; 32]),
            passenger: Address::from_label("pax"),
            amount: 10,
        })
        .unwrap_err();
    assert!(matches!(err, NodeError::Ledger(LedgerError::NotAuthorized)));
    assert_eq!(node.snapshot(), before);

    let store = SnapshotStore::new(dir.path()).unwrap();
    let persisted = store.load().unwrap().expect("snapshot on disk");
    assert_eq!(persisted.state, before);
    assert_eq!(persisted.index_seed, 42);
}

#[test]
fn snapshot_for_another_owner_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    start(dir.path()).shutdown().unwrap();

    let other = GenesisConfig::new(Address::from_label("someone-else"), Address::from_label("air-1"));
    let res = NodeHandle::start(
        Ledger::builder(other),
        NodeConfig {
            data_dir: Some(dir.path().to_path_buf()),
        },
    );
    assert!(matches!(
        res,
        Err(NodeError::Ledger(LedgerError::InvalidConfig(_)))
    ));
}
