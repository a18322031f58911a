// One worker thread owns the ledger and applies calls in arrival order. After every
// committed call it republishes the read snapshot and, with a data dir, saves it.
// Readers only ever see the state store; the index seed stays in the saved file.

use crate::call::{Call, Outcome};
use crate::error::LedgerError;
use crate::ledger::{Ledger, LedgerBuilder, PersistedSnapshot};
use crate::service::storage::SnapshotStore;
use crate::service::NodeError;
use crate::store::StateStore;
use std::path::PathBuf;
use std::sync::{mpsc, Arc, RwLock};
use std::thread;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, Default)]
pub struct NodeConfig {
    pub data_dir: Option<PathBuf>,
}

pub enum NodeCommand {
    Submit(Call, mpsc::Sender<Result<Outcome, LedgerError>>),
    Shutdown,
}

struct Node {
    ledger: Ledger,
    snapshot: Arc<RwLock<StateStore>>,
    store: Option<SnapshotStore>,
}

impl Node {
    fn run(mut self, rx_cmd: mpsc::Receiver<NodeCommand>) {
        while let Ok(cmd) = rx_cmd.recv() {
            match cmd {
                NodeCommand::Submit(call, reply) => {
                    let op = call.name();
                    let res = self.ledger.apply(call);
                    if res.is_ok() {
                        self.commit();
                    } else {
                        debug!(op, "call not applied");
                    }
                    let _ = reply.send(res);
                }
                NodeCommand::Shutdown => break,
            }
        }
        self.persist();
        info!("ledger worker stopped");
    }

    fn commit(&mut self) {
        let persisted = self.ledger.persisted();
        self.save(&persisted);
        match self.snapshot.write() {
            Ok(mut current) => *current = persisted.state,
            Err(_) => warn!("snapshot lock poisoned; readers see stale state"),
        }
    }

    fn persist(&self) {
        if self.store.is_some() {
            self.save(&self.ledger.persisted());
        }
    }

    fn save(&self, persisted: &PersistedSnapshot) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save(persisted) {
            warn!(path = %store.path().display(), error = %e, "snapshot save failed");
        }
    }
}

/// Cloneable entry point for submitting calls and reading state.
#[derive(Clone)]
pub struct NodeClient {
    tx_cmd: mpsc::Sender<NodeCommand>,
    snapshot: Arc<RwLock<StateStore>>,
}

impl NodeClient {
    /// Queues `call` and waits for the worker's answer.
    pub fn submit(&self, call: Call) -> Result<Outcome, NodeError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx_cmd
            .send(NodeCommand::Submit(call, reply_tx))
            .map_err(|_| NodeError::Disconnected)?;
        let res = reply_rx.recv().map_err(|_| NodeError::Disconnected)?;
        Ok(res?)
    }

    /// Last committed state; never a half-applied call.
    pub fn snapshot(&self) -> StateStore {
        match self.snapshot.read() {
            Ok(snap) => snap.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

pub struct NodeHandle {
    client: NodeClient,
    worker: Option<thread::JoinHandle<()>>,
}

impl NodeHandle {
    /// Restores from `config.data_dir` when a snapshot exists there, then spawns the worker.
    pub fn start(builder: LedgerBuilder, config: NodeConfig) -> Result<Self, NodeError> {
        let store = match config.data_dir {
            Some(dir) => Some(SnapshotStore::new(dir)?),
            None => None,
        };

        let builder = match store.as_ref().map(SnapshotStore::load).transpose()?.flatten() {
            Some(snap) => {
                info!(
                    airlines = snap.state.airline_count(),
                    flights = snap.state.flight_count(),
                    "restoring ledger snapshot"
                );
                builder.restore(snap)
            }
            None => builder,
        };
        let ledger = builder.build()?;

        let snapshot = Arc::new(RwLock::new(ledger.state().clone()));
        let (tx_cmd, rx_cmd) = mpsc::channel();
        let node = Node {
            ledger,
            snapshot: Arc::clone(&snapshot),
            store,
        };
        node.persist();
        let worker = thread::Builder::new()
            .name("flightsure-ledger".into())
            .spawn(move || node.run(rx_cmd))?;

        Ok(Self {
            client: NodeClient { tx_cmd, snapshot },
            worker: Some(worker),
        })
    }

    pub fn client(&self) -> NodeClient {
        self.client.clone()
    }

    pub fn submit(&self, call: Call) -> Result<Outcome, NodeError> {
        self.client.submit(call)
    }

    pub fn snapshot(&self) -> StateStore {
        self.client.snapshot()
    }

    /// Stops the worker after queued calls drain; the final state is saved.
    pub fn shutdown(mut self) -> Result<(), NodeError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), NodeError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        let _ = self.client.tx_cmd.send(NodeCommand::Shutdown);
        worker.join().map_err(|_| NodeError::Disconnected)
    }
}

impl Drop for NodeHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "ledger worker did not stop cleanly");
        }
    }
}
