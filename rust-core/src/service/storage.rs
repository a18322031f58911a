use crate::ledger::PersistedSnapshot;
use crate::service::NodeError;
use std::fs;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_FILE: &str = "ledger_snapshot.json";

pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self, NodeError> {
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            path: data_dir.as_ref().join(SNAPSHOT_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<PersistedSnapshot>, NodeError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path)?;
        let snap = serde_json::from_slice::<PersistedSnapshot>(&data)?;
        Ok(Some(snap))
    }

    /// Writes to a sibling temp file and renames over the old snapshot.
    pub fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), NodeError> {
        let data = serde_json::to_vec_pretty(snapshot)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
