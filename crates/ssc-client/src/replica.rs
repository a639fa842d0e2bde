//! Local document replica

use ssc_core::{Error, Result, SharedState};

/// Replica lifecycle: absent (no server document yet) -> live (mirroring
/// server state) -> deleted (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicaPhase {
    Absent,
    Live,
    Deleted,
}

/// The local copy of the shared document.
///
/// Exactly one instance per content id per client session, owned by the
/// synchronization engine and mutated only on its event loop.
#[derive(Debug)]
pub struct DocumentReplica<T: SharedState> {
    phase: ReplicaPhase,
    version: u64,
    data: Option<T>,
}

impl<T: SharedState> DocumentReplica<T> {
    pub fn new() -> Self {
        Self {
            phase: ReplicaPhase::Absent,
            version: 0,
            data: None,
        }
    }

    pub fn phase(&self) -> ReplicaPhase {
        self.phase
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Install authoritative server state, decoding it into the document
    /// type. Ignored after deletion.
    pub fn install(&mut self, version: u64, raw: serde_json::Value) -> Result<T> {
        if self.phase == ReplicaPhase::Deleted {
            return Err(Error::DocumentDeleted);
        }
        let decoded: T =
            serde_json::from_value(raw).map_err(|e| Error::Serialization(e.to_string()))?;
        self.phase = ReplicaPhase::Live;
        self.version = version;
        self.data = Some(decoded.clone());
        Ok(decoded)
    }

    /// Install locally seeded data after a won create race
    pub fn install_seeded(&mut self, seeded: T) {
        self.phase = ReplicaPhase::Live;
        self.version = 1;
        self.data = Some(seeded);
    }

    pub fn mark_deleted(&mut self) {
        self.phase = ReplicaPhase::Deleted;
        self.data = None;
    }
}

impl<T: SharedState> Default for DocumentReplica<T> {
    fn default() -> Self {
        Self::new()
    }
}
