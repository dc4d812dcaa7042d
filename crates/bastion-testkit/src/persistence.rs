//! In-memory claim persistence that round-trips records through JSON
//!
//! Rows are stored as serialized JSON so that a test reloading a store exercises the
//! same serde path a file-backed host would, including the loss of runtime-only
//! state such as child links and siege membership.

use bastion_claims::{ClaimPersistence, ClaimRecord};
use bastion_core::{BastionError, ClaimId, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct PersistenceState {
    rows: BTreeMap<ClaimId, String>,
    fail_writes: bool,
    writes: usize,
}

/// Shared JSON-backed persistence
///
/// Clones share the same rows, so a test can keep one handle while the store owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    state: Arc<Mutex<PersistenceState>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persistence pre-populated with `records`
    pub fn seeded(records: impl IntoIterator<Item = ClaimRecord>) -> Self {
        let persistence = Self::new();
        {
            let mut state = persistence.state.lock();
            for record in records {
                let json = serde_json::to_string(&record).unwrap();
                state.rows.insert(record.id(), json);
            }
        }
        persistence
    }

    /// Decoded copy of one stored row
    pub fn stored(&self, id: ClaimId) -> Option<ClaimRecord> {
        let state = self.state.lock();
        state
            .rows
            .get(&id)
            .map(|json| serde_json::from_str(json).unwrap())
    }

    /// Raw JSON of one stored row
    pub fn raw(&self, id: ClaimId) -> Option<String> {
        self.state.lock().rows.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().rows.is_empty()
    }

    /// Number of save and delete calls seen so far
    pub fn writes(&self) -> usize {
        self.state.lock().writes
    }

    /// Make every subsequent write fail
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }
}

impl ClaimPersistence for MemoryPersistence {
    fn load_all_claims(&self) -> Result<Vec<ClaimRecord>> {
        let state = self.state.lock();
        state
            .rows
            .values()
            .map(|json| serde_json::from_str(json).map_err(BastionError::from))
            .collect()
    }

    fn save_claim(&mut self, claim: &ClaimRecord) -> Result<()> {
        let mut state = self.state.lock();
        state.writes += 1;
        if state.fail_writes {
            return Err(BastionError::storage("write rejected"));
        }
        let json = serde_json::to_string(claim)?;
        state.rows.insert(claim.id(), json);
        Ok(())
    }

    fn delete_claim(&mut self, id: ClaimId) -> Result<()> {
        let mut state = self.state.lock();
        state.writes += 1;
        if state.fail_writes {
            return Err(BastionError::storage("delete rejected"));
        }
        state.rows.remove(&id);
        Ok(())
    }
}
