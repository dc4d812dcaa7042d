//! Claim persistence boundary
//!
//! Storage format and location are the host's concern. The claim store loads every
//! record once at startup and then reports each committed change; a failed write
//! is logged and does not roll back the in-memory change.

use crate::claim::ClaimRecord;
use bastion_core::{ClaimId, Result};

/// Storage for claim records
pub trait ClaimPersistence {
    /// Every stored record, top-level claims and subdivisions alike.
    fn load_all_claims(&self) -> Result<Vec<ClaimRecord>>;

    /// Store or replace one record.
    fn save_claim(&mut self, claim: &ClaimRecord) -> Result<()>;

    /// Forget one record.
    fn delete_claim(&mut self, id: ClaimId) -> Result<()>;
}
