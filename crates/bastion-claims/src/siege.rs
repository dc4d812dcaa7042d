//! Siege bookkeeping
//!
//! A siege pits one attacker against one defender over a growing set of claims.
//! While it runs, the claims in it are not PvP safe zones, nobody builds in them,
//! and only siege-breakable materials can be broken.

use bastion_core::{ActorId, ClaimId, SiegeId};
use std::collections::BTreeMap;

/// How a siege ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiegeOutcome {
    AttackerVictory,
    DefenderVictory,
}

impl SiegeOutcome {
    /// Outcome when `actor` leaves a siege they were part of
    pub fn forfeited_by(descriptor: &SiegeDescriptor, actor: ActorId) -> Self {
        if actor == descriptor.attacker {
            Self::DefenderVictory
        } else {
            Self::AttackerVictory
        }
    }
}

/// One siege
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiegeDescriptor {
    pub id: SiegeId,
    pub attacker: ActorId,
    pub defender: ActorId,
    /// Claims pulled into the siege, in the order they joined.
    pub claims: Vec<ClaimId>,
    pub started_at_ms: u64,
}

impl SiegeDescriptor {
    pub fn includes(&self, claim: ClaimId) -> bool {
        self.claims.contains(&claim)
    }

    pub fn involves(&self, actor: ActorId) -> bool {
        self.attacker == actor || self.defender == actor
    }
}

/// Sieges still running
///
/// A siege leaves the book as soon as it is resolved.
#[derive(Debug, Clone, Default)]
pub struct SiegeBook {
    sieges: BTreeMap<SiegeId, SiegeDescriptor>,
    next_id: u64,
}

impl SiegeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SiegeId) -> Option<&SiegeDescriptor> {
        self.sieges.get(&id)
    }

    pub fn ongoing(&self) -> impl Iterator<Item = &SiegeDescriptor> {
        self.sieges.values()
    }

    pub fn len(&self) -> usize {
        self.sieges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sieges.is_empty()
    }

    /// Running siege `actor` takes part in
    pub fn ongoing_for(&self, actor: ActorId) -> Option<&SiegeDescriptor> {
        self.ongoing().find(|siege| siege.involves(actor))
    }

    pub(crate) fn open(
        &mut self,
        attacker: ActorId,
        defender: ActorId,
        claim: ClaimId,
        now_ms: u64,
    ) -> SiegeId {
        self.next_id += 1;
        let id = SiegeId::new(self.next_id);
        self.sieges.insert(
            id,
            SiegeDescriptor {
                id,
                attacker,
                defender,
                claims: vec![claim],
                started_at_ms: now_ms,
            },
        );
        id
    }

    pub(crate) fn get_mut(&mut self, id: SiegeId) -> Option<&mut SiegeDescriptor> {
        self.sieges.get_mut(&id)
    }

    /// Take a siege out of the book
    pub(crate) fn close(&mut self, id: SiegeId) -> Option<SiegeDescriptor> {
        self.sieges.remove(&id)
    }
}
