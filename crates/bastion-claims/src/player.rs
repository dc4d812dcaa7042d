//! Per-actor runtime state
//!
//! Nothing here is persisted. State is created on first touch and dropped when the
//! actor disconnects.

use bastion_core::{ActorId, ClaimId, SiegeId};
use std::collections::HashMap;

/// Most recent PvP contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PvpContact {
    pub at_ms: u64,
    pub opponent: ActorId,
}

/// Side an actor is on in a siege
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiegeRole {
    Attacker,
    Defender,
}

/// Runtime state for one actor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerState {
    /// Claim most recently resolved for this actor, used as a lookup hint.
    pub last_claim: Option<ClaimId>,
    /// Claim bypass mode.
    pub ignore_claims: bool,
    /// Fresh-spawn immunity expiry; `u64::MAX` means until cleared.
    pub pvp_immune_until: Option<u64>,
    pub last_pvp: Option<PvpContact>,
    pub siege: Option<(SiegeId, SiegeRole)>,
}

static UNTOUCHED: PlayerState = PlayerState {
    last_claim: None,
    ignore_claims: false,
    pvp_immune_until: None,
    last_pvp: None,
    siege: None,
};

impl PlayerState {
    /// Returns `true` while fresh-spawn immunity lasts
    pub fn is_pvp_immune(&self, now_ms: u64) -> bool {
        self.pvp_immune_until.is_some_and(|until| now_ms < until)
    }

    /// Returns `true` within `timeout_ms` of the last PvP contact
    pub fn in_pvp_combat(&self, now_ms: u64, timeout_ms: u64) -> bool {
        self.last_pvp
            .is_some_and(|contact| now_ms.saturating_sub(contact.at_ms) <= timeout_ms)
    }

    /// Siege this actor takes part in
    pub fn siege_id(&self) -> Option<SiegeId> {
        self.siege.map(|(id, _)| id)
    }
}

/// State of every actor seen so far
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    states: HashMap<ActorId, PlayerState>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for `actor`; untouched actors read as the default state
    pub fn get(&self, actor: ActorId) -> &PlayerState {
        self.states.get(&actor).unwrap_or(&UNTOUCHED)
    }

    /// Mutable state for `actor`, created on first use
    pub fn get_mut(&mut self, actor: ActorId) -> &mut PlayerState {
        self.states.entry(actor).or_default()
    }

    /// Remember the claim most recently resolved for `actor`
    pub fn remember_claim(&mut self, actor: ActorId, claim: Option<ClaimId>) {
        if claim.is_some() || self.states.contains_key(&actor) {
            self.get_mut(actor).last_claim = claim;
        }
    }

    /// Drop an actor's state
    pub fn remove(&mut self, actor: ActorId) -> Option<PlayerState> {
        self.states.remove(&actor)
    }

    /// Number of actors with state
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untouched_actor_reads_default() {
        let registry = PlayerRegistry::new();
        let state = registry.get(ActorId::from_name("ghost"));
        assert_eq!(state, &PlayerState::default());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_combat_window_is_inclusive() {
        let state = PlayerState {
            last_pvp: Some(PvpContact {
                at_ms: 1_000,
                opponent: ActorId::from_name("rival"),
            }),
            ..PlayerState::default()
        };
        assert!(state.in_pvp_combat(16_000, 15_000));
        assert!(!state.in_pvp_combat(16_001, 15_000));
        assert!(!PlayerState::default().in_pvp_combat(0, 15_000));
    }

    #[test]
    fn test_immunity_expires() {
        let state = PlayerState {
            pvp_immune_until: Some(5_000),
            ..PlayerState::default()
        };
        assert!(state.is_pvp_immune(4_999));
        assert!(!state.is_pvp_immune(5_000));
    }

    #[test]
    fn test_remember_claim_creates_state_lazily() {
        let mut registry = PlayerRegistry::new();
        let actor = ActorId::from_name("walker");
        registry.remember_claim(actor, None);
        assert!(registry.is_empty());
        registry.remember_claim(actor, Some(ClaimId::new(4)));
        assert_eq!(registry.get(actor).last_claim, Some(ClaimId::new(4)));
    }
}
