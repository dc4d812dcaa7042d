//! Effect traits through which the host server is consulted
//!
//! Bastion never talks to a game server directly. Every external fact it needs
//! (permission nodes, player names, world flags, the clock) and every notification
//! it publishes goes through one of these traits. [`HostEffects`] bundles them and
//! is implemented automatically for any type implementing all of them.

use crate::geometry::ClaimBounds;
use crate::identifiers::{ActorId, ClaimId, EntityId, WorldId};
use crate::permission::PermissionKind;
use crate::verdict::Verdict;
use serde::{Deserialize, Serialize};

/// Host permission-node lookups
pub trait PermissionEffects {
    /// Returns `true` if the actor holds the host permission `node`.
    fn actor_has_permission(&self, actor: ActorId, node: &str) -> bool;
}

/// Player directory lookups
pub trait DirectoryEffects {
    /// Display name for an actor, if known.
    fn display_name(&self, actor: ActorId) -> Option<String>;
}

/// Per-world flags
pub trait WorldEffects {
    /// Returns `true` if PvP rules are in force in `world`.
    fn pvp_rules_apply(&self, world: WorldId) -> bool;

    /// Returns `true` if claims are honoured in `world`.
    fn claims_enabled(&self, _world: WorldId) -> bool {
        true
    }

    /// Returns `true` if the world itself has PvP switched on.
    fn world_pvp_enabled(&self, world: WorldId) -> bool {
        self.pvp_rules_apply(world)
    }
}

/// Wall-clock time in milliseconds
pub trait TimeEffects {
    /// Current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

/// Notification hooks through which the host may observe or override decisions
pub trait NotificationEffects {
    /// Called once per outermost permission check. The returned verdict replaces
    /// the computed one.
    fn claim_permission_resolved(&self, event: &ClaimPermissionEvent) -> Verdict {
        event.verdict.clone()
    }

    /// Called before a safe-zone rule blocks PvP.
    fn pvp_prevention(&self, _notice: &PvpPreventionNotice) -> PvpOverride {
        PvpOverride::Enforce
    }
}

/// Composite of every host effect Bastion needs
pub trait HostEffects:
    PermissionEffects + DirectoryEffects + WorldEffects + TimeEffects + NotificationEffects
{
}

impl<T> HostEffects for T where
    T: PermissionEffects + DirectoryEffects + WorldEffects + TimeEffects + NotificationEffects
{
}

/// A finished permission check, published to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimPermissionEvent {
    pub actor: ActorId,
    pub claim: ClaimId,
    pub kind: PermissionKind,
    pub verdict: Verdict,
}

/// Area a PvP prevention applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PvpScope {
    /// A stored claim.
    Claim(ClaimId),
    /// A detached area around an entity, not part of any hierarchy.
    Inert(ClaimBounds),
}

/// Published before a safe zone blocks an attack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvpPreventionNotice {
    pub scope: PvpScope,
    pub attacker: Option<ActorId>,
    pub defender: EntityId,
}

/// Host answer to a [`PvpPreventionNotice`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PvpOverride {
    /// Block the attack.
    #[default]
    Enforce,
    /// Let the attack through.
    AllowPvp,
}

impl PvpOverride {
    /// Returns `true` if the host chose to let the attack through
    pub fn is_overridden(self) -> bool {
        self == Self::AllowPvp
    }
}
