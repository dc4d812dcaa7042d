//! # Bastion Core - Layer 1: Shared Vocabulary
//!
//! Types shared by every Bastion crate: identifiers, block geometry, permission
//! levels and principal keys, verdicts and denial reasons, the ordered rule chain,
//! configuration, and the effect traits through which the host server is consulted.
//!
//! Nothing in this crate knows about claim hierarchies or game events. Those live in
//! `bastion-claims` and `bastion-protection`.

pub mod block;
pub mod chain;
pub mod config;
pub mod effects;
pub mod errors;
pub mod geometry;
pub mod identifiers;
pub mod permission;
pub mod verdict;

pub use block::BlockKind;
pub use chain::{Rule, RuleChain, RuleMatch};
pub use config::{ClaimRules, PermissionNodes, ProtectionConfig, PvpRules, ValidationError};
pub use effects::{
    ClaimPermissionEvent, DirectoryEffects, HostEffects, NotificationEffects, PermissionEffects,
    PvpOverride, PvpPreventionNotice, PvpScope, TimeEffects, WorldEffects,
};
pub use errors::{BastionError, Result};
pub use geometry::{BlockPos, ClaimBounds, Location, VerticalExtent};
pub use identifiers::{ActorId, ClaimId, EntityId, SiegeId, WorldId};
pub use permission::{PermissionKind, PermissionLevel, PermissionRequest, PrincipalKey};
pub use verdict::{Denial, DenialReason, Verdict, ADMIN_OWNER_NAME, IGNORE_CLAIMS_HINT};
