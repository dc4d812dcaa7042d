//! Allow/deny verdicts and structured denial reasons
//!
//! A denial carries a structured reason rather than a bare string so that hosts can
//! localize messages. The English `Display` text is the default wording shown to
//! players.

use crate::identifiers::ClaimId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an action was refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    NoBuildPermission { owner: String },
    NoAccessPermission { owner: String },
    NoContainersPermission { owner: String },
    NoPermissionTrust { owner: String },
    OnlyOwnersModifyClaims { owner: String },
    NoModifyDuringSiege,
    NoBuildUnderSiege { attacker: String },
    NoContainersSiege { attacker: String },
    NoBuildPvp,
    NonSiegeMaterial,
    NoOwnerBuildUnderSiege,
    NoDamageClaimedEntity { owner: String },
    CantFightWhileImmune,
    ThatPlayerPvpImmune,
    PlayerInPvpSafeZone,
    /// Environmental damage to a pet that PvP rules do not cover.
    PetEnvironmentalHazard,
    /// Block explosions may not harm non-player entities inside a claim.
    ExplosionInClaim,
    /// Damage without an attributable actor against a claimed entity.
    UnattributedDamage,
    /// Knockback in a world where PvP rules are off.
    PvpDisabled,
    /// No actor was present to check permissions for.
    UnknownActor,
    /// The claim no longer exists.
    UnknownClaim { claim: ClaimId },
    /// Replacement text supplied by a host override.
    Custom(String),
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoBuildPermission { owner } => {
                write!(f, "You don't have {owner}'s permission to build here.")
            }
            Self::NoAccessPermission { owner } | Self::NoContainersPermission { owner } => {
                write!(f, "You don't have {owner}'s permission to use that.")
            }
            Self::NoPermissionTrust { owner } => {
                write!(f, "You don't have {owner}'s permission to manage permissions here.")
            }
            Self::OnlyOwnersModifyClaims { owner } => write!(f, "Only {owner} can modify this claim."),
            Self::NoModifyDuringSiege => write!(f, "Claims can't be modified while under siege."),
            Self::NoBuildUnderSiege { attacker } => write!(
                f,
                "This claim is under siege by {attacker}. No one can build here."
            ),
            Self::NoContainersSiege { attacker } => write!(
                f,
                "This claim is under siege by {attacker}. No one can access containers here right now."
            ),
            Self::NoBuildPvp => write!(f, "You can't build in claims during PvP combat."),
            Self::NonSiegeMaterial => write!(f, "That material is too tough to break."),
            Self::NoOwnerBuildUnderSiege => write!(f, "You can't make changes while under siege."),
            Self::NoDamageClaimedEntity { owner } => write!(f, "That belongs to {owner}."),
            Self::CantFightWhileImmune => {
                write!(f, "You can't fight someone while you're protected from PvP.")
            }
            Self::ThatPlayerPvpImmune => write!(f, "You can't injure defenseless players."),
            Self::PlayerInPvpSafeZone => write!(f, "That player is in a PvP safe zone."),
            Self::PetEnvironmentalHazard => write!(f, "Pets are protected from the environment."),
            Self::ExplosionInClaim => write!(f, "Explosions can't harm that here."),
            Self::UnattributedDamage => write!(f, "That is protected by a land claim."),
            Self::PvpDisabled => write!(f, "PvP is disabled here."),
            Self::UnknownActor => write!(f, "No player to check permissions for."),
            Self::UnknownClaim { claim } => write!(f, "{claim} no longer exists."),
            Self::Custom(message) => write!(f, "{message}"),
        }
    }
}

/// Hint appended to denials when the actor could bypass claims
pub const IGNORE_CLAIMS_HINT: &str = "To override, use /ignoreclaims.";

/// Owner name displayed for administrative claims
pub const ADMIN_OWNER_NAME: &str = "an administrator";

/// A denial with its optional bypass hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denial {
    reason: DenialReason,
    override_hint: bool,
}

impl Denial {
    /// Create a denial without a hint
    pub fn new(reason: DenialReason) -> Self {
        Self {
            reason,
            override_hint: false,
        }
    }

    /// Attach the ignore-claims hint when `show` is true
    pub fn with_override_hint(mut self, show: bool) -> Self {
        self.override_hint = show;
        self
    }

    pub fn reason(&self) -> &DenialReason {
        &self.reason
    }

    pub fn has_override_hint(&self) -> bool {
        self.override_hint
    }

    /// Message shown to the actor
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.override_hint {
            write!(f, "{}  {IGNORE_CLAIMS_HINT}", self.reason)
        } else {
            write!(f, "{}", self.reason)
        }
    }
}

impl From<DenialReason> for Denial {
    fn from(reason: DenialReason) -> Self {
        Self::new(reason)
    }
}

/// Result of a permission check or protection rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// The action may proceed.
    Allowed,
    /// The action is refused.
    Denied(Denial),
}

impl Verdict {
    /// Create an allow verdict
    pub fn allow() -> Self {
        Self::Allowed
    }

    /// Create a deny verdict without a hint
    pub fn deny(reason: DenialReason) -> Self {
        Self::Denied(Denial::new(reason))
    }

    /// Returns `true` if the verdict allows the action
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Returns `true` if the verdict refuses the action
    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    /// The denial, if refused
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Allowed => None,
            Self::Denied(denial) => Some(denial),
        }
    }

    /// The denial reason, if refused
    pub fn denial_reason(&self) -> Option<&DenialReason> {
        self.denial().map(Denial::reason)
    }

    /// The message for the actor, if refused
    pub fn message(&self) -> Option<String> {
        self.denial().map(Denial::message)
    }
}

impl From<Denial> for Verdict {
    fn from(denial: Denial) -> Self {
        Self::Denied(denial)
    }
}
