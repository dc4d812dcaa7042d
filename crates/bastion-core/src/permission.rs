//! Permission levels, principal keys, and permission requests

use crate::block::BlockKind;
use crate::identifiers::ActorId;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Ordered grant level held by a principal in a claim
///
/// `Build` implies `Inventory`, which implies `Access`. The ordering is total and
/// the derived `Ord` follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PermissionLevel {
    /// Use doors, buttons, levers and beds.
    Access,
    /// Open containers, trade with villagers, harm or feed animals.
    Inventory,
    /// Place and break blocks.
    Build,
}

impl PermissionLevel {
    /// All levels from weakest to strongest
    pub const ALL: [PermissionLevel; 3] = [Self::Access, Self::Inventory, Self::Build];

    /// Returns `true` if holding `held` satisfies a requirement of `self`.
    pub fn is_granted_by(self, held: Option<PermissionLevel>) -> bool {
        held.is_some_and(|held| held >= self)
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Access => "access",
            Self::Inventory => "inventory",
            Self::Build => "build",
        };
        write!(f, "{name}")
    }
}

/// Key of a permission-map or manager-list entry
///
/// Keys are always stored lowercase. Three shapes are meaningful: the literal
/// `public`, an actor UUID string, or a host permission node written in square
/// brackets such as `[towny.resident]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PrincipalKey(String);

impl PrincipalKey {
    /// The key that grants to everyone
    pub const PUBLIC: &'static str = "public";

    /// Create a key from raw text, lowercasing it
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    /// The public key
    pub fn public() -> Self {
        Self(Self::PUBLIC.to_string())
    }

    /// The key for a specific actor
    pub fn actor(actor: ActorId) -> Self {
        Self(actor.principal_key())
    }

    /// The key for everyone holding a host permission node
    pub fn node(node: &str) -> Self {
        Self::new(format!("[{node}]"))
    }

    /// Get the key text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the public key
    pub fn is_public(&self) -> bool {
        self.0 == Self::PUBLIC
    }

    /// Returns `true` if this key names `actor`
    pub fn is_actor(&self, actor: ActorId) -> bool {
        self.0 == actor.principal_key()
    }

    /// The host permission node named by a bracketed key
    ///
    /// Keys shorter than three characters are never nodes.
    pub fn as_node(&self) -> Option<&str> {
        if self.0.len() < 3 {
            return None;
        }
        self.0.strip_prefix('[')?.strip_suffix(']')
    }
}

impl From<String> for PrincipalKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for PrincipalKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<ActorId> for PrincipalKey {
    fn from(actor: ActorId) -> Self {
        Self::actor(actor)
    }
}

impl Borrow<str> for PrincipalKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<PrincipalKey> for String {
    fn from(value: PrincipalKey) -> Self {
        value.0
    }
}

impl fmt::Display for PrincipalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of permission that was checked, as reported to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermissionKind {
    Edit,
    Build,
    Access,
    Containers,
    GrantPermission,
}

impl fmt::Display for PermissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Edit => "edit",
            Self::Build => "build",
            Self::Access => "access",
            Self::Containers => "containers",
            Self::GrantPermission => "grant-permission",
        };
        write!(f, "{name}")
    }
}

/// A permission question asked of a claim
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PermissionRequest {
    /// Modify the claim itself (resize, delete, abandon).
    Edit,
    /// Place a block; the material enables the farming exception.
    Build(Option<BlockKind>),
    /// Break a block of the given material.
    Break(BlockKind),
    /// Use doors, switches and similar.
    Access,
    /// Open containers and interact with claimed creatures.
    Container,
    /// Grant permissions to others.
    GrantPermission,
}

impl PermissionRequest {
    /// The request corresponding to a permission level
    pub fn for_level(level: PermissionLevel) -> Self {
        match level {
            PermissionLevel::Access => Self::Access,
            PermissionLevel::Inventory => Self::Container,
            PermissionLevel::Build => Self::Build(None),
        }
    }

    /// The kind reported to the host once the request resolves
    pub fn kind(&self) -> PermissionKind {
        match self {
            Self::Edit => PermissionKind::Edit,
            Self::Build(_) | Self::Break(_) => PermissionKind::Build,
            Self::Access => PermissionKind::Access,
            Self::Container => PermissionKind::Containers,
            Self::GrantPermission => PermissionKind::GrantPermission,
        }
    }

    /// Level an explicit or public grant must reach, if the request is level-based
    pub fn required_level(&self) -> Option<PermissionLevel> {
        match self {
            Self::Build(_) | Self::Break(_) => Some(PermissionLevel::Build),
            Self::Container => Some(PermissionLevel::Inventory),
            Self::Access => Some(PermissionLevel::Access),
            Self::Edit | Self::GrantPermission => None,
        }
    }

    /// Returns `true` if asking this question may pull a claim into a siege
    pub fn extends_siege(&self) -> bool {
        matches!(self, Self::Build(_) | Self::Container)
    }
}
