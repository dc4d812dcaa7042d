//! Identifier types used across Bastion
//!
//! Actors, worlds and entities are identified by the host's UUIDs. Claims and sieges
//! are numbered by Bastion itself and are never reused once assigned.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const BASTION_NAMESPACE: Uuid = Uuid::from_u128(0x6d3c_1f4a_8b2e_4c71_9a05_2f6e_b8d4_c013);

fn named_uuid(kind: &str, name: &str) -> Uuid {
    Uuid::new_v5(&BASTION_NAMESPACE, format!("{kind}:{name}").as_bytes())
}

/// Stable claim identifier
///
/// Assigned by the claim store at creation time. Subdivisions receive identifiers
/// from the same sequence as top-level claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(pub u64);

impl ClaimId {
    /// Create a claim ID from its numeric value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the inner numeric value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Get the next identifier in sequence
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "claim-{}", self.0)
    }
}

impl From<u64> for ClaimId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Identifier of a player-controlled actor
///
/// The lowercase hyphenated UUID doubles as the actor's principal key inside a
/// claim's permission map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub Uuid);

impl ActorId {
    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Derive a deterministic actor ID from a player name
    pub fn from_name(name: &str) -> Self {
        Self(named_uuid("actor", name))
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Key under which this actor's grants are stored in a permission map
    pub fn principal_key(&self) -> String {
        self.0.hyphenated().to_string()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ActorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl From<Uuid> for ActorId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ActorId> for Uuid {
    fn from(actor: ActorId) -> Self {
        actor.0
    }
}

/// World (dimension) identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub Uuid);

impl WorldId {
    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Derive a deterministic world ID from a world name
    pub fn named(name: &str) -> Self {
        Self(named_uuid("world", name))
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for WorldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "world-{}", self.0)
    }
}

impl From<Uuid> for WorldId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identifier of a host entity (players, mobs, projectiles, vehicles)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Create from a UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Derive a deterministic entity ID from a label
    pub fn named(label: &str) -> Self {
        Self(named_uuid("entity", label))
    }

    /// Get the inner UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity-{}", self.0)
    }
}

impl From<Uuid> for EntityId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identifier of a running siege
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiegeId(pub u64);

impl SiegeId {
    /// Create a siege ID from its numeric value
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the inner numeric value
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Get the next identifier in sequence
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SiegeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "siege-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_key_is_lowercase_hyphenated() {
        let actor = ActorId::from_uuid(Uuid::from_u128(0xABCD_EF01_2345_6789_ABCD_EF01_2345_6789));
        let key = actor.principal_key();
        assert_eq!(key, key.to_lowercase());
        assert_eq!(key.len(), 36);
        assert_eq!(key, actor.to_string());
    }

    #[test]
    fn test_named_ids_are_deterministic() {
        assert_eq!(ActorId::from_name("alice"), ActorId::from_name("alice"));
        assert_ne!(ActorId::from_name("alice"), ActorId::from_name("bob"));
        assert_eq!(WorldId::named("overworld"), WorldId::named("overworld"));
        assert_ne!(
            WorldId::named("overworld").uuid(),
            ActorId::from_name("overworld").uuid()
        );
    }

    #[test]
    fn test_actor_id_parses_uppercase() {
        let actor = ActorId::from_name("carol");
        let upper = actor.to_string().to_uppercase();
        let parsed: ActorId = upper.parse().unwrap();
        assert_eq!(parsed, actor);
    }

    #[test]
    fn test_claim_id_sequence() {
        let id = ClaimId::new(41);
        assert_eq!(id.next().value(), 42);
        assert_eq!(id.to_string(), "claim-41");
    }
}
