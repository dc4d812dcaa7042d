//! Entity model
//!
//! Hosts describe every entity involved in an event with an [`EntitySnapshot`]: its
//! kind, where it stands, and the few pieces of state the protection rules read
//! (tamer, current target, hostility markers, projectile shooter).

use bastion_core::{ActorId, EntityId, Location};
use serde::{Deserialize, Serialize};

/// Kinds of entity the protection rules distinguish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Player,

    // Monsters
    Zombie,
    Skeleton,
    Creeper,
    Spider,
    Enderman,
    Witch,
    Pillager,
    Vindicator,
    Evoker,
    EvokerFangs,
    Vex,
    Wither,
    Ghast,
    MagmaCube,
    Shulker,
    Slime,

    // Animals
    Rabbit,
    Panda,
    Hoglin,
    PolarBear,
    Horse,
    Donkey,
    Mule,
    Llama,
    TraderLlama,
    Wolf,
    Cat,
    Parrot,
    Cow,
    Pig,
    Sheep,
    Chicken,
    Axolotl,

    // Water mobs
    Squid,
    Dolphin,

    Villager,

    // Placeables
    ItemFrame,
    GlowItemFrame,
    ArmorStand,
    Painting,
    EndCrystal,

    // Vehicles
    Minecart,
    TntMinecart,
    Boat,

    // Projectiles and other damage sources
    Arrow,
    Trident,
    Snowball,
    ThrownPotion,
    Firework,
    Fireball,
    WindCharge,
    PrimedTnt,
    AreaEffectCloud,
    FallingBlock,
}

impl EntityKind {
    /// Kinds that are always hostile
    pub fn is_monster(self) -> bool {
        matches!(
            self,
            Self::Zombie
                | Self::Skeleton
                | Self::Creeper
                | Self::Spider
                | Self::Enderman
                | Self::Witch
                | Self::Pillager
                | Self::Vindicator
                | Self::Evoker
                | Self::Vex
                | Self::Wither
                | Self::Ghast
                | Self::MagmaCube
                | Self::Shulker
        )
    }

    pub fn is_animal(self) -> bool {
        matches!(
            self,
            Self::Rabbit
                | Self::Panda
                | Self::Hoglin
                | Self::PolarBear
                | Self::Horse
                | Self::Donkey
                | Self::Mule
                | Self::Llama
                | Self::TraderLlama
                | Self::Wolf
                | Self::Cat
                | Self::Parrot
                | Self::Cow
                | Self::Pig
                | Self::Sheep
                | Self::Chicken
                | Self::Axolotl
        )
    }

    pub fn is_water_mob(self) -> bool {
        matches!(self, Self::Squid | Self::Dolphin)
    }

    /// Living non-player mobs covered by creature protection
    pub fn is_creature(self) -> bool {
        self.is_animal() || self.is_water_mob() || self == Self::Villager
    }

    pub fn is_projectile(self) -> bool {
        matches!(
            self,
            Self::Arrow
                | Self::Trident
                | Self::Snowball
                | Self::ThrownPotion
                | Self::Firework
                | Self::Fireball
                | Self::WindCharge
        )
    }

    pub fn is_explosive(self) -> bool {
        matches!(
            self,
            Self::Fireball | Self::WindCharge | Self::PrimedTnt | Self::TntMinecart
        )
    }

    pub fn is_vehicle(self) -> bool {
        matches!(self, Self::Minecart | Self::TntMinecart | Self::Boat)
    }

    /// Placed or trade entities whose damage needs build trust
    pub fn needs_build_trust(self) -> bool {
        matches!(
            self,
            Self::ItemFrame | Self::GlowItemFrame | Self::ArmorStand | Self::Villager | Self::EndCrystal
        )
    }

    /// Entities that hang on or stand against blocks
    pub fn is_placeable(self) -> bool {
        matches!(
            self,
            Self::ItemFrame | Self::GlowItemFrame | Self::ArmorStand | Self::Painting
        )
    }
}

/// Hostility markers that depend on an entity's state rather than its kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disposition {
    /// Slime size; anything above zero attacks.
    pub slime_size: u8,
    pub killer_bunny: bool,
    /// Panda main gene is aggressive.
    pub aggressive_gene: bool,
    /// Hoglin or polar bear following a player's lure.
    pub lured: bool,
}

/// Who launched a projectile or area effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProjectileSource {
    Player {
        actor: ActorId,
        entity: EntityId,
        location: Location,
    },
    /// A dispenser or similar block.
    Block { location: Location },
    /// A non-player entity, e.g. a witch.
    Entity { kind: EntityKind },
}

impl ProjectileSource {
    /// The player behind this source, if any
    pub fn attacker(&self) -> Option<Attacker> {
        match self {
            Self::Player {
                actor,
                entity,
                location,
            } => Some(Attacker {
                actor: *actor,
                entity: *entity,
                location: *location,
            }),
            Self::Block { .. } | Self::Entity { .. } => None,
        }
    }
}

/// The player an event is attributed to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attacker {
    pub actor: ActorId,
    pub entity: EntityId,
    pub location: Location,
}

/// Everything the protection rules know about one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub kind: EntityKind,
    pub location: Location,
    /// Set for players.
    pub actor: Option<ActorId>,
    /// Tamer of a tamed animal.
    pub owner: Option<ActorId>,
    /// Entity this mob is currently targeting.
    pub target: Option<EntityId>,
    pub disposition: Disposition,
    /// Shooter of a projectile or area effect.
    pub shooter: Option<ProjectileSource>,
}

impl EntitySnapshot {
    pub fn new(id: EntityId, kind: EntityKind, location: Location) -> Self {
        Self {
            id,
            kind,
            location,
            actor: None,
            owner: None,
            target: None,
            disposition: Disposition::default(),
            shooter: None,
        }
    }

    /// A player entity; its entity id is derived from the actor id
    pub fn player(actor: ActorId, location: Location) -> Self {
        Self {
            actor: Some(actor),
            ..Self::new(EntityId::from_uuid(actor.uuid()), EntityKind::Player, location)
        }
    }

    pub fn tamed_by(mut self, owner: ActorId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn targeting(mut self, target: EntityId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = disposition;
        self
    }

    pub fn shot_by(mut self, source: ProjectileSource) -> Self {
        self.shooter = Some(source);
        self
    }

    /// Mark this projectile as launched by `player`, standing where the snapshot says
    pub fn shot_by_player(self, player: &EntitySnapshot) -> Self {
        match player.actor {
            Some(actor) => self.shot_by(ProjectileSource::Player {
                actor,
                entity: player.id,
                location: player.location,
            }),
            None => self,
        }
    }

    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::Player && self.actor.is_some()
    }

    pub fn is_tamed(&self) -> bool {
        self.owner.is_some()
    }

    /// The player this entity acts for: itself, or the shooter of a projectile
    pub fn attacker(&self) -> Option<Attacker> {
        if let Some(actor) = self.actor {
            return Some(Attacker {
                actor,
                entity: self.id,
                location: self.location,
            });
        }
        if self.kind.is_projectile() {
            return self.shooter.as_ref().and_then(ProjectileSource::attacker);
        }
        None
    }

    /// Monsters and mobs currently behaving like one are never protected
    pub fn is_hostile(&self) -> bool {
        if self.kind.is_monster() {
            return true;
        }
        match self.kind {
            EntityKind::Slime => self.disposition.slime_size > 0,
            EntityKind::Rabbit => self.disposition.killer_bunny,
            EntityKind::Panda => self.disposition.aggressive_gene,
            EntityKind::Hoglin | EntityKind::PolarBear => {
                self.target.is_some() && !self.disposition.lured
            }
            _ => false,
        }
    }
}
