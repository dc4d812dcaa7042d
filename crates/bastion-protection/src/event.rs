//! World events evaluated by the protection chains

use crate::entity::{EntitySnapshot, ProjectileSource};
use serde::{Deserialize, Serialize};

/// Why an entity is taking damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageCause {
    EntityAttack,
    EntitySweepAttack,
    Projectile,
    BlockExplosion,
    EntityExplosion,
    FallingBlock,
    Fire,
    FireTick,
    Lava,
    Suffocation,
    Contact,
    Drowning,
    Fall,
    Magic,
    Poison,
    Wither,
    Other,
}

impl DamageCause {
    /// Environmental causes that are easy to inflict on someone else's pet
    pub fn endangers_pets(self) -> bool {
        matches!(
            self,
            Self::BlockExplosion
                | Self::EntityExplosion
                | Self::FallingBlock
                | Self::Fire
                | Self::FireTick
                | Self::Lava
                | Self::Suffocation
                | Self::Contact
                | Self::Drowning
        )
    }
}

/// An entity is about to take damage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub victim: EntitySnapshot,
    pub cause: DamageCause,
    /// Entity dealing the damage; `None` for purely environmental damage.
    pub damager: Option<EntitySnapshot>,
    /// Whether denials are reported to the attacking player.
    pub notify_actor: bool,
}

impl DamageEvent {
    /// Damage from the environment, with no entity behind it
    pub fn environmental(victim: EntitySnapshot, cause: DamageCause) -> Self {
        Self {
            victim,
            cause,
            damager: None,
            notify_actor: true,
        }
    }

    /// Damage dealt by another entity
    pub fn by_entity(victim: EntitySnapshot, damager: EntitySnapshot, cause: DamageCause) -> Self {
        Self {
            victim,
            cause,
            damager: Some(damager),
            notify_actor: true,
        }
    }

    /// An entity set on fire by another entity
    ///
    /// The host raises a regular damage event for the same hit, so combustion never
    /// messages the attacker.
    pub fn combustion(victim: EntitySnapshot, combuster: EntitySnapshot) -> Self {
        Self {
            victim,
            cause: DamageCause::FireTick,
            damager: Some(combuster),
            notify_actor: false,
        }
    }
}

/// A vehicle is about to take damage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDamageEvent {
    pub vehicle: EntitySnapshot,
    pub damager: Option<EntitySnapshot>,
}

/// Potion effects carried by a splash potion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PotionEffectKind {
    Absorption,
    Resistance,
    Haste,
    FireResistance,
    InstantHealth,
    HealthBoost,
    Strength,
    Invisibility,
    JumpBoost,
    NightVision,
    Regeneration,
    Saturation,
    Speed,
    WaterBreathing,
    InstantDamage,
    Poison,
    Wither,
    Slowness,
    Weakness,
    Blindness,
    Nausea,
    Hunger,
    SlowFalling,
    Levitation,
    Glowing,
    MiningFatigue,
}

impl PotionEffectKind {
    /// Effects that never need protecting against
    pub fn is_positive(self) -> bool {
        matches!(
            self,
            Self::Absorption
                | Self::Resistance
                | Self::Haste
                | Self::FireResistance
                | Self::InstantHealth
                | Self::HealthBoost
                | Self::Strength
                | Self::Invisibility
                | Self::JumpBoost
                | Self::NightVision
                | Self::Regeneration
                | Self::Saturation
                | Self::Speed
                | Self::WaterBreathing
        )
    }

    /// Effects that can kill claimed animals or lift them over fences
    pub fn restricted_on_claimed_creatures(self) -> bool {
        matches!(
            self,
            Self::InstantDamage | Self::Poison | Self::JumpBoost | Self::Wither
        )
    }
}

/// A splash potion landed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotionSplashEvent {
    /// Thrower or dispenser; potions without a source are ignored.
    pub source: Option<ProjectileSource>,
    pub effects: Vec<PotionEffectKind>,
    /// Every living entity the splash reaches, thrower included.
    pub affected: Vec<EntitySnapshot>,
}

/// What pushed the entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnockbackCause {
    Melee,
    WindCharge,
    Explosion,
}

/// An entity is about to be pushed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnockbackEvent {
    /// The pushing entity, already resolved to a projectile's shooter by the host.
    pub attacker: Option<EntitySnapshot>,
    pub defender: EntitySnapshot,
    pub cause: KnockbackCause,
}

impl KnockbackEvent {
    /// A wind charge fired by `shooter` pushing `defender`
    pub fn wind_charge(shooter: EntitySnapshot, defender: EntitySnapshot) -> Self {
        Self {
            attacker: Some(shooter),
            defender,
            cause: KnockbackCause::WindCharge,
        }
    }
}

