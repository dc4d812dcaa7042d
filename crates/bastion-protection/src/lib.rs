//! # Bastion Protection - Layer 3: Protection Policy
//!
//! Turns world events into verdicts. Each event kind is an ordered rule chain over a
//! context that borrows the claim service through [`ClaimAccess`]:
//!
//! - [`damage`]: entity damage and combustion, including the PvP chain
//! - [`vehicle`]: vehicle theft protection
//! - [`potion`]: splash potions, decided per affected entity
//! - [`knockback`]: melee, wind-charge and explosion pushes
//!
//! [`ProtectionEngine`] owns a [`ClaimService`](bastion_claims::ClaimService) and is
//! the entry point hosts call from their event listeners. Outcomes carry the verdict
//! together with the [`HostCommand`]s the host should carry out.

pub mod access;
pub mod damage;
pub mod engine;
pub mod entity;
pub mod event;
pub mod knockback;
pub mod outcome;
pub mod potion;
pub mod pvp;
pub mod vehicle;

pub use access::ClaimAccess;
pub use engine::ProtectionEngine;
pub use entity::{Attacker, Disposition, EntityKind, EntitySnapshot, ProjectileSource};
pub use event::{
    DamageCause, DamageEvent, KnockbackCause, KnockbackEvent, PotionEffectKind, PotionSplashEvent,
    VehicleDamageEvent,
};
pub use outcome::{EventOutcome, HostCommand, SplashOutcome};
