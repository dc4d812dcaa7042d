//! Protection engine: the host-facing entry point
//!
//! Owns the claim service so that every event sees claims, player state and the
//! host effects through one borrow. Hosts that share the service across threads
//! can call the per-event `evaluate` functions with a locked
//! [`SharedClaimService`](bastion_claims::SharedClaimService) guard instead.

use crate::event::{DamageEvent, KnockbackEvent, PotionSplashEvent, VehicleDamageEvent};
use crate::outcome::{EventOutcome, SplashOutcome};
use crate::{damage, knockback, potion, vehicle};
use bastion_claims::{ClaimPersistence, ClaimService};
use bastion_core::{HostEffects, ProtectionConfig, Result};

/// Evaluates world events against the claims of one service
pub struct ProtectionEngine<P, E> {
    service: ClaimService<P, E>,
}

impl<P: ClaimPersistence, E: HostEffects> ProtectionEngine<P, E> {
    pub fn new(service: ClaimService<P, E>) -> Self {
        Self { service }
    }

    /// Validate the configuration, load stored claims and wrap the service
    pub fn load(config: ProtectionConfig, persistence: P, effects: E) -> Result<Self> {
        ClaimService::load(config, persistence, effects).map(Self::new)
    }

    pub fn service(&self) -> &ClaimService<P, E> {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut ClaimService<P, E> {
        &mut self.service
    }

    pub fn into_service(self) -> ClaimService<P, E> {
        self.service
    }

    /// Decide an entity damage or combustion event
    pub fn evaluate_damage_event(&mut self, event: &DamageEvent) -> EventOutcome {
        damage::evaluate(&mut self.service, event)
    }

    /// Decide a vehicle damage event
    pub fn evaluate_vehicle_damage(&mut self, event: &VehicleDamageEvent) -> EventOutcome {
        vehicle::evaluate(&mut self.service, event)
    }

    /// Decide which entities a splash potion may affect
    pub fn evaluate_potion_splash(&mut self, event: &PotionSplashEvent) -> SplashOutcome {
        potion::evaluate(&mut self.service, event)
    }

    /// Decide a knockback event
    pub fn evaluate_knockback_event(&mut self, event: &KnockbackEvent) -> EventOutcome {
        knockback::evaluate(&mut self.service, event)
    }

    /// Record PvP combat after damage was applied; see [`damage::record_pvp_damage`]
    pub fn record_pvp_damage(&mut self, event: &DamageEvent, amount: f64) -> bool {
        damage::record_pvp_damage(&mut self.service, event, amount)
    }
}
