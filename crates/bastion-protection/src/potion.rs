//! Splash potions
//!
//! A splash is decided per affected entity rather than once per event: the host
//! drops the effect intensity to zero for every neutralized entity and applies the
//! rest. Two passes run for each effect. Harmful effects that can kill claimed
//! animals or lift them over fences are held back unless the thrower has container
//! trust where the animal stands; then, for player throwers, non-positive effects
//! are kept out of PvP safe zones.
//!
//! The thrower is told at most once per splash.

use crate::access::ClaimAccess;
use crate::entity::{Attacker, EntityKind, EntitySnapshot, ProjectileSource};
use crate::event::PotionSplashEvent;
use crate::outcome::{HostCommand, SplashOutcome};
use crate::pvp::{prevent_pvp, safe_zone_at};
use bastion_core::{ClaimId, Denial, DenialReason, PermissionRequest, PvpScope};
use tracing::debug;

struct Splash<'a> {
    access: &'a mut dyn ClaimAccess,
    event: &'a PotionSplashEvent,
    source: &'a ProjectileSource,
    thrower: Option<Attacker>,
    outcome: SplashOutcome,
    messaged: bool,
}

impl Splash<'_> {
    fn is_thrower(&self, entity: &EntitySnapshot) -> bool {
        self.thrower
            .is_some_and(|thrower| thrower.entity == entity.id)
    }

    fn tell_thrower(&mut self, denial: Denial) {
        let Some(thrower) = self.thrower else {
            return;
        };
        if self.messaged {
            return;
        }
        self.messaged = true;
        self.outcome.commands.push(HostCommand::NotifyActor {
            actor: thrower.actor,
            denial,
        });
    }

    /// A dispenser inside the same claim may splash its own animals
    fn block_source_in(&self, claim: ClaimId) -> bool {
        let ProjectileSource::Block { location } = self.source else {
            return false;
        };
        self.access
            .claim(claim)
            .is_some_and(|found| found.contains(location, false, false))
    }

    fn guard_claimed_creatures(&mut self) {
        let event = self.event;
        for affected in &event.affected {
            if self.is_thrower(affected) {
                continue;
            }
            if affected.kind != EntityKind::Villager && !affected.kind.is_animal() {
                continue;
            }
            let Some(claim) = self.access.locate(None, &affected.location) else {
                continue;
            };

            match self.thrower {
                None => {
                    if !self.block_source_in(claim) {
                        self.outcome.neutralize(affected.id);
                    }
                }
                Some(thrower) => {
                    let verdict =
                        self.access
                            .check(Some(thrower.actor), claim, &PermissionRequest::Container);
                    if verdict.is_denied() {
                        self.outcome.neutralize(affected.id);
                        let owner = self.access.owner_name(claim);
                        self.tell_thrower(Denial::new(DenialReason::NoDamageClaimedEntity { owner }));
                    }
                }
            }
        }
    }

    /// Keep non-positive effects away from players in PvP safe zones
    ///
    /// Only players standing in a world where PvP rules apply are considered. A
    /// splash in a world without PvP is not combat, so claims there are not safe
    /// zones and the player keeps the effect.
    fn guard_safe_zones(&mut self, thrower: Attacker) {
        if !self.access.config().pvp.any_safe_zones() {
            return;
        }
        let event = self.event;
        for affected in &event.affected {
            if self.is_thrower(affected) || !affected.is_player() {
                continue;
            }
            let Some(defender) = affected.actor else {
                continue;
            };
            if !self.access.pvp_rules_apply(affected.location.world) {
                continue;
            }

            // Throwing from inside a safe zone.
            if let Some(claim) = safe_zone_at(self.access, thrower.actor, &thrower.location) {
                let answer = prevent_pvp(self.access, PvpScope::Claim(claim), Some(thrower.actor), affected.id);
                if !answer.is_overridden() {
                    self.outcome.neutralize(affected.id);
                    self.tell_thrower(Denial::new(DenialReason::CantFightWhileImmune));
                }
                continue;
            }

            if let Some(claim) = safe_zone_at(self.access, defender, &affected.location) {
                let answer = prevent_pvp(self.access, PvpScope::Claim(claim), Some(thrower.actor), affected.id);
                if !answer.is_overridden() {
                    self.outcome.neutralize(affected.id);
                    self.tell_thrower(Denial::new(DenialReason::PlayerInPvpSafeZone));
                }
            }
        }
    }
}

/// Decide which affected entities a splash potion may reach
pub fn evaluate(access: &mut dyn ClaimAccess, event: &PotionSplashEvent) -> SplashOutcome {
    let Some(source) = event.source.as_ref() else {
        return SplashOutcome::default();
    };
    let mut splash = Splash {
        access,
        event,
        source,
        thrower: source.attacker(),
        outcome: SplashOutcome::default(),
        messaged: false,
    };

    for effect in &event.effects {
        if effect.restricted_on_claimed_creatures() {
            splash.guard_claimed_creatures();
        }
        // Non-player sources are only held back from claimed animals.
        let Some(thrower) = splash.thrower else {
            continue;
        };
        if effect.is_positive() {
            continue;
        }
        splash.guard_safe_zones(thrower);
    }

    debug!(
        affected = event.affected.len(),
        neutralized = splash.outcome.neutralized.len(),
        "potion splash evaluated"
    );
    splash.outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PotionEffectKind;
    use bastion_core::{EntityId, Location, PermissionLevel};
    use bastion_testkit::{actor, at, square, Scenario};

    fn cow(label: &str, location: Location) -> EntitySnapshot {
        EntitySnapshot::new(EntityId::named(label), EntityKind::Cow, location)
    }

    fn thrown_by(name: &str, location: Location) -> (EntitySnapshot, ProjectileSource) {
        let player = EntitySnapshot::player(actor(name), location);
        let source = ProjectileSource::Player {
            actor: actor(name),
            entity: player.id,
            location,
        };
        (player, source)
    }

    #[test]
    fn test_harmful_splash_spares_unclaimed_and_trusted() {
        let mut fixture = Scenario::new().named("alice").build();
        let claim = fixture.claim_for("alice", square(0, 0, 9, 9));
        let (bob, source) = thrown_by("bob", at(5, 64, 12));
        let inside = cow("inside", at(5, 64, 5));
        let outside = cow("outside", at(5, 64, 20));

        let event = PotionSplashEvent {
            source: Some(source),
            effects: vec![PotionEffectKind::InstantDamage, PotionEffectKind::Poison],
            affected: vec![bob.clone(), inside.clone(), outside.clone()],
        };
        let outcome = evaluate(&mut fixture.service, &event);
        assert_eq!(outcome.neutralized, vec![inside.id]);
        assert_eq!(outcome.commands.len(), 1);
        assert!(!outcome.is_neutralized(bob.id));

        fixture.trust(claim, "bob", PermissionLevel::Inventory);
        assert!(evaluate(&mut fixture.service, &event).neutralized.is_empty());
    }

    #[test]
    fn test_dispenser_in_same_claim_may_splash() {
        let mut fixture = Scenario::new().build();
        fixture.claim_for("alice", square(0, 0, 9, 9));
        let target = cow("cow", at(5, 64, 5));

        let mut event = PotionSplashEvent {
            source: Some(ProjectileSource::Block { location: at(1, 64, 1) }),
            effects: vec![PotionEffectKind::Poison],
            affected: vec![target.clone()],
        };
        assert!(evaluate(&mut fixture.service, &event).neutralized.is_empty());

        event.source = Some(ProjectileSource::Block { location: at(15, 64, 1) });
        let outcome = evaluate(&mut fixture.service, &event);
        assert_eq!(outcome.neutralized, vec![target.id]);
        assert!(outcome.commands.is_empty());
    }

    #[test]
    fn test_positive_effects_reach_players_in_safe_zones() {
        let mut fixture = Scenario::new().pvp().build();
        fixture.claim_for("carol", square(0, 0, 9, 9));
        let (bob, source) = thrown_by("bob", at(5, 64, 12));
        let defender = EntitySnapshot::player(actor("dave"), at(5, 64, 5));

        let healing = PotionSplashEvent {
            source: Some(source.clone()),
            effects: vec![PotionEffectKind::InstantHealth],
            affected: vec![bob.clone(), defender.clone()],
        };
        assert!(evaluate(&mut fixture.service, &healing).neutralized.is_empty());

        let weakness = PotionSplashEvent {
            effects: vec![PotionEffectKind::Weakness, PotionEffectKind::Slowness],
            ..healing
        };
        let outcome = evaluate(&mut fixture.service, &weakness);
        assert_eq!(outcome.neutralized, vec![defender.id]);
        assert_eq!(
            outcome.commands,
            vec![HostCommand::NotifyActor {
                actor: actor("bob"),
                denial: Denial::new(DenialReason::PlayerInPvpSafeZone),
            }]
        );
    }

    #[test]
    fn test_safe_zones_only_guard_pvp_worlds() {
        let mut fixture = Scenario::new().build();
        fixture.claim_for("carol", square(0, 0, 9, 9));
        let (bob, source) = thrown_by("bob", at(5, 64, 12));
        let defender = EntitySnapshot::player(actor("dave"), at(5, 64, 5));
        let event = PotionSplashEvent {
            source: Some(source),
            effects: vec![PotionEffectKind::Weakness],
            affected: vec![bob, defender.clone()],
        };

        let outcome = evaluate(&mut fixture.service, &event);
        assert!(outcome.neutralized.is_empty());
        assert!(outcome.commands.is_empty());

        fixture.host.enable_pvp(bastion_testkit::overworld());
        assert_eq!(evaluate(&mut fixture.service, &event).neutralized, vec![defender.id]);
    }

    #[test]
    fn test_missing_source_is_ignored() {
        let mut fixture = Scenario::new().build();
        fixture.claim_for("alice", square(0, 0, 9, 9));
        let event = PotionSplashEvent {
            source: None,
            effects: vec![PotionEffectKind::InstantDamage],
            affected: vec![cow("cow", at(5, 64, 5))],
        };
        assert_eq!(evaluate(&mut fixture.service, &event), SplashOutcome::default());
    }
}
