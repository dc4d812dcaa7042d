//! Vehicle theft protection
//!
//! Vehicles can still be pushed around, so this only stops players without
//! container trust from breaking them, and explosions from wrecking them inside
//! claims.

use crate::access::ClaimAccess;
use crate::entity::{Attacker, EntityKind, EntitySnapshot};
use crate::event::VehicleDamageEvent;
use crate::outcome::{EventOutcome, HostCommand};
use bastion_core::{Denial, DenialReason, PermissionRequest, Rule, RuleChain, Verdict};
use tracing::debug;

struct VehicleContext<'a> {
    access: &'a mut dyn ClaimAccess,
    event: &'a VehicleDamageEvent,
    attacker: Option<Attacker>,
    commands: Vec<HostCommand>,
}

/// Sources that wreck vehicles without a player behind them
fn is_explosion_source(kind: EntityKind) -> bool {
    matches!(
        kind,
        EntityKind::Creeper | EntityKind::Wither | EntityKind::PrimedTnt
    )
}

fn theft_allowed(ctx: &mut VehicleContext<'_>) -> Option<Verdict> {
    (!ctx.access.config().claims.prevent_theft).then(Verdict::allow)
}

fn claims_disabled(ctx: &mut VehicleContext<'_>) -> Option<Verdict> {
    let world = ctx.event.vehicle.location.world;
    (!ctx.access.claims_enabled(world)).then(Verdict::allow)
}

fn harmless_source(ctx: &mut VehicleContext<'_>) -> Option<Verdict> {
    if ctx.attacker.is_some() {
        return None;
    }
    let explosive = ctx
        .event
        .damager
        .as_ref()
        .is_some_and(|damager| is_explosion_source(damager.kind));
    (!explosive).then(Verdict::allow)
}

fn claimed_vehicle(ctx: &mut VehicleContext<'_>) -> Option<Verdict> {
    let event = ctx.event;
    let actor = ctx.attacker.map(|attacker| attacker.actor);
    let claim = ctx.access.locate(actor, &event.vehicle.location)?;
    let Some(actor) = actor else {
        return Some(Verdict::deny(DenialReason::UnattributedDamage));
    };

    let verdict = ctx.access.check(Some(actor), claim, &PermissionRequest::Container);
    if verdict.is_allowed() {
        return Some(verdict);
    }
    let denial = Denial::new(DenialReason::NoDamageClaimedEntity {
        owner: ctx.access.owner_name(claim),
    })
    .with_override_hint(ctx.access.shows_ignore_hint(actor));
    ctx.commands.push(HostCommand::NotifyActor {
        actor,
        denial: denial.clone(),
    });
    Some(Verdict::Denied(denial))
}

/// Decide a vehicle damage event
pub fn evaluate(access: &mut dyn ClaimAccess, event: &VehicleDamageEvent) -> EventOutcome {
    let mut ctx = VehicleContext {
        access,
        event,
        attacker: event.damager.as_ref().and_then(EntitySnapshot::attacker),
        commands: Vec::new(),
    };

    let rules: [(&'static str, Rule<VehicleContext<'_>, Verdict>); 4] = [
        ("theft_allowed", theft_allowed),
        ("claims_disabled", claims_disabled),
        ("harmless_source", harmless_source),
        ("claimed_vehicle", claimed_vehicle),
    ];
    let decided = RuleChain::new("vehicle", &rules).evaluate_or(&mut ctx, Verdict::allow());

    debug!(
        vehicle = %event.vehicle.id,
        rule = decided.rule,
        cancelled = decided.value.is_denied(),
        "vehicle damage evaluated"
    );
    EventOutcome {
        verdict: decided.value,
        commands: ctx.commands,
        decided_by: decided.rule,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::{EntityId, PermissionLevel};
    use bastion_testkit::{actor, at, square, Scenario};

    fn boat() -> EntitySnapshot {
        EntitySnapshot::new(EntityId::named("boat"), EntityKind::Boat, at(3, 64, 3))
    }

    fn player(name: &str) -> EntitySnapshot {
        EntitySnapshot::player(actor(name), at(2, 64, 2))
    }

    #[test]
    fn test_stranger_cannot_break_claimed_boat() {
        let mut fixture = Scenario::new().named("alice").build();
        fixture.claim_for("alice", square(0, 0, 9, 9));

        let event = VehicleDamageEvent {
            vehicle: boat(),
            damager: Some(player("bob")),
        };
        let outcome = evaluate(&mut fixture.service, &event);
        assert!(outcome.is_cancelled());
        assert_eq!(outcome.decided_by, "claimed_vehicle");
        assert_eq!(outcome.messages(), vec!["That belongs to alice.".to_string()]);
    }

    #[test]
    fn test_trusted_player_and_owner_may_break() {
        let mut fixture = Scenario::new().build();
        let claim = fixture.claim_for("alice", square(0, 0, 9, 9));
        fixture.trust(claim, "bob", PermissionLevel::Inventory);

        for name in ["alice", "bob"] {
            let event = VehicleDamageEvent {
                vehicle: boat(),
                damager: Some(player(name)),
            };
            assert!(!evaluate(&mut fixture.service, &event).is_cancelled());
        }
    }

    #[test]
    fn test_explosions_only_blocked_inside_claims() {
        let mut fixture = Scenario::new().build();
        fixture.claim_for("alice", square(0, 0, 9, 9));
        let creeper = EntitySnapshot::new(EntityId::named("creeper"), EntityKind::Creeper, at(4, 64, 4));

        let inside = VehicleDamageEvent {
            vehicle: boat(),
            damager: Some(creeper.clone()),
        };
        let outcome = evaluate(&mut fixture.service, &inside);
        assert_eq!(
            outcome.verdict.denial_reason(),
            Some(&DenialReason::UnattributedDamage)
        );
        assert!(outcome.commands.is_empty());

        let mut outside = inside.clone();
        outside.vehicle.location = at(40, 64, 40);
        assert!(!evaluate(&mut fixture.service, &outside).is_cancelled());

        let zombie = EntitySnapshot::new(EntityId::named("zombie"), EntityKind::Zombie, at(4, 64, 4));
        let pushed = VehicleDamageEvent {
            vehicle: boat(),
            damager: Some(zombie),
        };
        assert_eq!(evaluate(&mut fixture.service, &pushed).decided_by, "harmless_source");
    }

    #[test]
    fn test_theft_protection_toggle() {
        let mut fixture = Scenario::new()
            .configure(|config| config.claims.prevent_theft = false)
            .build();
        fixture.claim_for("alice", square(0, 0, 9, 9));
        let event = VehicleDamageEvent {
            vehicle: boat(),
            damager: Some(player("bob")),
        };
        assert_eq!(evaluate(&mut fixture.service, &event).decided_by, "theft_allowed");
    }

    #[test]
    fn test_arrow_shot_by_stranger_is_attributed() {
        let mut fixture = Scenario::new().build();
        fixture.claim_for("alice", square(0, 0, 9, 9));
        let shooter = EntitySnapshot::player(actor("bob"), at(30, 64, 30));
        let arrow = EntitySnapshot::new(EntityId::named("arrow"), EntityKind::Arrow, at(3, 65, 3))
            .shot_by_player(&shooter);

        let event = VehicleDamageEvent {
            vehicle: boat(),
            damager: Some(arrow),
        };
        let outcome = evaluate(&mut fixture.service, &event);
        assert!(outcome.is_cancelled());
        assert!(matches!(
            outcome.commands.as_slice(),
            [HostCommand::NotifyActor { actor: who, .. }] if *who == actor("bob")
        ));
    }
}
