//! Knockback
//!
//! Pushing is decided like damage but on its own chains: one for players being
//! pushed, one for entities. Only pushes attributed to a player are examined.
//! A player may always push themselves, which keeps wind-charge mobility working
//! everywhere, and players trusted with containers where the defender stands may
//! push each other regardless of PvP rules.

use crate::access::ClaimAccess;
use crate::entity::{Attacker, EntityKind, EntitySnapshot};
use crate::event::KnockbackEvent;
use crate::outcome::{EventOutcome, HostCommand};
use crate::pvp::{fresh_spawn_denial, is_safe_zone, prevent_pvp, safe_zone_at};
use bastion_core::{
    ActorId, ClaimId, Denial, DenialReason, PermissionRequest, PvpScope, Rule, RuleChain, Verdict,
};
use tracing::debug;

struct KnockbackContext<'a> {
    access: &'a mut dyn ClaimAccess,
    event: &'a KnockbackEvent,
    attacker: Attacker,
    /// Claim at the defender's location, once looked up
    defender_claim: Option<ClaimId>,
    required: Option<PermissionRequest>,
    commands: Vec<HostCommand>,
}

impl KnockbackContext<'_> {
    fn deny_and_notify(&mut self, denial: Denial) -> Verdict {
        self.commands.push(HostCommand::NotifyActor {
            actor: self.attacker.actor,
            denial: denial.clone(),
        });
        Verdict::Denied(denial)
    }

    fn defender_actor(&self) -> Option<ActorId> {
        self.event.defender.actor
    }
}

fn self_knockback(ctx: &mut KnockbackContext<'_>) -> Option<Verdict> {
    (ctx.defender_actor() == Some(ctx.attacker.actor)).then(Verdict::allow)
}

fn ignoring_claims(ctx: &mut KnockbackContext<'_>) -> Option<Verdict> {
    ctx.access
        .player(ctx.attacker.actor)
        .ignore_claims
        .then(Verdict::allow)
}

fn trusted_claim(ctx: &mut KnockbackContext<'_>) -> Option<Verdict> {
    let event = ctx.event;
    let claim = ctx.access.locate(event.defender.actor, &event.defender.location);
    ctx.defender_claim = claim;
    let verdict = ctx
        .access
        .check(Some(ctx.attacker.actor), claim?, &PermissionRequest::Container);
    verdict.is_allowed().then_some(verdict)
}

fn pvp_disabled(ctx: &mut KnockbackContext<'_>) -> Option<Verdict> {
    let world = ctx.event.defender.location.world;
    (!ctx.access.pvp_rules_apply(world)).then(|| Verdict::deny(DenialReason::PvpDisabled))
}

fn fresh_spawn(ctx: &mut KnockbackContext<'_>) -> Option<Verdict> {
    let defender = ctx.defender_actor()?;
    let reason = fresh_spawn_denial(ctx.access, ctx.attacker.actor, defender)?;
    Some(ctx.deny_and_notify(Denial::new(reason)))
}

fn defender_safe_zone(ctx: &mut KnockbackContext<'_>) -> Option<Verdict> {
    let claim = ctx.defender_claim?;
    let safe = ctx
        .access
        .claim(claim)
        .is_some_and(|found| is_safe_zone(found, &ctx.access.config().pvp));
    if !safe {
        return None;
    }
    let scope = PvpScope::Claim(claim);
    let answer = prevent_pvp(ctx.access, scope, Some(ctx.attacker.actor), ctx.event.defender.id);
    Some(if answer.is_overridden() {
        Verdict::allow()
    } else {
        ctx.deny_and_notify(Denial::new(DenialReason::PlayerInPvpSafeZone))
    })
}

fn attacker_safe_zone(ctx: &mut KnockbackContext<'_>) -> Option<Verdict> {
    let attacker = ctx.attacker;
    let claim = safe_zone_at(ctx.access, attacker.actor, &attacker.location)?;
    let answer = prevent_pvp(
        ctx.access,
        PvpScope::Claim(claim),
        Some(attacker.actor),
        ctx.event.defender.id,
    );
    Some(if answer.is_overridden() {
        Verdict::allow()
    } else {
        ctx.deny_and_notify(Denial::new(DenialReason::CantFightWhileImmune))
    })
}

/// Trust needed to push `entity` around inside a claim, if any
fn required_permission(entity: &EntitySnapshot, protect_creatures: bool) -> Option<PermissionRequest> {
    if entity.kind.is_placeable() {
        return Some(PermissionRequest::Build(None));
    }
    if entity.kind.is_creature() && protect_creatures && !entity.is_hostile() {
        return Some(PermissionRequest::Container);
    }
    None
}

fn claims_disabled(ctx: &mut KnockbackContext<'_>) -> Option<Verdict> {
    let world = ctx.event.defender.location.world;
    (!ctx.access.claims_enabled(world)).then(Verdict::allow)
}

fn unprotected_entity(ctx: &mut KnockbackContext<'_>) -> Option<Verdict> {
    let protect_creatures = ctx.access.config().claims.protect_creatures;
    ctx.required = required_permission(&ctx.event.defender, protect_creatures);
    ctx.required.is_none().then(Verdict::allow)
}

fn unclaimed(ctx: &mut KnockbackContext<'_>) -> Option<Verdict> {
    let event = ctx.event;
    ctx.defender_claim = ctx
        .access
        .locate(Some(ctx.attacker.actor), &event.defender.location);
    ctx.defender_claim.is_none().then(Verdict::allow)
}

fn claim_permission(ctx: &mut KnockbackContext<'_>) -> Option<Verdict> {
    let claim = ctx.defender_claim?;
    let request = ctx.required.clone()?;
    match ctx.access.check(Some(ctx.attacker.actor), claim, &request) {
        Verdict::Denied(denial) => Some(ctx.deny_and_notify(denial)),
        allowed @ Verdict::Allowed => Some(allowed),
    }
}

/// Decide a knockback event
pub fn evaluate(access: &mut dyn ClaimAccess, event: &KnockbackEvent) -> EventOutcome {
    let Some(attacker) = event.attacker.as_ref().and_then(EntitySnapshot::attacker) else {
        return EventOutcome {
            verdict: Verdict::allow(),
            commands: Vec::new(),
            decided_by: "non_player_source",
        };
    };
    let mut ctx = KnockbackContext {
        access,
        event,
        attacker,
        defender_claim: None,
        required: None,
        commands: Vec::new(),
    };

    let decided = if event.defender.kind == EntityKind::Player {
        let rules: [(&'static str, Rule<KnockbackContext<'_>, Verdict>); 7] = [
            ("self_knockback", self_knockback),
            ("ignoring_claims", ignoring_claims),
            ("trusted_claim", trusted_claim),
            ("pvp_disabled", pvp_disabled),
            ("fresh_spawn", fresh_spawn),
            ("defender_safe_zone", defender_safe_zone),
            ("attacker_safe_zone", attacker_safe_zone),
        ];
        RuleChain::new("knockback_player", &rules).evaluate_or(&mut ctx, Verdict::allow())
    } else {
        let rules: [(&'static str, Rule<KnockbackContext<'_>, Verdict>); 5] = [
            ("claims_disabled", claims_disabled),
            ("unprotected_entity", unprotected_entity),
            ("ignoring_claims", ignoring_claims),
            ("unclaimed", unclaimed),
            ("claim_permission", claim_permission),
        ];
        RuleChain::new("knockback_entity", &rules).evaluate_or(&mut ctx, Verdict::allow())
    };

    debug!(
        defender = %event.defender.id,
        cause = ?event.cause,
        rule = decided.rule,
        cancelled = decided.value.is_denied(),
        "knockback evaluated"
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
    use bastion_core::EntityId;
    use bastion_testkit::{actor, at, square, Scenario};

    #[test]
    fn test_placeables_need_build_and_creatures_need_containers() {
        let cow = EntitySnapshot::new(EntityId::named("cow"), EntityKind::Cow, at(0, 64, 0));
        let frame = EntitySnapshot::new(EntityId::named("frame"), EntityKind::ItemFrame, at(0, 64, 0));
        let zombie = EntitySnapshot::new(EntityId::named("zombie"), EntityKind::Zombie, at(0, 64, 0));
        let boat = EntitySnapshot::new(EntityId::named("boat"), EntityKind::Boat, at(0, 64, 0));

        assert_eq!(required_permission(&frame, true), Some(PermissionRequest::Build(None)));
        assert_eq!(required_permission(&cow, true), Some(PermissionRequest::Container));
        assert_eq!(required_permission(&cow, false), None);
        assert_eq!(required_permission(&zombie, true), None);
        assert_eq!(required_permission(&boat, true), None);
    }

    #[test]
    fn test_mob_pushes_are_ignored() {
        let mut fixture = Scenario::new().build();
        fixture.claim_for("alice", square(0, 0, 9, 9));
        let creeper = EntitySnapshot::new(EntityId::named("creeper"), EntityKind::Creeper, at(3, 64, 3));
        let event = KnockbackEvent {
            attacker: Some(creeper),
            defender: EntitySnapshot::player(actor("bob"), at(4, 64, 4)),
            cause: crate::event::KnockbackCause::Explosion,
        };
        let outcome = evaluate(&mut fixture.service, &event);
        assert_eq!(outcome.decided_by, "non_player_source");
        assert!(!outcome.is_cancelled());
    }

    #[test]
    fn test_pve_world_blocks_pushing_players_silently() {
        let mut fixture = Scenario::new().build();
        let event = KnockbackEvent::wind_charge(
            EntitySnapshot::player(actor("alice"), at(50, 64, 50)),
            EntitySnapshot::player(actor("bob"), at(52, 64, 50)),
        );
        let outcome = evaluate(&mut fixture.service, &event);
        assert_eq!(outcome.verdict.denial_reason(), Some(&DenialReason::PvpDisabled));
        assert!(outcome.commands.is_empty());
    }
}
