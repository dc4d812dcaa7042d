//! Entity damage
//!
//! One ordered chain decides every damage event. Early rules settle whole classes
//! of victim (hostile mobs, unprotected species, pets hurt by the environment); the
//! PvP rules then run only when both sides are players in a PvP world; the claim
//! rules last protect placed entities, pets and creatures inside claims.
//!
//! Combustion re-uses the chain with `notify_actor` off, since the host raises a
//! damage event for the same hit and the player would otherwise hear twice.

use crate::access::ClaimAccess;
use crate::entity::{Attacker, EntityKind, EntitySnapshot};
use crate::event::{DamageCause, DamageEvent};
use crate::outcome::{EventOutcome, HostCommand};
use crate::pvp::{fresh_spawn_denial, prevent_pvp, pvp_in_claim, safe_zone_at};
use bastion_core::{
    ActorId, ClaimBounds, ClaimId, Denial, DenialReason, PermissionRequest, PvpOverride, PvpScope,
    Rule, RuleChain, Verdict,
};
use tracing::debug;

struct DamageContext<'a> {
    access: &'a mut dyn ClaimAccess,
    event: &'a DamageEvent,
    attacker: Option<Attacker>,
    pvp_rules: bool,
    commands: Vec<HostCommand>,
}

impl DamageContext<'_> {
    fn notify(&mut self, denial: Denial) {
        if !self.event.notify_actor {
            return;
        }
        if let Some(attacker) = self.attacker {
            self.commands.push(HostCommand::NotifyActor {
                actor: attacker.actor,
                denial,
            });
        }
    }

    fn deny_and_notify(&mut self, denial: Denial) -> Verdict {
        self.notify(denial.clone());
        Verdict::Denied(denial)
    }

    /// Settle a safe-zone block: enforced blocks deny and message the attacker
    fn settle_pvp(&mut self, answer: PvpOverride, reason: DenialReason) -> Verdict {
        if answer.is_overridden() {
            Verdict::allow()
        } else {
            self.deny_and_notify(Denial::new(reason))
        }
    }

    /// The victim as a PvP defender, when PvP rules cover this event
    fn pvp_defender(&self) -> Option<ActorId> {
        let victim = &self.event.victim;
        if self.pvp_rules && victim.is_player() {
            victim.actor
        } else {
            None
        }
    }

    /// Creature protection applies to this victim
    fn protected_creature(&self) -> bool {
        self.event.victim.kind.is_creature() && self.access.config().claims.protect_creatures
    }

    /// "That belongs to ..." for the attacker, with the bypass hint when they hold it
    fn belongs_to(&self, owner: String, attacker: ActorId) -> Denial {
        Denial::new(DenialReason::NoDamageClaimedEntity { owner })
            .with_override_hint(self.access.shows_ignore_hint(attacker))
    }

    fn locate_victim(&mut self) -> Option<ClaimId> {
        let actor = self.attacker.map(|attacker| attacker.actor);
        self.access.locate(actor, &self.event.victim.location)
    }
}

fn hostile_victim(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    ctx.event.victim.is_hostile().then(Verdict::allow)
}

fn species_toggle(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    let rules = &ctx.access.config().claims;
    let unprotected = match ctx.event.victim.kind {
        EntityKind::Horse => !rules.protect_horses,
        EntityKind::Donkey | EntityKind::Mule => !rules.protect_donkeys,
        EntityKind::Llama | EntityKind::TraderLlama => !rules.protect_llamas,
        _ => false,
    };
    unprotected.then(Verdict::allow)
}

fn pet_environment(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    let endangered =
        !ctx.pvp_rules && ctx.event.victim.is_tamed() && ctx.event.cause.endangers_pets();
    endangered.then(|| Verdict::deny(DenialReason::PetEnvironmentalHazard))
}

fn block_explosion(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    let event = ctx.event;
    let victim = &event.victim;
    // Players may still hurt themselves or others with block explosions.
    if event.cause != DamageCause::BlockExplosion || victim.is_player() {
        return None;
    }
    ctx.access.locate(None, &victim.location)?;
    Some(Verdict::deny(DenialReason::ExplosionInClaim))
}

fn environmental(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    ctx.event.damager.is_none().then(Verdict::allow)
}

fn lingering_potion(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    let defender = ctx.pvp_defender()?;
    let event = ctx.event;
    if event.damager.as_ref()?.kind != EntityKind::AreaEffectCloud {
        return None;
    }
    if ctx.access.config().pvp.protect_fresh_spawns && ctx.access.is_pvp_immune(defender) {
        return Some(Verdict::deny(DenialReason::ThatPlayerPvpImmune));
    }
    let claim = safe_zone_at(ctx.access, defender, &event.victim.location)?;
    let attacker = ctx.attacker.map(|attacker| attacker.actor);
    let answer = prevent_pvp(ctx.access, PvpScope::Claim(claim), attacker, event.victim.id);
    Some(if answer.is_overridden() {
        Verdict::allow()
    } else {
        Verdict::deny(DenialReason::PlayerInPvpSafeZone)
    })
}

fn player_pvp(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    let defender = ctx.pvp_defender()?;
    let attacker = ctx.attacker?;
    if attacker.actor == defender {
        return None;
    }
    if let Some(reason) = fresh_spawn_denial(ctx.access, attacker.actor, defender) {
        return Some(ctx.deny_and_notify(Denial::new(reason)));
    }
    if ctx.access.player(attacker.actor).ignore_claims || !ctx.access.config().pvp.any_safe_zones() {
        return None;
    }

    let event = ctx.event;
    let victim = event.victim.id;
    let from_safe_zone = pvp_in_claim(
        ctx.access,
        attacker.actor,
        &attacker.location,
        Some(attacker.actor),
        victim,
    );
    if let Some(answer) = from_safe_zone {
        return Some(ctx.settle_pvp(answer, DenialReason::CantFightWhileImmune));
    }
    let into_safe_zone = pvp_in_claim(
        ctx.access,
        defender,
        &event.victim.location,
        Some(attacker.actor),
        victim,
    )?;
    Some(ctx.settle_pvp(into_safe_zone, DenialReason::PlayerInPvpSafeZone))
}

fn claims_disabled(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    let world = ctx.event.victim.location.world;
    (!ctx.access.claims_enabled(world)).then(Verdict::allow)
}

fn pet_pvp(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    let event = ctx.event;
    if !event.victim.is_player() {
        return None;
    }
    let defender = event.victim.actor?;
    let pet = event.damager.as_ref().filter(|damager| damager.is_tamed())?;
    if ctx.access.is_pvp_immune(defender) {
        return None;
    }
    let answer = pvp_in_claim(ctx.access, defender, &event.victim.location, None, event.victim.id)?;
    if answer.is_overridden() {
        return Some(Verdict::allow());
    }
    ctx.commands.push(HostCommand::ClearTarget { entity: pet.id });
    Some(Verdict::deny(DenialReason::PlayerInPvpSafeZone))
}

fn build_protected(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    let event = ctx.event;
    let victim = &event.victim;
    if !victim.kind.needs_build_trust() {
        return None;
    }
    if victim.kind == EntityKind::Villager {
        // Zombies may always besiege villages, claimed or not.
        let by_zombie = event
            .damager
            .as_ref()
            .is_some_and(|damager| damager.kind == EntityKind::Zombie);
        if !ctx.access.config().claims.protect_creatures || by_zombie {
            return Some(Verdict::allow());
        }
    }

    let claim = ctx.locate_victim()?;
    let Some(attacker) = ctx.attacker else {
        return Some(Verdict::deny(DenialReason::UnattributedDamage));
    };
    let verdict = ctx
        .access
        .check(Some(attacker.actor), claim, &PermissionRequest::Build(None));
    match verdict {
        Verdict::Denied(denial) => Some(ctx.deny_and_notify(denial)),
        Verdict::Allowed => ctx
            .access
            .config()
            .claims
            .build_trust_short_circuits_entity_checks
            .then(Verdict::allow),
    }
}

fn owned_pet(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    if !ctx.protected_creature() {
        return None;
    }
    let event = ctx.event;
    let victim = &event.victim;
    let owner = victim.owner?;
    let attacker = ctx.attacker?;
    if attacker.actor == owner || ctx.access.player(attacker.actor).ignore_claims {
        return Some(Verdict::allow());
    }

    let guarded_pet = ctx.access.config().pvp.protect_pets && victim.kind != EntityKind::Wolf;
    if !ctx.pvp_rules || guarded_pet {
        let denial = ctx.belongs_to(ctx.access.actor_name(owner), attacker.actor);
        ctx.notify(denial.clone());
        let scope = PvpScope::Inert(ClaimBounds::around(&victim.location));
        let answer = prevent_pvp(ctx.access, scope, Some(attacker.actor), victim.id);
        return Some(if answer.is_overridden() {
            Verdict::allow()
        } else {
            Verdict::Denied(denial)
        });
    }
    if ctx.access.is_pvp_immune(attacker.actor) {
        return Some(ctx.deny_and_notify(Denial::new(DenialReason::CantFightWhileImmune)));
    }
    if victim.kind == EntityKind::Wolf {
        // A wolf attacking you may be fought back.
        if victim.target == Some(attacker.entity) {
            return Some(Verdict::allow());
        }
        let denial = ctx.belongs_to(ctx.access.actor_name(owner), attacker.actor);
        return Some(ctx.deny_and_notify(denial));
    }
    None
}

/// Damage sources that can hurt creatures without anyone being responsible
fn is_incidental(damager: &EntitySnapshot) -> bool {
    let kind = damager.kind;
    let dangerous = matches!(
        kind,
        EntityKind::Creeper
            | EntityKind::Wither
            | EntityKind::EndCrystal
            | EntityKind::AreaEffectCloud
            | EntityKind::Witch
    );
    !dangerous && !kind.is_projectile() && !kind.is_explosive()
}

fn incidental(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    if !ctx.protected_creature() || ctx.attacker.is_some() {
        return None;
    }
    let damager = ctx.event.damager.as_ref()?;
    is_incidental(damager).then(Verdict::allow)
}

fn claimed_creature(ctx: &mut DamageContext<'_>) -> Option<Verdict> {
    if !ctx.protected_creature() {
        return None;
    }
    let event = ctx.event;
    let damager = event.damager.as_ref()?;
    let claim = ctx.locate_victim()?;

    // Villagers never get here unattributed; build_protected settles them.
    let Some(attacker) = ctx.attacker else {
        if damager.kind.is_projectile() {
            ctx.commands.push(HostCommand::RemoveProjectile { entity: damager.id });
        }
        return Some(Verdict::deny(DenialReason::UnattributedDamage));
    };

    let world = event.victim.location.world;
    if event.victim.kind == EntityKind::Wolf && ctx.access.host().world_pvp_enabled(world) {
        return Some(Verdict::allow());
    }
    let verdict = ctx
        .access
        .check(Some(attacker.actor), claim, &PermissionRequest::Container);
    if verdict.is_allowed() {
        return Some(verdict);
    }

    // Kill the arrow so it does not bounce between crowded animals.
    if damager.kind.is_projectile() && damager.kind != EntityKind::Trident {
        ctx.commands.push(HostCommand::RemoveProjectile { entity: damager.id });
    }
    if damager.kind == EntityKind::Firework && !event.victim.is_player() {
        return Some(Verdict::allow());
    }
    let denial = ctx.belongs_to(ctx.access.owner_name(claim), attacker.actor);
    Some(ctx.deny_and_notify(denial))
}

/// Decide a damage or combustion event
pub fn evaluate(access: &mut dyn ClaimAccess, event: &DamageEvent) -> EventOutcome {
    let pvp_rules = access.pvp_rules_apply(event.victim.location.world);
    let mut ctx = DamageContext {
        access,
        event,
        attacker: event.damager.as_ref().and_then(EntitySnapshot::attacker),
        pvp_rules,
        commands: Vec::new(),
    };

    let rules: [(&'static str, Rule<DamageContext<'_>, Verdict>); 13] = [
        ("hostile_victim", hostile_victim),
        ("species_toggle", species_toggle),
        ("pet_environment", pet_environment),
        ("block_explosion", block_explosion),
        ("environmental", environmental),
        ("lingering_potion", lingering_potion),
        ("player_pvp", player_pvp),
        ("claims_disabled", claims_disabled),
        ("pet_pvp", pet_pvp),
        ("build_protected", build_protected),
        ("owned_pet", owned_pet),
        ("incidental", incidental),
        ("claimed_creature", claimed_creature),
    ];
    let decided = RuleChain::new("damage", &rules).evaluate_or(&mut ctx, Verdict::allow());

    debug!(
        victim = %event.victim.id,
        kind = ?event.victim.kind,
        cause = ?event.cause,
        rule = decided.rule,
        cancelled = decided.value.is_denied(),
        "damage evaluated"
    );
    EventOutcome {
        verdict: decided.value,
        commands: ctx.commands,
        decided_by: decided.rule,
    }
}

/// Tag both players as in combat after PvP damage actually landed
///
/// Only non-zero damage between two different players in a PvP world counts.
/// Returns `true` if combat was recorded.
pub fn record_pvp_damage(access: &mut dyn ClaimAccess, event: &DamageEvent, amount: f64) -> bool {
    if amount <= 0.0 || !event.victim.is_player() {
        return false;
    }
    let Some(defender) = event.victim.actor else {
        return false;
    };
    let Some(attacker) = event.damager.as_ref().and_then(EntitySnapshot::attacker) else {
        return false;
    };
    if attacker.actor == defender || !access.pvp_rules_apply(event.victim.location.world) {
        return false;
    }
    access.record_pvp_contact(attacker.actor, defender);
    debug!(attacker = %attacker.actor, defender = %defender, "pvp combat recorded");
    true
}
