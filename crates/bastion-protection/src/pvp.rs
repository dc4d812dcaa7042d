//! PvP safe zones and fresh-spawn immunity
//!
//! Shared by the damage, splash and knockback chains. A claim is a safe zone when
//! the configuration forbids combat in its kind of claim and it is not besieged.
//! Every safe-zone block is first offered to the host as a
//! [`PvpPreventionNotice`], which may let the attack through.

use crate::access::ClaimAccess;
use bastion_claims::ClaimRef;
use bastion_core::{
    ActorId, ClaimId, DenialReason, EntityId, Location, PvpOverride, PvpPreventionNotice, PvpRules,
    PvpScope,
};
use tracing::debug;

/// Returns `true` if combat is forbidden inside `claim`
pub fn is_safe_zone(claim: ClaimRef<'_>, rules: &PvpRules) -> bool {
    if claim.siege().is_some() {
        return false;
    }
    if !claim.is_admin_claim() {
        return rules.no_combat_in_player_claims;
    }
    if claim.is_subdivision() {
        rules.no_combat_in_admin_subdivisions
    } else {
        rules.no_combat_in_admin_claims
    }
}

/// The safe-zone claim at `location`, looked up with `player`'s cached claim
pub fn safe_zone_at(access: &mut dyn ClaimAccess, player: ActorId, location: &Location) -> Option<ClaimId> {
    let claim = access.locate(Some(player), location)?;
    let safe = access
        .claim(claim)
        .is_some_and(|found| is_safe_zone(found, &access.config().pvp));
    safe.then_some(claim)
}

/// Offer a safe-zone block to the host
pub fn prevent_pvp(
    access: &dyn ClaimAccess,
    scope: PvpScope,
    attacker: Option<ActorId>,
    defender: EntityId,
) -> PvpOverride {
    let notice = PvpPreventionNotice {
        scope,
        attacker,
        defender,
    };
    let answer = access.host().pvp_prevention(&notice);
    debug!(scope = ?notice.scope, defender = %defender, overridden = answer.is_overridden(), "pvp prevention");
    answer
}

/// Safe-zone check at one combatant's location
///
/// Players already in combat carry no safe zone with them. Returns `None` when the
/// location is not a safe zone, otherwise the host's answer.
pub fn pvp_in_claim(
    access: &mut dyn ClaimAccess,
    player: ActorId,
    location: &Location,
    attacker: Option<ActorId>,
    defender: EntityId,
) -> Option<PvpOverride> {
    if access.in_pvp_combat(player) {
        return None;
    }
    let claim = safe_zone_at(access, player, location)?;
    Some(prevent_pvp(access, PvpScope::Claim(claim), attacker, defender))
}

/// Fresh-spawn denial for a fight between two players
pub fn fresh_spawn_denial(
    access: &dyn ClaimAccess,
    attacker: ActorId,
    defender: ActorId,
) -> Option<DenialReason> {
    if !access.config().pvp.protect_fresh_spawns {
        return None;
    }
    if access.is_pvp_immune(attacker) {
        Some(DenialReason::CantFightWhileImmune)
    } else if access.is_pvp_immune(defender) {
        Some(DenialReason::ThatPlayerPvpImmune)
    } else {
        None
    }
}
