//! The claim-service surface the protection chains need
//!
//! Rule functions take a context holding `&mut dyn ClaimAccess`, so the chains stay
//! plain function lists no matter which persistence or host a service uses.

use bastion_claims::{
    ClaimPersistence, ClaimRef, ClaimService, Notify, PlayerState, UNKNOWN_OWNER_NAME,
};
use bastion_core::{
    ActorId, ClaimId, HostEffects, Location, PermissionRequest, ProtectionConfig, Verdict, WorldId,
};

/// Claim lookups, permission checks and player state, as seen by protection rules
pub trait ClaimAccess {
    fn config(&self) -> &ProtectionConfig;

    fn host(&self) -> &dyn HostEffects;

    fn player(&self, actor: ActorId) -> &PlayerState;

    fn claim(&self, id: ClaimId) -> Option<ClaimRef<'_>>;

    /// Most specific claim at `location`, using and refreshing the actor's cached
    /// claim when an actor is given
    fn locate(&mut self, actor: Option<ActorId>, location: &Location) -> Option<ClaimId>;

    /// Published permission check; never extends a siege
    fn check(&self, actor: Option<ActorId>, claim: ClaimId, request: &PermissionRequest) -> Verdict;

    fn is_pvp_immune(&self, actor: ActorId) -> bool;

    fn in_pvp_combat(&self, actor: ActorId) -> bool;

    fn record_pvp_contact(&mut self, attacker: ActorId, defender: ActorId);

    fn pvp_rules_apply(&self, world: WorldId) -> bool {
        self.host().pvp_rules_apply(world)
    }

    fn claims_enabled(&self, world: WorldId) -> bool {
        self.host().claims_enabled(world)
    }

    /// Display name of an actor, for messages
    fn actor_name(&self, actor: ActorId) -> String {
        self.host()
            .display_name(actor)
            .unwrap_or_else(|| UNKNOWN_OWNER_NAME.to_string())
    }

    /// Display name of a claim's owner, for messages
    fn owner_name(&self, claim: ClaimId) -> String {
        self.claim(claim)
            .map(|claim| claim.owner_name(self.host()))
            .unwrap_or_default()
    }

    /// Returns `true` if denials shown to `actor` should advertise claim bypass
    fn shows_ignore_hint(&self, actor: ActorId) -> bool {
        let node = &self.config().claims.nodes.ignore_claims;
        self.host().actor_has_permission(actor, node)
    }
}

impl<P: ClaimPersistence, E: HostEffects> ClaimAccess for ClaimService<P, E> {
    fn config(&self) -> &ProtectionConfig {
        ClaimService::config(self)
    }

    fn host(&self) -> &dyn HostEffects {
        self.effects()
    }

    fn player(&self, actor: ActorId) -> &PlayerState {
        self.players().get(actor)
    }

    fn claim(&self, id: ClaimId) -> Option<ClaimRef<'_>> {
        ClaimService::claim(self, id)
    }

    fn locate(&mut self, actor: Option<ActorId>, location: &Location) -> Option<ClaimId> {
        match actor {
            Some(actor) => self.resolve_for_actor(actor, location, false),
            None => self.resolve_claim(location, false, None).map(|claim| claim.id()),
        }
    }

    fn check(&self, actor: Option<ActorId>, claim: ClaimId, request: &PermissionRequest) -> Verdict {
        self.resolver().check(actor, claim, request, Notify::Publish)
    }

    fn is_pvp_immune(&self, actor: ActorId) -> bool {
        ClaimService::is_pvp_immune(self, actor)
    }

    fn in_pvp_combat(&self, actor: ActorId) -> bool {
        ClaimService::in_pvp_combat(self, actor)
    }

    fn record_pvp_contact(&mut self, attacker: ActorId, defender: ActorId) {
        ClaimService::record_pvp_contact(self, attacker, defender);
    }
}
