//! Claim service: the single entry point hosts hold on to
//!
//! The service owns the claim store, per-actor state, the siege book, the validated
//! configuration and the host effects. Permission checks that may pull a claim into
//! a siege take `&mut self`; everything else that only reads goes through
//! [`ClaimService::resolver`].

use crate::claim::{ClaimRecord, ClaimRef, PermissionListing};
use crate::persistence::ClaimPersistence;
use crate::player::{PlayerRegistry, PvpContact, SiegeRole};
use crate::resolver::{Notify, PermissionResolver};
use crate::siege::{SiegeBook, SiegeOutcome};
use crate::store::{ClaimStore, ResizeOutcome};
use bastion_core::{
    ActorId, BastionError, ClaimBounds, ClaimId, HostEffects, Location, PermissionLevel,
    PermissionRequest, PrincipalKey, ProtectionConfig, Result, SiegeId, Verdict, WorldId,
};
use tracing::{debug, info};

/// Claims, players and sieges behind one API
pub struct ClaimService<P, E> {
    store: ClaimStore<P>,
    players: PlayerRegistry,
    sieges: SiegeBook,
    config: ProtectionConfig,
    effects: E,
}

impl<P: ClaimPersistence, E: HostEffects> ClaimService<P, E> {
    /// Validate the configuration and load every stored claim
    pub fn load(config: ProtectionConfig, persistence: P, effects: E) -> Result<Self> {
        config.validate()?;
        let store = ClaimStore::load(persistence)?;
        Ok(Self::with_store(config, store, effects))
    }

    /// Validate the configuration and start with no claims
    pub fn empty(config: ProtectionConfig, persistence: P, effects: E) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_store(config, ClaimStore::new(persistence), effects))
    }

    fn with_store(config: ProtectionConfig, store: ClaimStore<P>, effects: E) -> Self {
        Self {
            store,
            players: PlayerRegistry::new(),
            sieges: SiegeBook::new(),
            config,
            effects,
        }
    }

    pub fn store(&self) -> &ClaimStore<P> {
        &self.store
    }

    pub fn config(&self) -> &ProtectionConfig {
        &self.config
    }

    pub fn effects(&self) -> &E {
        &self.effects
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut PlayerRegistry {
        &mut self.players
    }

    pub fn sieges(&self) -> &SiegeBook {
        &self.sieges
    }

    /// Current host time
    pub fn now_ms(&self) -> u64 {
        self.effects.now_ms()
    }

    /// Read-only permission resolver over the current state
    pub fn resolver(&self) -> PermissionResolver<'_> {
        PermissionResolver::new(
            self.store.arena(),
            &self.players,
            &self.sieges,
            &self.config,
            &self.effects,
        )
    }

    /// Hierarchy view of a claim
    pub fn claim(&self, id: ClaimId) -> Option<ClaimRef<'_>> {
        self.store.get(id)
    }

    /// Most specific claim containing `location`
    pub fn resolve_claim(
        &self,
        location: &Location,
        ignore_height: bool,
        hint: Option<ClaimId>,
    ) -> Option<ClaimRef<'_>> {
        self.store.claim_at(location, ignore_height, hint)
    }

    /// Resolve using the actor's cached claim as the hint, then update the cache
    pub fn resolve_for_actor(
        &mut self,
        actor: ActorId,
        location: &Location,
        ignore_height: bool,
    ) -> Option<ClaimId> {
        let hint = self.players.get(actor).last_claim;
        let found = self
            .store
            .claim_at(location, ignore_height, hint)
            .map(|claim| claim.id());
        self.players.remember_claim(actor, found);
        found
    }

    /// Answer a permission question and publish the result to the host
    ///
    /// Build and container checks by an actor fighting a siege may first pull the
    /// claim into that siege.
    pub fn check_permission(
        &mut self,
        actor: Option<ActorId>,
        claim: ClaimId,
        request: &PermissionRequest,
    ) -> Verdict {
        if let Some(actor) = actor {
            if request.extends_siege() {
                self.extend_siege(actor, claim);
            }
        }
        self.resolver().check(actor, claim, request, Notify::Publish)
    }

    /// Level-based form of [`check_permission`](Self::check_permission)
    pub fn check_level(
        &mut self,
        actor: Option<ActorId>,
        claim: ClaimId,
        level: PermissionLevel,
    ) -> Verdict {
        self.check_permission(actor, claim, &PermissionRequest::for_level(level))
    }

    /// Pull `claim` into the siege `actor` is fighting, if eligible
    pub fn extend_siege(&mut self, actor: ActorId, claim: ClaimId) -> bool {
        let Some(siege) = self.resolver().siege_extension_candidate(actor, claim) else {
            return false;
        };
        if let Some(descriptor) = self.sieges.get_mut(siege) {
            descriptor.claims.push(claim);
        }
        self.store.set_siege(claim, Some(siege));
        info!(siege = %siege, claim = %claim, actor = %actor, "siege extended");
        true
    }

    /// Create a top-level claim
    pub fn create_claim(&mut self, bounds: ClaimBounds, owner: Option<ActorId>) -> Result<ClaimId> {
        let now = self.now_ms();
        self.store.create_claim(bounds, owner, now)
    }

    /// Create a subdivision inside a top-level claim
    pub fn create_subdivision(&mut self, parent: ClaimId, bounds: ClaimBounds) -> Result<ClaimId> {
        let now = self.now_ms();
        self.store.create_subdivision(parent, bounds, now)
    }

    /// Change a claim's bounds, clipping or deleting subdivisions as needed
    pub fn resize_claim(&mut self, id: ClaimId, bounds: ClaimBounds) -> Result<ResizeOutcome> {
        let now = self.now_ms();
        let outcome = self.store.resize_claim(id, bounds, now)?;
        for removed in &outcome.removed {
            self.forget_siege_membership(*removed);
        }
        Ok(outcome)
    }

    /// Delete a claim and, for top-level claims, its subdivisions
    pub fn delete_claim(&mut self, id: ClaimId) -> Result<Vec<ClaimRecord>> {
        let removed = self.store.delete_claim(id)?;
        for record in &removed {
            self.forget_siege_membership(record.id());
        }
        Ok(removed)
    }

    /// Delete every claim in a world, optionally including administrative claims
    pub fn delete_claims_in_world(&mut self, world: WorldId, include_admin: bool) -> Vec<ClaimRecord> {
        let removed = self.store.delete_claims_in_world(world, include_admin);
        for record in &removed {
            self.forget_siege_membership(record.id());
        }
        removed
    }

    /// Give a top-level claim to another owner, or to administrators with `None`
    pub fn transfer_ownership(&mut self, id: ClaimId, new_owner: Option<ActorId>) -> Result<()> {
        let now = self.now_ms();
        self.store.transfer_ownership(id, new_owner, now)
    }

    /// Grant `level` to `key`
    pub fn set_permission(&mut self, id: ClaimId, key: PrincipalKey, level: PermissionLevel) -> Result<()> {
        let now = self.now_ms();
        self.store.set_permission(id, key, level, now)
    }

    /// Remove `key`'s grant from the claim and its subdivisions
    pub fn drop_permission(&mut self, id: ClaimId, key: &PrincipalKey) -> Result<()> {
        let now = self.now_ms();
        self.store.drop_permission(id, key, now)
    }

    /// Remove every grant and manager from the claim and its subdivisions
    pub fn clear_permissions(&mut self, id: ClaimId) -> Result<()> {
        let now = self.now_ms();
        self.store.clear_permissions(id, now)
    }

    pub fn add_manager(&mut self, id: ClaimId, key: PrincipalKey) -> Result<()> {
        let now = self.now_ms();
        self.store.add_manager(id, key, now)
    }

    pub fn remove_manager(&mut self, id: ClaimId, key: &PrincipalKey) -> Result<()> {
        let now = self.now_ms();
        self.store.remove_manager(id, key, now)
    }

    pub fn set_inherit_nothing(&mut self, id: ClaimId, inherit_nothing: bool) -> Result<()> {
        let now = self.now_ms();
        self.store.set_inherit_nothing(id, inherit_nothing, now)
    }

    pub fn set_explosives_allowed(&mut self, id: ClaimId, allowed: bool) -> Result<()> {
        let now = self.now_ms();
        self.store.set_explosives_allowed(id, allowed, now)
    }

    /// Grants on a claim grouped by level
    pub fn all_permissions(&self, id: ClaimId) -> Result<PermissionListing> {
        self.store.all_permissions(id)
    }

    /// Start a siege by `attacker` against `defender` over `claim`
    ///
    /// The defender must have at least access rights in the claim, administrative
    /// claims cannot be besieged, and neither side may already be fighting one.
    pub fn start_siege(&mut self, attacker: ActorId, defender: ActorId, claim: ClaimId) -> Result<SiegeId> {
        let claim_ref = self
            .store
            .get(claim)
            .ok_or_else(|| BastionError::claim_not_found(claim))?;
        if attacker == defender {
            return Err(BastionError::siege_rejected("an actor cannot besiege themselves"));
        }
        if claim_ref.is_admin_claim() {
            return Err(BastionError::siege_rejected("administrative claims cannot be besieged"));
        }
        if claim_ref.siege().is_some() {
            return Err(BastionError::siege_rejected(format!("{claim} is already under siege")));
        }
        if self.players.get(attacker).siege.is_some() || self.players.get(defender).siege.is_some() {
            return Err(BastionError::siege_rejected("a participant is already in a siege"));
        }
        let standing = self
            .resolver()
            .check_level(Some(defender), claim, PermissionLevel::Access, Notify::Suppress);
        if standing.is_denied() {
            return Err(BastionError::siege_rejected("the defender has no standing in this claim"));
        }

        let now = self.now_ms();
        let id = self.sieges.open(attacker, defender, claim, now);
        self.players.get_mut(attacker).siege = Some((id, SiegeRole::Attacker));
        self.players.get_mut(defender).siege = Some((id, SiegeRole::Defender));
        self.store.set_siege(claim, Some(id));

        info!(siege = %id, claim = %claim, attacker = %attacker, defender = %defender, "siege started");
        Ok(id)
    }

    /// End a siege
    ///
    /// An attacker victory leaves the doors of every besieged claim open until the
    /// owner closes them. The siege leaves the book, so resolving it again fails
    /// with `NotFound`.
    pub fn resolve_siege(&mut self, id: SiegeId, outcome: SiegeOutcome) -> Result<()> {
        let descriptor = self
            .sieges
            .close(id)
            .ok_or_else(|| BastionError::not_found(format!("{id}")))?;
        let participants = [descriptor.attacker, descriptor.defender];
        let claims = descriptor.claims;

        for claim in &claims {
            self.store.set_siege(*claim, None);
            if outcome == SiegeOutcome::AttackerVictory {
                self.store.set_doors_open(*claim, true);
            }
        }
        for actor in participants {
            let state = self.players.get_mut(actor);
            if state.siege_id() == Some(id) {
                state.siege = None;
            }
        }

        info!(siege = %id, outcome = ?outcome, claims = claims.len(), "siege resolved");
        Ok(())
    }

    /// Resolve sieges that have run longer than the configured timeout in the
    /// defender's favour
    pub fn expire_sieges(&mut self) -> Vec<SiegeId> {
        let now = self.now_ms();
        let timeout = self.config.pvp.siege_timeout_ms;
        let expired: Vec<SiegeId> = self
            .sieges
            .ongoing()
            .filter(|siege| now.saturating_sub(siege.started_at_ms) > timeout)
            .map(|siege| siege.id)
            .collect();
        for id in &expired {
            if let Err(err) = self.resolve_siege(*id, SiegeOutcome::DefenderVictory) {
                debug!(siege = %id, error = %err, "siege already resolved");
            }
        }
        expired
    }

    /// Close doors left open by a lost siege
    pub fn close_doors(&mut self, id: ClaimId) -> Result<()> {
        if self.store.get(id).is_none() {
            return Err(BastionError::claim_not_found(id));
        }
        self.store.set_doors_open(id, false);
        Ok(())
    }

    /// Forfeit any siege the actor is in and drop their runtime state
    pub fn player_disconnected(&mut self, actor: ActorId) {
        let forfeited = self
            .sieges
            .ongoing_for(actor)
            .map(|siege| (siege.id, SiegeOutcome::forfeited_by(siege, actor)));
        if let Some((id, outcome)) = forfeited {
            if let Err(err) = self.resolve_siege(id, outcome) {
                debug!(siege = %id, error = %err, "siege already resolved");
            }
        }
        self.players.remove(actor);
        debug!(actor = %actor, "player state dropped");
    }

    /// Toggle claim bypass for an actor
    pub fn set_ignore_claims(&mut self, actor: ActorId, ignore: bool) {
        self.players.get_mut(actor).ignore_claims = ignore;
        info!(actor = %actor, ignore, "ignore-claims toggled");
    }

    /// Protect a freshly spawned actor from PvP for the configured duration
    pub fn grant_spawn_immunity(&mut self, actor: ActorId) {
        let until = self
            .now_ms()
            .saturating_add(self.config.pvp.spawn_immunity_ms);
        self.players.get_mut(actor).pvp_immune_until = Some(until);
    }

    /// End fresh-spawn protection
    pub fn clear_spawn_immunity(&mut self, actor: ActorId) {
        self.players.get_mut(actor).pvp_immune_until = None;
    }

    /// Returns `true` while the actor is protected as a fresh spawn
    pub fn is_pvp_immune(&self, actor: ActorId) -> bool {
        self.players.get(actor).is_pvp_immune(self.now_ms())
    }

    /// Returns `true` while the actor is tagged as in combat
    pub fn in_pvp_combat(&self, actor: ActorId) -> bool {
        self.players
            .get(actor)
            .in_pvp_combat(self.now_ms(), self.config.pvp.combat_timeout_ms)
    }

    /// Tag both players as in combat with each other
    pub fn record_pvp_contact(&mut self, attacker: ActorId, defender: ActorId) {
        let now = self.now_ms();
        self.players.get_mut(attacker).last_pvp = Some(PvpContact {
            at_ms: now,
            opponent: defender,
        });
        self.players.get_mut(defender).last_pvp = Some(PvpContact {
            at_ms: now,
            opponent: attacker,
        });
    }

    fn forget_siege_membership(&mut self, claim: ClaimId) {
        let sieges: Vec<SiegeId> = self
            .sieges
            .ongoing()
            .filter(|siege| siege.includes(claim))
            .map(|siege| siege.id)
            .collect();
        for id in sieges {
            if let Some(descriptor) = self.sieges.get_mut(id) {
                descriptor.claims.retain(|existing| *existing != claim);
            }
        }
    }
}
