//! Permission resolution
//!
//! Each permission kind is an ordered [`RuleChain`] over a [`PermissionQuery`]. The
//! first rule that decides wins; if none does, the kind's denial applies. Subdivisions
//! consult their parent through `parent_inheritance`, which evaluates the parent's
//! chain without publishing, so the host hears about each check exactly once.
//!
//! The resolver only reads. Pulling a claim into a siege when build or container
//! rights are checked is a mutation and is done by
//! [`ClaimService`](crate::ClaimService) before the chain runs.

use crate::claim::{ClaimArena, ClaimRef, UNKNOWN_OWNER_NAME};
use crate::player::PlayerRegistry;
use crate::siege::SiegeBook;
use bastion_core::{
    ActorId, BlockKind, ClaimId, ClaimPermissionEvent, Denial, DenialReason, HostEffects,
    PermissionLevel, PermissionRequest, ProtectionConfig, Rule, RuleChain, SiegeId, Verdict,
};
use tracing::{debug, trace};

/// Whether a finished check is published to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notify {
    /// Report through `NotificationEffects::claim_permission_resolved`.
    Publish,
    /// Internal check; nothing is reported.
    Suppress,
}

/// Read-only view over everything a permission check consults
#[derive(Clone, Copy)]
pub struct PermissionResolver<'a> {
    arena: &'a ClaimArena,
    players: &'a PlayerRegistry,
    sieges: &'a SiegeBook,
    config: &'a ProtectionConfig,
    effects: &'a dyn HostEffects,
}

impl<'a> PermissionResolver<'a> {
    pub fn new(
        arena: &'a ClaimArena,
        players: &'a PlayerRegistry,
        sieges: &'a SiegeBook,
        config: &'a ProtectionConfig,
        effects: &'a dyn HostEffects,
    ) -> Self {
        Self {
            arena,
            players,
            sieges,
            config,
            effects,
        }
    }

    /// Answer a permission question for `actor` in `claim`
    ///
    /// An absent actor is always denied.
    pub fn check(
        &self,
        actor: Option<ActorId>,
        claim: ClaimId,
        request: &PermissionRequest,
        notify: Notify,
    ) -> Verdict {
        let Some(actor) = actor else {
            trace!(claim = %claim, "permission check without an actor");
            return Verdict::deny(DenialReason::UnknownActor);
        };
        let Some(claim_ref) = self.arena.get(claim).filter(|claim| claim.is_live()) else {
            return Verdict::deny(DenialReason::UnknownClaim { claim });
        };

        if let PermissionRequest::Break(block) = request {
            if let Some(verdict) = self.siege_break(actor, claim_ref, block) {
                return verdict;
            }
            let build = PermissionRequest::Build(Some(block.clone()));
            return self.check(Some(actor), claim, &build, notify);
        }

        let verdict = self.evaluate(actor, claim_ref, request);
        match notify {
            Notify::Publish => self.publish(actor, claim, request, verdict),
            Notify::Suppress => verdict,
        }
    }

    /// Level-based form of [`check`](Self::check)
    pub fn check_level(
        &self,
        actor: Option<ActorId>,
        claim: ClaimId,
        level: PermissionLevel,
        notify: Notify,
    ) -> Verdict {
        self.check(actor, claim, &PermissionRequest::for_level(level), notify)
    }

    /// The siege `claim` should join when `actor` checks build or container rights
    /// in it
    ///
    /// The actor must be in a running siege that does not already include the
    /// claim, the claim must not be administrative, and the actor must own it or
    /// hold an explicit grant somewhere up its hierarchy.
    pub fn siege_extension_candidate(&self, actor: ActorId, claim: ClaimId) -> Option<SiegeId> {
        let siege_id = self.players.get(actor).siege_id()?;
        let siege = self.sieges.get(siege_id)?;
        let claim_ref = self.arena.get(claim)?;
        if siege.includes(claim) || claim_ref.is_admin_claim() || claim_ref.siege().is_some() {
            return None;
        }
        if claim_ref.is_owned_by(actor) {
            return Some(siege_id);
        }

        let mut current = Some(claim_ref);
        while let Some(candidate) = current {
            if candidate.has_explicit_permission(actor, PermissionLevel::Access, self.effects) {
                return Some(siege_id);
            }
            current = candidate.parent();
        }
        None
    }

    pub fn config(&self) -> &'a ProtectionConfig {
        self.config
    }

    pub fn effects(&self) -> &'a dyn HostEffects {
        self.effects
    }

    pub fn players(&self) -> &'a PlayerRegistry {
        self.players
    }

    pub fn sieges(&self) -> &'a SiegeBook {
        self.sieges
    }

    /// Display name used in messages
    pub fn actor_name(&self, actor: ActorId) -> String {
        self.effects
            .display_name(actor)
            .unwrap_or_else(|| UNKNOWN_OWNER_NAME.to_string())
    }

    fn evaluate(&self, actor: ActorId, claim: ClaimRef<'a>, request: &PermissionRequest) -> Verdict {
        let mut query = PermissionQuery {
            resolver: self,
            actor,
            claim,
            request,
        };

        let decided = match request {
            PermissionRequest::Edit => {
                let rules: [(&'static str, PermissionRule<'_, 'a>); 4] = [
                    ("admin_or_delete_node", admin_or_delete_node),
                    ("owner_edit", owner_edit),
                    ("parent_owner", parent_owner),
                    ("parent_inheritance", parent_inheritance),
                ];
                RuleChain::new("edit", &rules).evaluate(&mut query)
            }
            PermissionRequest::Build(_) | PermissionRequest::Break(_) => {
                let rules: [(&'static str, PermissionRule<'_, 'a>); 9] = [
                    ("admin_claim_node", admin_claim_node),
                    ("siege_build_lockout", siege_build_lockout),
                    ("pvp_combat_lockout", pvp_combat_lockout),
                    ("owner_or_bypass", owner_or_bypass),
                    ("explicit_grant", explicit_grant),
                    ("public_grant", public_grant),
                    ("farming_exception", farming_exception),
                    ("parent_owner", parent_owner),
                    ("parent_inheritance", parent_inheritance),
                ];
                RuleChain::new("build", &rules).evaluate(&mut query)
            }
            PermissionRequest::Access => {
                let rules: [(&'static str, PermissionRule<'_, 'a>); 7] = [
                    ("doors_open", doors_open),
                    ("admin_claim_node", admin_claim_node),
                    ("owner_or_bypass", owner_or_bypass),
                    ("explicit_grant", explicit_grant),
                    ("public_grant", public_grant),
                    ("parent_owner", parent_owner),
                    ("parent_inheritance", parent_inheritance),
                ];
                RuleChain::new("access", &rules).evaluate(&mut query)
            }
            PermissionRequest::Container => {
                let rules: [(&'static str, PermissionRule<'_, 'a>); 7] = [
                    ("siege_container_lockout", siege_container_lockout),
                    ("owner_or_bypass", owner_or_bypass),
                    ("admin_claim_node", admin_claim_node),
                    ("explicit_grant", explicit_grant),
                    ("public_grant", public_grant),
                    ("parent_owner", parent_owner),
                    ("parent_inheritance", parent_inheritance),
                ];
                RuleChain::new("containers", &rules).evaluate(&mut query)
            }
            PermissionRequest::GrantPermission => {
                let rules: [(&'static str, PermissionRule<'_, 'a>); 4] = [
                    ("edit_delegate", edit_delegate),
                    ("manager_entry", manager_entry),
                    ("parent_owner", parent_owner),
                    ("parent_inheritance", parent_inheritance),
                ];
                RuleChain::new("grant-permission", &rules).evaluate(&mut query)
            }
        };

        match decided {
            Some(decided) => decided.value,
            None => {
                debug!(claim = %claim.id(), actor = %actor, kind = %request.kind(), "no grant matched");
                query.denial()
            }
        }
    }

    fn siege_break(&self, actor: ActorId, claim: ClaimRef<'a>, block: &BlockKind) -> Option<Verdict> {
        if claim.siege().is_none() && !claim.doors_open() {
            return None;
        }
        if !self.config.claims.is_siege_breakable(block) {
            return Some(Verdict::deny(DenialReason::NonSiegeMaterial));
        }
        if claim.is_owned_by(actor) {
            return Some(Verdict::deny(DenialReason::NoOwnerBuildUnderSiege));
        }
        Some(Verdict::allow())
    }

    fn publish(
        &self,
        actor: ActorId,
        claim: ClaimId,
        request: &PermissionRequest,
        verdict: Verdict,
    ) -> Verdict {
        let event = ClaimPermissionEvent {
            actor,
            claim,
            kind: request.kind(),
            verdict,
        };
        let resolved = self.effects.claim_permission_resolved(&event);
        if resolved != event.verdict {
            debug!(
                claim = %claim,
                actor = %actor,
                kind = %event.kind,
                allowed = resolved.is_allowed(),
                "permission verdict replaced by host"
            );
        }
        resolved
    }

    fn attacker_name(&self, claim: ClaimRef<'_>) -> String {
        claim
            .siege()
            .and_then(|id| self.sieges.get(id))
            .map_or_else(|| UNKNOWN_OWNER_NAME.to_string(), |siege| self.actor_name(siege.attacker))
    }
}

/// One permission question against one claim
pub struct PermissionQuery<'q, 'a> {
    resolver: &'q PermissionResolver<'a>,
    actor: ActorId,
    claim: ClaimRef<'a>,
    request: &'q PermissionRequest,
}

type PermissionRule<'q, 'a> = Rule<PermissionQuery<'q, 'a>, Verdict>;

impl PermissionQuery<'_, '_> {
    fn has_node(&self, node: &str) -> bool {
        self.resolver.effects.actor_has_permission(self.actor, node)
    }

    fn config(&self) -> &ProtectionConfig {
        self.resolver.config
    }

    fn bypass_hint(&self) -> bool {
        self.has_node(&self.config().claims.nodes.ignore_claims)
    }

    fn owner_name(&self) -> String {
        self.claim.owner_name(self.resolver.effects)
    }

    fn denial(&self) -> Verdict {
        let owner = self.owner_name();
        let reason = match self.request {
            PermissionRequest::Edit => {
                return Verdict::deny(DenialReason::OnlyOwnersModifyClaims { owner });
            }
            PermissionRequest::Build(_) | PermissionRequest::Break(_) => {
                DenialReason::NoBuildPermission { owner }
            }
            PermissionRequest::Access => DenialReason::NoAccessPermission { owner },
            PermissionRequest::Container => DenialReason::NoContainersPermission { owner },
            PermissionRequest::GrantPermission => DenialReason::NoPermissionTrust { owner },
        };
        Verdict::Denied(Denial::new(reason).with_override_hint(self.bypass_hint()))
    }
}

fn admin_or_delete_node(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    let nodes = &q.config().claims.nodes;
    let node = if q.claim.is_admin_claim() {
        &nodes.admin_claims
    } else {
        &nodes.delete_claims
    };
    q.has_node(node).then(Verdict::allow)
}

fn owner_edit(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    if !q.claim.is_owned_by(q.actor) {
        return None;
    }
    if q.claim.siege().is_some() {
        return Some(Verdict::deny(DenialReason::NoModifyDuringSiege));
    }
    Some(Verdict::allow())
}

fn admin_claim_node(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    (q.claim.is_admin_claim() && q.has_node(&q.config().claims.nodes.admin_claims))
        .then(Verdict::allow)
}

fn siege_build_lockout(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    q.claim.siege()?;
    let attacker = q.resolver.attacker_name(q.claim);
    Some(Verdict::deny(DenialReason::NoBuildUnderSiege { attacker }))
}

fn siege_container_lockout(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    q.claim.siege()?;
    let attacker = q.resolver.attacker_name(q.claim);
    Some(Verdict::deny(DenialReason::NoContainersSiege { attacker }))
}

fn pvp_combat_lockout(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    let now = q.resolver.effects.now_ms();
    let timeout = q.config().pvp.combat_timeout_ms;
    q.resolver
        .players
        .get(q.actor)
        .in_pvp_combat(now, timeout)
        .then(|| Verdict::deny(DenialReason::NoBuildPvp))
}

fn owner_or_bypass(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    (q.claim.is_owned_by(q.actor) || q.resolver.players.get(q.actor).ignore_claims)
        .then(Verdict::allow)
}

fn explicit_grant(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    let level = q.request.required_level()?;
    q.claim
        .has_explicit_permission(q.actor, level, q.resolver.effects)
        .then(Verdict::allow)
}

fn public_grant(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    let level = q.request.required_level()?;
    level
        .is_granted_by(q.claim.public_level())
        .then(Verdict::allow)
}

fn farming_exception(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    let PermissionRequest::Build(Some(block)) = q.request else {
        return None;
    };
    if !q.config().claims.is_farmable(block) {
        return None;
    }
    q.resolver
        .evaluate(q.actor, q.claim, &PermissionRequest::Container)
        .is_allowed()
        .then(Verdict::allow)
}

fn doors_open(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    q.claim.doors_open().then(Verdict::allow)
}

fn edit_delegate(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    q.resolver
        .evaluate(q.actor, q.claim, &PermissionRequest::Edit)
        .is_allowed()
        .then(Verdict::allow)
}

fn manager_entry(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    let listed = q.claim.managers().iter().any(|key| {
        key.is_actor(q.actor) || key.as_node().is_some_and(|node| q.has_node(node))
    });
    listed.then(Verdict::allow)
}

fn parent_owner(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    q.claim
        .parent()
        .filter(|parent| parent.is_owned_by(q.actor))
        .map(|_| Verdict::allow())
}

fn parent_inheritance(q: &mut PermissionQuery<'_, '_>) -> Option<Verdict> {
    if q.claim.inherit_nothing() {
        return None;
    }
    let parent = q.claim.parent()?;
    Some(q.resolver.evaluate(q.actor, parent, q.request))
}
