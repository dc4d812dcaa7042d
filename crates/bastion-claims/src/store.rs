//! Claim store: the arena, the spatial index and persistence kept in step
//!
//! Every mutation validates first, then updates the arena and the index together,
//! then reports the change to persistence. Callers see either the whole change or
//! an error and no change.

use crate::claim::{ClaimArena, ClaimRecord, ClaimRef, PermissionListing};
use crate::persistence::ClaimPersistence;
use crate::spatial::SpatialIndex;
use bastion_core::{
    ActorId, BastionError, ClaimBounds, ClaimId, Location, PermissionLevel, PrincipalKey, Result,
    SiegeId, WorldId,
};
use tracing::{debug, info, warn};

/// Subdivisions affected by resizing their parent
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResizeOutcome {
    /// Children whose bounds were clipped to the new parent footprint.
    pub clipped: Vec<ClaimId>,
    /// Children that no longer overlapped the parent and were deleted.
    pub removed: Vec<ClaimId>,
}

/// Owner of every claim record and the index over them
#[derive(Debug)]
pub struct ClaimStore<P> {
    arena: ClaimArena,
    index: SpatialIndex,
    persistence: P,
    next_id: ClaimId,
}

impl<P: ClaimPersistence> ClaimStore<P> {
    /// Create an empty store without reading from persistence
    pub fn new(persistence: P) -> Self {
        Self {
            arena: ClaimArena::default(),
            index: SpatialIndex::new(),
            persistence,
            next_id: ClaimId::new(1),
        }
    }

    /// Load every stored record and rebuild hierarchy links and the index
    ///
    /// Subdivisions whose parent is missing or is itself a subdivision are dropped.
    /// Subdivisions that extend past their parent are kept; containment still
    /// requires the parent, so the overhang protects nothing.
    pub fn load(persistence: P) -> Result<Self> {
        let records = persistence.load_all_claims()?;
        let mut store = Self::new(persistence);

        for mut record in records {
            let id = record.id();
            if store.arena.contains_id(id) {
                warn!(claim = %id, "duplicate claim record skipped");
                continue;
            }
            let bounds = record.bounds().normalized();
            record.set_bounds(bounds);
            record.children_mut().clear();
            record.set_live(true);
            if id >= store.next_id {
                store.next_id = id.next();
            }
            store.arena.insert(record);
        }

        let links: Vec<(ClaimId, ClaimId)> = store
            .arena
            .iter()
            .filter_map(|claim| claim.parent_id().map(|parent| (claim.id(), parent)))
            .collect();

        for (child, parent) in links {
            let parent_bounds = match store.arena.record(parent) {
                Some(record) if !record.is_subdivision() => *record.bounds(),
                _ => {
                    warn!(claim = %child, parent = %parent, "subdivision without a valid parent dropped");
                    store.arena.remove(child);
                    continue;
                }
            };
            if let Some(record) = store.arena.record(child) {
                if !parent_bounds.encloses(record.bounds()) {
                    warn!(
                        claim = %child,
                        parent = %parent,
                        "subdivision extends past its parent"
                    );
                }
            }
            if let Some(record) = store.arena.record_mut(parent) {
                record.children_mut().push(child);
            }
        }

        let top_level: Vec<(ClaimId, ClaimBounds)> = store
            .arena
            .top_level()
            .map(|claim| (claim.id(), *claim.bounds()))
            .collect();
        for (id, bounds) in &top_level {
            store.index.insert(*id, bounds);
        }

        info!(
            claims = store.arena.len(),
            top_level = top_level.len(),
            "claims loaded"
        );
        Ok(store)
    }

    pub fn arena(&self) -> &ClaimArena {
        &self.arena
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Hierarchy view of a claim
    pub fn get(&self, id: ClaimId) -> Option<ClaimRef<'_>> {
        self.arena.get(id)
    }

    /// Most specific claim containing `location`
    pub fn claim_at(
        &self,
        location: &Location,
        ignore_height: bool,
        hint: Option<ClaimId>,
    ) -> Option<ClaimRef<'_>> {
        self.index.resolve(&self.arena, location, ignore_height, hint)
    }

    /// Top-level claims owned by `owner`; `None` lists administrative claims
    pub fn claims_owned_by(&self, owner: Option<ActorId>) -> Vec<ClaimId> {
        self.arena
            .top_level()
            .filter(|claim| claim.stored_owner() == owner)
            .map(|claim| claim.id())
            .collect()
    }

    /// Create a top-level claim
    pub fn create_claim(
        &mut self,
        bounds: ClaimBounds,
        owner: Option<ActorId>,
        now_ms: u64,
    ) -> Result<ClaimId> {
        let bounds = bounds.normalized();
        if let Some(existing) = self.first_overlap(&bounds, None) {
            return Err(BastionError::overlap(existing));
        }

        let id = self.allocate_id();
        let mut record = ClaimRecord::new(id, bounds, owner).with_modified_at(now_ms);
        record.set_live(true);
        self.index.insert(id, &bounds);
        self.arena.insert(record);
        self.persist(id);

        info!(claim = %id, owner = ?owner, area = bounds.area(), "claim created");
        Ok(id)
    }

    /// Create a subdivision inside a top-level claim
    pub fn create_subdivision(
        &mut self,
        parent: ClaimId,
        bounds: ClaimBounds,
        now_ms: u64,
    ) -> Result<ClaimId> {
        let bounds = bounds.normalized();
        let parent_record = self
            .arena
            .record(parent)
            .ok_or_else(|| BastionError::claim_not_found(parent))?;
        if parent_record.is_subdivision() {
            return Err(BastionError::invalid("subdivisions cannot be nested"));
        }
        if !parent_record.bounds().encloses(&bounds) {
            return Err(BastionError::out_of_bounds(format!(
                "subdivision must lie inside {parent}"
            )));
        }
        if let Some(sibling) = self.sibling_overlap(parent, &bounds, None) {
            return Err(BastionError::overlap(sibling));
        }

        let id = self.allocate_id();
        let mut record = ClaimRecord::new(id, bounds, None)
            .with_parent(parent)
            .with_modified_at(now_ms);
        record.set_live(true);
        self.arena.insert(record);
        if let Some(parent_record) = self.arena.record_mut(parent) {
            parent_record.children_mut().push(id);
        }
        self.persist(id);

        info!(claim = %id, parent = %parent, "subdivision created");
        Ok(id)
    }

    /// Change a claim's bounds
    ///
    /// Resizing a top-level claim clips its subdivisions to the new footprint and
    /// deletes any that no longer overlap it.
    pub fn resize_claim(
        &mut self,
        id: ClaimId,
        bounds: ClaimBounds,
        now_ms: u64,
    ) -> Result<ResizeOutcome> {
        let bounds = bounds.normalized();
        let record = self
            .arena
            .record(id)
            .ok_or_else(|| BastionError::claim_not_found(id))?;
        let old = *record.bounds();
        if bounds.world() != old.world() {
            return Err(BastionError::invalid("claims cannot move between worlds"));
        }

        if let Some(parent) = record.parent_id() {
            let parent_encloses = self
                .arena
                .record(parent)
                .is_some_and(|parent| parent.bounds().encloses(&bounds));
            if !parent_encloses {
                return Err(BastionError::out_of_bounds(format!(
                    "subdivision must lie inside {parent}"
                )));
            }
            if let Some(sibling) = self.sibling_overlap(parent, &bounds, Some(id)) {
                return Err(BastionError::overlap(sibling));
            }
            self.update(id, now_ms, |record| record.set_bounds(bounds));
            info!(claim = %id, "subdivision resized");
            return Ok(ResizeOutcome::default());
        }

        if let Some(existing) = self.first_overlap(&bounds, Some(id)) {
            return Err(BastionError::overlap(existing));
        }

        let children = record.child_ids().to_vec();
        self.index.remove(id, &old);
        self.index.insert(id, &bounds);
        self.update(id, now_ms, |record| record.set_bounds(bounds));

        let mut outcome = ResizeOutcome::default();
        for child in children {
            let Some(child_bounds) = self.arena.record(child).map(|record| *record.bounds()) else {
                continue;
            };
            match child_bounds.clipped_to(&bounds) {
                Some(clipped) if clipped == child_bounds => {}
                Some(clipped) => {
                    self.update(child, now_ms, |record| record.set_bounds(clipped));
                    outcome.clipped.push(child);
                }
                None => {
                    self.remove_subdivision(child);
                    outcome.removed.push(child);
                }
            }
        }

        info!(
            claim = %id,
            area = bounds.area(),
            clipped = outcome.clipped.len(),
            removed = outcome.removed.len(),
            "claim resized"
        );
        Ok(outcome)
    }

    /// Delete a claim; deleting a top-level claim deletes its subdivisions
    ///
    /// Returns the removed records, marked no longer live.
    pub fn delete_claim(&mut self, id: ClaimId) -> Result<Vec<ClaimRecord>> {
        let record = self
            .arena
            .record(id)
            .ok_or_else(|| BastionError::claim_not_found(id))?;

        let removed = if record.is_subdivision() {
            self.remove_subdivision(id).into_iter().collect()
        } else {
            let children = record.child_ids().to_vec();
            let mut removed: Vec<ClaimRecord> = children
                .into_iter()
                .filter_map(|child| self.remove_subdivision(child))
                .collect();
            if let Some(mut top) = self.arena.remove(id) {
                self.index.remove(id, top.bounds());
                self.forget(id);
                top.set_live(false);
                removed.push(top);
            }
            removed
        };

        info!(claim = %id, removed = removed.len(), "claim deleted");
        Ok(removed)
    }

    /// Delete every top-level claim in a world, optionally sparing admin claims
    pub fn delete_claims_in_world(&mut self, world: WorldId, include_admin: bool) -> Vec<ClaimRecord> {
        let doomed: Vec<ClaimId> = self
            .arena
            .top_level()
            .filter(|claim| claim.bounds().world() == world)
            .filter(|claim| include_admin || !claim.is_admin_claim())
            .map(|claim| claim.id())
            .collect();

        let mut removed = Vec::new();
        for id in doomed {
            if let Ok(records) = self.delete_claim(id) {
                removed.extend(records);
            }
        }
        info!(world = %world, removed = removed.len(), "world claims deleted");
        removed
    }

    /// Give a top-level claim to a new owner, or to administrators with `None`
    pub fn transfer_ownership(
        &mut self,
        id: ClaimId,
        new_owner: Option<ActorId>,
        now_ms: u64,
    ) -> Result<()> {
        let record = self
            .arena
            .record(id)
            .ok_or_else(|| BastionError::claim_not_found(id))?;
        if record.is_subdivision() {
            return Err(BastionError::invalid("subdivisions follow their parent's owner"));
        }
        self.update(id, now_ms, |record| record.set_owner(new_owner));
        info!(claim = %id, owner = ?new_owner, "claim ownership transferred");
        Ok(())
    }

    /// Grant `level` to `key`, replacing any previous grant
    pub fn set_permission(
        &mut self,
        id: ClaimId,
        key: PrincipalKey,
        level: PermissionLevel,
        now_ms: u64,
    ) -> Result<()> {
        if key.as_str().is_empty() {
            return Err(BastionError::invalid("empty principal key"));
        }
        self.require(id)?;
        debug!(claim = %id, principal = %key, level = %level, "permission granted");
        self.update(id, now_ms, |record| {
            record.permissions_mut().insert(key, level);
        });
        Ok(())
    }

    /// Remove `key`'s grant from a claim and all of its subdivisions
    pub fn drop_permission(&mut self, id: ClaimId, key: &PrincipalKey, now_ms: u64) -> Result<()> {
        for target in self.with_children(id)? {
            self.update(target, now_ms, |record| {
                record.permissions_mut().shift_remove(key);
            });
        }
        debug!(claim = %id, principal = %key, "permission dropped");
        Ok(())
    }

    /// Remove all grants and managers from a claim and all of its subdivisions
    pub fn clear_permissions(&mut self, id: ClaimId, now_ms: u64) -> Result<()> {
        for target in self.with_children(id)? {
            self.update(target, now_ms, |record| {
                record.permissions_mut().clear();
                record.managers_mut().clear();
            });
        }
        debug!(claim = %id, "permissions cleared");
        Ok(())
    }

    /// Add a manager entry
    pub fn add_manager(&mut self, id: ClaimId, key: PrincipalKey, now_ms: u64) -> Result<()> {
        if key.as_str().is_empty() {
            return Err(BastionError::invalid("empty principal key"));
        }
        self.require(id)?;
        self.update(id, now_ms, |record| {
            if !record.managers().contains(&key) {
                record.managers_mut().push(key);
            }
        });
        Ok(())
    }

    /// Remove a manager entry
    pub fn remove_manager(&mut self, id: ClaimId, key: &PrincipalKey, now_ms: u64) -> Result<()> {
        self.require(id)?;
        self.update(id, now_ms, |record| {
            record.managers_mut().retain(|existing| existing != key);
        });
        Ok(())
    }

    /// Stop or resume inheriting the parent's grants
    pub fn set_inherit_nothing(&mut self, id: ClaimId, inherit_nothing: bool, now_ms: u64) -> Result<()> {
        self.require(id)?;
        self.update(id, now_ms, |record| record.set_inherit_nothing(inherit_nothing));
        Ok(())
    }

    /// Allow or forbid explosions inside a claim
    pub fn set_explosives_allowed(&mut self, id: ClaimId, allowed: bool, now_ms: u64) -> Result<()> {
        self.require(id)?;
        self.update(id, now_ms, |record| record.set_explosives_allowed(allowed));
        Ok(())
    }

    /// Grants on a claim grouped by level
    pub fn all_permissions(&self, id: ClaimId) -> Result<PermissionListing> {
        self.arena
            .get(id)
            .map(|claim| claim.all_permissions())
            .ok_or_else(|| BastionError::claim_not_found(id))
    }

    pub(crate) fn set_siege(&mut self, id: ClaimId, siege: Option<SiegeId>) {
        if let Some(record) = self.arena.record_mut(id) {
            record.set_siege(siege);
        }
    }

    pub(crate) fn set_doors_open(&mut self, id: ClaimId, open: bool) {
        if let Some(record) = self.arena.record_mut(id) {
            record.set_doors_open(open);
        }
    }

    fn allocate_id(&mut self) -> ClaimId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    fn require(&self, id: ClaimId) -> Result<()> {
        if self.arena.contains_id(id) {
            Ok(())
        } else {
            Err(BastionError::claim_not_found(id))
        }
    }

    fn with_children(&self, id: ClaimId) -> Result<Vec<ClaimId>> {
        let record = self
            .arena
            .record(id)
            .ok_or_else(|| BastionError::claim_not_found(id))?;
        let mut ids = vec![id];
        ids.extend_from_slice(record.child_ids());
        Ok(ids)
    }

    fn first_overlap(&self, bounds: &ClaimBounds, excluding: Option<ClaimId>) -> Option<ClaimId> {
        self.index
            .candidates_in(bounds)
            .into_iter()
            .filter(|id| Some(*id) != excluding)
            .find(|id| {
                self.arena
                    .record(*id)
                    .is_some_and(|record| record.is_live() && record.bounds().intersects(bounds))
            })
    }

    fn sibling_overlap(
        &self,
        parent: ClaimId,
        bounds: &ClaimBounds,
        excluding: Option<ClaimId>,
    ) -> Option<ClaimId> {
        let parent = self.arena.record(parent)?;
        parent
            .child_ids()
            .iter()
            .copied()
            .filter(|id| Some(*id) != excluding)
            .find(|id| {
                self.arena
                    .record(*id)
                    .is_some_and(|sibling| sibling.bounds().intersects_volume(bounds))
            })
    }

    fn update(&mut self, id: ClaimId, now_ms: u64, change: impl FnOnce(&mut ClaimRecord)) {
        if let Some(record) = self.arena.record_mut(id) {
            change(record);
            record.touch(now_ms);
            self.persist(id);
        }
    }

    fn remove_subdivision(&mut self, id: ClaimId) -> Option<ClaimRecord> {
        let mut record = self.arena.remove(id)?;
        if let Some(parent) = record.parent_id().and_then(|parent| self.arena.record_mut(parent)) {
            parent.children_mut().retain(|child| *child != id);
        }
        self.forget(id);
        record.set_live(false);
        Some(record)
    }

    fn persist(&mut self, id: ClaimId) {
        let Some(record) = self.arena.record(id) else {
            return;
        };
        if let Err(err) = self.persistence.save_claim(record) {
            warn!(claim = %id, error = %err, "failed to persist claim");
        }
    }

    fn forget(&mut self, id: ClaimId) {
        if let Err(err) = self.persistence.delete_claim(id) {
            warn!(claim = %id, error = %err, "failed to delete stored claim");
        }
    }
}
