//! Claim records and hierarchy views
//!
//! Records live in a [`ClaimArena`] keyed by [`ClaimId`]. Parent and child links are
//! identifiers into the arena, never owning pointers; [`ClaimRef`] pairs a record
//! with its arena so hierarchy questions can follow those links.

use bastion_core::{
    ActorId, ClaimBounds, ClaimId, DirectoryEffects, Location, PermissionEffects,
    PermissionLevel, PrincipalKey, SiegeId, ADMIN_OWNER_NAME,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Deref;

/// Name shown for an owner the directory does not know
pub const UNKNOWN_OWNER_NAME: &str = "someone";

/// One protected region
///
/// The owner is only meaningful on top-level claims; subdivisions report the owner
/// of their top-level claim through [`ClaimRef::owner`]. The child list, siege
/// membership, door state and liveness are runtime state and are not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    id: ClaimId,
    bounds: ClaimBounds,
    #[serde(default)]
    owner: Option<ActorId>,
    #[serde(default)]
    permissions: IndexMap<PrincipalKey, PermissionLevel>,
    #[serde(default)]
    managers: Vec<PrincipalKey>,
    #[serde(default)]
    parent: Option<ClaimId>,
    #[serde(default)]
    inherit_nothing: bool,
    #[serde(default)]
    explosives_allowed: bool,
    #[serde(default)]
    modified_at_ms: u64,
    #[serde(skip)]
    children: Vec<ClaimId>,
    #[serde(skip)]
    siege: Option<SiegeId>,
    #[serde(skip)]
    doors_open: bool,
    #[serde(skip)]
    live: bool,
}

impl ClaimRecord {
    /// Create a detached record. An absent owner makes it an administrative claim.
    pub fn new(id: ClaimId, bounds: ClaimBounds, owner: Option<ActorId>) -> Self {
        Self {
            id,
            bounds,
            owner,
            permissions: IndexMap::new(),
            managers: Vec::new(),
            parent: None,
            inherit_nothing: false,
            explosives_allowed: false,
            modified_at_ms: 0,
            children: Vec::new(),
            siege: None,
            doors_open: false,
            live: false,
        }
    }

    /// Attach to a parent claim, making this record a subdivision
    pub fn with_parent(mut self, parent: ClaimId) -> Self {
        self.parent = Some(parent);
        self.owner = None;
        self
    }

    /// Add a grant
    pub fn with_permission(mut self, key: impl Into<PrincipalKey>, level: PermissionLevel) -> Self {
        self.permissions.insert(key.into(), level);
        self
    }

    /// Add a manager entry
    pub fn with_manager(mut self, key: impl Into<PrincipalKey>) -> Self {
        let key = key.into();
        if !self.managers.contains(&key) {
            self.managers.push(key);
        }
        self
    }

    /// Stop inheriting the parent's grants
    pub fn with_inherit_nothing(mut self, inherit_nothing: bool) -> Self {
        self.inherit_nothing = inherit_nothing;
        self
    }

    /// Set the last-modified timestamp
    pub fn with_modified_at(mut self, modified_at_ms: u64) -> Self {
        self.modified_at_ms = modified_at_ms;
        self
    }

    pub fn id(&self) -> ClaimId {
        self.id
    }

    pub fn bounds(&self) -> &ClaimBounds {
        &self.bounds
    }

    /// Owner as stored on this record
    pub fn stored_owner(&self) -> Option<ActorId> {
        self.owner
    }

    pub fn parent_id(&self) -> Option<ClaimId> {
        self.parent
    }

    pub fn child_ids(&self) -> &[ClaimId] {
        &self.children
    }

    pub fn is_subdivision(&self) -> bool {
        self.parent.is_some()
    }

    pub fn inherit_nothing(&self) -> bool {
        self.inherit_nothing
    }

    pub fn explosives_allowed(&self) -> bool {
        self.explosives_allowed
    }

    pub fn modified_at_ms(&self) -> u64 {
        self.modified_at_ms
    }

    /// Siege this claim is part of, if any
    pub fn siege(&self) -> Option<SiegeId> {
        self.siege
    }

    pub fn doors_open(&self) -> bool {
        self.doors_open
    }

    /// Returns `false` once the claim has been deleted or before it is stored
    pub fn is_live(&self) -> bool {
        self.live
    }

    pub fn is_3d(&self) -> bool {
        self.bounds.is_3d()
    }

    pub fn width(&self) -> i64 {
        self.bounds.width()
    }

    pub fn height(&self) -> i64 {
        self.bounds.height()
    }

    pub fn area(&self) -> i64 {
        self.bounds.area()
    }

    /// Grants in insertion order
    pub fn permissions(&self) -> impl Iterator<Item = (&PrincipalKey, PermissionLevel)> {
        self.permissions.iter().map(|(key, level)| (key, *level))
    }

    /// Level stored under `key`
    pub fn permission_of(&self, key: &PrincipalKey) -> Option<PermissionLevel> {
        self.permissions.get(key).copied()
    }

    /// Level granted to everyone
    pub fn public_level(&self) -> Option<PermissionLevel> {
        self.permissions.get(PrincipalKey::PUBLIC).copied()
    }

    pub fn managers(&self) -> &[PrincipalKey] {
        &self.managers
    }

    /// Returns `true` if the actor's own key, or a node key whose node the actor
    /// holds, grants at least `level` on this record alone.
    pub fn has_explicit_permission<N: PermissionEffects + ?Sized>(
        &self,
        actor: ActorId,
        level: PermissionLevel,
        nodes: &N,
    ) -> bool {
        let own = self.permissions.get(actor.principal_key().as_str()).copied();
        if level.is_granted_by(own) {
            return true;
        }
        self.permissions.iter().any(|(key, held)| {
            *held >= level
                && key
                    .as_node()
                    .is_some_and(|node| nodes.actor_has_permission(actor, node))
        })
    }

    /// Returns `true` if the horizontal footprints intersect
    pub fn overlaps(&self, other: &ClaimRecord) -> bool {
        self.bounds.intersects(&other.bounds)
    }

    /// Returns `true` if `location` is within `distance` blocks of the footprint
    ///
    /// Height is ignored and the check uses a detached, grown copy of the bounds.
    pub fn near(&self, location: &Location, distance: i32) -> bool {
        self.bounds.expanded(distance).contains(location, true)
    }

    pub(crate) fn set_bounds(&mut self, bounds: ClaimBounds) {
        self.bounds = bounds;
    }

    pub(crate) fn set_owner(&mut self, owner: Option<ActorId>) {
        self.owner = owner;
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<ClaimId> {
        &mut self.children
    }

    pub(crate) fn permissions_mut(&mut self) -> &mut IndexMap<PrincipalKey, PermissionLevel> {
        &mut self.permissions
    }

    pub(crate) fn managers_mut(&mut self) -> &mut Vec<PrincipalKey> {
        &mut self.managers
    }

    pub(crate) fn set_inherit_nothing(&mut self, inherit_nothing: bool) {
        self.inherit_nothing = inherit_nothing;
    }

    pub(crate) fn set_explosives_allowed(&mut self, allowed: bool) {
        self.explosives_allowed = allowed;
    }

    pub(crate) fn touch(&mut self, now_ms: u64) {
        self.modified_at_ms = now_ms;
    }

    pub(crate) fn set_siege(&mut self, siege: Option<SiegeId>) {
        self.siege = siege;
    }

    pub(crate) fn set_doors_open(&mut self, open: bool) {
        self.doors_open = open;
    }

    pub(crate) fn set_live(&mut self, live: bool) {
        self.live = live;
    }
}

/// Grants grouped by level, as shown by trust listings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionListing {
    pub builders: Vec<PrincipalKey>,
    pub containers: Vec<PrincipalKey>,
    pub accessors: Vec<PrincipalKey>,
    pub managers: Vec<PrincipalKey>,
}

impl PermissionListing {
    pub(crate) fn of(record: &ClaimRecord) -> Self {
        let mut listing = Self::default();
        for (key, level) in record.permissions() {
            let bucket = match level {
                PermissionLevel::Build => &mut listing.builders,
                PermissionLevel::Inventory => &mut listing.containers,
                PermissionLevel::Access => &mut listing.accessors,
            };
            bucket.push(key.clone());
        }
        listing.managers = record.managers.clone();
        listing
    }
}

/// Owning storage for claim records
#[derive(Debug, Clone, Default)]
pub struct ClaimArena {
    records: BTreeMap<ClaimId, ClaimRecord>,
}

impl ClaimArena {
    /// Hierarchy view of a claim
    pub fn get(&self, id: ClaimId) -> Option<ClaimRef<'_>> {
        self.records.get(&id).map(|record| ClaimRef {
            arena: self,
            record,
        })
    }

    /// Raw record
    pub fn record(&self, id: ClaimId) -> Option<&ClaimRecord> {
        self.records.get(&id)
    }

    pub fn contains_id(&self, id: ClaimId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every claim, subdivisions included, in identifier order
    pub fn iter(&self) -> impl Iterator<Item = ClaimRef<'_>> {
        self.records.values().map(move |record| ClaimRef {
            arena: self,
            record,
        })
    }

    /// Top-level claims in identifier order
    pub fn top_level(&self) -> impl Iterator<Item = ClaimRef<'_>> {
        self.iter().filter(|claim| !claim.is_subdivision())
    }

    pub(crate) fn record_mut(&mut self, id: ClaimId) -> Option<&mut ClaimRecord> {
        self.records.get_mut(&id)
    }

    pub(crate) fn insert(&mut self, record: ClaimRecord) {
        self.records.insert(record.id, record);
    }

    pub(crate) fn remove(&mut self, id: ClaimId) -> Option<ClaimRecord> {
        self.records.remove(&id)
    }
}

/// A claim together with the arena that resolves its links
#[derive(Debug, Clone, Copy)]
pub struct ClaimRef<'a> {
    arena: &'a ClaimArena,
    record: &'a ClaimRecord,
}

impl<'a> Deref for ClaimRef<'a> {
    type Target = ClaimRecord;

    fn deref(&self) -> &Self::Target {
        self.record
    }
}

impl<'a> ClaimRef<'a> {
    pub fn record(&self) -> &'a ClaimRecord {
        self.record
    }

    pub fn arena(&self) -> &'a ClaimArena {
        self.arena
    }

    /// Parent claim, for subdivisions
    pub fn parent(&self) -> Option<ClaimRef<'a>> {
        self.record.parent.and_then(|id| self.arena.get(id))
    }

    /// Child claims in creation order
    pub fn children(&self) -> impl Iterator<Item = ClaimRef<'a>> + 'a {
        let arena = self.arena;
        self.record
            .children
            .iter()
            .filter_map(move |id| arena.get(*id))
    }

    /// The top-level claim of this hierarchy
    pub fn top_level(&self) -> ClaimRef<'a> {
        let mut current = *self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Effective owner: the top-level claim's owner
    pub fn owner(&self) -> Option<ActorId> {
        self.top_level().record.owner
    }

    /// Returns `true` if `actor` owns this claim's hierarchy
    pub fn is_owned_by(&self, actor: ActorId) -> bool {
        self.owner() == Some(actor)
    }

    /// Administrative claims have no owner at the top level
    pub fn is_admin_claim(&self) -> bool {
        self.owner().is_none()
    }

    /// Owner name for messages
    pub fn owner_name<D: DirectoryEffects + ?Sized>(&self, directory: &D) -> String {
        match self.owner() {
            None => ADMIN_OWNER_NAME.to_string(),
            Some(owner) => directory
                .display_name(owner)
                .unwrap_or_else(|| UNKNOWN_OWNER_NAME.to_string()),
        }
    }

    /// Hierarchy-aware point containment
    ///
    /// A subdivision only contains points its parent also contains (height is
    /// checked against both). With `exclude_subdivisions`, a top-level claim does not
    /// contain points that one of its children contains.
    pub fn contains(&self, location: &Location, ignore_height: bool, exclude_subdivisions: bool) -> bool {
        if !self.record.bounds.contains(location, ignore_height) {
            return false;
        }

        if let Some(parent_id) = self.record.parent {
            return self
                .arena
                .get(parent_id)
                .is_some_and(|parent| parent.contains(location, ignore_height, false));
        }

        if exclude_subdivisions {
            return !self
                .children()
                .any(|child| child.is_live() && child.contains(location, ignore_height, true));
        }

        true
    }

    /// Grants grouped by level
    pub fn all_permissions(&self) -> PermissionListing {
        PermissionListing::of(self.record)
    }
}
