//! Spatial lookup of claims by location
//!
//! Top-level claims are bucketed by the 16x16 chunk cells their footprint covers, per
//! world. A lookup scans only the bucket of the queried cell and then descends into
//! the matching claim's children, so subdivisions are never indexed on their own.

use crate::claim::{ClaimArena, ClaimRef};
use bastion_core::{BlockPos, ClaimBounds, ClaimId, Location, WorldId};
use std::collections::HashMap;
use tracing::trace;

/// Cells are `1 << CELL_SHIFT` blocks on a side
pub const CELL_SHIFT: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CellKey {
    world: WorldId,
    x: i32,
    z: i32,
}

impl CellKey {
    fn of(world: WorldId, pos: BlockPos) -> Self {
        Self {
            world,
            x: pos.x >> CELL_SHIFT,
            z: pos.z >> CELL_SHIFT,
        }
    }
}

fn cells(bounds: &ClaimBounds) -> impl Iterator<Item = CellKey> {
    let world = bounds.world();
    let lesser = CellKey::of(world, bounds.lesser());
    let greater = CellKey::of(world, bounds.greater());
    (lesser.x..=greater.x)
        .flat_map(move |x| (lesser.z..=greater.z).map(move |z| CellKey { world, x, z }))
}

/// Cell-bucketed index of top-level claims
#[derive(Debug, Clone, Default)]
pub struct SpatialIndex {
    cells: HashMap<CellKey, Vec<ClaimId>>,
}

impl SpatialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a top-level claim under every cell its footprint touches
    pub fn insert(&mut self, id: ClaimId, bounds: &ClaimBounds) {
        for cell in cells(bounds) {
            let bucket = self.cells.entry(cell).or_default();
            if !bucket.contains(&id) {
                bucket.push(id);
            }
        }
    }

    /// Remove a claim from every cell of `bounds`
    pub fn remove(&mut self, id: ClaimId, bounds: &ClaimBounds) {
        for cell in cells(bounds) {
            if let Some(bucket) = self.cells.get_mut(&cell) {
                bucket.retain(|existing| *existing != id);
                if bucket.is_empty() {
                    self.cells.remove(&cell);
                }
            }
        }
    }

    /// Claims registered in the cell containing `pos`
    pub fn candidates(&self, world: WorldId, pos: BlockPos) -> &[ClaimId] {
        self.cells
            .get(&CellKey::of(world, pos))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Claims registered in any cell `bounds` touches, without duplicates
    pub fn candidates_in(&self, bounds: &ClaimBounds) -> Vec<ClaimId> {
        let mut found: Vec<ClaimId> = cells(bounds)
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
            .copied()
            .collect();
        found.sort_unstable();
        found.dedup();
        found
    }

    /// Number of occupied cells
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Most specific live claim containing `location`
    ///
    /// A live `hint` that contains the location is tried first. A top-level hit
    /// still descends into its children, so the answer is the same with or without
    /// the hint.
    pub fn resolve<'a>(
        &self,
        arena: &'a ClaimArena,
        location: &Location,
        ignore_height: bool,
        hint: Option<ClaimId>,
    ) -> Option<ClaimRef<'a>> {
        if let Some(hinted) = hint
            .and_then(|id| arena.get(id))
            .filter(|claim| claim.is_live() && claim.contains(location, ignore_height, false))
        {
            trace!(claim = %hinted.id(), "claim lookup satisfied by hint");
            if hinted.is_subdivision() {
                return Some(hinted);
            }
            return Some(most_specific(hinted, location, ignore_height));
        }

        let block = location.block();
        self.candidates(location.world, block)
            .iter()
            .filter_map(|id| arena.get(*id))
            .find(|claim| {
                claim.is_live()
                    && !claim.is_subdivision()
                    && claim.contains(location, ignore_height, false)
            })
            .map(|claim| most_specific(claim, location, ignore_height))
    }
}

fn most_specific<'a>(claim: ClaimRef<'a>, location: &Location, ignore_height: bool) -> ClaimRef<'a> {
    claim
        .children()
        .find(|child| child.is_live() && child.contains(location, ignore_height, false))
        .unwrap_or(claim)
}
