//! Block-grid geometry
//!
//! Claims are axis-aligned boxes on the integer block grid. Both corners are
//! inclusive: a claim from x=0 to x=9 covers ten block columns, so a point at
//! x=9.99 is inside and x=10.0 is not. Horizontal checks use X and Z; the Y
//! axis is only bounded below unless the claim is three-dimensional.

use crate::identifiers::WorldId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer block coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    /// Create a block position
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Component-wise minimum
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    /// Component-wise maximum
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A point in a world with fractional coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: WorldId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    /// Create a location
    pub fn new(world: WorldId, x: f64, y: f64, z: f64) -> Self {
        Self { world, x, y, z }
    }

    /// Location of the minimum corner of a block
    pub fn at_block(world: WorldId, pos: BlockPos) -> Self {
        Self::new(world, f64::from(pos.x), f64::from(pos.y), f64::from(pos.z))
    }

    /// The block this location falls in
    pub fn block(&self) -> BlockPos {
        BlockPos::new(
            floor_to_block(self.x),
            floor_to_block(self.y),
            floor_to_block(self.z),
        )
    }
}

#[allow(clippy::cast_possible_truncation)]
fn floor_to_block(value: f64) -> i32 {
    value.floor() as i32
}

/// Vertical shape of a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VerticalExtent {
    /// Two-dimensional: bounded below by the lesser corner, open to the sky.
    #[default]
    ToSky,
    /// Three-dimensional: bounded above by the greater corner as well.
    Bounded,
}

/// Axis-aligned box of blocks in one world
///
/// The lesser corner is component-wise no greater than the greater corner. Values
/// built through [`ClaimBounds::new`] are normalized; bounds read from storage
/// should be passed through [`ClaimBounds::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimBounds {
    world: WorldId,
    lesser: BlockPos,
    greater: BlockPos,
    #[serde(default)]
    vertical: VerticalExtent,
}

impl ClaimBounds {
    /// Create bounds from any two opposite corners
    pub fn new(world: WorldId, a: BlockPos, b: BlockPos, vertical: VerticalExtent) -> Self {
        Self {
            world,
            lesser: a.min(b),
            greater: a.max(b),
            vertical,
        }
    }

    /// Two-dimensional bounds that extend to the sky
    pub fn to_sky(world: WorldId, a: BlockPos, b: BlockPos) -> Self {
        Self::new(world, a, b, VerticalExtent::ToSky)
    }

    /// Three-dimensional bounds
    pub fn bounded(world: WorldId, a: BlockPos, b: BlockPos) -> Self {
        Self::new(world, a, b, VerticalExtent::Bounded)
    }

    /// Re-establish the corner ordering invariant
    pub fn normalized(self) -> Self {
        Self::new(self.world, self.lesser, self.greater, self.vertical)
    }

    /// Returns `true` if the corners are correctly ordered
    pub fn is_normalized(&self) -> bool {
        self.lesser == self.lesser.min(self.greater)
    }

    pub fn world(&self) -> WorldId {
        self.world
    }

    pub fn lesser(&self) -> BlockPos {
        self.lesser
    }

    pub fn greater(&self) -> BlockPos {
        self.greater
    }

    pub fn vertical(&self) -> VerticalExtent {
        self.vertical
    }

    /// Returns `true` for three-dimensional bounds
    pub fn is_3d(&self) -> bool {
        self.vertical == VerticalExtent::Bounded
    }

    /// Number of block columns along X
    pub fn width(&self) -> i64 {
        i64::from(self.greater.x) - i64::from(self.lesser.x) + 1
    }

    /// Number of block rows along Z
    pub fn height(&self) -> i64 {
        i64::from(self.greater.z) - i64::from(self.lesser.z) + 1
    }

    /// Horizontal area in blocks, saturating at `i64::MAX` for bounds spanning
    /// most of the coordinate range
    pub fn area(&self) -> i64 {
        self.width().saturating_mul(self.height())
    }

    /// Point containment against these bounds alone
    ///
    /// With `ignore_height` the Y coordinate is not consulted at all.
    pub fn contains(&self, location: &Location, ignore_height: bool) -> bool {
        if location.world != self.world {
            return false;
        }

        let within_x = location.x >= f64::from(self.lesser.x)
            && location.x < f64::from(self.greater.x) + 1.0;
        let within_z = location.z >= f64::from(self.lesser.z)
            && location.z < f64::from(self.greater.z) + 1.0;
        if !within_x || !within_z {
            return false;
        }
        if ignore_height {
            return true;
        }

        let above_floor = location.y >= f64::from(self.lesser.y);
        match self.vertical {
            VerticalExtent::ToSky => above_floor,
            VerticalExtent::Bounded => above_floor && location.y < f64::from(self.greater.y) + 1.0,
        }
    }

    /// Returns `true` if the horizontal footprints share at least one block
    pub fn intersects(&self, other: &ClaimBounds) -> bool {
        self.world == other.world
            && self.lesser.x <= other.greater.x
            && other.lesser.x <= self.greater.x
            && self.lesser.z <= other.greater.z
            && other.lesser.z <= self.greater.z
    }

    /// Returns `true` if the footprints intersect and the vertical ranges overlap
    ///
    /// Two-dimensional bounds extend upward without limit.
    pub fn intersects_volume(&self, other: &ClaimBounds) -> bool {
        if !self.intersects(other) {
            return false;
        }
        let top = |bounds: &ClaimBounds| {
            if bounds.is_3d() {
                bounds.greater.y
            } else {
                i32::MAX
            }
        };
        self.lesser.y <= top(other) && other.lesser.y <= top(self)
    }

    /// Returns `true` if `other`'s horizontal footprint lies entirely inside this one
    pub fn encloses(&self, other: &ClaimBounds) -> bool {
        self.world == other.world
            && self.lesser.x <= other.lesser.x
            && self.lesser.z <= other.lesser.z
            && self.greater.x >= other.greater.x
            && self.greater.z >= other.greater.z
    }

    /// Horizontal intersection with `outer`, keeping this shape's vertical extent
    ///
    /// Returns `None` when the footprints do not overlap.
    pub fn clipped_to(&self, outer: &ClaimBounds) -> Option<ClaimBounds> {
        if !self.intersects(outer) {
            return None;
        }
        let lesser = BlockPos::new(
            self.lesser.x.max(outer.lesser.x),
            self.lesser.y,
            self.lesser.z.max(outer.lesser.z),
        );
        let greater = BlockPos::new(
            self.greater.x.min(outer.greater.x),
            self.greater.y,
            self.greater.z.min(outer.greater.z),
        );
        Some(Self::new(self.world, lesser, greater, self.vertical))
    }

    /// Copy grown by `distance` blocks on every horizontal side
    ///
    /// The result is open to the sky with its floor at the lowest block.
    pub fn expanded(&self, distance: i32) -> ClaimBounds {
        let lesser = BlockPos::new(
            self.lesser.x.saturating_sub(distance),
            i32::MIN,
            self.lesser.z.saturating_sub(distance),
        );
        let greater = BlockPos::new(
            self.greater.x.saturating_add(distance),
            self.greater.y,
            self.greater.z.saturating_add(distance),
        );
        Self::new(self.world, lesser, greater, VerticalExtent::ToSky)
    }

    /// Single-block, sky-high bounds around a location
    pub fn around(location: &Location) -> ClaimBounds {
        let block = location.block();
        Self::to_sky(location.world, block, block)
    }
}

impl fmt::Display for ClaimBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.world, self.lesser, self.greater)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn world() -> WorldId {
        WorldId::named("overworld")
    }

    fn square(x0: i32, z0: i32, x1: i32, z1: i32) -> ClaimBounds {
        ClaimBounds::to_sky(world(), BlockPos::new(x0, 60, z0), BlockPos::new(x1, 60, z1))
    }

    #[test]
    fn test_inclusive_upper_corner() {
        let bounds = square(0, 0, 9, 9);
        assert!(bounds.contains(&Location::new(world(), 9.99, 64.0, 9.99), false));
        assert!(!bounds.contains(&Location::new(world(), 10.0, 64.0, 5.0), false));
        assert!(!bounds.contains(&Location::new(world(), 5.0, 64.0, -0.01), false));
    }

    #[test]
    fn test_floor_applies_unless_height_ignored() {
        let bounds = square(0, 0, 9, 9);
        let below = Location::new(world(), 5.0, 12.0, 5.0);
        assert!(!bounds.contains(&below, false));
        assert!(bounds.contains(&below, true));
        assert!(bounds.contains(&Location::new(world(), 5.0, 319.0, 5.0), false));
    }

    #[test]
    fn test_three_dimensional_ceiling() {
        let bounds =
            ClaimBounds::bounded(world(), BlockPos::new(0, 10, 0), BlockPos::new(4, 20, 4));
        assert!(bounds.contains(&Location::new(world(), 2.0, 20.5, 2.0), false));
        assert!(!bounds.contains(&Location::new(world(), 2.0, 21.0, 2.0), false));
    }

    #[test]
    fn test_other_world_never_contains() {
        let bounds = square(0, 0, 9, 9);
        let nether = Location::new(WorldId::named("nether"), 5.0, 64.0, 5.0);
        assert!(!bounds.contains(&nether, true));
    }

    #[test]
    fn test_new_normalizes_corners() {
        let bounds = square(9, 9, 0, 0);
        assert_eq!(bounds.lesser(), BlockPos::new(0, 60, 0));
        assert_eq!(bounds.greater(), BlockPos::new(9, 60, 9));
        assert_eq!(bounds.area(), 100);
    }

    #[test]
    fn test_area_of_extreme_bounds_saturates() {
        let everything = square(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(everything.width(), 4_294_967_296);
        assert_eq!(everything.area(), i64::MAX);

        let strip = square(i32::MIN, 0, i32::MAX, 0);
        assert_eq!(strip.area(), 4_294_967_296);
    }

    #[test]
    fn test_clip_keeps_vertical_extent() {
        let child = ClaimBounds::bounded(world(), BlockPos::new(5, 10, 5), BlockPos::new(15, 20, 15));
        let parent = square(0, 0, 9, 9);
        let clipped = child.clipped_to(&parent).unwrap();
        assert_eq!(clipped.lesser(), BlockPos::new(5, 10, 5));
        assert_eq!(clipped.greater(), BlockPos::new(9, 20, 9));
        assert!(clipped.is_3d());
        assert!(square(20, 20, 30, 30).clipped_to(&parent).is_none());
    }

    #[test]
    fn test_expanded_reaches_neighbours() {
        let bounds = square(0, 0, 9, 9);
        let grown = bounds.expanded(5);
        assert!(grown.contains(&Location::new(world(), -5.0, -64.0, 14.5), false));
        assert!(!grown.contains(&Location::new(world(), -5.01, 64.0, 0.0), false));
    }

    fn arb_square() -> impl Strategy<Value = ClaimBounds> {
        (-200i32..200, -200i32..200, 0i32..40, 0i32..40)
            .prop_map(|(x, z, w, h)| square(x, z, x + w, z + h))
    }

    proptest! {
        #[test]
        fn intersection_is_symmetric(a in arb_square(), b in arb_square()) {
            prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        }

        #[test]
        fn intersection_matches_shared_block(a in arb_square(), b in arb_square()) {
            let cx = a.lesser().x.max(b.lesser().x);
            let cz = a.lesser().z.max(b.lesser().z);
            let probe = Location::new(world(), f64::from(cx) + 0.5, 64.0, f64::from(cz) + 0.5);
            let shared = a.contains(&probe, true) && b.contains(&probe, true);
            prop_assert_eq!(a.intersects(&b), shared);
        }

        #[test]
        fn clipped_bounds_are_enclosed(a in arb_square(), b in arb_square()) {
            if let Some(clipped) = a.clipped_to(&b) {
                prop_assert!(b.encloses(&clipped));
                prop_assert!(a.encloses(&clipped));
            } else {
                prop_assert!(!a.intersects(&b));
            }
        }
    }
}
