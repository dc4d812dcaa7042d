//! Proptest strategies for Bastion types
//!
//! Coordinates stay within a few hundred blocks of the origin so generated claims
//! collide often enough to exercise overlap and containment paths.

use bastion_core::{BlockPos, ClaimBounds, Location, PermissionLevel, WorldId};
use proptest::prelude::*;

use crate::fixtures::overworld;

/// Strategy for generating arbitrary permission levels
pub fn arb_permission_level() -> impl Strategy<Value = PermissionLevel> {
    prop_oneof![
        Just(PermissionLevel::Access),
        Just(PermissionLevel::Inventory),
        Just(PermissionLevel::Build),
    ]
}

/// Strategy for generating sky-high claims in the overworld
pub fn arb_square_bounds() -> impl Strategy<Value = ClaimBounds> {
    (-200i32..200, -200i32..200, 0i32..60, 0i32..60, -64i32..100).prop_map(
        |(x, z, width, depth, floor)| {
            ClaimBounds::to_sky(
                overworld(),
                BlockPos::new(x, floor, z),
                BlockPos::new(x + width, floor, z + depth),
            )
        },
    )
}

/// Strategy for generating bounded (3D) claims in the overworld
pub fn arb_cuboid_bounds() -> impl Strategy<Value = ClaimBounds> {
    (
        arb_square_bounds(),
        0i32..40,
    )
        .prop_map(|(square, tall)| {
            let lesser = square.lesser();
            let greater = square.greater();
            ClaimBounds::bounded(
                overworld(),
                lesser,
                BlockPos::new(greater.x, lesser.y + tall, greater.z),
            )
        })
}

/// Strategy for generating locations near the origin of `world`
pub fn arb_location_in(world: WorldId) -> impl Strategy<Value = Location> {
    (-260.0f64..260.0, -64.0f64..200.0, -260.0f64..260.0)
        .prop_map(move |(x, y, z)| Location::new(world, x, y, z))
}

/// Strategy for generating overworld locations
pub fn arb_location() -> impl Strategy<Value = Location> {
    arb_location_in(overworld())
}
