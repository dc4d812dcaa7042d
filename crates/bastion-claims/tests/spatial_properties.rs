//! Property tests for claim placement and location lookup
#![allow(clippy::unwrap_used)]

use bastion_claims::ClaimArena;
use bastion_core::{BastionError, ClaimId, Location};
use bastion_testkit::{actor, arb_location, arb_square_bounds, Scenario};
use proptest::prelude::*;

/// Lookup by scanning every live claim instead of the index
fn brute_force(arena: &ClaimArena, location: &Location) -> Option<ClaimId> {
    let top = arena
        .top_level()
        .find(|claim| claim.is_live() && claim.contains(location, false, false))?;
    let child = top
        .children()
        .find(|child| child.is_live() && child.contains(location, false, false));
    Some(child.unwrap_or(top).id())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn second_claim_rejected_iff_footprints_intersect(
        first in arb_square_bounds(),
        second in arb_square_bounds(),
    ) {
        let mut fixture = Scenario::new().build();
        let existing = fixture.claim_for("alice", first);

        let result = fixture.service.create_claim(second, Some(actor("bob")));
        if first.intersects(&second) {
            prop_assert_eq!(result.unwrap_err(), BastionError::Overlap { existing });
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn index_lookup_matches_full_scan(
        footprints in proptest::collection::vec(arb_square_bounds(), 1..8),
        probes in proptest::collection::vec(arb_location(), 1..16),
    ) {
        let mut fixture = Scenario::new().build();
        for bounds in footprints {
            // Overlapping candidates are rejected; the rest form the world.
            let _ = fixture.service.create_claim(bounds, Some(actor("alice")));
        }
        let ids: Vec<ClaimId> = fixture
            .service
            .store()
            .arena()
            .iter()
            .map(|claim| claim.id())
            .collect();

        for probe in &probes {
            let expected = brute_force(fixture.service.store().arena(), probe);
            let found = fixture.service.resolve_claim(probe, false, None).map(|c| c.id());
            prop_assert_eq!(found, expected);

            for hint in &ids {
                let hinted = fixture
                    .service
                    .resolve_claim(probe, false, Some(*hint))
                    .map(|c| c.id());
                prop_assert_eq!(hinted, expected);
            }
        }
    }

    #[test]
    fn subdivision_points_lie_in_parent(
        parent in arb_square_bounds(),
        probes in proptest::collection::vec(arb_location(), 1..16),
    ) {
        let mut fixture = Scenario::new().build();
        let parent_id = fixture.claim_for("alice", parent);
        let lesser = parent.lesser();
        let greater = parent.greater();
        let inner = bastion_core::ClaimBounds::to_sky(
            parent.world(),
            bastion_core::BlockPos::new(lesser.x, lesser.y + 5, lesser.z),
            bastion_core::BlockPos::new(
                lesser.x + (greater.x - lesser.x) / 2,
                lesser.y + 5,
                lesser.z + (greater.z - lesser.z) / 2,
            ),
        );
        let sub = fixture.subdivide(parent_id, inner);

        let sub_ref = fixture.service.claim(sub).unwrap();
        let parent_ref = fixture.service.claim(parent_id).unwrap();
        for probe in &probes {
            if sub_ref.contains(probe, false, false) {
                prop_assert!(parent_ref.contains(probe, false, false));
                prop_assert!(!parent_ref.contains(probe, false, true));
            }
        }
    }
}
