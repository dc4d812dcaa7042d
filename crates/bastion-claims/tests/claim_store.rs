//! Claim Store Integration Tests
//!
//! Creation, resizing and deletion through the claim service, plus reloading from
//! JSON rows written by the in-memory persistence.
#![allow(clippy::unwrap_used)]

use bastion_claims::ClaimRecord;
use bastion_core::{BastionError, ClaimId, PermissionLevel, PrincipalKey};
use bastion_testkit::{actor, at, cuboid, nether, square, MemoryPersistence, Scenario};

#[test]
fn overlapping_claims_are_rejected() {
    let mut fixture = Scenario::new().build();
    let first = fixture.claim_for("alice", square(0, 0, 9, 9));

    let err = fixture
        .service
        .create_claim(square(9, 9, 20, 20), Some(actor("bob")))
        .unwrap_err();
    assert_eq!(err, BastionError::Overlap { existing: first });

    // Touching edges is not overlapping.
    assert!(fixture
        .service
        .create_claim(square(10, 0, 20, 9), Some(actor("bob")))
        .is_ok());
}

#[test]
fn subdivisions_stay_inside_parent() {
    let mut fixture = Scenario::new().build();
    let parent = fixture.claim_for("alice", square(0, 0, 19, 19));
    let sub = fixture.subdivide(parent, square(0, 0, 4, 4));

    assert!(matches!(
        fixture.service.create_subdivision(parent, square(15, 15, 25, 25)),
        Err(BastionError::OutOfBounds { .. })
    ));
    assert_eq!(
        fixture
            .service
            .create_subdivision(parent, square(3, 3, 8, 8))
            .unwrap_err(),
        BastionError::Overlap { existing: sub }
    );
    assert!(matches!(
        fixture.service.create_subdivision(sub, square(1, 1, 2, 2)),
        Err(BastionError::Invalid { .. })
    ));
}

#[test]
fn stacked_cuboid_subdivisions_may_share_a_footprint() {
    let mut fixture = Scenario::new().build();
    let parent = fixture.claim_for("alice", square(0, 0, 19, 19));
    let ground = fixture.subdivide(parent, cuboid((0, 0, 0), (9, 9, 9)));
    let upper = fixture.subdivide(parent, cuboid((0, 10, 0), (9, 19, 9)));

    let ground_hit = fixture.service.resolve_claim(&at(5, 5, 5), false, None).unwrap();
    assert_eq!(ground_hit.id(), ground);
    let upper_hit = fixture.service.resolve_claim(&at(5, 15, 5), false, None).unwrap();
    assert_eq!(upper_hit.id(), upper);
    let above = fixture.service.resolve_claim(&at(5, 40, 5), false, None).unwrap();
    assert_eq!(above.id(), parent);
}

#[test]
fn lookup_prefers_most_specific_claim() {
    let mut fixture = Scenario::new().build();
    let parent = fixture.claim_for("alice", square(0, 0, 19, 19));
    let sub = fixture.subdivide(parent, square(0, 0, 4, 4));
    let alice = actor("alice");

    assert_eq!(fixture.service.resolve_for_actor(alice, &at(2, 64, 2), false), Some(sub));
    assert_eq!(fixture.service.players().get(alice).last_claim, Some(sub));

    assert_eq!(
        fixture.service.resolve_for_actor(alice, &at(10, 64, 10), false),
        Some(parent)
    );
    assert_eq!(fixture.service.resolve_for_actor(alice, &at(50, 64, 50), false), None);
    assert_eq!(fixture.service.players().get(alice).last_claim, None);

    // Below a sky-high claim's floor only an ignore-height lookup matches.
    assert_eq!(fixture.service.resolve_claim(&at(10, -5, 10), false, None).map(|c| c.id()), None);
    assert_eq!(
        fixture.service.resolve_claim(&at(10, -5, 10), true, None).map(|c| c.id()),
        Some(parent)
    );
}

#[test]
fn resize_clips_and_removes_subdivisions() {
    let mut fixture = Scenario::new().build();
    let parent = fixture.claim_for("alice", square(0, 0, 19, 19));
    let kept = fixture.subdivide(parent, square(0, 0, 4, 4));
    let far = fixture.subdivide(parent, square(15, 15, 19, 19));
    let straddling = fixture.subdivide(parent, square(8, 8, 12, 12));

    let outcome = fixture.service.resize_claim(parent, square(0, 0, 9, 9)).unwrap();
    assert_eq!(outcome.clipped, vec![straddling]);
    assert_eq!(outcome.removed, vec![far]);

    assert!(fixture.service.claim(far).is_none());
    assert_eq!(
        fixture.service.claim(straddling).unwrap().bounds(),
        &square(8, 8, 9, 9)
    );
    assert_eq!(fixture.service.claim(kept).unwrap().bounds(), &square(0, 0, 4, 4));
    assert_eq!(fixture.service.claim(parent).unwrap().child_ids(), &[kept, straddling]);

    // The old footprint no longer resolves.
    assert!(fixture.service.resolve_claim(&at(15, 64, 15), false, None).is_none());
}

#[test]
fn resize_rejects_overlap_and_world_change() {
    let mut fixture = Scenario::new().build();
    let first = fixture.claim_for("alice", square(0, 0, 9, 9));
    let second = fixture.claim_for("bob", square(20, 0, 29, 9));

    assert_eq!(
        fixture
            .service
            .resize_claim(first, square(0, 0, 25, 9))
            .unwrap_err(),
        BastionError::Overlap { existing: second }
    );

    let elsewhere = bastion_core::ClaimBounds::to_sky(
        nether(),
        bastion_core::BlockPos::new(0, 0, 0),
        bastion_core::BlockPos::new(9, 0, 9),
    );
    assert!(matches!(
        fixture.service.resize_claim(first, elsewhere),
        Err(BastionError::Invalid { .. })
    ));
}

#[test]
fn delete_removes_children_and_marks_records_dead() {
    let mut fixture = Scenario::new().build();
    let parent = fixture.claim_for("alice", square(0, 0, 19, 19));
    let sub = fixture.subdivide(parent, square(0, 0, 4, 4));

    let removed = fixture.service.delete_claim(parent).unwrap();
    let ids: Vec<ClaimId> = removed.iter().map(ClaimRecord::id).collect();
    assert_eq!(ids, vec![sub, parent]);
    assert!(removed.iter().all(|record| !record.is_live()));
    assert!(fixture.persistence.is_empty());
    assert!(fixture.service.resolve_claim(&at(2, 64, 2), false, None).is_none());
}

#[test]
fn world_wipe_can_spare_admin_claims() {
    let mut fixture = Scenario::new().build();
    fixture.claim_for("alice", square(0, 0, 9, 9));
    let admin = fixture.admin_claim(square(20, 20, 29, 29));

    let removed = fixture
        .service
        .delete_claims_in_world(bastion_testkit::overworld(), false);
    assert_eq!(removed.len(), 1);
    assert!(fixture.service.claim(admin).is_some());

    let removed = fixture
        .service
        .delete_claims_in_world(bastion_testkit::overworld(), true);
    assert_eq!(removed.len(), 1);
    assert!(fixture.service.store().arena().is_empty());
}

#[test]
fn transfer_changes_effective_owner_of_subdivisions() {
    let mut fixture = Scenario::new().build();
    let parent = fixture.claim_for("alice", square(0, 0, 19, 19));
    let sub = fixture.subdivide(parent, square(0, 0, 4, 4));

    fixture.service.transfer_ownership(parent, Some(actor("bob"))).unwrap();
    assert_eq!(fixture.service.claim(sub).unwrap().owner(), Some(actor("bob")));
    assert!(matches!(
        fixture.service.transfer_ownership(sub, Some(actor("carol"))),
        Err(BastionError::Invalid { .. })
    ));

    fixture.service.transfer_ownership(parent, None).unwrap();
    assert!(fixture.service.claim(sub).unwrap().is_admin_claim());
}

#[test]
fn dropping_a_grant_reaches_subdivisions() {
    let mut fixture = Scenario::new().build();
    let parent = fixture.claim_for("alice", square(0, 0, 19, 19));
    let sub = fixture.subdivide(parent, square(0, 0, 4, 4));
    fixture.trust(parent, "bob", PermissionLevel::Build);
    fixture.trust(sub, "bob", PermissionLevel::Access);
    fixture.service.add_manager(sub, PrincipalKey::actor(actor("carol"))).unwrap();

    let bob = PrincipalKey::actor(actor("bob"));
    fixture.service.drop_permission(parent, &bob).unwrap();
    assert_eq!(fixture.service.claim(parent).unwrap().permission_of(&bob), None);
    assert_eq!(fixture.service.claim(sub).unwrap().permission_of(&bob), None);

    fixture.service.clear_permissions(parent).unwrap();
    assert!(fixture.service.claim(sub).unwrap().managers().is_empty());
}

#[test]
fn listing_groups_grants_by_level() {
    let mut fixture = Scenario::new().build();
    let claim = fixture.claim_for("alice", square(0, 0, 9, 9));
    fixture.trust(claim, "bob", PermissionLevel::Build);
    fixture.trust(claim, "carol", PermissionLevel::Inventory);
    fixture.trust_public(claim, PermissionLevel::Access);
    fixture.service.add_manager(claim, PrincipalKey::node("town.stewards")).unwrap();

    let listing = fixture.service.all_permissions(claim).unwrap();
    assert_eq!(listing.builders, vec![PrincipalKey::actor(actor("bob"))]);
    assert_eq!(listing.containers, vec![PrincipalKey::actor(actor("carol"))]);
    assert_eq!(listing.accessors, vec![PrincipalKey::public()]);
    assert_eq!(listing.managers, vec![PrincipalKey::node("town.stewards")]);

    assert!(matches!(
        fixture.service.set_permission(claim, PrincipalKey::new(""), PermissionLevel::Build),
        Err(BastionError::Invalid { .. })
    ));
}

#[test]
fn claims_survive_a_reload() {
    let mut fixture = Scenario::new().build();
    let parent = fixture.claim_for("alice", square(0, 0, 19, 19));
    let sub = fixture.subdivide(parent, square(0, 0, 4, 4));
    fixture.trust(sub, "bob", PermissionLevel::Inventory);
    fixture.service.set_inherit_nothing(sub, true).unwrap();
    let persistence = fixture.persistence.clone();
    drop(fixture);

    let mut reloaded = Scenario::new().with_persistence(persistence).build();
    let sub_ref = reloaded.service.claim(sub).unwrap();
    assert_eq!(sub_ref.parent().map(|p| p.id()), Some(parent));
    assert!(sub_ref.inherit_nothing());
    assert_eq!(
        sub_ref.permission_of(&PrincipalKey::actor(actor("bob"))),
        Some(PermissionLevel::Inventory)
    );
    assert_eq!(
        reloaded.service.resolve_claim(&at(1, 64, 1), false, None).map(|c| c.id()),
        Some(sub)
    );

    let next = reloaded.claim_for("carol", square(40, 40, 49, 49));
    assert!(next > sub);
}

#[test]
fn load_repairs_legacy_hierarchies() {
    let parent = ClaimRecord::new(ClaimId::new(1), square(0, 0, 9, 9), Some(actor("alice")));
    let overhanging = ClaimRecord::new(ClaimId::new(2), square(5, 5, 14, 14), None)
        .with_parent(ClaimId::new(1));
    let orphan = ClaimRecord::new(ClaimId::new(3), square(30, 30, 34, 34), None)
        .with_parent(ClaimId::new(99));
    let nested = ClaimRecord::new(ClaimId::new(4), square(6, 6, 7, 7), None)
        .with_parent(ClaimId::new(2));
    let persistence = MemoryPersistence::seeded([parent, overhanging, orphan, nested]);

    let fixture = Scenario::new().with_persistence(persistence).build();
    let arena = fixture.service.store().arena();
    assert!(arena.contains_id(ClaimId::new(2)));
    assert!(!arena.contains_id(ClaimId::new(3)));
    assert!(!arena.contains_id(ClaimId::new(4)));

    // The overhang past the parent protects nothing.
    assert_eq!(
        fixture.service.resolve_claim(&at(6, 64, 6), false, None).map(|c| c.id()),
        Some(ClaimId::new(2))
    );
    assert!(fixture.service.resolve_claim(&at(12, 64, 12), false, None).is_none());
    assert!(!fixture
        .service
        .claim(ClaimId::new(2))
        .unwrap()
        .contains(&at(12, 64, 12), false, false));
}

#[test]
fn failed_writes_keep_memory_state() {
    let mut fixture = Scenario::new().build();
    fixture.persistence.fail_writes(true);

    let claim = fixture.claim_for("alice", square(0, 0, 9, 9));
    assert!(fixture.service.claim(claim).is_some());
    assert!(fixture.persistence.is_empty());
    assert_eq!(fixture.persistence.writes(), 1);
}

#[test]
fn runtime_state_is_not_persisted() {
    let mut fixture = Scenario::new().build();
    let parent = fixture.claim_for("alice", square(0, 0, 19, 19));
    fixture.subdivide(parent, square(0, 0, 4, 4));

    let raw = fixture.persistence.raw(parent).unwrap();
    assert!(!raw.contains("children"));
    assert!(!raw.contains("doors_open"));
    let stored = fixture.persistence.stored(parent).unwrap();
    assert!(stored.child_ids().is_empty());
    assert!(!stored.is_live());
}
