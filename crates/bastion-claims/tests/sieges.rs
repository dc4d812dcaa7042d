//! Siege lifecycle tests: start, lockouts, extension, resolution and expiry
#![allow(clippy::unwrap_used)]

use bastion_claims::{SiegeOutcome, SiegeRole};
use bastion_core::{BastionError, BlockKind, DenialReason, PermissionLevel, PermissionRequest};
use bastion_testkit::{actor, square, Fixture, Scenario};

fn breaking(block: &str) -> PermissionRequest {
    PermissionRequest::Break(BlockKind::new(block))
}

fn besieged() -> (Fixture, bastion_core::ClaimId, bastion_core::SiegeId) {
    let mut fixture = Scenario::new().named("alice").named("bob").pvp().build();
    let claim = fixture.claim_for("alice", square(0, 0, 9, 9));
    let siege = fixture
        .service
        .start_siege(actor("bob"), actor("alice"), claim)
        .unwrap();
    (fixture, claim, siege)
}

#[test]
fn start_marks_claim_and_participants() {
    let (fixture, claim, siege) = besieged();

    assert_eq!(fixture.service.claim(claim).unwrap().siege(), Some(siege));
    let players = fixture.service.players();
    assert_eq!(
        players.get(actor("bob")).siege,
        Some((siege, SiegeRole::Attacker))
    );
    assert_eq!(
        players.get(actor("alice")).siege,
        Some((siege, SiegeRole::Defender))
    );
    assert_eq!(fixture.service.sieges().ongoing_for(actor("bob")).map(|s| s.id), Some(siege));
}

#[test]
fn start_rejects_invalid_sieges() {
    let mut fixture = Scenario::new().build();
    let claim = fixture.claim_for("alice", square(0, 0, 9, 9));
    let admin = fixture.admin_claim(square(20, 20, 29, 29));
    let (alice, bob, carol) = (actor("alice"), actor("bob"), actor("carol"));

    let rejected = |result: Result<_, BastionError>| {
        matches!(result, Err(BastionError::SiegeRejected { .. }))
    };

    assert!(rejected(fixture.service.start_siege(alice, alice, claim)));
    assert!(rejected(fixture.service.start_siege(bob, alice, admin)));
    // Carol has no standing in alice's claim.
    assert!(rejected(fixture.service.start_siege(bob, carol, claim)));

    fixture.service.start_siege(bob, alice, claim).unwrap();
    assert!(rejected(fixture.service.start_siege(carol, alice, claim)));
}

#[test]
fn only_siege_materials_break() {
    let (mut fixture, claim, _) = besieged();

    let stone = fixture
        .service
        .check_permission(Some(actor("bob")), claim, &breaking("stone"));
    assert_eq!(stone.denial_reason(), Some(&DenialReason::NonSiegeMaterial));
    assert_eq!(
        stone.message().as_deref(),
        Some("That material is too tough to break.")
    );

    assert!(fixture
        .service
        .check_permission(Some(actor("bob")), claim, &breaking("dirt"))
        .is_allowed());

    let owner = fixture
        .service
        .check_permission(Some(actor("alice")), claim, &breaking("dirt"));
    assert_eq!(owner.denial_reason(), Some(&DenialReason::NoOwnerBuildUnderSiege));
}

#[test]
fn nobody_builds_or_loots_during_siege() {
    let (mut fixture, claim, _) = besieged();
    fixture.trust(claim, "carol", PermissionLevel::Build);

    let build = fixture
        .service
        .check_level(Some(actor("carol")), claim, PermissionLevel::Build);
    assert_eq!(
        build.message().as_deref(),
        Some("This claim is under siege by bob. No one can build here.")
    );

    let containers = fixture
        .service
        .check_level(Some(actor("alice")), claim, PermissionLevel::Inventory);
    assert_eq!(
        containers.denial_reason(),
        Some(&DenialReason::NoContainersSiege {
            attacker: "bob".to_string()
        })
    );

    let edit = fixture
        .service
        .check_permission(Some(actor("alice")), claim, &PermissionRequest::Edit);
    assert_eq!(edit.denial_reason(), Some(&DenialReason::NoModifyDuringSiege));
}

#[test]
fn defender_pulls_own_claims_into_siege() {
    let (mut fixture, _, siege) = besieged();
    let second = fixture.claim_for("alice", square(40, 40, 49, 49));
    let alice = Some(actor("alice"));

    // Breaking never extends a siege.
    fixture
        .service
        .check_permission(alice, second, &breaking("dirt"));
    assert_eq!(fixture.service.claim(second).unwrap().siege(), None);

    let build = fixture.service.check_level(alice, second, PermissionLevel::Build);
    assert!(build.is_denied());
    assert_eq!(fixture.service.claim(second).unwrap().siege(), Some(siege));
    assert!(fixture.service.sieges().get(siege).unwrap().includes(second));
}

#[test]
fn attacker_victory_leaves_doors_open() {
    let (mut fixture, claim, siege) = besieged();
    let dave = Some(actor("dave"));

    fixture
        .service
        .resolve_siege(siege, SiegeOutcome::AttackerVictory)
        .unwrap();

    let record = fixture.service.claim(claim).unwrap();
    assert_eq!(record.siege(), None);
    assert!(record.doors_open());
    assert_eq!(fixture.service.players().get(actor("bob")).siege, None);

    assert!(fixture
        .service
        .check_level(dave, claim, PermissionLevel::Access)
        .is_allowed());
    assert!(fixture
        .service
        .check_permission(dave, claim, &breaking("sand"))
        .is_allowed());
    assert!(fixture
        .service
        .check_permission(dave, claim, &breaking("stone"))
        .is_denied());

    fixture.service.close_doors(claim).unwrap();
    assert!(fixture
        .service
        .check_level(dave, claim, PermissionLevel::Access)
        .is_denied());

    assert!(matches!(
        fixture.service.resolve_siege(siege, SiegeOutcome::DefenderVictory),
        Err(BastionError::NotFound { .. })
    ));
}

#[test]
fn resolved_sieges_leave_the_book() {
    let (mut fixture, _, siege) = besieged();
    let second = fixture.claim_for("alice", square(40, 40, 49, 49));
    fixture
        .service
        .check_level(Some(actor("alice")), second, PermissionLevel::Build);
    assert_eq!(fixture.service.sieges().len(), 1);

    fixture
        .service
        .resolve_siege(siege, SiegeOutcome::DefenderVictory)
        .unwrap();

    assert!(fixture.service.sieges().is_empty());
    assert!(fixture.service.sieges().get(siege).is_none());
    assert_eq!(fixture.service.claim(second).unwrap().siege(), None);

    // A new siege on the same claim gets a fresh id.
    let again = fixture
        .service
        .start_siege(actor("bob"), actor("alice"), second)
        .unwrap();
    assert_ne!(again, siege);
    assert_eq!(fixture.service.sieges().len(), 1);
}

#[test]
fn sieges_expire_in_defenders_favour() {
    let (mut fixture, claim, siege) = besieged();

    fixture.host.advance(1_800_000);
    assert!(fixture.service.expire_sieges().is_empty());

    fixture.host.advance(1);
    assert_eq!(fixture.service.expire_sieges(), vec![siege]);
    assert!(fixture.service.sieges().is_empty());
    let record = fixture.service.claim(claim).unwrap();
    assert_eq!(record.siege(), None);
    assert!(!record.doors_open());
}

#[test]
fn disconnecting_attacker_forfeits() {
    let (mut fixture, claim, siege) = besieged();

    fixture.service.player_disconnected(actor("bob"));

    assert!(fixture.service.sieges().get(siege).is_none());
    assert!(!fixture.service.claim(claim).unwrap().doors_open());
    assert_eq!(fixture.service.players().get(actor("alice")).siege, None);
}

#[test]
fn disconnecting_defender_opens_doors() {
    let (mut fixture, claim, _) = besieged();

    fixture.service.player_disconnected(actor("alice"));

    assert!(fixture.service.claim(claim).unwrap().doors_open());
}
