//! Common fixtures: worlds, actors, bounds, and a ready-to-use claim service

use crate::mock_host::MockHost;
use crate::persistence::MemoryPersistence;
use bastion_claims::ClaimService;
use bastion_core::{
    ActorId, BlockPos, ClaimBounds, ClaimId, Location, PermissionLevel, PrincipalKey,
    ProtectionConfig, WorldId,
};

/// Claim service wired to the mock host and in-memory persistence
pub type TestService = ClaimService<MemoryPersistence, MockHost>;

/// The default test world
pub fn overworld() -> WorldId {
    WorldId::named("overworld")
}

/// A second world for cross-world checks
pub fn nether() -> WorldId {
    WorldId::named("nether")
}

/// Deterministic actor for a player name
pub fn actor(name: &str) -> ActorId {
    ActorId::from_name(name)
}

/// Sky-high claim in the overworld spanning `x1..=x2`, `z1..=z2` from y = 0
pub fn square(x1: i32, z1: i32, x2: i32, z2: i32) -> ClaimBounds {
    ClaimBounds::to_sky(overworld(), BlockPos::new(x1, 0, z1), BlockPos::new(x2, 0, z2))
}

/// Bounded claim in the overworld
pub fn cuboid(lesser: (i32, i32, i32), greater: (i32, i32, i32)) -> ClaimBounds {
    ClaimBounds::bounded(
        overworld(),
        BlockPos::new(lesser.0, lesser.1, lesser.2),
        BlockPos::new(greater.0, greater.1, greater.2),
    )
}

/// Overworld location at the centre of block `(x, y, z)`
pub fn at(x: i32, y: i32, z: i32) -> Location {
    Location::new(
        overworld(),
        f64::from(x) + 0.5,
        f64::from(y),
        f64::from(z) + 0.5,
    )
}

/// Builder for a claim service with a known population
///
/// ```ignore
/// let mut scenario = Scenario::new()
///     .named("alice")
///     .named("bob")
///     .build();
/// let claim = scenario.claim_for("alice", square(0, 0, 9, 9));
/// ```
pub struct Scenario {
    config: ProtectionConfig,
    host: MockHost,
    persistence: MemoryPersistence,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    pub fn new() -> Self {
        Self {
            config: ProtectionConfig::default(),
            host: MockHost::new(),
            persistence: MemoryPersistence::new(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: ProtectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Adjust the default configuration in place
    pub fn configure(mut self, change: impl FnOnce(&mut ProtectionConfig)) -> Self {
        change(&mut self.config);
        self
    }

    /// Start from previously stored rows
    pub fn with_persistence(mut self, persistence: MemoryPersistence) -> Self {
        self.persistence = persistence;
        self
    }

    /// Register `name` in the mock directory
    pub fn named(self, name: &str) -> Self {
        self.host.set_name(actor(name), name);
        self
    }

    /// Turn PvP rules on in the overworld
    pub fn pvp(self) -> Self {
        self.host.enable_pvp(overworld());
        self
    }

    /// Load the service from the configured persistence
    pub fn build(self) -> Fixture {
        let service = ClaimService::load(self.config, self.persistence.clone(), self.host.clone())
            .unwrap();
        Fixture {
            service,
            host: self.host,
            persistence: self.persistence,
        }
    }
}

/// A built scenario with handles onto its host and storage
pub struct Fixture {
    pub service: TestService,
    pub host: MockHost,
    pub persistence: MemoryPersistence,
}

impl Fixture {
    /// Create a top-level claim owned by `owner`
    pub fn claim_for(&mut self, owner: &str, bounds: ClaimBounds) -> ClaimId {
        self.service.create_claim(bounds, Some(actor(owner))).unwrap()
    }

    /// Create an administrative claim
    pub fn admin_claim(&mut self, bounds: ClaimBounds) -> ClaimId {
        self.service.create_claim(bounds, None).unwrap()
    }

    /// Create a subdivision
    pub fn subdivide(&mut self, parent: ClaimId, bounds: ClaimBounds) -> ClaimId {
        self.service.create_subdivision(parent, bounds).unwrap()
    }

    /// Grant `level` to a named actor
    pub fn trust(&mut self, claim: ClaimId, name: &str, level: PermissionLevel) {
        self.service
            .set_permission(claim, PrincipalKey::actor(actor(name)), level)
            .unwrap();
    }

    /// Grant `level` to everyone
    pub fn trust_public(&mut self, claim: ClaimId, level: PermissionLevel) {
        self.service
            .set_permission(claim, PrincipalKey::public(), level)
            .unwrap();
    }
}
