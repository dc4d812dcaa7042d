//! # Bastion Testkit
//!
//! Shared test infrastructure: a mock host implementing every effect trait,
//! JSON-backed in-memory persistence, common fixtures, and proptest strategies.
//!
//! ```ignore
//! use bastion_testkit::*;
//!
//! let mut fixture = Scenario::new().named("alice").build();
//! let claim = fixture.claim_for("alice", square(0, 0, 9, 9));
//! ```

#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

pub mod fixtures;
pub mod mock_host;
pub mod persistence;
pub mod strategies;

pub use fixtures::{actor, at, cuboid, nether, overworld, square, Fixture, Scenario, TestService};
pub use mock_host::{MockHost, START_TIME_MS};
pub use persistence::MemoryPersistence;
pub use strategies::*;

/// Install a test-friendly tracing subscriber once per process
///
/// Honours `RUST_LOG`; later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
