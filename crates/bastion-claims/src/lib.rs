//! # Bastion Claims - Layer 2: Claims and Permissions
//!
//! Claim records and their two-level hierarchy, the spatial index that maps a
//! location to its most specific claim, the permission resolver, sieges, and the
//! [`ClaimService`] that keeps all of them consistent.

pub mod claim;
pub mod persistence;
pub mod player;
pub mod resolver;
pub mod service;
pub mod shared;
pub mod siege;
pub mod spatial;
pub mod store;

pub use claim::{ClaimArena, ClaimRecord, ClaimRef, PermissionListing, UNKNOWN_OWNER_NAME};
pub use persistence::ClaimPersistence;
pub use player::{PlayerRegistry, PlayerState, PvpContact, SiegeRole};
pub use resolver::{Notify, PermissionQuery, PermissionResolver};
pub use service::ClaimService;
pub use shared::SharedClaimService;
pub use siege::{SiegeBook, SiegeDescriptor, SiegeOutcome};
pub use spatial::SpatialIndex;
pub use store::{ClaimStore, ResizeOutcome};
