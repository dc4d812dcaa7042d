//! Thread-shareable claim service
//!
//! Protection checks read the claim store while command handlers mutate it. A host
//! that raises events on more than one thread wraps its service here so that every
//! check and every mutation, index updates included, runs under one lock.

use crate::persistence::ClaimPersistence;
use crate::service::ClaimService;
use bastion_core::HostEffects;
use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;

/// Cloneable handle to a claim service behind a single mutex
pub struct SharedClaimService<P, E> {
    inner: Arc<Mutex<ClaimService<P, E>>>,
}

impl<P, E> Clone for SharedClaimService<P, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, E> fmt::Debug for SharedClaimService<P, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedClaimService")
            .field("handles", &Arc::strong_count(&self.inner))
            .finish()
    }
}

impl<P: ClaimPersistence, E: HostEffects> SharedClaimService<P, E> {
    pub fn new(service: ClaimService<P, E>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(service)),
        }
    }

    /// Run `f` with exclusive access to the service
    pub fn with<R>(&self, f: impl FnOnce(&mut ClaimService<P, E>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Hold the lock across several calls
    pub fn lock(&self) -> MutexGuard<'_, ClaimService<P, E>> {
        self.inner.lock()
    }

    /// Unwrap the service if this is the last handle
    pub fn try_into_inner(self) -> Result<ClaimService<P, E>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}
