//! Unified error type for Bastion
//!
//! Errors are reserved for claim management and storage. Permission and protection
//! checks never fail: they return a [`Verdict`](crate::Verdict).

use crate::identifiers::ClaimId;
use serde::{Deserialize, Serialize};

/// Unified error type for all Bastion operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum BastionError {
    /// Invalid input or request
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Claim, siege or actor not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// The requested area overlaps an existing claim
    #[error("Overlaps existing {existing}")]
    Overlap {
        /// The claim that is in the way
        existing: ClaimId,
    },

    /// A subdivision would leave its parent's footprint
    #[error("Out of bounds: {message}")]
    OutOfBounds {
        /// Error message describing the violation
        message: String,
    },

    /// A siege could not be started
    #[error("Siege rejected: {message}")]
    SiegeRejected {
        /// Error message describing why
        message: String,
    },

    /// Persistence failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Configuration failed validation
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration problem
        message: String,
    },
}

impl BastionError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an overlap error
    pub fn overlap(existing: ClaimId) -> Self {
        Self::Overlap { existing }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds(message: impl Into<String>) -> Self {
        Self::OutOfBounds {
            message: message.into(),
        }
    }

    /// Create a siege rejection
    pub fn siege_rejected(message: impl Into<String>) -> Self {
        Self::SiegeRejected {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a not found error for a claim
    pub fn claim_not_found(claim: ClaimId) -> Self {
        Self::not_found(format!("{claim}"))
    }
}

/// Standard Result type for Bastion operations
pub type Result<T> = std::result::Result<T, BastionError>;

impl From<serde_json::Error> for BastionError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(err.to_string())
    }
}
