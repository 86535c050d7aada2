//! Error taxonomy shared by the engine and its callers.

use thiserror::Error;

/// Why an import, batch, or administrative operation was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("metadata URI must not be empty")]
    EmptyMetadataUri,

    #[error("{0} address must not be zero")]
    ZeroAddress(&'static str),

    #[error("royalty rate {0} exceeds the maximum of 100")]
    RoyaltyOutOfRange(u8),

    #[error("destination registry identity must not be zero")]
    MissingRegistryIdentity,

    #[error("no account implementation configured for nested-ownership imports")]
    MissingAccountImplementation,

    #[error("batch must contain at least one record")]
    EmptyBatch,

    #[error("batch of {len} records exceeds the maximum of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("origin {0} has already been imported")]
    AlreadyImported(String),

    #[error("no token with origin {0} exists in the destination registry")]
    ParentNotFound(String),

    #[error("destination registry rejected the mint: {0}")]
    DestinationRejected(String),

    #[error("destination registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("caller is not the engine authority")]
    AuthorizationRequired,

    #[error("dedup store error: {0}")]
    Store(String),
}

impl ImportError {
    /// Caller errors: malformed input that fails identically on retry.
    ///
    /// These are never charged against an actor's failure counter.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            ImportError::EmptyMetadataUri
                | ImportError::ZeroAddress(_)
                | ImportError::RoyaltyOutOfRange(_)
                | ImportError::MissingRegistryIdentity
                | ImportError::MissingAccountImplementation
                | ImportError::EmptyBatch
                | ImportError::BatchTooLarge { .. }
        )
    }
}
