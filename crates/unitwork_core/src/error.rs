//! Error taxonomy surfaced by transaction operations.
//!
//! # Invariants
//! - Backend failures are carried unchanged inside `UowError::Backend` and
//!   can be downcast to the backend's own error type.
//! - No variant implies a rollback: cache entries written before a failure
//!   stay in place for the rest of the transaction.

use crate::model::reference::Reference;
use std::error::Error;
use thiserror::Error;

/// Opaque error returned by repository backends.
pub type BackendError = Box<dyn Error + Send + Sync>;

pub type BackendResult<T> = Result<T, BackendError>;

pub type UowResult<T> = Result<T, UowError>;

/// Raised by identifier resolvers that cannot produce an id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct IdentityError {
    message: String,
}

impl IdentityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Unit-of-work error.
#[derive(Debug, Error)]
pub enum UowError {
    #[error("no metadata registered for entity type `{0}`")]
    MetadataNotFound(String),
    #[error("cannot resolve identity for `{entity_type}`: {source}")]
    IdentityResolution {
        entity_type: String,
        #[source]
        source: IdentityError,
    },
    #[error("no repository registered for entity type `{0}`")]
    RepositoryNotFound(String),
    #[error("entity {0} is in use by a running relation hook")]
    EntityInUse(Reference),
    #[error("relation failed for `{entity_type}`: {message}")]
    Relation {
        entity_type: String,
        message: String,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl UowError {
    /// Convenience constructor for relation hooks.
    pub fn relation(entity_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Relation {
            entity_type: entity_type.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MetadataNotFound(_) => "metadata_not_found",
            Self::IdentityResolution { .. } => "identity_resolution_failed",
            Self::RepositoryNotFound(_) => "repository_not_found",
            Self::EntityInUse(_) => "entity_in_use",
            Self::Relation { .. } => "relation_failed",
            Self::Backend(_) => "backend_failed",
        }
    }
}
