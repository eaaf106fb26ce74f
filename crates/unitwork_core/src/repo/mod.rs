//! Repository backend contracts and shipped implementations.
//!
//! # Responsibility
//! - Define the narrow per-type backend contract the transaction consumes.
//! - Resolve backends by entity type name.
//! - Provide in-memory and SQLite document backends.
//!
//! # Invariants
//! - Backends return owned values; nothing they hand out aliases their
//!   internal storage.
//! - Backend errors stay opaque to the transaction layer.

use crate::db::DbError;
use crate::error::{BackendResult, IdentityError};
use crate::model::entity::Entity;
use crate::model::reference::EntityId;
use thiserror::Error;

pub mod locator;
pub mod memory_repo;
pub mod sqlite_repo;

/// Physical storage for one entity type.
pub trait Repository {
    /// Inserts or replaces `object`.
    fn save(&self, object: &dyn Entity) -> BackendResult<()>;
    /// Returns the stored object with `id`, if any.
    fn find_by_id(&self, id: &EntityId) -> BackendResult<Option<Box<dyn Entity>>>;
    /// Returns every stored object of this repository's type.
    fn get_all(&self) -> BackendResult<Vec<Box<dyn Entity>>>;
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Error raised by the shipped repository implementations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("repository for `{expected}` cannot store entity type `{actual}`")]
    TypeMismatch { expected: String, actual: String },
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("cannot identify entity: {0}")]
    Identity(#[from] IdentityError),
    #[error("entity serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid persisted entity data: {0}")]
    InvalidData(String),
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Downcasts `object` to the repository's concrete type.
pub(crate) fn expect_entity<'a, T: Entity>(
    object: &'a dyn Entity,
    expected: &str,
) -> RepoResult<&'a T> {
    object
        .downcast_ref::<T>()
        .ok_or_else(|| RepoError::TypeMismatch {
            expected: expected.to_string(),
            actual: object.entity_type().to_string(),
        })
}
