//! Unit-of-work persistence core.
//!
//! A [`Transaction`] saves and loads domain objects through pluggable
//! repository backends, using per-type [`Metadata`] to derive stable
//! [`Reference`]s and to run relation hooks. Its identity map guarantees each
//! persisted entity is processed at most once per transaction, even when
//! relations form cycles.

pub mod db;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod repo;
pub mod transaction;

pub use error::{BackendError, BackendResult, IdentityError, UowError, UowResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use metadata::descriptor::Metadata;
pub use metadata::identifier::{CallbackIdentifier, IdentifierResolver};
pub use metadata::registry::MetadataRegistry;
pub use metadata::relation::Relation;
pub use model::entity::{Entity, EntityHandle, Persistable};
pub use model::reference::{EntityId, Reference};
pub use repo::locator::{RepositoryLocator, RepositoryManager};
pub use repo::memory_repo::InMemoryRepository;
pub use repo::sqlite_repo::SqliteRepository;
pub use repo::{RepoError, RepoResult, Repository};
pub use transaction::{EntryState, Transaction};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
