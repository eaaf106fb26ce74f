//! Repository locator contract and map-backed implementation.

use crate::error::{UowError, UowResult};
use crate::model::entity::Entity;
use crate::repo::Repository;
use log::debug;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Resolves the backend responsible for an entity type.
pub trait RepositoryLocator {
    /// # Errors
    /// - `RepositoryNotFound` when no backend serves `entity_type`.
    fn repository_for_type(&self, entity_type: &str) -> UowResult<Rc<dyn Repository>>;

    fn repository_for_object(&self, object: &dyn Entity) -> UowResult<Rc<dyn Repository>> {
        self.repository_for_type(object.entity_type())
    }
}

/// In-process locator keyed by entity type name.
#[derive(Default)]
pub struct RepositoryManager {
    repositories: BTreeMap<String, Rc<dyn Repository>>,
}

impl RepositoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `repository` for `entity_type`, replacing any earlier one.
    pub fn add_repository(
        &mut self,
        entity_type: impl Into<String>,
        repository: Rc<dyn Repository>,
    ) {
        let entity_type = entity_type.into();
        debug!(
            "event=repository_register module=repo status=ok entity_type={}",
            entity_type
        );
        self.repositories.insert(entity_type, repository);
    }

    /// Returns registered type names in sorted order.
    pub fn entity_types(&self) -> Vec<&str> {
        self.repositories.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

impl RepositoryLocator for RepositoryManager {
    fn repository_for_type(&self, entity_type: &str) -> UowResult<Rc<dyn Repository>> {
        self.repositories
            .get(entity_type)
            .cloned()
            .ok_or_else(|| UowError::RepositoryNotFound(entity_type.to_string()))
    }
}
