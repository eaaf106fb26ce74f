//! Type name to metadata registry.

use crate::error::{UowError, UowResult};
use crate::metadata::descriptor::Metadata;
use crate::model::entity::Entity;
use log::debug;
use std::collections::BTreeMap;

/// Explicitly constructed registry of persistable entity types.
///
/// # Invariants
/// - Keys are unique; the last registration for a type wins.
/// - Lookups never touch a repository backend.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    entries: BTreeMap<String, Metadata>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers metadata for `entity_type`, replacing any earlier entry.
    pub fn add_metadata(&mut self, entity_type: impl Into<String>, metadata: Metadata) {
        let entity_type = entity_type.into();
        let replaced = self.entries.insert(entity_type.clone(), metadata).is_some();
        debug!(
            "event=metadata_register module=metadata status=ok entity_type={} replaced={}",
            entity_type, replaced
        );
    }

    /// Resolves metadata by the object's runtime type.
    ///
    /// # Errors
    /// - `MetadataNotFound` when the type was never registered.
    pub fn metadata_for_object(&self, object: &dyn Entity) -> UowResult<&Metadata> {
        self.metadata_for_type(object.entity_type())
    }

    /// Resolves metadata by type name.
    pub fn metadata_for_type(&self, entity_type: &str) -> UowResult<&Metadata> {
        self.entries
            .get(entity_type)
            .ok_or_else(|| UowError::MetadataNotFound(entity_type.to_string()))
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.entries.contains_key(entity_type)
    }

    /// Returns registered type names in sorted order.
    pub fn entity_types(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
