//! Metadata descriptor for one entity type.

use crate::error::{UowError, UowResult};
use crate::metadata::identifier::IdentifierResolver;
use crate::metadata::relation::Relation;
use crate::model::entity::Entity;
use crate::model::reference::Reference;
use crate::transaction::Transaction;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Identity strategy plus ordered relation hooks for one entity type.
///
/// # Invariants
/// - Relations run in the order they were added; later relations may rely
///   on side effects of earlier ones.
pub struct Metadata {
    identifier: Arc<dyn IdentifierResolver>,
    relations: Vec<Box<dyn Relation>>,
}

impl Metadata {
    pub fn new(identifier: Arc<dyn IdentifierResolver>) -> Self {
        Self {
            identifier,
            relations: Vec::new(),
        }
    }

    /// Appends one relation to the processing order.
    pub fn add_relation(&mut self, relation: impl Relation + 'static) {
        self.relations.push(Box::new(relation));
    }

    /// Builder form of [`Metadata::add_relation`].
    pub fn with_relation(mut self, relation: impl Relation + 'static) -> Self {
        self.add_relation(relation);
        self
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    pub fn identifier(&self) -> &Arc<dyn IdentifierResolver> {
        &self.identifier
    }

    /// Computes the reference naming `object`.
    ///
    /// # Errors
    /// - `IdentityResolution` when the resolver cannot produce an id.
    pub fn reference_for_object(&self, object: &dyn Entity) -> UowResult<Reference> {
        let id = self
            .identifier
            .identity(object)
            .map_err(|source| UowError::IdentityResolution {
                entity_type: object.entity_type().to_string(),
                source,
            })?;
        Ok(Reference::new(object.entity_type(), id))
    }

    /// Runs every relation's save hook in declaration order.
    pub fn prepare_to_save(
        &self,
        transaction: &mut Transaction<'_>,
        object: &mut dyn Entity,
    ) -> UowResult<()> {
        for relation in &self.relations {
            relation.prepare_to_save(transaction, object)?;
        }
        Ok(())
    }

    /// Runs every relation's load hook in declaration order.
    pub fn prepare_to_load(
        &self,
        transaction: &mut Transaction<'_>,
        object: &mut dyn Entity,
    ) -> UowResult<()> {
        for relation in &self.relations {
            relation.prepare_to_load(transaction, object)?;
        }
        Ok(())
    }
}

impl Debug for Metadata {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metadata")
            .field("relations", &self.relations.len())
            .finish_non_exhaustive()
    }
}
