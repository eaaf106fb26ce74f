//! In-memory repository backend.
//!
//! # Invariants
//! - One slot per canonical id; re-saving replaces the value in place.
//! - `get_all` preserves first-insertion order.

use crate::error::BackendResult;
use crate::metadata::identifier::IdentifierResolver;
use crate::model::entity::{Entity, Persistable};
use crate::model::reference::EntityId;
use crate::repo::{expect_entity, RepoError, Repository};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Process-local storage for one `Persistable` type.
pub struct InMemoryRepository<T: Persistable> {
    identifier: Arc<dyn IdentifierResolver>,
    state: RefCell<MemoryState<T>>,
}

struct MemoryState<T> {
    slots: HashMap<String, usize>,
    values: Vec<T>,
}

impl<T: Persistable> InMemoryRepository<T> {
    pub fn new(identifier: Arc<dyn IdentifierResolver>) -> Self {
        Self {
            identifier,
            state: RefCell::new(MemoryState {
                slots: HashMap::new(),
                values: Vec::new(),
            }),
        }
    }

    /// Builds a repository pre-populated with `values`.
    pub fn with_values(
        identifier: Arc<dyn IdentifierResolver>,
        values: impl IntoIterator<Item = T>,
    ) -> Result<Self, RepoError> {
        let repository = Self::new(identifier);
        for value in values {
            repository.insert(&value)?;
        }
        Ok(repository)
    }

    pub fn len(&self) -> usize {
        self.state.borrow().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().values.is_empty()
    }

    /// Returns a clone of every stored value in insertion order.
    pub fn values(&self) -> Vec<T> {
        self.state.borrow().values.clone()
    }

    fn insert(&self, value: &T) -> Result<(), RepoError> {
        let key = self.identifier.identity(value)?.canonical();
        let mut state = self.state.borrow_mut();
        match state.slots.get(&key).copied() {
            Some(index) => state.values[index] = value.clone(),
            None => {
                let index = state.values.len();
                state.values.push(value.clone());
                state.slots.insert(key, index);
            }
        }
        Ok(())
    }
}

impl<T: Persistable> Repository for InMemoryRepository<T> {
    fn save(&self, object: &dyn Entity) -> BackendResult<()> {
        let value = expect_entity::<T>(object, T::ENTITY_TYPE)?;
        self.insert(value)?;
        Ok(())
    }

    fn find_by_id(&self, id: &EntityId) -> BackendResult<Option<Box<dyn Entity>>> {
        let state = self.state.borrow();
        let found = state
            .slots
            .get(&id.canonical())
            .map(|index| Box::new(state.values[*index].clone()) as Box<dyn Entity>);
        Ok(found)
    }

    fn get_all(&self) -> BackendResult<Vec<Box<dyn Entity>>> {
        let state = self.state.borrow();
        Ok(state
            .values
            .iter()
            .map(|value| Box::new(value.clone()) as Box<dyn Entity>)
            .collect())
    }
}
