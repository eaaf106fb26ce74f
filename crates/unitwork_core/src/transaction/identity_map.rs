//! Transaction-scoped identity map.
//!
//! # Invariants
//! - Keys are `entity_type -> canonical id digest`.
//! - Entries are never removed; state only moves forward:
//!   `Saving -> Saved`, `Loaded -> Saving -> Saved`.
//! - Absence of an entity is never recorded.

use crate::model::entity::EntityHandle;
use crate::model::reference::Reference;
use std::collections::HashMap;

/// Lifecycle of one reference inside a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Save started; relation hooks or the backend call are still running.
    Saving,
    /// Backend accepted the working copy.
    Saved,
    /// Loaded from the backend and not saved in this transaction.
    Loaded,
}

#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub(crate) state: EntryState,
    pub(crate) handle: EntityHandle,
}

#[derive(Debug, Default)]
pub(crate) struct IdentityMap {
    entries: HashMap<String, HashMap<String, CacheEntry>>,
}

impl IdentityMap {
    pub(crate) fn get(&self, reference: &Reference) -> Option<&CacheEntry> {
        self.entries
            .get(reference.entity_type())?
            .get(reference.digest())
    }

    pub(crate) fn insert(&mut self, reference: &Reference, state: EntryState, handle: EntityHandle) {
        self.entries
            .entry(reference.entity_type().to_string())
            .or_default()
            .insert(reference.digest().to_string(), CacheEntry { state, handle });
    }

    /// Moves an existing entry to `state`; returns `false` when absent.
    pub(crate) fn set_state(&mut self, reference: &Reference, state: EntryState) -> bool {
        match self
            .entries
            .get_mut(reference.entity_type())
            .and_then(|by_id| by_id.get_mut(reference.digest()))
        {
            Some(entry) => {
                entry.state = state;
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }
}
