//! Transaction state machine.

use crate::error::{UowError, UowResult};
use crate::metadata::descriptor::Metadata;
use crate::metadata::registry::MetadataRegistry;
use crate::model::entity::{Entity, EntityHandle};
use crate::model::reference::Reference;
use crate::repo::locator::RepositoryLocator;
use crate::transaction::identity_map::{EntryState, IdentityMap};
use log::{debug, warn};

/// One unit of work.
///
/// Not shareable across threads; create one per unit of work and drop it
/// when the work ends. Handles it returned stay valid afterwards but are no
/// longer tracked by anything.
pub struct Transaction<'a> {
    metadata: &'a MetadataRegistry,
    repositories: &'a dyn RepositoryLocator,
    identity_map: IdentityMap,
}

impl<'a> Transaction<'a> {
    pub fn new(metadata: &'a MetadataRegistry, repositories: &'a dyn RepositoryLocator) -> Self {
        debug!("event=uow_begin module=transaction status=ok");
        Self {
            metadata,
            repositories,
            identity_map: IdentityMap::default(),
        }
    }

    /// Persists `object` and every related object its relations save.
    ///
    /// The first save of a reference clones `object`, publishes the clone in
    /// the identity map, runs the save hooks on it and hands it to the
    /// backend. Later saves of the same reference return immediately.
    ///
    /// # Errors
    /// - `MetadataNotFound` for unregistered types, before any backend access.
    /// - `IdentityResolution`, `RepositoryNotFound`, relation and backend
    ///   errors propagate unchanged.
    pub fn save(&mut self, object: &dyn Entity) -> UowResult<Reference> {
        let registry = self.metadata;
        let metadata = registry.metadata_for_object(object)?;
        let reference = metadata.reference_for_object(object)?;

        let handle = match self.identity_map.get(&reference) {
            Some(entry) if entry.state != EntryState::Loaded => {
                debug!(
                    "event=uow_save module=transaction status=hit state={:?} entity_type={} id_digest={}",
                    entry.state,
                    reference.entity_type(),
                    reference.digest()
                );
                return Ok(reference);
            }
            Some(entry) => {
                let handle = entry.handle.clone();
                let mut working = handle
                    .try_borrow_mut()
                    .map_err(|_| UowError::EntityInUse(reference.clone()))?;
                *working = object.clone_entity();
                drop(working);
                handle
            }
            None => EntityHandle::new(object.clone_entity()),
        };
        self.identity_map
            .insert(&reference, EntryState::Saving, handle.clone());

        self.persist(metadata, &reference, &handle)
            .inspect_err(|err| {
                warn!(
                    "event=uow_save module=transaction status=error entity_type={} id_digest={} error_code={} error={}",
                    reference.entity_type(),
                    reference.digest(),
                    err.code(),
                    err
                );
            })?;

        self.identity_map.set_state(&reference, EntryState::Saved);
        debug!(
            "event=uow_save module=transaction status=ok entity_type={} id_digest={}",
            reference.entity_type(),
            reference.digest()
        );
        Ok(reference)
    }

    /// Returns the transaction's instance for `reference`, loading it once.
    ///
    /// Cached references are returned without touching the backend or
    /// re-running load hooks. An absent object is not cached, so a later call
    /// asks the backend again.
    pub fn find_by_reference(&mut self, reference: &Reference) -> UowResult<Option<EntityHandle>> {
        if let Some(entry) = self.identity_map.get(reference) {
            debug!(
                "event=uow_find module=transaction status=hit state={:?} entity_type={} id_digest={}",
                entry.state,
                reference.entity_type(),
                reference.digest()
            );
            return Ok(Some(entry.handle.clone()));
        }

        let repository = self.repositories.repository_for_type(reference.entity_type())?;
        let Some(object) = repository.find_by_id(reference.id())? else {
            debug!(
                "event=uow_find module=transaction status=absent entity_type={} id_digest={}",
                reference.entity_type(),
                reference.digest()
            );
            return Ok(None);
        };

        self.load(reference.clone(), object).map(Some)
    }

    /// Returns every object of `entity_type`, normalized through the
    /// identity map.
    ///
    /// Objects already touched in this transaction come back as the cached
    /// instance. The rest take the same cache-insert and load-hook path as
    /// [`Transaction::find_by_reference`], but start from the object `get_all`
    /// already fetched: the backend is not asked for each object a second
    /// time through `find_by_id`.
    pub fn get_all(&mut self, entity_type: &str) -> UowResult<Vec<EntityHandle>> {
        let registry = self.metadata;
        let repository = self.repositories.repository_for_type(entity_type)?;
        let objects = repository.get_all()?;

        let mut handles = Vec::with_capacity(objects.len());
        for object in objects {
            let reference = registry
                .metadata_for_object(&*object)?
                .reference_for_object(&*object)?;
            let handle = match self.identity_map.get(&reference) {
                Some(entry) => entry.handle.clone(),
                None => self.load(reference, object)?,
            };
            handles.push(handle);
        }

        debug!(
            "event=uow_get_all module=transaction status=ok entity_type={} count={}",
            entity_type,
            handles.len()
        );
        Ok(handles)
    }

    /// State of `reference` in this transaction, if it was seen.
    pub fn entry_state(&self, reference: &Reference) -> Option<EntryState> {
        self.identity_map.get(reference).map(|entry| entry.state)
    }

    pub fn is_cached(&self, reference: &Reference) -> bool {
        self.identity_map.get(reference).is_some()
    }

    /// Number of references tracked by the identity map.
    pub fn len(&self) -> usize {
        self.identity_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn persist(
        &mut self,
        metadata: &Metadata,
        reference: &Reference,
        handle: &EntityHandle,
    ) -> UowResult<()> {
        let mut working = handle
            .try_borrow_mut()
            .map_err(|_| UowError::EntityInUse(reference.clone()))?;
        metadata.prepare_to_save(self, &mut **working)?;

        let repository = self.repositories.repository_for_object(&**working)?;
        repository.save(&**working)?;
        Ok(())
    }

    fn load(&mut self, reference: Reference, object: Box<dyn Entity>) -> UowResult<EntityHandle> {
        let registry = self.metadata;
        let metadata = registry.metadata_for_object(&*object)?;

        let handle = EntityHandle::new(object);
        self.identity_map
            .insert(&reference, EntryState::Loaded, handle.clone());

        {
            let mut working = handle
                .try_borrow_mut()
                .map_err(|_| UowError::EntityInUse(reference.clone()))?;
            metadata.prepare_to_load(self, &mut **working)?;
        }

        debug!(
            "event=uow_find module=transaction status=loaded entity_type={} id_digest={}",
            reference.entity_type(),
            reference.digest()
        );
        Ok(handle)
    }
}
