//! Identifier resolver contract and closure adapter.

use crate::error::IdentityError;
use crate::model::entity::Entity;
use crate::model::reference::EntityId;
use std::any::type_name;
use std::marker::PhantomData;

/// Produces the identity value of an object, unique within its type.
pub trait IdentifierResolver: Send + Sync {
    fn identity(&self, object: &dyn Entity) -> Result<EntityId, IdentityError>;
}

/// Resolver backed by a typed closure.
///
/// The closure returns `None` while the object has no id assigned yet.
pub struct CallbackIdentifier<T, F> {
    callback: F,
    _entity: PhantomData<fn(&T)>,
}

impl<T, F> CallbackIdentifier<T, F>
where
    T: Entity,
    F: Fn(&T) -> Option<EntityId> + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _entity: PhantomData,
        }
    }
}

impl<T, F> IdentifierResolver for CallbackIdentifier<T, F>
where
    T: Entity,
    F: Fn(&T) -> Option<EntityId> + Send + Sync,
{
    fn identity(&self, object: &dyn Entity) -> Result<EntityId, IdentityError> {
        let typed = object.downcast_ref::<T>().ok_or_else(|| {
            IdentityError::new(format!(
                "expected `{}`, got entity type `{}`",
                type_name::<T>(),
                object.entity_type()
            ))
        })?;
        (self.callback)(typed)
            .ok_or_else(|| IdentityError::new("object has no identity assigned"))
    }
}
