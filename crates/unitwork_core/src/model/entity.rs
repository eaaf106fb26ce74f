//! Entity trait object and transaction-owned handles.
//!
//! # Responsibility
//! - Erase concrete domain types behind `dyn Entity` so one transaction can
//!   move heterogeneous objects through metadata, relations and backends.
//! - Provide typed access back into erased objects.
//!
//! # Invariants
//! - `entity_type()` is the key used for metadata and repository lookup.
//! - `clone_entity()` produces an independent deep copy.

use std::any::Any;
use std::cell::{BorrowError, BorrowMutError, Ref, RefCell, RefMut};
use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

/// Object that can flow through a transaction.
///
/// Implemented for every [`Persistable`] type; implement it by hand only for
/// types whose runtime name is not a compile-time constant.
pub trait Entity: Any + Debug {
    /// Runtime type name used for metadata and repository lookup.
    fn entity_type(&self) -> &str;
    /// Deep copy used as the transaction's private working copy.
    fn clone_entity(&self) -> Box<dyn Entity>;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Concrete domain type with a fixed persisted type name.
pub trait Persistable: Any + Clone + Debug {
    const ENTITY_TYPE: &'static str;
}

impl<T: Persistable> Entity for T {
    fn entity_type(&self) -> &str {
        T::ENTITY_TYPE
    }

    fn clone_entity(&self) -> Box<dyn Entity> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn Entity {
    pub fn is<T: Entity>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Entity>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Entity>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Shared handle to a working copy owned by one transaction.
///
/// Cloning the handle does not clone the entity; every clone points at the
/// same instance, which is what makes repeated lookups return one object.
///
/// # Invariants
/// - Handles are single-threaded and must not outlive the unit of work that
///   produced them in any meaningful way: later transactions never see them.
/// - While a relation hook runs for an entity, that entity's handle is
///   mutably borrowed. In a cyclic load a hook can get that handle back from
///   the transaction; read it there with [`EntityHandle::try_read`] or
///   [`EntityHandle::try_get`], which fail instead of panicking.
#[derive(Clone)]
pub struct EntityHandle(Rc<RefCell<Box<dyn Entity>>>);

impl EntityHandle {
    pub fn new(entity: Box<dyn Entity>) -> Self {
        Self(Rc::new(RefCell::new(entity)))
    }

    pub fn borrow(&self) -> Ref<'_, Box<dyn Entity>> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Box<dyn Entity>> {
        self.0.borrow_mut()
    }

    pub fn try_borrow(&self) -> Result<Ref<'_, Box<dyn Entity>>, BorrowError> {
        self.0.try_borrow()
    }

    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, Box<dyn Entity>>, BorrowMutError> {
        self.0.try_borrow_mut()
    }

    /// Returns `true` while no hook holds the entity mutably.
    pub fn is_available(&self) -> bool {
        self.0.try_borrow().is_ok()
    }

    /// Runtime type of the wrapped entity.
    pub fn entity_type(&self) -> String {
        self.borrow().entity_type().to_string()
    }

    /// Runs `read` against the entity when it is a `T`.
    pub fn read<T: Entity, R>(&self, read: impl FnOnce(&T) -> R) -> Option<R> {
        let entity = self.borrow();
        (**entity).downcast_ref::<T>().map(read)
    }

    /// Like [`EntityHandle::read`], but fails while a hook holds the entity.
    pub fn try_read<T: Entity, R>(
        &self,
        read: impl FnOnce(&T) -> R,
    ) -> Result<Option<R>, BorrowError> {
        let entity = self.try_borrow()?;
        Ok((**entity).downcast_ref::<T>().map(read))
    }

    /// Runs `update` against the entity when it is a `T`.
    pub fn update<T: Entity, R>(&self, update: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut entity = self.borrow_mut();
        (**entity).downcast_mut::<T>().map(update)
    }

    /// Returns a detached clone of the entity when it is a `T`.
    pub fn get<T: Entity + Clone>(&self) -> Option<T> {
        self.read(T::clone)
    }

    pub fn try_get<T: Entity + Clone>(&self) -> Result<Option<T>, BorrowError> {
        self.try_read(T::clone)
    }

    /// Whether both handles point at the same working copy.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Debug for EntityHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(entity) => f.debug_tuple("EntityHandle").field(&entity).finish(),
            Err(_) => f.write_str("EntityHandle(<in use>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Entity, EntityHandle, Persistable};

    #[derive(Debug, Clone, PartialEq)]
    struct Tag {
        label: String,
    }

    impl Persistable for Tag {
        const ENTITY_TYPE: &'static str = "Tag";
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Other;

    impl Persistable for Other {
        const ENTITY_TYPE: &'static str = "Other";
    }

    #[test]
    fn clone_entity_is_independent_copy() {
        let original = Tag {
            label: "rust".to_string(),
        };
        let mut copy = original.clone_entity();
        copy.downcast_mut::<Tag>()
            .expect("copy should downcast to Tag")
            .label = "changed".to_string();

        assert_eq!(original.label, "rust");
        assert_eq!(copy.entity_type(), "Tag");
    }

    #[test]
    fn downcast_rejects_other_types() {
        let boxed: Box<dyn Entity> = Box::new(Other);
        assert!(boxed.is::<Other>());
        assert!(boxed.downcast_ref::<Tag>().is_none());
    }

    #[test]
    fn handle_clones_share_one_instance() {
        let handle = EntityHandle::new(Box::new(Tag {
            label: "a".to_string(),
        }));
        let alias = handle.clone();
        alias
            .update::<Tag, _>(|tag| tag.label = "b".to_string())
            .expect("alias should be a Tag");

        assert!(handle.ptr_eq(&alias));
        assert_eq!(
            handle.get::<Tag>().expect("handle should be a Tag").label,
            "b"
        );
        assert_eq!(handle.read::<Other, _>(|_| ()), None);
    }

    #[test]
    fn debug_does_not_panic_while_borrowed() {
        let handle = EntityHandle::new(Box::new(Other));
        let _guard = handle.borrow_mut();
        assert!(!handle.is_available());
        assert_eq!(format!("{handle:?}"), "EntityHandle(<in use>)");
    }

    #[test]
    fn try_accessors_fail_while_borrowed_and_recover_after() {
        let handle = EntityHandle::new(Box::new(Tag {
            label: "busy".to_string(),
        }));
        {
            let _guard = handle.borrow_mut();
            assert!(handle.try_read::<Tag, _>(|tag| tag.label.clone()).is_err());
            assert!(handle.try_get::<Tag>().is_err());
        }

        assert_eq!(
            handle
                .try_read::<Tag, _>(|tag| tag.label.clone())
                .expect("handle should be free"),
            Some("busy".to_string())
        );
        assert_eq!(
            handle.try_get::<Other>().expect("handle should be free"),
            None
        );
    }
}
