//! Relation hook contract.
//!
//! Concrete relations (foreign objects, cascaded lists, ...) live outside the
//! core. A relation may call back into the transaction, e.g. to save a
//! related object before its owner is persisted; the identity map keeps that
//! reentrancy terminating on cyclic graphs.

use crate::error::UowResult;
use crate::model::entity::Entity;
use crate::transaction::Transaction;

/// Hook participating in save/load processing of one entity type.
pub trait Relation: Send + Sync {
    /// Runs on the transaction's working copy before the backend saves it.
    fn prepare_to_save(
        &self,
        transaction: &mut Transaction<'_>,
        object: &mut dyn Entity,
    ) -> UowResult<()>;

    /// Runs on the freshly loaded working copy, after it has been cached.
    fn prepare_to_load(
        &self,
        transaction: &mut Transaction<'_>,
        object: &mut dyn Entity,
    ) -> UowResult<()>;
}
