//! SQLite-backed JSON document repository.
//!
//! # Responsibility
//! - Persist one `Persistable` type as JSON rows in the shared `entities` table.
//! - Keep SQL details inside the repository boundary.
//!
//! # Invariants
//! - Rows are keyed by `(entity_type, id_digest)`; saving an existing id
//!   updates the row in place, so `get_all` keeps first-insertion order.
//! - Read paths reject undecodable rows instead of skipping them.

use crate::error::BackendResult;
use crate::metadata::identifier::IdentifierResolver;
use crate::model::entity::{Entity, Persistable};
use crate::model::reference::EntityId;
use crate::repo::{expect_entity, RepoError, RepoResult, Repository};
use log::debug;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

const UPSERT_SQL: &str = "INSERT INTO entities (entity_type, id_digest, id_json, body)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT (entity_type, id_digest) DO UPDATE SET
    id_json = excluded.id_json,
    body = excluded.body,
    updated_at = (strftime('%s', 'now') * 1000);";

/// Document repository for one entity type over a shared connection.
pub struct SqliteRepository<T> {
    conn: Rc<Connection>,
    identifier: Arc<dyn IdentifierResolver>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> SqliteRepository<T>
where
    T: Persistable + Serialize + DeserializeOwned,
{
    /// Wraps a connection opened through [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    pub fn new(conn: Rc<Connection>, identifier: Arc<dyn IdentifierResolver>) -> Self {
        Self {
            conn,
            identifier,
            _entity: PhantomData,
        }
    }

    /// Number of stored rows for this entity type.
    pub fn count(&self) -> RepoResult<u64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM entities WHERE entity_type = ?1;",
            [T::ENTITY_TYPE],
            |row| row.get::<_, u64>(0),
        )?;
        Ok(count)
    }

    fn upsert(&self, value: &T) -> RepoResult<()> {
        let id = self.identifier.identity(value)?;
        let digest = id.canonical();
        let id_json = serde_json::to_string(&id)?;
        let body = serde_json::to_string(value)?;

        self.conn
            .execute(UPSERT_SQL, params![T::ENTITY_TYPE, digest, id_json, body])?;
        debug!(
            "event=entity_write module=repo status=ok backend=sqlite entity_type={} id_digest={}",
            T::ENTITY_TYPE,
            digest
        );
        Ok(())
    }

    fn select_one(&self, id: &EntityId) -> RepoResult<Option<T>> {
        let mut stmt = self.conn.prepare(
            "SELECT body FROM entities
             WHERE entity_type = ?1 AND id_digest = ?2;",
        )?;
        let mut rows = stmt.query(params![T::ENTITY_TYPE, id.canonical()])?;
        match rows.next()? {
            Some(row) => Ok(Some(decode_body(&row.get::<_, String>("body")?)?)),
            None => Ok(None),
        }
    }

    fn select_all(&self) -> RepoResult<Vec<T>> {
        let mut stmt = self.conn.prepare(
            "SELECT body FROM entities
             WHERE entity_type = ?1
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([T::ENTITY_TYPE])?;
        let mut values = Vec::new();
        while let Some(row) = rows.next()? {
            values.push(decode_body(&row.get::<_, String>("body")?)?);
        }
        Ok(values)
    }
}

impl<T> Repository for SqliteRepository<T>
where
    T: Persistable + Serialize + DeserializeOwned,
{
    fn save(&self, object: &dyn Entity) -> BackendResult<()> {
        let value = expect_entity::<T>(object, T::ENTITY_TYPE)?;
        self.upsert(value)?;
        Ok(())
    }

    fn find_by_id(&self, id: &EntityId) -> BackendResult<Option<Box<dyn Entity>>> {
        let found = self.select_one(id)?;
        Ok(found.map(|value| Box::new(value) as Box<dyn Entity>))
    }

    fn get_all(&self) -> BackendResult<Vec<Box<dyn Entity>>> {
        let values = self.select_all()?;
        Ok(values
            .into_iter()
            .map(|value| Box::new(value) as Box<dyn Entity>)
            .collect())
    }
}

fn decode_body<T: Persistable + DeserializeOwned>(body: &str) -> RepoResult<T> {
    serde_json::from_str(body).map_err(|err| {
        RepoError::InvalidData(format!(
            "cannot decode `{}` row body: {err}",
            T::ENTITY_TYPE
        ))
    })
}
