//! Document store handle.
//!
//! # Responsibility
//! - Resolve `StoreConfig` into a database target and open bootstrapped
//!   connections for sessions and the bulk channel.
//! - Run bulk loads outside any session.
//!
//! # Invariants
//! - A private in-memory store lives exactly as long as its `DocumentStore`.
//! - `bulk_insert` is all-or-nothing.

use super::session::Session;
use super::{
    entity_collection, pending_id_prefix, resolve_pending_id, write_document, METADATA_DIRTY,
};
use crate::config::{StoreConfig, StoreLocation};
use crate::db::{open_db, open_db_uri};
use crate::model::entity::Entity;
use crate::repo::error::{RepoError, RepoResult};
use log::{error, info};
use rusqlite::{Connection, TransactionBehavior};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum Target {
    File(PathBuf),
    Memory(String),
}

/// Entry point to the document store; shareable across threads.
pub struct DocumentStore {
    config: StoreConfig,
    target: Target,
    // Named memdb databases vanish with their last connection.
    _keeper: Option<Mutex<Connection>>,
}

impl DocumentStore {
    /// Opens (and migrates) the store described by `config`.
    pub fn open(config: StoreConfig) -> RepoResult<Self> {
        let started_at = Instant::now();
        if config.default_page_size == 0 {
            return Err(RepoError::InvalidArgument(
                "default_page_size must be greater than zero".to_string(),
            ));
        }

        let (target, keeper) = match &config.location {
            StoreLocation::File(path) => {
                open_db(path, config.busy_timeout)?;
                (Target::File(path.clone()), None)
            }
            StoreLocation::Memory => {
                // memdb uses file-style locks; busy_timeout covers contention.
                let uri = format!("file:/docrepo-{}?vfs=memdb", Uuid::new_v4());
                let keeper = open_db_uri(&uri, config.busy_timeout)?;
                (Target::Memory(uri), Some(Mutex::new(keeper)))
            }
        };

        info!(
            "event=store_open module=store status=ok mode={} duration_ms={}",
            match target {
                Target::File(_) => "file",
                Target::Memory(_) => "memory",
            },
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            config,
            target,
            _keeper: keeper,
        })
    }

    /// Convenience for a private in-memory store.
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::open(StoreConfig::in_memory())
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Opens a new bootstrapped connection to this store.
    pub fn connect(&self) -> RepoResult<Connection> {
        let conn = match &self.target {
            Target::File(path) => open_db(path, self.config.busy_timeout)?,
            Target::Memory(uri) => open_db_uri(uri, self.config.busy_timeout)?,
        };
        Ok(conn)
    }

    /// Acquires a unit-of-work session; dropping it releases the connection.
    pub fn open_session(&self) -> RepoResult<Session> {
        Ok(Session::new(self.connect()?))
    }

    /// Loads `entities` through a dedicated channel outside any session.
    ///
    /// Each entity receives the pending id `<collection lowercased>/`, which
    /// the store resolves to the next number of that prefix. The whole batch
    /// commits or nothing does. Returns the assigned ids in input order.
    ///
    /// The entities themselves are left untouched.
    pub fn bulk_insert<E: Entity>(&self, entities: &[E]) -> RepoResult<Vec<String>> {
        let started_at = Instant::now();
        let result = self.connect().and_then(|mut conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut ids = Vec::with_capacity(entities.len());
            for entity in entities {
                let collection = entity_collection(entity)?;
                let id = resolve_pending_id(&tx, &pending_id_prefix(collection))?;
                let mut metadata = Map::new();
                metadata.insert(METADATA_DIRTY.to_string(), Value::Bool(true));
                write_document(&tx, collection, &id, entity.to_body()?, metadata)?;
                ids.push(id);
            }
            tx.commit()?;
            Ok(ids)
        });

        match &result {
            Ok(ids) => info!(
                "event=bulk_insert module=store status=ok count={} duration_ms={}",
                ids.len(),
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=bulk_insert module=store status=error count={} duration_ms={} error={}",
                entities.len(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}
