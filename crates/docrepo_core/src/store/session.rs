//! Unit-of-work session over one store connection.
//!
//! # Responsibility
//! - Own one SQLite connection for the lifetime of a logical operation.
//! - Buffer writes until `save_changes` and count storage round trips.
//!
//! # Invariants
//! - A session is released exactly once, either by `dispose` or by `Drop`.
//! - Unsaved pending changes are discarded on release.
//! - Sequential calls on one session are strictly ordered.

use super::query::DeferredQuery;
use super::{
    decode_row, delete_document, entity_collection, is_pending_id, write_document, StoredDocument,
};
use crate::model::entity::Entity;
use crate::repo::error::{RepoError, RepoResult};
use log::{debug, error, info};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
enum PendingChange {
    Store {
        collection: String,
        id: String,
        body: Map<String, Value>,
    },
    Delete {
        collection: String,
        id: String,
    },
}

/// Unit-of-work scope handed out by [`super::DocumentStore::open_session`].
pub struct Session {
    id: Uuid,
    conn: Connection,
    pending: RefCell<Vec<PendingChange>>,
    tracked: RefCell<BTreeSet<String>>,
    requests: Cell<u32>,
    opened_at: Instant,
}

impl Session {
    pub(crate) fn new(conn: Connection) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            conn,
            pending: RefCell::new(Vec::new()),
            tracked: RefCell::new(BTreeSet::new()),
            requests: Cell::new(0),
            opened_at: Instant::now(),
        };
        debug!(
            "event=session_open module=store status=ok session_id={}",
            session.id
        );
        session
    }

    /// Stable id used to correlate log events of one session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Starts a deferred query over `collection`.
    pub fn query(&self, collection: &str) -> DeferredQuery<'_> {
        DeferredQuery::new(self, collection)
    }

    /// Loads one document of `collection` by id; one round trip.
    pub fn load_by_id(&self, collection: &str, id: &str) -> RepoResult<Option<StoredDocument>> {
        self.record_request();
        let row = self
            .conn
            .query_row(
                "SELECT id, collection, body FROM documents WHERE id = ?1 AND collection = ?2;",
                params![id, collection],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()
            .map_err(|err| RepoError::QueryFailure(err.to_string()))?;

        match row {
            Some((id, collection, raw)) => {
                let document = decode_row(id, collection, &raw)?;
                self.track(std::iter::once(document.id.as_str()));
                Ok(Some(document))
            }
            None => Ok(None),
        }
    }

    /// Schedules `entity` for writing under `id` (or its own/generated id).
    ///
    /// The identifier is assigned to the entity immediately; the write happens
    /// on the next [`Session::save_changes`].
    ///
    /// # Errors
    /// - `PreconditionViolation` when the entity already carries another id.
    /// - `InvalidArgument` for pending ids (`persons/`), which only the bulk
    ///   channel may resolve.
    /// - `InvalidArgument` when the entity has a blank collection name.
    pub fn store<E: Entity>(&self, entity: &mut E, id: Option<&str>) -> RepoResult<String> {
        let collection = entity_collection(&*entity)?.to_string();
        let candidate = id.or(entity.identifier()).map(str::to_string);
        if let Some(candidate) = candidate.as_deref() {
            if candidate.trim().is_empty() || is_pending_id(candidate) {
                return Err(RepoError::InvalidArgument(format!(
                    "`{candidate}` is not a storable document id"
                )));
            }
        }
        let id = match id {
            Some(id) => {
                entity.assign_identifier(id)?;
                id.to_string()
            }
            None => entity.ensure_identifier(),
        };

        let body = entity.to_body()?;
        self.pending.borrow_mut().push(PendingChange::Store {
            collection,
            id: id.clone(),
            body,
        });
        Ok(id)
    }

    /// Schedules deletion of `entity`.
    ///
    /// # Errors
    /// - `InvalidArgument` when the entity has never been assigned an id.
    pub fn delete<E: Entity>(&self, entity: &E) -> RepoResult<()> {
        let id = entity.identifier().ok_or_else(|| {
            RepoError::InvalidArgument("cannot delete an entity without an identifier".to_string())
        })?;
        let collection = entity_collection(entity)?;
        self.pending.borrow_mut().push(PendingChange::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        Ok(())
    }

    /// Writes every pending change in one transaction.
    ///
    /// Returns the number of applied changes. On failure nothing is written and
    /// the pending changes stay buffered.
    pub fn save_changes(&self) -> RepoResult<usize> {
        let started_at = Instant::now();
        let pending = self.pending.borrow().clone();
        if pending.is_empty() {
            return Ok(0);
        }

        self.record_request();
        match self.apply(&pending) {
            Ok(()) => {
                self.pending.borrow_mut().clear();
                info!(
                    "event=save_changes module=store status=ok session_id={} changes={} duration_ms={}",
                    self.id,
                    pending.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(pending.len())
            }
            Err(err) => {
                error!(
                    "event=save_changes module=store status=error session_id={} changes={} duration_ms={} error={}",
                    self.id,
                    pending.len(),
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    fn apply(&self, pending: &[PendingChange]) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        for change in pending {
            match change {
                PendingChange::Store {
                    collection,
                    id,
                    body,
                } => write_document(&tx, collection, id, body.clone(), Map::new())?,
                PendingChange::Delete { collection, id } => {
                    delete_document(&tx, collection, id)?;
                }
            }
        }
        tx.commit()?;

        let mut tracked = self.tracked.borrow_mut();
        for change in pending {
            match change {
                PendingChange::Store { id, .. } => {
                    tracked.insert(id.clone());
                }
                PendingChange::Delete { id, .. } => {
                    tracked.remove(id);
                }
            }
        }
        Ok(())
    }

    /// Number of storage round trips performed so far.
    pub fn request_count(&self) -> u32 {
        self.requests.get()
    }

    /// Number of buffered, unsaved changes.
    pub fn pending_changes(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Whether the document id was loaded or saved through this session.
    pub fn is_tracked(&self, id: &str) -> bool {
        self.tracked.borrow().contains(id)
    }

    /// Releases the session; unsaved changes are discarded.
    pub fn dispose(self) {}

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn record_request(&self) {
        self.requests.set(self.requests.get().saturating_add(1));
    }

    pub(crate) fn track<'a>(&self, ids: impl Iterator<Item = &'a str>) {
        let mut tracked = self.tracked.borrow_mut();
        for id in ids {
            tracked.insert(id.to_string());
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(
            "event=session_dispose module=store status=ok session_id={} requests={} discarded_changes={} duration_ms={}",
            self.id,
            self.requests.get(),
            self.pending.get_mut().len(),
            self.opened_at.elapsed().as_millis()
        );
    }
}
