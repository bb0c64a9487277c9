//! Session-scoped storage client.
//!
//! # Responsibility
//! - Own the SQLite-backed document store and hand out unit-of-work sessions.
//! - Provide deferred queries, change tracking and the bulk-load channel.
//!
//! # Invariants
//! - Every stored body carries an `@metadata` object; callers above the
//!   repository never see it.
//! - A document id belongs to exactly one collection.
//! - All writes of one `save_changes` / `bulk_insert` call commit atomically.

mod document_store;
mod query;
mod session;

pub use document_store::DocumentStore;
pub use query::{DeferredQuery, SpatialClause};
pub use session::Session;

use crate::model::entity::Entity;
use crate::repo::error::{RepoError, RepoResult};
use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde_json::{Map, Value};

pub const METADATA_KEY: &str = "@metadata";
pub const METADATA_COLLECTION: &str = "@collection";
pub const METADATA_LAST_MODIFIED: &str = "@last-modified";
pub const METADATA_DIRTY: &str = "@dirty";

/// Separator between a collection prefix and the store-assigned number.
pub const PENDING_ID_SEPARATOR: char = '/';

/// A raw document row, metadata included.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub collection: String,
    pub body: Map<String, Value>,
}

impl StoredDocument {
    /// Removes storage metadata, returning the application-facing body.
    pub fn strip_metadata(mut self) -> (String, String, Map<String, Value>) {
        self.body.remove(METADATA_KEY);
        (self.id, self.collection, self.body)
    }

    /// Metadata object attached by the store, if present.
    pub fn metadata(&self) -> Option<&Map<String, Value>> {
        self.body.get(METADATA_KEY).and_then(Value::as_object)
    }
}

/// Collection of `entity`, refusing blank names.
pub(crate) fn entity_collection<E: Entity>(entity: &E) -> RepoResult<&str> {
    let collection = entity.collection_name();
    if collection.trim().is_empty() {
        return Err(RepoError::InvalidArgument(
            "entity has no collection name".to_string(),
        ));
    }
    Ok(collection)
}

/// Pending identifier for a collection: lowercase name plus separator.
pub fn pending_id_prefix(collection: &str) -> String {
    format!("{}{PENDING_ID_SEPARATOR}", collection.to_lowercase())
}

pub(crate) fn is_pending_id(id: &str) -> bool {
    id.ends_with(PENDING_ID_SEPARATOR)
}

/// Replaces a pending id (`persons/`) with the next store-assigned one.
pub(crate) fn resolve_pending_id(conn: &Connection, prefix: &str) -> RepoResult<String> {
    let next: i64 = conn.query_row(
        "INSERT INTO identities (prefix, last_value) VALUES (?1, 1)
         ON CONFLICT(prefix) DO UPDATE SET last_value = last_value + 1
         RETURNING last_value;",
        [prefix],
        |row| row.get(0),
    )?;
    Ok(format!("{prefix}{next}"))
}

/// Upserts one document body with its metadata.
///
/// # Errors
/// - `PreconditionViolation` when `id` already belongs to another collection.
pub(crate) fn write_document(
    conn: &Connection,
    collection: &str,
    id: &str,
    mut body: Map<String, Value>,
    mut metadata: Map<String, Value>,
) -> RepoResult<()> {
    metadata.insert(
        METADATA_COLLECTION.to_string(),
        Value::String(collection.to_string()),
    );
    metadata.insert(
        METADATA_LAST_MODIFIED.to_string(),
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    body.insert(METADATA_KEY.to_string(), Value::Object(metadata));
    let encoded = serde_json::to_string(&body)?;

    let changed = conn.execute(
        "INSERT INTO documents (id, collection, body, updated_at)
         VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
         ON CONFLICT(id) DO UPDATE SET
            body = excluded.body,
            updated_at = excluded.updated_at
         WHERE documents.collection = excluded.collection;",
        params![id, collection, encoded],
    )?;

    if changed == 0 {
        return Err(RepoError::PreconditionViolation(format!(
            "document id `{id}` already belongs to another collection than `{collection}`"
        )));
    }

    Ok(())
}

/// Deletes one document; deleting an absent document is a no-op.
pub(crate) fn delete_document(conn: &Connection, collection: &str, id: &str) -> RepoResult<usize> {
    let changed = conn.execute(
        "DELETE FROM documents WHERE id = ?1 AND collection = ?2;",
        params![id, collection],
    )?;
    Ok(changed)
}

pub(crate) fn decode_row(id: String, collection: String, raw: &str) -> RepoResult<StoredDocument> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(body) => Ok(StoredDocument {
            id,
            collection,
            body,
        }),
        _ => Err(RepoError::Serialization(format!(
            "stored body of `{id}` is not a JSON object"
        ))),
    }
}
