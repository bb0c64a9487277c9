//! Deferred document queries.
//!
//! # Responsibility
//! - Accumulate SQL clauses for one collection without touching the store.
//! - Execute exactly one round trip per terminal call (`all`, `first_or_null`,
//!   `count`).
//!
//! # Invariants
//! - Results come back in storage-native (insertion) order.
//! - Execution failures surface as `RepoError::QueryFailure`.

use super::session::Session;
use super::{decode_row, StoredDocument};
use crate::db::functions::{DOC_EQUALS, DOC_SEARCH, DOC_WITHIN_RADIUS};
use crate::repo::error::{RepoError, RepoResult};
use log::{debug, warn};
use rusqlite::params_from_iter;
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use std::time::Instant;

/// Within-radius constraint over one latitude/longitude field pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialClause {
    pub latitude_field: String,
    pub longitude_field: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Kilometers.
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct EqualsClause {
    field: String,
    value: Value,
}

/// A query over one collection, executed only by a terminal call.
pub struct DeferredQuery<'s> {
    session: &'s Session,
    collection: String,
    equals: Vec<EqualsClause>,
    spatials: Vec<SpatialClause>,
    /// Each group is OR-ed internally; groups are AND-ed together.
    search_groups: Vec<Vec<(String, String)>>,
    fuzzy: Option<f64>,
    skip: u64,
    take: Option<u64>,
    tracking: bool,
}

#[derive(Debug, Clone, Copy)]
enum Terminal {
    All,
    First,
}

impl<'s> DeferredQuery<'s> {
    pub(crate) fn new(session: &'s Session, collection: &str) -> Self {
        Self {
            session,
            collection: collection.to_string(),
            equals: Vec::new(),
            spatials: Vec::new(),
            search_groups: Vec::new(),
            fuzzy: None,
            skip: 0,
            take: None,
            tracking: true,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn where_equals(mut self, field: &str, value: Value) -> Self {
        self.equals.push(EqualsClause {
            field: field.to_string(),
            value,
        });
        self
    }

    /// Applies edit-distance tolerance to every equality clause.
    pub fn fuzzy(mut self, similarity: f64) -> Self {
        self.fuzzy = Some(similarity);
        self
    }

    pub fn spatial(mut self, clause: SpatialClause) -> Self {
        self.spatials.push(clause);
        self
    }

    /// Full-text match of `term` on one field.
    pub fn search(self, field: &str, term: &str) -> Self {
        self.search_any(&[field.to_string()], term)
    }

    /// Full-text match of `term` on any of `fields`; no-op for empty `fields`.
    pub fn search_any(mut self, fields: &[String], term: &str) -> Self {
        if !fields.is_empty() {
            self.search_groups.push(
                fields
                    .iter()
                    .map(|field| (field.clone(), term.to_string()))
                    .collect(),
            );
        }
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn take(mut self, take: u64) -> Self {
        self.take = Some(take);
        self
    }

    /// Results are not registered as tracked in the owning session.
    pub fn no_tracking(mut self) -> Self {
        self.tracking = false;
        self
    }

    /// Executes and returns every matching document.
    pub fn all(self) -> RepoResult<Vec<StoredDocument>> {
        self.fetch(Terminal::All)
    }

    /// Executes and returns the first matching document, if any.
    pub fn first_or_null(self) -> RepoResult<Option<StoredDocument>> {
        Ok(self.fetch(Terminal::First)?.into_iter().next())
    }

    /// Executes a count of matching documents; `skip`/`take` are ignored.
    pub fn count(self) -> RepoResult<u64> {
        let started_at = Instant::now();
        let (filter, bind_values) = self.build_filter();
        let sql = format!("SELECT COUNT(*) FROM documents WHERE {filter};");

        self.session.record_request();
        let count = self
            .session
            .connection()
            .query_row(&sql, params_from_iter(bind_values), |row| row.get::<_, i64>(0))
            .map_err(|err| self.failure("count", started_at, err))?;

        self.log_ok("count", started_at);
        Ok(count.max(0) as u64)
    }

    fn fetch(self, terminal: Terminal) -> RepoResult<Vec<StoredDocument>> {
        let started_at = Instant::now();
        let kind = match terminal {
            Terminal::All => "all",
            Terminal::First => "first",
        };
        let (filter, mut bind_values) = self.build_filter();
        let mut sql = format!(
            "SELECT id, collection, body FROM documents WHERE {filter} ORDER BY seq ASC"
        );

        let take = match terminal {
            Terminal::All => self.take,
            Terminal::First => Some(self.take.map_or(1, |take| take.min(1))),
        };
        if let Some(take) = take {
            sql.push_str(" LIMIT ?");
            bind_values.push(SqlValue::Integer(to_sql_int(take)));
            if self.skip > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(SqlValue::Integer(to_sql_int(self.skip)));
            }
        } else if self.skip > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(SqlValue::Integer(to_sql_int(self.skip)));
        }

        self.session.record_request();
        let rows = self
            .run_rows(&sql, bind_values)
            .map_err(|err| self.failure(kind, started_at, err))?;

        let mut documents = Vec::with_capacity(rows.len());
        for (id, collection, raw) in rows {
            documents.push(decode_row(id, collection, &raw)?);
        }
        if self.tracking {
            self.session
                .track(documents.iter().map(|document| document.id.as_str()));
        }

        self.log_ok(kind, started_at);
        Ok(documents)
    }

    fn run_rows(
        &self,
        sql: &str,
        bind_values: Vec<SqlValue>,
    ) -> rusqlite::Result<Vec<(String, String, String)>> {
        let mut stmt = self.session.connection().prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push((row.get(0)?, row.get(1)?, row.get(2)?));
        }
        Ok(out)
    }

    fn build_filter(&self) -> (String, Vec<SqlValue>) {
        let mut filter = String::from("collection = ?");
        let mut bind_values = vec![SqlValue::Text(self.collection.clone())];

        for clause in &self.equals {
            filter.push_str(&format!(" AND {DOC_EQUALS}(body, ?, ?, ?)"));
            bind_values.push(SqlValue::Text(clause.field.clone()));
            bind_values.push(SqlValue::Text(clause.value.to_string()));
            bind_values.push(self.fuzzy.map_or(SqlValue::Null, SqlValue::Real));
        }

        for clause in &self.spatials {
            filter.push_str(&format!(" AND {DOC_WITHIN_RADIUS}(body, ?, ?, ?, ?, ?)"));
            bind_values.push(SqlValue::Text(clause.latitude_field.clone()));
            bind_values.push(SqlValue::Text(clause.longitude_field.clone()));
            bind_values.push(SqlValue::Real(clause.latitude));
            bind_values.push(SqlValue::Real(clause.longitude));
            bind_values.push(SqlValue::Real(clause.radius));
        }

        for group in &self.search_groups {
            let alternatives = group
                .iter()
                .map(|_| format!("{DOC_SEARCH}(body, ?, ?)"))
                .collect::<Vec<_>>()
                .join(" OR ");
            filter.push_str(&format!(" AND ({alternatives})"));
            for (field, term) in group {
                bind_values.push(SqlValue::Text(field.clone()));
                bind_values.push(SqlValue::Text(term.clone()));
            }
        }

        (filter, bind_values)
    }

    fn failure(&self, kind: &str, started_at: Instant, err: rusqlite::Error) -> RepoError {
        warn!(
            "event=query_execute module=store status=error kind={} collection={} session_id={} duration_ms={} error={}",
            kind,
            self.collection,
            self.session.id(),
            started_at.elapsed().as_millis(),
            err
        );
        RepoError::QueryFailure(err.to_string())
    }

    fn log_ok(&self, kind: &str, started_at: Instant) {
        debug!(
            "event=query_execute module=store status=ok kind={} collection={} session_id={} duration_ms={}",
            kind,
            self.collection,
            self.session.id(),
            started_at.elapsed().as_millis()
        );
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
