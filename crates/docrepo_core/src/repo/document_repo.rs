//! Collection-bound repository and its query builder.
//!
//! # Responsibility
//! - Bind a collection and a session, then hand out a `QueryBuilder` that
//!   accumulates predicates and materializes results.
//! - Run the two-query pagination protocol (count, then data page).
//!
//! # Invariants
//! - Materialization is only reachable through `Repository::builder()`.
//! - Every returned entity has storage metadata removed and its id set.
//! - Count and data reads share no snapshot; under concurrent writes `total`
//!   and the page contents may disagree.

use crate::model::entity::{Document, Entity};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::pagination::{Page, PaginationParams};
use crate::repo::predicate::{QuerySpec, SpatialPredicate};
use crate::store::{DeferredQuery, Session, StoredDocument};
use log::{info, warn};
use serde_json::Value;
use std::marker::PhantomData;
use std::time::Instant;

/// Repository over one collection within one session.
pub struct Repository<'s, T: Entity = Document> {
    collection: String,
    session: &'s Session,
    _entity: PhantomData<fn() -> T>,
}

impl<'s, T: Entity> Repository<'s, T> {
    pub fn new(collection: impl Into<String>, session: &'s Session) -> Self {
        Self {
            collection: collection.into(),
            session,
            _entity: PhantomData,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Starts predicate configuration; the only way to reach materializers.
    pub fn builder(self) -> QueryBuilder<'s, T> {
        QueryBuilder {
            collection: self.collection,
            session: self.session,
            spec: QuerySpec::default(),
            _entity: PhantomData,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Materialize {
    All,
    One,
}

/// Accumulated predicates of one repository query.
pub struct QueryBuilder<'s, T: Entity = Document> {
    collection: String,
    session: &'s Session,
    spec: QuerySpec,
    _entity: PhantomData<fn() -> T>,
}

impl<'s, T: Entity> QueryBuilder<'s, T> {
    pub fn where_equals(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.spec = self.spec.with_equals(field, value.into());
        self
    }

    pub fn where_spatial(mut self, predicate: SpatialPredicate) -> Self {
        self.spec = self.spec.with_spatial(predicate);
        self
    }

    /// Fields searched (OR) when `paginate` receives a search term.
    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec = self.spec.with_search_fields(fields);
        self
    }

    /// Matches every equality predicate with edit-distance tolerance.
    pub fn with_fuzzy(mut self, similarity: f64) -> Self {
        self.spec = self.spec.with_fuzzy(similarity);
        self
    }

    /// [`QueryBuilder::with_fuzzy`] at the default similarity of 0.5.
    pub fn fuzzy(mut self) -> Self {
        self.spec = self.spec.with_default_fuzzy();
        self
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// Every match, in insertion order.
    pub fn get_all(&self) -> RepoResult<Vec<T>> {
        self.execute(Materialize::All)
    }

    /// First match in insertion order, if any.
    pub fn get_one(&self) -> RepoResult<Option<T>> {
        Ok(self.execute(Materialize::One)?.into_iter().next())
    }

    /// Direct id lookup in this collection; accumulated predicates are ignored.
    pub fn get_by_id(&self, id: &str) -> RepoResult<Option<T>> {
        self.session
            .load_by_id(&self.collection, id)?
            .map(into_entity)
            .transpose()
    }

    /// Count plus one page of matches, in two storage round trips.
    ///
    /// A non-blank `params.search` adds an OR full-text match over the
    /// configured search fields to both queries.
    ///
    /// # Errors
    /// - `InvalidArgument` for invalid predicate values (no I/O performed).
    /// - `QueryFailure` for any failure of either query.
    pub fn paginate(&self, params: &PaginationParams) -> RepoResult<Page<T>> {
        let started_at = Instant::now();
        self.spec.validate()?;

        let term = params.search.as_deref();
        let count_query = self
            .spec
            .apply_search(self.spec.apply(self.base_query()), term);
        let data_query = self
            .spec
            .apply_search(self.spec.apply(self.base_query()), term)
            .skip(params.skip)
            .take(params.take);

        let result = count_query.count().and_then(|total| {
            let data = data_query
                .all()?
                .into_iter()
                .map(into_entity)
                .collect::<RepoResult<Vec<T>>>()?;
            Ok(Page { total, data })
        });

        match result {
            Ok(page) => {
                info!(
                    "event=paginate module=repo status=ok collection={} page={} take={} total={} returned={} searched={} duration_ms={}",
                    self.collection,
                    params.page,
                    params.take,
                    page.total,
                    page.data.len(),
                    params.has_search(),
                    started_at.elapsed().as_millis()
                );
                Ok(page)
            }
            Err(err) => {
                warn!(
                    "event=paginate module=repo status=error collection={} page={} take={} duration_ms={} error={}",
                    self.collection,
                    params.page,
                    params.take,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(match err {
                    RepoError::QueryFailure(message) => RepoError::QueryFailure(message),
                    other => RepoError::QueryFailure(other.to_string()),
                })
            }
        }
    }

    fn base_query(&self) -> DeferredQuery<'s> {
        self.session.query(&self.collection).no_tracking()
    }

    fn execute(&self, mode: Materialize) -> RepoResult<Vec<T>> {
        self.spec.validate()?;
        let query = self.spec.apply(self.session.query(&self.collection));
        let documents = match mode {
            Materialize::All => query.all()?,
            Materialize::One => query.first_or_null()?.into_iter().collect(),
        };
        documents.into_iter().map(into_entity).collect()
    }
}

fn into_entity<T: Entity>(document: StoredDocument) -> RepoResult<T> {
    let (id, collection, body) = document.strip_metadata();
    T::from_body(&collection, id, body)
}
