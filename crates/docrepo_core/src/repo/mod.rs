//! Generic document repository over one collection.
//!
//! # Responsibility
//! - Accumulate query predicates in an immutable `QuerySpec`.
//! - Materialize single, full and paginated results with storage metadata
//!   removed.
//!
//! # Invariants
//! - Predicates are configured before the first materialization; a
//!   repository cannot be queried before `builder()` is called.
//! - `paginate` issues exactly two storage round trips (count, then data).

pub mod document_repo;
pub mod error;
pub mod pagination;
pub mod predicate;
