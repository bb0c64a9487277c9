//! Document matching primitives behind the repository predicates.
//!
//! # Responsibility
//! - Resolve (dotted) field paths inside stored JSON bodies.
//! - Implement equality, fuzzy, full-text and within-radius matching.
//!
//! # Invariants
//! - Matching is pure: no I/O, no shared state.
//! - Missing or mistyped fields never match; they are not errors.

pub mod equality;
pub mod field;
pub mod fuzzy;
pub mod geo;
pub mod text;
