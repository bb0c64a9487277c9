//! Domain model for the document store.
//!
//! # Responsibility
//! - Define the entity contract shared by every persisted record.
//! - Provide identifier generation and the built-in domain entities.
//!
//! # Invariants
//! - Every entity belongs to exactly one collection for its lifetime.
//! - Identifiers are unique within a collection and never reassigned.

pub mod company;
pub mod entity;
pub mod identity;
pub mod person;
