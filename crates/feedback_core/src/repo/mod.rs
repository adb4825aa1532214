//! Document repository abstraction and persistence implementation.
//!
//! # Responsibility
//! - Define the collection-scoped document contract the store talks to.
//! - Isolate SQLite details from the store façade.
//!
//! # Invariants
//! - Batch commits apply every write or none.
//! - Deleting an absent document is a successful no-op.

pub mod document;
pub mod document_repo;
