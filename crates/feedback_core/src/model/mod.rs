//! Domain model for feedback items and their categories.
//!
//! # Invariants
//! - A category is identified by its caller-chosen `id`, which is also its
//!   document key and never changes.
//! - Feedback references categories by id only; dangling ids are valid data.

pub mod category;
pub mod feedback;
