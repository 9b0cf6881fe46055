//! Domain model for the book catalog.
//!
//! # Responsibility
//! - Define the canonical catalog record used by core business logic.
//!
//! # Invariants
//! - Every record is identified by its ISBN; no surrogate key exists.
//! - All record fields are required.

pub mod book;
