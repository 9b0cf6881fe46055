//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Book::validate()` before
//!   persistence.
//! - Repository APIs return semantic errors (`DuplicateIsbn`,
//!   `NotFound`) in addition to DB transport errors.

pub mod book_repo;
