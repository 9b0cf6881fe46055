//! Catalog use-case service.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for core callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence
//!   contracts.
//! - Service layer remains storage-agnostic.

use crate::model::book::Book;
use crate::repo::book_repo::{BookListQuery, BookRepository, RepoResult};
use chrono::NaiveDate;

/// Use-case service wrapper for book catalog operations.
pub struct CatalogService<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> CatalogService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Adds an existing book record to the catalog.
    pub fn add_book(&self, book: &Book) -> RepoResult<()> {
        self.repo.add_book(book)
    }

    /// Builds and catalogs a book in one step.
    ///
    /// # Contract
    /// - Fails with `DuplicateIsbn` when the ISBN is already cataloged.
    /// - Returns the cataloged record on success.
    pub fn register_book(
        &self,
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        publication_date: NaiveDate,
    ) -> RepoResult<Book> {
        let book = Book::new(title, author, isbn, publication_date);
        self.repo.add_book(&book)?;
        Ok(book)
    }

    /// Gets one book by ISBN.
    pub fn get_book(&self, isbn: &str) -> RepoResult<Option<Book>> {
        self.repo.get_book(isbn)
    }

    /// Lists books using filter and pagination options.
    pub fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>> {
        self.repo.list_books(query)
    }

    /// Lists every cataloged book by one author.
    pub fn list_by_author(&self, author: impl Into<String>) -> RepoResult<Vec<Book>> {
        let query = BookListQuery {
            author: Some(author.into()),
            ..BookListQuery::default()
        };
        self.repo.list_books(&query)
    }

    /// Updates an existing book, keyed by its ISBN.
    ///
    /// Returns repository-level not-found or validation errors
    /// unchanged.
    pub fn update_book(&self, book: &Book) -> RepoResult<()> {
        self.repo.update_book(book)
    }

    /// Removes a book from the catalog by ISBN.
    pub fn remove_book(&self, isbn: &str) -> RepoResult<()> {
        self.repo.remove_book(isbn)
    }
}
