//! Book domain model.
//!
//! # Responsibility
//! - Define the canonical catalog record for one book.
//! - Enforce the declared field-length maximums before persistence.
//!
//! # Invariants
//! - `isbn` is unique across stored records; the storage layer owns
//!   the constraint, this model only carries the value.
//! - All four fields are required; there is no absent/null state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum title length in characters.
pub const MAX_TITLE_CHARS: usize = 100;
/// Maximum author length in characters.
pub const MAX_AUTHOR_CHARS: usize = 100;
/// Maximum ISBN length in characters.
pub const MAX_ISBN_CHARS: usize = 13;

/// Validation failure for a single book field.
///
/// Only the declared length maximums are checked. ISBN checksum/format
/// and date-range policies are intentionally not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookValidationError {
    TitleTooLong { chars: usize },
    AuthorTooLong { chars: usize },
    IsbnTooLong { chars: usize },
}

impl Display for BookValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TitleTooLong { chars } => write!(
                f,
                "title is {chars} characters long, maximum is {MAX_TITLE_CHARS}"
            ),
            Self::AuthorTooLong { chars } => write!(
                f,
                "author is {chars} characters long, maximum is {MAX_AUTHOR_CHARS}"
            ),
            Self::IsbnTooLong { chars } => write!(
                f,
                "isbn is {chars} characters long, maximum is {MAX_ISBN_CHARS}"
            ),
        }
    }
}

impl Error for BookValidationError {}

/// Canonical catalog record for one book.
///
/// The record is flat on purpose: four required fields, keyed by ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Display title, at most 100 characters.
    pub title: String,
    /// Author name, at most 100 characters.
    pub author: String,
    /// Catalog key, at most 13 characters. Unique in storage.
    pub isbn: String,
    /// Calendar date of publication, no time component.
    pub publication_date: NaiveDate,
}

impl Book {
    /// Creates a book from all four required fields.
    ///
    /// Construction does not validate; call [`Book::validate`] before
    /// handing the record to a write path.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        isbn: impl Into<String>,
        publication_date: NaiveDate,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            isbn: isbn.into(),
            publication_date,
        }
    }

    /// Checks the declared length maximums.
    ///
    /// Lengths are counted in characters, not bytes.
    pub fn validate(&self) -> Result<(), BookValidationError> {
        let title_chars = self.title.chars().count();
        if title_chars > MAX_TITLE_CHARS {
            return Err(BookValidationError::TitleTooLong { chars: title_chars });
        }

        let author_chars = self.author.chars().count();
        if author_chars > MAX_AUTHOR_CHARS {
            return Err(BookValidationError::AuthorTooLong {
                chars: author_chars,
            });
        }

        let isbn_chars = self.isbn.chars().count();
        if isbn_chars > MAX_ISBN_CHARS {
            return Err(BookValidationError::IsbnTooLong { chars: isbn_chars });
        }

        Ok(())
    }
}

/// A book displays as its title, verbatim.
impl Display for Book {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}
