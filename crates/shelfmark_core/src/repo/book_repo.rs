//! Book repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over canonical `books` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths must call `Book::validate()` before SQL mutations.
//! - ISBN uniqueness is enforced by the storage schema; violations
//!   surface as `RepoError::DuplicateIsbn`, never as raw SQL errors.
//! - Read paths must reject invalid persisted state instead of
//!   masking it.

use crate::db::{migrations, DbError};
use crate::model::book::{Book, BookValidationError};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, Row};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const BOOK_SELECT_SQL: &str = "SELECT
    title,
    author,
    isbn,
    publication_date
FROM books";

const BOOKS_TABLE: &str = "books";
const REQUIRED_BOOK_COLUMNS: &[&str] = &["title", "author", "isbn", "publication_date"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for book persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(BookValidationError),
    Db(DbError),
    /// An insert would produce a second record with this ISBN.
    DuplicateIsbn(String),
    /// No stored record carries this ISBN.
    NotFound(String),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateIsbn(isbn) => {
                write!(f, "a book with isbn {isbn} is already cataloged")
            }
            Self::NotFound(isbn) => write!(f, "book not found: {isbn}"),
            Self::InvalidData(message) => write!(f, "invalid persisted book data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it through db::open_db"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` is missing")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BookValidationError> for RepoError {
    fn from(value: BookValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing books.
#[derive(Debug, Clone, Default)]
pub struct BookListQuery {
    /// Exact-match author filter.
    pub author: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for book CRUD operations.
///
/// Records are keyed by ISBN, the only unique field.
pub trait BookRepository {
    fn add_book(&self, book: &Book) -> RepoResult<()>;
    fn get_book(&self, isbn: &str) -> RepoResult<Option<Book>>;
    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>>;
    fn update_book(&self, book: &Book) -> RepoResult<()>;
    fn remove_book(&self, isbn: &str) -> RepoResult<()>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    /// Wraps a connection after verifying it carries the expected
    /// catalog schema.
    ///
    /// # Errors
    /// - `UninitializedConnection` when `PRAGMA user_version` does not
    ///   match the latest migration.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the
    ///   `books` shape is incomplete.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = migrations::latest_version();
        let actual_version: u32 =
            conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        ensure_table(conn, BOOKS_TABLE)?;
        ensure_book_columns(conn)?;

        Ok(Self { conn })
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn add_book(&self, book: &Book) -> RepoResult<()> {
        book.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO books (
                title,
                author,
                isbn,
                publication_date
            ) VALUES (?1, ?2, ?3, ?4);",
            params![
                book.title.as_str(),
                book.author.as_str(),
                book.isbn.as_str(),
                date_to_db(book.publication_date),
            ],
        );

        match inserted {
            Ok(_) => Ok(()),
            Err(err) if is_isbn_conflict(&err) => Err(RepoError::DuplicateIsbn(book.isbn.clone())),
            Err(err) => Err(err.into()),
        }
    }

    fn get_book(&self, isbn: &str) -> RepoResult<Option<Book>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOK_SELECT_SQL} WHERE isbn = ?1;"))?;

        let mut rows = stmt.query([isbn])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_book_row(row)?));
        }

        Ok(None)
    }

    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>> {
        let mut sql = format!("{BOOK_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(author) = &query.author {
            sql.push_str(" AND author = ?");
            bind_values.push(Value::Text(author.clone()));
        }

        sql.push_str(" ORDER BY title ASC, isbn ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut books = Vec::new();

        while let Some(row) = rows.next()? {
            books.push(parse_book_row(row)?);
        }

        Ok(books)
    }

    fn update_book(&self, book: &Book) -> RepoResult<()> {
        book.validate()?;

        let changed = self.conn.execute(
            "UPDATE books
             SET
                title = ?1,
                author = ?2,
                publication_date = ?3
             WHERE isbn = ?4;",
            params![
                book.title.as_str(),
                book.author.as_str(),
                date_to_db(book.publication_date),
                book.isbn.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(book.isbn.clone()));
        }

        Ok(())
    }

    fn remove_book(&self, isbn: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM books WHERE isbn = ?1;", [isbn])?;

        if changed == 0 {
            return Err(RepoError::NotFound(isbn.to_string()));
        }

        Ok(())
    }
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let date_text: String = row.get("publication_date")?;
    let publication_date = parse_db_date(&date_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid date value `{date_text}` in books.publication_date"
        ))
    })?;

    let book = Book {
        title: row.get("title")?,
        author: row.get("author")?,
        isbn: row.get("isbn")?,
        publication_date,
    };
    book.validate()?;
    Ok(book)
}

fn date_to_db(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_db_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn is_isbn_conflict(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, message) => {
            failure.code == ErrorCode::ConstraintViolation
                && message
                    .as_deref()
                    .is_some_and(|text| text.contains("books.isbn"))
        }
        _ => false,
    }
}

fn ensure_table(conn: &Connection, table: &'static str) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;

    if exists == 0 {
        return Err(RepoError::MissingRequiredTable(table));
    }

    Ok(())
}

fn ensure_book_columns(conn: &Connection) -> RepoResult<()> {
    let mut stmt = conn.prepare("PRAGMA table_info(books);")?;
    let mut rows = stmt.query([])?;

    let mut present = HashSet::new();
    while let Some(row) = rows.next()? {
        present.insert(row.get::<_, String>("name")?);
    }

    for &column in REQUIRED_BOOK_COLUMNS {
        if !present.contains(column) {
            return Err(RepoError::MissingRequiredColumn {
                table: BOOKS_TABLE,
                column,
            });
        }
    }

    Ok(())
}
