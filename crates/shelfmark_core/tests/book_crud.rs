use chrono::NaiveDate;
use rusqlite::Connection;
use shelfmark_core::db::migrations::latest_version;
use shelfmark_core::db::open_db_in_memory;
use shelfmark_core::{
    Book, BookListQuery, BookRepository, CatalogService, RepoError, SqliteBookRepository,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn sample_book(isbn: &str, title: &str, author: &str) -> Book {
    Book::new(title, author, isbn, date(1990, 6, 15))
}

#[test]
fn add_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let book = Book::new(
        "Dune",
        "Frank Herbert",
        "9780441013593",
        date(1965, 8, 1),
    );
    repo.add_book(&book).unwrap();

    let loaded = repo.get_book("9780441013593").unwrap().unwrap();
    assert_eq!(loaded, book);
    assert_eq!(loaded.to_string(), "Dune");
}

#[test]
fn get_unknown_isbn_returns_none() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    assert!(repo.get_book("0000000000000").unwrap().is_none());
}

#[test]
fn duplicate_isbn_fails_on_second_insert() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let first = Book::new("First Title", "Author A", "1234567890123", date(2001, 1, 1));
    let second = Book::new("Other Title", "Author B", "1234567890123", date(2015, 9, 9));

    repo.add_book(&first).unwrap();
    let err = repo.add_book(&second).unwrap_err();
    assert!(matches!(err, RepoError::DuplicateIsbn(isbn) if isbn == "1234567890123"));

    // The first record survives the failed insert untouched.
    let loaded = repo.get_book("1234567890123").unwrap().unwrap();
    assert_eq!(loaded.title, "First Title");
}

#[test]
fn update_existing_book() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let mut book = sample_book("9780441013593", "Dune", "Frank Herbert");
    repo.add_book(&book).unwrap();

    book.title = "Dune Messiah".to_string();
    book.publication_date = date(1969, 7, 15);
    repo.update_book(&book).unwrap();

    let loaded = repo.get_book("9780441013593").unwrap().unwrap();
    assert_eq!(loaded.title, "Dune Messiah");
    assert_eq!(loaded.publication_date, date(1969, 7, 15));
}

#[test]
fn update_unknown_isbn_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let book = sample_book("9999999999999", "Missing", "Nobody");
    let err = repo.update_book(&book).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(isbn) if isbn == "9999999999999"));
}

#[test]
fn remove_book_deletes_row() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let book = sample_book("9780441013593", "Dune", "Frank Herbert");
    repo.add_book(&book).unwrap();

    repo.remove_book("9780441013593").unwrap();
    assert!(repo.get_book("9780441013593").unwrap().is_none());

    let err = repo.remove_book("9780441013593").unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[test]
fn removed_isbn_can_be_cataloged_again() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let book = sample_book("1234567890123", "First Run", "Author A");
    repo.add_book(&book).unwrap();
    repo.remove_book("1234567890123").unwrap();

    let reissue = sample_book("1234567890123", "Second Run", "Author B");
    repo.add_book(&reissue).unwrap();

    let loaded = repo.get_book("1234567890123").unwrap().unwrap();
    assert_eq!(loaded.title, "Second Run");
}

#[test]
fn validation_failure_blocks_add_and_update() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let invalid = Book::new("t".repeat(101), "author", "isbn", date(2000, 1, 1));
    let add_err = repo.add_book(&invalid).unwrap_err();
    assert!(matches!(add_err, RepoError::Validation(_)));

    let mut valid = sample_book("9780441013593", "Dune", "Frank Herbert");
    repo.add_book(&valid).unwrap();

    valid.author = "a".repeat(101);
    let update_err = repo.update_book(&valid).unwrap_err();
    assert!(matches!(update_err, RepoError::Validation(_)));
}

#[test]
fn list_orders_by_title_and_filters_by_author() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    repo.add_book(&sample_book("isbn-c", "Children of Dune", "Frank Herbert"))
        .unwrap();
    repo.add_book(&sample_book("isbn-a", "Dune", "Frank Herbert"))
        .unwrap();
    repo.add_book(&sample_book("isbn-b", "Neuromancer", "William Gibson"))
        .unwrap();

    let all = repo.list_books(&BookListQuery::default()).unwrap();
    let titles: Vec<&str> = all.iter().map(|book| book.title.as_str()).collect();
    assert_eq!(titles, ["Children of Dune", "Dune", "Neuromancer"]);

    let query = BookListQuery {
        author: Some("Frank Herbert".to_string()),
        ..BookListQuery::default()
    };
    let herbert = repo.list_books(&query).unwrap();
    assert_eq!(herbert.len(), 2);
    assert!(herbert.iter().all(|book| book.author == "Frank Herbert"));
}

#[test]
fn list_pagination_with_limit_and_offset_is_stable() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    repo.add_book(&sample_book("isbn-3", "Gamma", "Author"))
        .unwrap();
    repo.add_book(&sample_book("isbn-1", "Alpha", "Author"))
        .unwrap();
    repo.add_book(&sample_book("isbn-2", "Beta", "Author"))
        .unwrap();

    let query = BookListQuery {
        limit: Some(2),
        offset: 1,
        ..BookListQuery::default()
    };
    let page = repo.list_books(&query).unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page[0].title, "Beta");
    assert_eq!(page[1].title, "Gamma");
}

#[test]
fn list_pagination_with_offset_only_path_is_stable() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    repo.add_book(&sample_book("isbn-1", "Alpha", "Author"))
        .unwrap();
    repo.add_book(&sample_book("isbn-2", "Beta", "Author"))
        .unwrap();
    repo.add_book(&sample_book("isbn-3", "Gamma", "Author"))
        .unwrap();

    let query = BookListQuery {
        offset: 1,
        ..BookListQuery::default()
    };
    let page = repo.list_books(&query).unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page[0].title, "Beta");
    assert_eq!(page[1].title, "Gamma");
}

#[test]
fn service_wraps_repository_calls() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();
    let service = CatalogService::new(repo);

    let book = service
        .register_book("Dune", "Frank Herbert", "9780441013593", date(1965, 8, 1))
        .unwrap();
    assert_eq!(book.to_string(), "Dune");

    let fetched = service.get_book("9780441013593").unwrap().unwrap();
    assert_eq!(fetched, book);

    let by_author = service.list_by_author("Frank Herbert").unwrap();
    assert_eq!(by_author.len(), 1);

    let duplicate = service.register_book(
        "Dune, Again",
        "Someone Else",
        "9780441013593",
        date(2020, 1, 1),
    );
    assert!(matches!(duplicate, Err(RepoError::DuplicateIsbn(_))));

    service.remove_book("9780441013593").unwrap();
    assert!(service.get_book("9780441013593").unwrap().is_none());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let result = SqliteBookRepository::try_new(&conn);
    match result {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_books_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteBookRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredTable("books"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_books_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE books (
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            isbn TEXT NOT NULL UNIQUE
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteBookRepository::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "books",
            column: "publication_date"
        })
    ));
}

#[test]
fn read_rejects_unparseable_persisted_date() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO books (title, author, isbn, publication_date)
         VALUES ('Broken', 'Author', 'isbn-broken', 'not-a-date');",
        [],
    )
    .unwrap();

    let repo = SqliteBookRepository::try_new(&conn).unwrap();
    let err = repo.get_book("isbn-broken").unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(_)));
}
