use rusqlite::{params, Connection, Error as SqlError, ErrorCode, Row};

use crate::error::{CatalogError, Result};
use crate::models::{BookId, BookRecord, NewBook, SortDirection, SortKey};

/// Column list shared by every query so `book_from_row` can rely on the order.
const BOOK_COLUMNS: &str = "book_id, title, author, pub_date";

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<BookRecord> {
    Ok(BookRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        pub_year: row.get(3)?,
    })
}

/// Run a prepared query without parameters and collect every book it yields.
fn collect_books(conn: &Connection, sql: &str) -> Result<Vec<BookRecord>> {
    let mut stmt = conn.prepare(sql)?;
    let books = stmt
        .query_map([], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(books)
}

/// Every book in store-native order. Ids only ever grow, so ordering by the
/// primary key is the same as insertion order.
pub fn fetch_books(conn: &Connection) -> Result<Vec<BookRecord>> {
    collect_books(
        conn,
        &format!("SELECT {BOOK_COLUMNS} FROM books ORDER BY book_id"),
    )
}

/// Highest id currently in the table, or 0 when the table is empty.
fn max_book_id(conn: &Connection) -> Result<i64> {
    let max = conn.query_row("SELECT COALESCE(MAX(book_id), 0) FROM books", [], |row| {
        row.get(0)
    })?;
    Ok(max)
}

/// Insert a validated book under the id after the current maximum. Fails with
/// a validation error once the maximum is `i64::MAX`, which only an import
/// can produce.
pub fn insert_book(conn: &Connection, book: &NewBook) -> Result<BookRecord> {
    let id = max_book_id(conn)?.checked_add(1).ok_or_else(|| {
        CatalogError::Validation(
            "No book ID left after the highest existing ID; remove that book first.".to_string(),
        )
    })?;

    conn.execute(
        "INSERT INTO books (book_id, title, author, pub_date) VALUES (?1, ?2, ?3, ?4)",
        params![id, book.title, book.author, book.pub_year],
    )?;

    Ok(BookRecord {
        id,
        title: book.title.clone(),
        author: book.author.clone(),
        pub_year: book.pub_year,
    })
}

/// Insert a book under an id chosen by the caller (used by CSV import).
pub fn insert_book_with_id(conn: &Connection, id: BookId, book: &NewBook) -> Result<BookRecord> {
    conn.execute(
        "INSERT INTO books (book_id, title, author, pub_date) VALUES (?1, ?2, ?3, ?4)",
        params![id.0, book.title, book.author, book.pub_year],
    )
    .map_err(|err| map_unique_constraint(err, id))?;

    Ok(BookRecord {
        id: id.0,
        title: book.title.clone(),
        author: book.author.clone(),
        pub_year: book.pub_year,
    })
}

/// Permanently delete a book, reporting `NotFound` when no row matched.
pub fn delete_book(conn: &Connection, id: BookId) -> Result<()> {
    let deleted = conn.execute("DELETE FROM books WHERE book_id = ?1", params![id.0])?;

    if deleted == 0 {
        Err(CatalogError::NotFound(id.0))
    } else {
        Ok(())
    }
}

/// Case-sensitive substring search over title, author, id and year. `instr`
/// is used instead of `LIKE`, which ignores ASCII case and treats `%` and `_`
/// as wildcards.
pub fn search_books(conn: &Connection, query: &str) -> Result<Vec<BookRecord>> {
    if query.is_empty() {
        return fetch_books(conn);
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOK_COLUMNS} FROM books
         WHERE instr(title, ?1) > 0
            OR instr(author, ?1) > 0
            OR instr(CAST(book_id AS TEXT), ?1) > 0
            OR instr(CAST(pub_date AS TEXT), ?1) > 0
         ORDER BY book_id"
    ))?;

    let books = stmt
        .query_map([query], book_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(books)
}

/// Fetch every book in the requested order.
///
/// Author and numeric orderings are delegated to SQLite; the title ordering
/// needs the article-stripping key and runs as a stable sort over the
/// store-native listing, so equal keys keep their insertion order in both
/// directions.
pub fn fetch_books_ordered(
    conn: &Connection,
    key: SortKey,
    direction: SortDirection,
) -> Result<Vec<BookRecord>> {
    let column = match key {
        SortKey::Title => {
            let mut books = fetch_books(conn)?;
            match direction {
                SortDirection::Ascending => {
                    books.sort_by(|a, b| a.title_sort_key().cmp(b.title_sort_key()))
                }
                SortDirection::Descending => {
                    books.sort_by(|a, b| b.title_sort_key().cmp(a.title_sort_key()))
                }
            }
            return Ok(books);
        }
        SortKey::Author => "author",
        SortKey::Field(field) => field.column(),
    };

    collect_books(
        conn,
        &format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY {column} {}, book_id",
            direction.sql()
        ),
    )
}

/// Coerce primary key violations into a validation message naming the id.
fn map_unique_constraint(err: SqlError, id: BookId) -> CatalogError {
    if matches!(
        err.sqlite_error_code(),
        Some(ErrorCode::ConstraintViolation)
    ) {
        CatalogError::Validation(format!("Book ID {id} already exists."))
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::NumericField;

    fn book(title: &str, author: &str, year: i64) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            pub_year: year,
        }
    }

    fn titles(books: &[BookRecord]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn ids_follow_the_current_maximum() {
        let conn = open_in_memory().unwrap();
        assert_eq!(max_book_id(&conn).unwrap(), 0);

        let first = insert_book(&conn, &book("Dune", "Frank Herbert", 1965)).unwrap();
        assert_eq!(first.id, 1);

        insert_book_with_id(&conn, BookId(40), &book("Emma", "Jane Austen", 1815)).unwrap();
        let next = insert_book(&conn, &book("Ubik", "Philip K. Dick", 1969)).unwrap();
        assert_eq!(next.id, 41);
    }

    #[test]
    fn exhausted_ids_are_a_validation_error() {
        let conn = open_in_memory().unwrap();
        insert_book_with_id(&conn, BookId(i64::MAX), &book("Dune", "Frank Herbert", 1965))
            .unwrap();

        let err = insert_book(&conn, &book("Emma", "Jane Austen", 1815)).unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert_eq!(fetch_books(&conn).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_explicit_id_is_a_validation_error() {
        let conn = open_in_memory().unwrap();
        insert_book(&conn, &book("Dune", "Frank Herbert", 1965)).unwrap();

        let err = insert_book_with_id(&conn, BookId(1), &book("Emma", "Jane Austen", 1815))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn delete_reports_missing_rows() {
        let conn = open_in_memory().unwrap();
        insert_book(&conn, &book("Dune", "Frank Herbert", 1965)).unwrap();

        let err = delete_book(&conn, BookId(9)).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(9)));
        assert_eq!(fetch_books(&conn).unwrap().len(), 1);

        delete_book(&conn, BookId(1)).unwrap();
        assert!(fetch_books(&conn).unwrap().is_empty());
    }

    #[test]
    fn search_does_not_treat_like_wildcards_specially() {
        let conn = open_in_memory().unwrap();
        insert_book(&conn, &book("100% Pure", "Anon", 2010)).unwrap();
        insert_book(&conn, &book("Pure", "Anon", 2011)).unwrap();

        let found = search_books(&conn, "0%").unwrap();
        assert_eq!(titles(&found), vec!["100% Pure"]);
        let found = search_books(&conn, "_").unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn numeric_ordering_is_not_lexicographic() {
        let conn = open_in_memory().unwrap();
        insert_book_with_id(&conn, BookId(9), &book("Nine", "N", 1999)).unwrap();
        insert_book_with_id(&conn, BookId(10), &book("Ten", "T", 2010)).unwrap();
        insert_book_with_id(&conn, BookId(2), &book("Two", "W", 1200)).unwrap();

        let by_id = fetch_books_ordered(
            &conn,
            SortKey::Field(NumericField::Id),
            SortDirection::Ascending,
        )
        .unwrap();
        assert_eq!(titles(&by_id), vec!["Two", "Nine", "Ten"]);

        let by_year = fetch_books_ordered(
            &conn,
            SortKey::Field(NumericField::PubYear),
            SortDirection::Descending,
        )
        .unwrap();
        assert_eq!(titles(&by_year), vec!["Ten", "Nine", "Two"]);
    }

    #[test]
    fn title_ordering_is_stable_for_equal_keys() {
        let conn = open_in_memory().unwrap();
        insert_book(&conn, &book("The Road", "Cormac McCarthy", 2006)).unwrap();
        insert_book(&conn, &book("Road", "Someone Else", 2001)).unwrap();
        insert_book(&conn, &book("Atlas", "Anon", 2001)).unwrap();

        let asc = fetch_books_ordered(&conn, SortKey::Title, SortDirection::Ascending).unwrap();
        assert_eq!(titles(&asc), vec!["Atlas", "The Road", "Road"]);

        let desc = fetch_books_ordered(&conn, SortKey::Title, SortDirection::Descending).unwrap();
        assert_eq!(titles(&desc), vec!["The Road", "Road", "Atlas"]);
    }
}
