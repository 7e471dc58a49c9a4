//! The catalog store: the one owner of the SQLite connection and the entry
//! point every front-end goes through.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::command::{Request, Response};
use crate::db::{
    delete_book, export_csv, fetch_books, fetch_books_ordered, import_csv, insert_book,
    open_database, open_in_memory, search_books, ExportOutcome,
};
use crate::error::{CatalogError, Result};
use crate::models::{BookId, BookRecord, NewBook, NumericField, SortDirection, SortKey};

/// Owns the connection to the catalog database. Dropping the store closes the
/// connection; [`CatalogStore::close`] does the same but reports errors.
pub struct CatalogStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl CatalogStore {
    /// Open the catalog file at `path`, creating the file and the `books`
    /// table if needed. Calling it again on the same file is harmless.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = open_database(path)?;
        info!(path = %path.display(), "catalog opened");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// A throwaway catalog that lives only as long as the store.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: open_in_memory()?,
            path: None,
        })
    }

    /// Location of the backing file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Store a validated book under the next free id and return the full
    /// record.
    pub fn add(&self, book: NewBook) -> Result<BookRecord> {
        let record = insert_book(&self.conn, &book)?;
        info!(id = record.id, title = %record.title, "book added");
        Ok(record)
    }

    /// Permanently delete the book with `id`; `NotFound` if there is none.
    pub fn remove(&self, id: BookId) -> Result<()> {
        match delete_book(&self.conn, id) {
            Ok(()) => {
                info!(%id, "book removed");
                Ok(())
            }
            Err(err) => {
                if let CatalogError::NotFound(_) = err {
                    warn!(%id, "remove requested for unknown book");
                }
                Err(err)
            }
        }
    }

    /// Every book in store-native (ascending id) order.
    pub fn list_all(&self) -> Result<Vec<BookRecord>> {
        fetch_books(&self.conn)
    }

    /// Books whose title, author, id or year contains `query`, case-sensitive.
    pub fn search(&self, query: &str) -> Result<Vec<BookRecord>> {
        let books = search_books(&self.conn, query)?;
        debug!(query, matches = books.len(), "catalog searched");
        Ok(books)
    }

    /// Books ordered by title, ignoring a leading "the", "a" or "an".
    pub fn sort_by_title(&self, direction: SortDirection) -> Result<Vec<BookRecord>> {
        self.sorted(SortKey::Title, direction)
    }

    /// Books ordered by author.
    pub fn sort_by_author(&self, direction: SortDirection) -> Result<Vec<BookRecord>> {
        self.sorted(SortKey::Author, direction)
    }

    /// Books ordered numerically by id or publication year.
    pub fn sort_by_field(
        &self,
        field: NumericField,
        direction: SortDirection,
    ) -> Result<Vec<BookRecord>> {
        self.sorted(SortKey::Field(field), direction)
    }

    /// Books in the order named by `key`.
    pub fn sorted(&self, key: SortKey, direction: SortDirection) -> Result<Vec<BookRecord>> {
        debug!(?key, ?direction, "sorting catalog");
        fetch_books_ordered(&self.conn, key, direction)
    }

    /// Write the catalog to `path` as CSV. An empty catalog writes nothing
    /// and yields [`ExportOutcome::NothingToExport`].
    pub fn export_csv(&self, path: impl AsRef<Path>) -> Result<ExportOutcome> {
        let path = path.as_ref();
        let outcome = export_csv(&self.conn, path)?;
        match &outcome {
            ExportOutcome::Exported { rows, .. } => {
                info!(path = %path.display(), rows, "catalog exported")
            }
            ExportOutcome::NothingToExport => warn!("export skipped, catalog is empty"),
        }
        Ok(outcome)
    }

    /// Load books from a CSV export, keeping their ids. Nothing is imported
    /// unless every row is valid.
    pub fn import_csv(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let imported = import_csv(&mut self.conn, path)?;
        info!(path = %path.display(), imported, "catalog imported");
        Ok(imported)
    }

    /// Dispatch a request coming from a front-end.
    pub fn execute(&mut self, request: Request) -> Result<Response> {
        let response = match request {
            Request::Add {
                title,
                author,
                pub_year,
            } => {
                let book = NewBook::parse(&title, &author, &pub_year).inspect_err(|err| {
                    warn!(%err, "rejected new book");
                })?;
                Response::Added(self.add(book)?)
            }
            Request::Remove { id } => {
                let id = BookId::parse(&id)?;
                self.remove(id)?;
                Response::Removed(id)
            }
            Request::ListAll => Response::Books(self.list_all()?),
            Request::Search { query } => Response::Books(self.search(&query)?),
            Request::Sort { key, direction } => Response::Books(self.sorted(key, direction)?),
            Request::Export { path } => Response::Exported(self.export_csv(path)?),
            Request::Import { path } => Response::Imported(self.import_csv(path)?),
        };
        Ok(response)
    }

    /// Release the connection, surfacing any error SQLite reports on close.
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| CatalogError::from(err))?;
        debug!("catalog closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn create_tmp_store() -> (CatalogStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = CatalogStore::open(temp_dir.path().join("library.db")).unwrap();
        (store, temp_dir)
    }

    fn add(store: &mut CatalogStore, title: &str, author: &str, year: &str) -> Result<Response> {
        store.execute(Request::Add {
            title: title.to_string(),
            author: author.to_string(),
            pub_year: year.to_string(),
        })
    }

    fn seed(store: &mut CatalogStore, books: &[(&str, &str, &str)]) {
        for (title, author, year) in books {
            add(store, title, author, year).unwrap();
        }
    }

    fn titles(books: &[BookRecord]) -> Vec<&str> {
        books.iter().map(|b| b.title.as_str()).collect()
    }

    #[test]
    fn open_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("library.db");

        let mut store = CatalogStore::open(&path).unwrap();
        seed(&mut store, &[("Dune", "Frank Herbert", "1965")]);
        store.close().unwrap();

        let store = CatalogStore::open(&path).unwrap();
        assert_eq!(store.list_all().unwrap().len(), 1);
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[test]
    fn add_assigns_previous_max_plus_one() {
        let (mut store, _temp_dir) = create_tmp_store();
        seed(
            &mut store,
            &[("Dune", "Frank Herbert", "1965"), ("Emma", "Jane Austen", "1815")],
        );
        let previous_max = store.list_all().unwrap().iter().map(|b| b.id).max().unwrap();

        let response = add(&mut store, "Ubik", "Philip K. Dick", "1969").unwrap();
        let Response::Added(record) = response else {
            panic!("expected an added record");
        };
        assert_eq!(record.id, previous_max + 1);

        let books = store.list_all().unwrap();
        assert_eq!(books.len(), 3);
        assert_eq!(books.iter().filter(|b| b.id == record.id).count(), 1);
        assert_eq!(books.last().unwrap(), &record);
    }

    #[test]
    fn invalid_book_never_reaches_the_store() {
        let (store, _temp_dir) = create_tmp_store();

        let err = NewBook::parse("", "   ", "5").unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn add_after_importing_the_largest_id_is_a_validation_error() {
        let (mut store, temp_dir) = create_tmp_store();
        let csv_path = temp_dir.path().join("seed.csv");
        fs::write(
            &csv_path,
            concat!(
                "Book ID,Title,Author,Publication Date\n",
                "9223372036854775807,Dune,Frank Herbert,1965\n",
            ),
        )
        .unwrap();
        store.import_csv(&csv_path).unwrap();

        let err = add(&mut store, "Emma", "Jane Austen", "1815").unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert_eq!(titles(&store.list_all().unwrap()), vec!["Dune"]);

        store.remove(BookId(i64::MAX)).unwrap();
        let Response::Added(record) = add(&mut store, "Emma", "Jane Austen", "1815").unwrap()
        else {
            panic!("expected an added record");
        };
        assert_eq!(record.id, 1);
    }

    #[test]
    fn removing_the_highest_id_frees_it_for_the_next_add() {
        let (mut store, _temp_dir) = create_tmp_store();
        seed(
            &mut store,
            &[
                ("Dune", "Frank Herbert", "1965"),
                ("Emma", "Jane Austen", "1815"),
                ("Ubik", "Philip K. Dick", "1969"),
            ],
        );

        store.remove(BookId(2)).unwrap();
        store.remove(BookId(3)).unwrap();
        let Response::Added(record) = add(&mut store, "Solaris", "Stanislaw Lem", "1961").unwrap()
        else {
            panic!("expected an added record");
        };
        assert_eq!(record.id, 2);
    }

    #[test]
    fn first_book_gets_id_one() {
        let (store, _temp_dir) = create_tmp_store();
        let record = store
            .add(NewBook::parse("Dune", "Frank Herbert", "1965").unwrap())
            .unwrap();
        assert_eq!(record.id, 1);
    }

    #[test]
    fn add_validates_publication_year() {
        let (mut store, _temp_dir) = create_tmp_store();
        for year in ["89", "19890", "abcd"] {
            let err = add(&mut store, "Dune", "Frank Herbert", year).unwrap_err();
            assert!(matches!(err, CatalogError::Validation(_)), "year {year}");
        }
        assert!(store.list_all().unwrap().is_empty());

        add(&mut store, "Dune", "Frank Herbert", "1989").unwrap();
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn add_requires_every_field() {
        let (mut store, _temp_dir) = create_tmp_store();
        let err = add(&mut store, "", "Frank Herbert", "1965").unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        let err = add(&mut store, "Dune", "   ", "1965").unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn remove_missing_id_leaves_store_unchanged() {
        let (mut store, _temp_dir) = create_tmp_store();
        seed(
            &mut store,
            &[("Dune", "Frank Herbert", "1965"), ("Emma", "Jane Austen", "1815")],
        );
        let before = store.list_all().unwrap();

        let err = store
            .execute(Request::Remove { id: "42".into() })
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(42)));
        assert_eq!(store.list_all().unwrap(), before);
    }

    #[test]
    fn remove_without_id_is_a_validation_error() {
        let (mut store, _temp_dir) = create_tmp_store();
        let err = store
            .execute(Request::Remove { id: " ".into() })
            .unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
    }

    #[test]
    fn remove_deletes_exactly_one_record() {
        let (mut store, _temp_dir) = create_tmp_store();
        seed(
            &mut store,
            &[
                ("Dune", "Frank Herbert", "1965"),
                ("Emma", "Jane Austen", "1815"),
                ("Ubik", "Philip K. Dick", "1969"),
            ],
        );

        let response = store.execute(Request::Remove { id: "2".into() }).unwrap();
        assert_eq!(response, Response::Removed(BookId(2)));
        assert_eq!(titles(&store.list_all().unwrap()), vec!["Dune", "Ubik"]);
    }

    #[test]
    fn sort_by_title_ignores_leading_articles() {
        let (mut store, _temp_dir) = create_tmp_store();
        seed(
            &mut store,
            &[
                ("The Hobbit", "J. R. R. Tolkien", "1937"),
                ("Dune", "Frank Herbert", "1965"),
                ("A Tale of Two Cities", "Charles Dickens", "1859"),
            ],
        );

        let asc = store.sort_by_title(SortDirection::Ascending).unwrap();
        assert_eq!(
            titles(&asc),
            vec!["Dune", "The Hobbit", "A Tale of Two Cities"]
        );

        let desc = store.sort_by_title(SortDirection::Descending).unwrap();
        assert_eq!(
            titles(&desc),
            vec!["A Tale of Two Cities", "The Hobbit", "Dune"]
        );
    }

    #[test]
    fn sort_by_author_and_year() {
        let (mut store, _temp_dir) = create_tmp_store();
        seed(
            &mut store,
            &[
                ("Ubik", "Philip K. Dick", "1969"),
                ("Emma", "Jane Austen", "1815"),
                ("Dune", "Frank Herbert", "1965"),
            ],
        );

        let by_author = store.sort_by_author(SortDirection::Ascending).unwrap();
        assert_eq!(titles(&by_author), vec!["Dune", "Emma", "Ubik"]);
        let by_author = store.sort_by_author(SortDirection::Descending).unwrap();
        assert_eq!(titles(&by_author), vec!["Ubik", "Emma", "Dune"]);

        let by_year = store
            .sort_by_field(NumericField::PubYear, SortDirection::Ascending)
            .unwrap();
        assert_eq!(titles(&by_year), vec!["Emma", "Dune", "Ubik"]);
        let by_id = store
            .sort_by_field(NumericField::Id, SortDirection::Descending)
            .unwrap();
        assert_eq!(titles(&by_id), vec!["Dune", "Emma", "Ubik"]);
    }

    #[test]
    fn search_matches_any_stringified_field() {
        let (mut store, _temp_dir) = create_tmp_store();
        seed(
            &mut store,
            &[
                ("Infinite Jest", "David Foster Wallace", "1996"),
                ("1984", "George Orwell", "1949"),
                ("Dune", "Frank Herbert", "1965"),
                ("Notes from 1990s", "Anon", "2003"),
                ("Author Test", "Agent 199", "2020"),
            ],
        );

        let found = store.search("199").unwrap();
        assert_eq!(
            titles(&found),
            vec!["Infinite Jest", "Notes from 1990s", "Author Test"]
        );
    }

    #[test]
    fn search_matches_ids_as_text() {
        let (mut store, temp_dir) = create_tmp_store();
        let temp_csv = temp_dir.path().join("seed.csv");
        fs::write(
            &temp_csv,
            concat!(
                "Book ID,Title,Author,Publication Date\n",
                "199,Dune,Frank Herbert,1965\n",
                "5,Emma,Jane Austen,1815\n",
            ),
        )
        .unwrap();
        store.import_csv(&temp_csv).unwrap();

        let found = store.search("199").unwrap();
        assert_eq!(titles(&found), vec!["Dune"]);
    }

    #[test]
    fn search_is_case_sensitive_and_empty_query_lists_all() {
        let (mut store, _temp_dir) = create_tmp_store();
        seed(
            &mut store,
            &[("Dune", "Frank Herbert", "1965"), ("dune messiah", "Frank Herbert", "1969")],
        );

        assert_eq!(titles(&store.search("Dune").unwrap()), vec!["Dune"]);
        assert_eq!(store.search("").unwrap().len(), 2);
    }

    #[test]
    fn exporting_empty_catalog_writes_no_file() {
        let (mut store, temp_dir) = create_tmp_store();
        let path = temp_dir.path().join("export.csv");

        let response = store
            .execute(Request::Export { path: path.clone() })
            .unwrap();
        assert_eq!(response, Response::Exported(ExportOutcome::NothingToExport));
        assert!(!path.exists());
    }

    #[test]
    fn export_then_import_round_trips() {
        let (mut store, temp_dir) = create_tmp_store();
        seed(
            &mut store,
            &[
                ("The Hobbit", "J. R. R. Tolkien", "1937"),
                ("Pride, and \"Prejudice\"", "Jane Austen", "1813"),
                ("Dune", "Frank Herbert", "1965"),
            ],
        );
        store.remove(BookId(1)).unwrap();
        let path = temp_dir.path().join("export.csv");

        let outcome = store.export_csv(&path).unwrap();
        assert!(matches!(outcome, ExportOutcome::Exported { rows: 2, .. }));

        let mut copy = CatalogStore::open_in_memory().unwrap();
        let response = copy.execute(Request::Import { path }).unwrap();
        assert_eq!(response, Response::Imported(2));

        let mut original = store.list_all().unwrap();
        let mut imported = copy.list_all().unwrap();
        original.sort_by_key(|b| b.id);
        imported.sort_by_key(|b| b.id);
        assert_eq!(original, imported);
    }
}
