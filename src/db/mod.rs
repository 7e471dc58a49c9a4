//! Persistence module split across logical submodules. Every function takes a
//! borrowed `Connection` so the owner of the handle stays in one place.

mod books;
mod connection;
mod export;

pub use books::{
    delete_book, fetch_books, fetch_books_ordered, insert_book, insert_book_with_id, search_books,
};
pub use connection::{ensure_schema, open_database, open_in_memory, DEFAULT_DB_FILE};
pub use export::{export_csv, import_csv, ExportOutcome, EXPORT_HEADER};
