use std::path::Path;

use rusqlite::Connection;
use tracing::debug;

use crate::error::Result;

/// SQLite file name used when no path is configured. Relative, so it lands in
/// the process's working directory.
pub const DEFAULT_DB_FILE: &str = "library.db";

/// Open (or create) the catalog file at `path` and make sure the schema exists.
pub fn open_database(path: &Path) -> Result<Connection> {
    debug!(path = %path.display(), "opening catalog database");
    let conn = Connection::open(path)?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Same as [`open_database`] but backed by a private in-memory database.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create the `books` table when it is missing. Safe to run on every startup.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS books (
            book_id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            pub_date INTEGER NOT NULL
        )",
        [],
    )?;
    Ok(())
}
