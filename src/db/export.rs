use std::path::{Path, PathBuf};

use rusqlite::Connection;

use super::books::{fetch_books, insert_book_with_id};
use crate::error::{CatalogError, Result};
use crate::models::{BookId, NewBook};

/// Header row written to (and expected from) catalog CSV files.
pub const EXPORT_HEADER: [&str; 4] = ["Book ID", "Title", "Author", "Publication Date"];

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of an export request. An empty catalog is reported, not treated as
/// a failure, and leaves the destination untouched.
pub enum ExportOutcome {
    Exported { path: PathBuf, rows: usize },
    NothingToExport,
}

/// Write every book to `path` in store-native order.
pub fn export_csv(conn: &Connection, path: &Path) -> Result<ExportOutcome> {
    let books = fetch_books(conn)?;
    if books.is_empty() {
        return Ok(ExportOutcome::NothingToExport);
    }

    let mut writer = csv::Writer::from_path(path).map_err(|err| export_error(path, err))?;
    writer
        .write_record(EXPORT_HEADER)
        .map_err(|err| export_error(path, err))?;

    for book in &books {
        writer
            .write_record([
                book.id.to_string(),
                book.title.clone(),
                book.author.clone(),
                book.pub_year.to_string(),
            ])
            .map_err(|err| export_error(path, err))?;
    }

    writer
        .flush()
        .map_err(|err| export_error(path, err.into()))?;

    Ok(ExportOutcome::Exported {
        path: path.to_path_buf(),
        rows: books.len(),
    })
}

/// Load a file produced by [`export_csv`]. All rows are validated before the
/// first insert and the inserts share one transaction, so a bad file leaves
/// the catalog unchanged. Returns the number of imported books.
pub fn import_csv(conn: &mut Connection, path: &Path) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|err| import_error(path, err))?;

    let headers = reader
        .headers()
        .map_err(|err| import_error(path, err))?
        .clone();
    if !headers.iter().map(str::trim).eq(EXPORT_HEADER) {
        return Err(CatalogError::Validation(format!(
            "line 1: expected header '{}'",
            EXPORT_HEADER.join(",")
        )));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| import_error(path, err))?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();

        if record.len() != EXPORT_HEADER.len() {
            return Err(CatalogError::Validation(format!(
                "line {line}: expected {} fields, found {}",
                EXPORT_HEADER.len(),
                record.len()
            )));
        }

        let id = BookId::parse(&record[0]).map_err(|err| at_line(line, err))?;
        if id.0 < 1 {
            return Err(CatalogError::Validation(format!(
                "line {line}: book ID must be positive"
            )));
        }
        let book = NewBook::parse(&record[1], &record[2], &record[3])
            .map_err(|err| at_line(line, err))?;
        rows.push((id, book));
    }

    let tx = conn.transaction()?;
    for (id, book) in &rows {
        insert_book_with_id(&tx, *id, book)?;
    }
    tx.commit()?;

    Ok(rows.len())
}

fn export_error(path: &Path, source: csv::Error) -> CatalogError {
    CatalogError::Export {
        path: path.to_path_buf(),
        source,
    }
}

fn import_error(path: &Path, source: csv::Error) -> CatalogError {
    CatalogError::Import {
        path: path.to_path_buf(),
        source,
    }
}

/// Prefix validation messages with the offending line of the input file.
fn at_line(line: u64, err: CatalogError) -> CatalogError {
    match err {
        CatalogError::Validation(message) => {
            CatalogError::Validation(format!("line {line}: {message}"))
        }
        other => other,
    }
}
