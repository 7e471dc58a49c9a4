use std::path::PathBuf;

use thiserror::Error;

/// Every failure the catalog core reports to its caller.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Missing or malformed input: blank fields, a bad year, a bad id or an
    /// invalid row in an imported file.
    #[error("{0}")]
    Validation(String),

    #[error("The provided book ID {0} does not exist.")]
    NotFound(i64),

    #[error("failed to export catalog to {}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read catalog import from {}", path.display())]
    Import {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("catalog storage error")]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T, E = CatalogError> = std::result::Result<T, E>;
