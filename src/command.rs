//! Typed requests and responses exchanged between a front-end and the
//! [`CatalogStore`](crate::CatalogStore). Requests carry raw user text; turning
//! it into validated values is the store's job, so every front-end reports
//! the same validation messages.

use std::path::PathBuf;

use crate::db::ExportOutcome;
use crate::models::{BookId, BookRecord, SortDirection, SortKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Add {
        title: String,
        author: String,
        pub_year: String,
    },
    Remove {
        id: String,
    },
    ListAll,
    Search {
        query: String,
    },
    Sort {
        key: SortKey,
        direction: SortDirection,
    },
    Export {
        path: PathBuf,
    },
    Import {
        path: PathBuf,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Added(BookRecord),
    Removed(BookId),
    Books(Vec<BookRecord>),
    Exported(ExportOutcome),
    Imported(usize),
}

impl Response {
    /// The rows carried by a listing response, if any.
    pub fn into_books(self) -> Option<Vec<BookRecord>> {
        match self {
            Response::Books(books) => Some(books),
            _ => None,
        }
    }
}
