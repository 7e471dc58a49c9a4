//! Core library surface for the book catalog.
//!
//! [`CatalogStore`] owns the SQLite file and implements every catalog
//! operation; the `ui` and `cli` front-ends talk to it only through
//! [`Request`] and [`Response`].
pub mod catalog;
pub mod cli;
pub mod command;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod ui;

pub use catalog::CatalogStore;
pub use command::{Request, Response};
pub use config::{Cli, Command};
pub use db::ExportOutcome;
pub use error::CatalogError;
pub use models::{BookId, BookRecord, NewBook, NumericField, SortDirection, SortKey};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
