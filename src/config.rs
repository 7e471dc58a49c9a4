//! Command-line configuration. Everything the binary needs to start lives in
//! [`Cli`]; file locations that are not given explicitly fall back to the
//! constants below.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;

use crate::db::DEFAULT_DB_FILE;
use crate::models::{NumericField, SortDirection, SortKey};

/// File name of the log written while the application runs.
const LOG_FILE_NAME: &str = "catalog.log";

#[derive(Parser, Debug)]
#[command(name = "book-catalog", about = "Personal library catalog", version)]
pub struct Cli {
    /// Path to the SQLite catalog file. Created on first run.
    #[arg(long, default_value = DEFAULT_DB_FILE)]
    pub db: PathBuf,

    /// Where to write the application log. Defaults to the platform data
    /// directory.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Run a single command instead of starting the terminal UI.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every book.
    List {
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        /// Reverse the order given by `--sort`.
        #[arg(long, requires = "sort")]
        desc: bool,
    },
    /// Print books whose id, title, author or year contains QUERY.
    Search { query: String },
    /// Add a book and print the stored record.
    Add {
        title: String,
        author: String,
        year: String,
    },
    /// Remove the book with the given id.
    Remove { id: String },
    /// Write the catalog to a CSV file.
    Export { path: PathBuf },
    /// Load books from a CSV file produced by `export`.
    Import { path: PathBuf },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortArg {
    Title,
    Author,
    Id,
    Year,
}

impl SortArg {
    pub fn key(self) -> SortKey {
        match self {
            SortArg::Title => SortKey::Title,
            SortArg::Author => SortKey::Author,
            SortArg::Id => SortKey::Field(NumericField::Id),
            SortArg::Year => SortKey::Field(NumericField::PubYear),
        }
    }

    pub fn direction(desc: bool) -> SortDirection {
        if desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }
}

impl Cli {
    /// Explicit `--log-file`, else the platform data directory, else the
    /// working directory.
    pub fn log_path(&self) -> PathBuf {
        if let Some(path) = &self.log_file {
            return path.clone();
        }
        ProjectDirs::from("", "", "book-catalog")
            .map(|dirs| dirs.data_local_dir().join(LOG_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(LOG_FILE_NAME))
    }
}
