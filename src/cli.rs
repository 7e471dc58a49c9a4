//! Non-interactive front-end: one subcommand in, plain text out.

use std::io::Write;

use anyhow::{Context, Result};

use crate::catalog::CatalogStore;
use crate::command::{Request, Response};
use crate::config::{Command, SortArg};
use crate::db::ExportOutcome;

impl From<Command> for Request {
    fn from(command: Command) -> Self {
        match command {
            Command::List { sort: None, .. } => Request::ListAll,
            Command::List {
                sort: Some(sort),
                desc,
            } => Request::Sort {
                key: sort.key(),
                direction: SortArg::direction(desc),
            },
            Command::Search { query } => Request::Search { query },
            Command::Add {
                title,
                author,
                year,
            } => Request::Add {
                title,
                author,
                pub_year: year,
            },
            Command::Remove { id } => Request::Remove { id },
            Command::Export { path } => Request::Export { path },
            Command::Import { path } => Request::Import { path },
        }
    }
}

/// Execute `command` against the store and print the outcome to `out`.
pub fn run_command<W: Write>(
    store: &mut CatalogStore,
    command: Command,
    out: &mut W,
) -> Result<()> {
    let response = store.execute(command.into())?;
    write_response(&response, out).context("failed to write output")
}

fn write_response<W: Write>(response: &Response, out: &mut W) -> std::io::Result<()> {
    match response {
        Response::Added(book) => writeln!(out, "Book added successfully.\n{book}"),
        Response::Removed(id) => writeln!(out, "Book {id} removed successfully."),
        Response::Books(books) if books.is_empty() => writeln!(out, "No books found."),
        Response::Books(books) => {
            for book in books {
                writeln!(out, "{book}")?;
            }
            Ok(())
        }
        Response::Exported(ExportOutcome::Exported { path, rows }) => writeln!(
            out,
            "Library database exported to {} ({rows} books).",
            path.display()
        ),
        Response::Exported(ExportOutcome::NothingToExport) => {
            writeln!(out, "No books found in the database; nothing exported.")
        }
        Response::Imported(count) => writeln!(out, "Imported {count} books."),
    }
}
