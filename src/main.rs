//! Binary entry point: parse flags, set up logging, open the catalog, then
//! either run a single command or drive the Ratatui event loop until the user
//! exits. The store is closed explicitly on the way out.
use std::fs;
use std::io;

use anyhow::{Context, Result};
use book_catalog::cli::run_command;
use book_catalog::logging::init_logging;
use book_catalog::{run_app, App, CatalogStore, Cli, Command};
use clap::Parser;
use tracing::error;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_path())?;

    if let Some(parent) = cli.db.parent() {
        fs::create_dir_all(parent).context("failed to create data directory")?;
    }
    let store = CatalogStore::open(&cli.db)
        .with_context(|| format!("failed to open catalog {}", cli.db.display()))?;

    let result = match cli.command {
        Some(command) => run_once(store, command),
        None => run_tui(store),
    };

    if let Err(err) = &result {
        error!("{err:#}");
    }
    result
}

fn run_once(mut store: CatalogStore, command: Command) -> Result<()> {
    let result = run_command(&mut store, command, &mut io::stdout().lock());
    store.close().context("failed to close catalog")?;
    result
}

/// Run the TUI, then hand the store back for an explicit close.
fn run_tui(store: CatalogStore) -> Result<()> {
    let mut app = App::new(store)?;
    let result = run_app(&mut app);
    app.into_store()
        .close()
        .context("failed to close catalog")?;
    result
}
