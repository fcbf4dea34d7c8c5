use anyhow::{Context, Result};

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{DocumentStore, SqliteDocumentStore};

pub async fn handle_docs(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let store = SqliteDocumentStore::open(&config.storage.db_path)
        .context("failed to open document database")?;
    let docs = store.list().context("failed to list documents")?;

    print!("{}", formatter.format_docs(&docs));
    Ok(())
}
