use anyhow::Result;
use console::style;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::{DocumentStore, EmbeddingClient, MetricsStore, SqliteDocumentStore, VectorIndex};

pub async fn handle_status(format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let (embedding_connected, embedding_model) = match EmbeddingClient::new(&config.embedding) {
        Ok(client) => match client.health_check().await {
            Ok(health) => (true, health.model_id),
            Err(e) => {
                if verbose {
                    eprintln!("{} embedding server: {}", style("✗").red(), e);
                }
                (false, None)
            }
        },
        Err(_) => (false, None),
    };

    let document_count = SqliteDocumentStore::open(&config.storage.db_path)
        .and_then(|store| store.count())
        .unwrap_or(0);

    let index_size = if config.storage.index_path.exists() {
        VectorIndex::load(&config.storage.index_path)
            .map(|i| i.len() as u64)
            .unwrap_or(0)
    } else {
        0
    };

    let metrics = MetricsStore::open(&config.storage.db_path.with_file_name("metrics.db"))
        .ok()
        .map(|m| m.get_summary());

    let status = StatusInfo {
        embedding_url: config.embedding.url.clone(),
        embedding_connected,
        embedding_model,
        embedding_dimension: config.embedding.dimension,
        generation_model: config.generation.model.clone(),
        generation_key_configured: config.generation.resolve_api_key().is_some(),
        document_count,
        index_size,
        metrics,
    };

    print!("{}", formatter.format_status(&status));
    Ok(())
}
