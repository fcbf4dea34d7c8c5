use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::utils::read_document_text;

#[derive(Debug, Args)]
pub struct IngestArgs {
    #[arg(help = "Path to a .txt or .md document")]
    pub file: Option<PathBuf>,

    #[arg(long, help = "Ingest raw text instead of a file", conflicts_with = "file")]
    pub text: Option<String>,

    #[arg(long, help = "Document name when ingesting raw text")]
    pub name: Option<String>,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let (filename, text) = match (&args.file, args.text) {
        (Some(path), None) => {
            let text = read_document_text(path)
                .with_context(|| format!("failed to extract text from {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .ok_or_else(|| anyhow::anyhow!("path has no filename: {}", path.display()))?;
            (filename, text)
        }
        (None, Some(text)) => {
            let name = args
                .name
                .context("--name is required when ingesting with --text")?;
            (name, text)
        }
        _ => anyhow::bail!("provide either a file path or --text"),
    };

    if verbose {
        eprintln!("Document: {} ({} chars)", filename, text.chars().count());
        eprintln!(
            "Chunking: size {} overlap {}",
            config.chunking.chunk_size, config.chunking.chunk_overlap
        );
    }

    let service = super::build_service(&config, false, verbose)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("Embedding and indexing '{}'...", filename));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = service.ingest(&filename, text).await;
    spinner.finish_and_clear();

    let receipt = result.with_context(|| format!("failed to ingest '{}'", filename))?;
    print!("{}", formatter.format_receipt(&receipt));

    Ok(())
}
