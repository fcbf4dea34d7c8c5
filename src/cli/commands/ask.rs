use std::time::Instant;

use anyhow::Result;
use clap::Args;

use crate::cli::output::get_formatter;
use crate::error::QueryError;
use crate::models::{Config, OutputFormat, QueryOutcome};
use crate::services::{DocumentRef, MetricsStore};

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(required = true, help = "Question to ask")]
    pub question: String,

    #[arg(long, short = 'd', help = "Document id or filename to query")]
    pub doc: Option<String>,

    #[arg(long, help = "Ask against raw text instead of a stored document")]
    pub text: Option<String>,
}

pub async fn handle_ask(args: AskArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let target = match (args.doc, args.text) {
        (Some(doc), None) => DocumentRef::Stored(doc),
        (None, Some(text)) => DocumentRef::Text(text),
        _ => anyhow::bail!("provide exactly one of --doc or --text"),
    };

    let service = super::build_service(&config, true, verbose)?;
    let metrics = MetricsStore::open(&config.storage.db_path.with_file_name("metrics.db")).ok();

    let start = Instant::now();
    let result = service.ask(&args.question, target).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    if let Some(ref metrics) = metrics {
        let (answered, success) = match &result {
            Ok(outcome) => (outcome.is_answered(), true),
            Err(_) => (false, false),
        };
        metrics.record(latency_ms, answered, success);
    }

    if verbose {
        eprintln!("Query latency: {}ms", latency_ms);
    }

    match result {
        Ok(outcome) => {
            if verbose
                && let QueryOutcome::Answered(ref answer) = outcome
            {
                eprintln!(
                    "Retrieved chunk (distance {:.3}): {}",
                    answer.distance,
                    answer.context.chars().take(120).collect::<String>()
                );
            }
            print!("{}", formatter.format_outcome(&outcome));
        }
        Err(e @ QueryError::Generation(_)) => {
            // Backend failure, distinct from "no relevant information";
            // safe for the user to retry.
            print!("{}", formatter.format_error(&e.to_string()));
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
