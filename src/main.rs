use anyhow::Result;
use clap::Parser;
use tokio::signal;

use lexdoc::cli::commands::{handle_ask, handle_config, handle_docs, handle_ingest, handle_status};
use lexdoc::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Pick up GEMINI_API_KEY from a local .env if present.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();
    let verbose = cli.verbose;

    tokio::select! {
        result = run_command(cli.command, format, verbose) => {
            result?;
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, cleaning up...");
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    }

    Ok(())
}

async fn run_command(
    command: Commands,
    format: lexdoc::models::OutputFormat,
    verbose: bool,
) -> Result<()> {
    match command {
        Commands::Status => {
            handle_status(format, verbose).await?;
        }
        Commands::Ingest(args) => {
            handle_ingest(args, format, verbose).await?;
        }
        Commands::Ask(args) => {
            handle_ask(args, format, verbose).await?;
        }
        Commands::Docs => {
            handle_docs(format, verbose).await?;
        }
        Commands::Config(cmd) => {
            handle_config(cmd, format, verbose).await?;
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
