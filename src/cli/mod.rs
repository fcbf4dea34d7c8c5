//! CLI module for the legal document Q&A tool.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Ask natural-language questions over uploaded legal documents.
#[derive(Debug, Parser)]
#[command(name = "lexdoc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check backend status (embedding server, generation key, index)
    Status,

    /// Ingest a document: chunk, embed, and index it
    Ingest(commands::IngestArgs),

    /// Ask a question about an ingested document
    Ask(commands::AskArgs),

    /// List ingested documents
    Docs,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

// FromStr for OutputFormat is implemented in models::answer
