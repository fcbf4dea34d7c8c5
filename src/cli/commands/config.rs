use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Write a default config file
    Init,

    /// Print the config file path
    Path,
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Show => {
            let config = Config::load()?;
            let rendered = toml::to_string_pretty(&config).context("failed to render config")?;
            print!("{}", formatter.format_message(rendered.trim_end()));
        }
        ConfigCommand::Init => {
            let path = Config::config_path()
                .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
            if path.exists() {
                print!(
                    "{}",
                    formatter.format_message(&format!("config already exists at {}", path.display()))
                );
                return Ok(());
            }
            Config::default().save().context("failed to write config")?;
            print!(
                "{}",
                formatter.format_message(&format!("wrote default config to {}", path.display()))
            );
        }
        ConfigCommand::Path => {
            let path = Config::config_path()
                .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?;
            print!("{}", formatter.format_message(&path.display().to_string()));
        }
    }

    Ok(())
}
