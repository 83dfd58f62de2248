//! CLI for fetchgate.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fetchgate_core::config::{self, FetchgateConfig};
use std::path::PathBuf;

use commands::{run_fetch, run_show_config, FetchRequest};

/// Top-level CLI for fetchgate.
#[derive(Debug, Parser)]
#[command(name = "fetchgate")]
#[command(about = "fetchgate: check URLs concurrently and save every reachable page", long_about = None)]
pub struct Cli {
    /// Use this config file instead of ~/.config/fetchgate/config.toml.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Check URLs and save each page that answers with 2xx.
    Fetch {
        /// http(s) URLs to fetch. Falls back to --input, then `urls` in the config.
        urls: Vec<String>,
        /// Read URLs from a file (one per line, `#` starts a comment).
        #[arg(long, short = 'i', value_name = "FILE")]
        input: Option<PathBuf>,
        /// Directory pages are written to (default: DownloadedPages).
        #[arg(long, short = 'o', value_name = "DIR")]
        output_dir: Option<PathBuf>,
        /// Maximum number of URLs fetched at once (default 5).
        #[arg(long, short = 'c', value_name = "N")]
        concurrency: Option<usize>,
        /// Attempts per URL for network errors, 408 and 5xx (default 3).
        #[arg(long, value_name = "N")]
        max_attempts: Option<u32>,
    },

    /// Print the effective configuration as TOML.
    Config,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let (cfg, cfg_path) = load_config(cli.config)?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch {
                urls,
                input,
                output_dir,
                concurrency,
                max_attempts,
            } => {
                let request = FetchRequest {
                    urls,
                    input,
                    output_dir,
                    concurrency,
                    max_attempts,
                };
                run_fetch(&cfg, request).await?;
            }
            CliCommand::Config => run_show_config(&cfg, cfg_path.as_deref())?,
        }

        Ok(())
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<(FetchgateConfig, Option<PathBuf>)> {
    match explicit {
        Some(path) => Ok((config::load_from_path(&path)?, Some(path))),
        None => {
            let cfg = config::load_or_init()?;
            Ok((cfg, config::config_path().ok()))
        }
    }
}

#[cfg(test)]
mod tests;
