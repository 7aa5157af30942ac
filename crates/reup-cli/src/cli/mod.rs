//! CLI for the reup batch engine.

mod commands;
mod prompt;
mod sim;

use anyhow::Result;
use clap::{Parser, Subcommand};
use reup_core::config;
use std::path::PathBuf;

use commands::{run_chunks, run_config, run_login, run_simulate, SimulateArgs};

/// Top-level CLI for reup.
#[derive(Debug, Parser)]
#[command(name = "reup")]
#[command(about = "reup: rate-limited, credential-aware batch runner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Run a batch against an in-process simulated remote.
    Simulate {
        /// Number of ids in the batch.
        #[arg(long, default_value = "120", value_name = "N")]
        ids: u64,
        /// Ids per remote call (defaults to config chunk_size).
        #[arg(long, value_name = "C")]
        chunk_size: Option<usize>,
        /// Expire the credential after this many successful calls.
        #[arg(long, value_name = "K")]
        expire_after: Option<usize>,
        /// Number of leading calls that fail with a connection error.
        #[arg(long, default_value = "0", value_name = "F")]
        network_failures: usize,
        /// Write the per-chunk report as JSON to this path.
        #[arg(long, value_name = "PATH")]
        export: Option<PathBuf>,
    },

    /// Show how N ids would be split into chunks.
    Chunks {
        /// Number of ids.
        #[arg(long, value_name = "N")]
        ids: usize,
        /// Ids per chunk (defaults to config chunk_size).
        #[arg(long, value_name = "C")]
        chunk_size: Option<usize>,
    },

    /// Show the config file path and effective values.
    Config,

    /// Prompt for a credential and store it in the cookie file.
    Login,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Simulate {
                ids,
                chunk_size,
                expire_after,
                network_failures,
                export,
            } => {
                let args = SimulateArgs {
                    ids,
                    chunk_size,
                    expire_after,
                    network_failures,
                    export,
                };
                run_simulate(&cfg, args).await?
            }
            CliCommand::Chunks { ids, chunk_size } => {
                run_chunks(ids, chunk_size.unwrap_or(cfg.chunk_size))?
            }
            CliCommand::Config => run_config(&cfg)?,
            CliCommand::Login => run_login(&cfg).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
