//! CLI for the scanflow release tool.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use scanflow_core::config;
use std::path::PathBuf;

use commands::{run_checksum, run_pack, run_post, run_up, run_upload, PackTarget, ReleaseArgs};

/// Top-level CLI for the scanflow release tool.
#[derive(Debug, Parser)]
#[command(name = "scanflow")]
#[command(about = "scanflow: pack, upload and publish scanlation releases", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Zip page directories into archives, one job per archive.
    Pack {
        /// Replace archives that already exist.
        #[arg(long)]
        overwrite: bool,
        /// Archive and source directory pairs.
        #[arg(required = true, value_name = "DEST=SRC_DIR", value_parser = commands::parse_pack_target)]
        targets: Vec<PackTarget>,
    },

    /// Upload archives to the download server.
    Upload {
        /// Archives to upload concurrently.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Post release metadata to the remote release server.
    Post(ReleaseArgs),

    /// Upload an archive to the download server, then post its release.
    Up {
        #[command(flatten)]
        release: ReleaseArgs,
        /// Only post metadata; the archive is already uploaded.
        #[arg(long)]
        meta: bool,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Pack { overwrite, targets } => run_pack(&cfg, targets, overwrite).await?,
            CliCommand::Upload { files } => run_upload(&cfg, files).await?,
            CliCommand::Post(args) => run_post(&cfg, args).await?,
            CliCommand::Up { release, meta } => run_up(&cfg, release, meta).await?,
            CliCommand::Checksum { path } => run_checksum(&path).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
