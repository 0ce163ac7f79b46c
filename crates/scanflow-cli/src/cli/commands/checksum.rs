//! Checksum command: print the digest the upload server will verify.

use anyhow::{Context, Result};
use scanflow_core::checksum;
use std::path::Path;

/// Compute and print SHA-256 of the given file.
pub async fn run_checksum(path: &Path) -> Result<()> {
    let owned = path.to_path_buf();
    let digest = tokio::task::spawn_blocking(move || checksum::sha256_path(&owned))
        .await
        .context("hash task panicked")??;
    println!("{}  {}", digest, path.display());
    Ok(())
}
