//! Pack command: zip page directories into release archives.

use anyhow::Result;
use scanflow_core::config::ScanflowConfig;
use scanflow_core::release::ArchiveJob;
use std::path::PathBuf;

use super::{new_group, run_group};

/// One `DEST=SRC_DIR` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackTarget {
    pub dest: PathBuf,
    pub src: PathBuf,
}

pub fn parse_pack_target(s: &str) -> Result<PackTarget, String> {
    match s.split_once('=') {
        Some((dest, src)) if !dest.is_empty() && !src.is_empty() => Ok(PackTarget {
            dest: dest.into(),
            src: src.into(),
        }),
        _ => Err(format!("expected DEST=SRC_DIR, got {s:?}")),
    }
}

/// Build every archive concurrently.
pub async fn run_pack(cfg: &ScanflowConfig, targets: Vec<PackTarget>, overwrite: bool) -> Result<()> {
    let mut group = new_group(cfg);
    for target in targets {
        let job = ArchiveJob::from_dir(&target.dest, &target.src)?.overwrite(overwrite);
        let name = target
            .dest
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| target.dest.display().to_string());
        if overwrite && target.dest.exists() {
            eprintln!("will overwrite {name}");
        }
        group.push(name, job);
    }
    run_group(group).await
}
