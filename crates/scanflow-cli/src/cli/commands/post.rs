//! Post command: publish release metadata with optional cover and thumbnail.

use anyhow::Result;
use clap::Args;
use scanflow_core::config::ScanflowConfig;
use scanflow_core::job::AnsiRows;
use scanflow_core::release::{publish, MetadataPostJob, Release, ReleaseKind};
use std::path::PathBuf;

use super::require_server;

/// Release fields shared by `post` and `up`.
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    #[arg(long)]
    pub series_id: u64,
    /// chapter or volume.
    #[arg(long)]
    pub kind: ReleaseKind,
    /// Chapter or volume number.
    #[arg(long)]
    pub ordinal: u32,
    /// The archive; its name and size are sent.
    #[arg(long)]
    pub file: PathBuf,
    /// Release notes.
    #[arg(long, default_value = "")]
    pub notes: String,
    #[arg(long)]
    pub nsfw: bool,
    #[arg(long, default_value = "")]
    pub isbn: String,
    /// Cover image.
    #[arg(long)]
    pub cover: Option<PathBuf>,
    /// Thumbnail image.
    #[arg(long)]
    pub thumb: Option<PathBuf>,
}

impl ReleaseArgs {
    /// The metadata job for these arguments, posting to `remote`.
    pub(super) fn into_job(self, cfg: &ScanflowConfig, remote: &str) -> Result<MetadataPostJob> {
        let mut release = Release::for_archive(self.series_id, self.kind, self.ordinal, &self.file)?;
        release.nsfw = self.nsfw;
        release.isbn = self.isbn;
        release.notes = self.notes;

        let mut job = MetadataPostJob::new(remote, release, cfg.upload_settings());
        if let Some(cover) = self.cover {
            job = job.with_cover(cover);
        }
        if let Some(thumb) = self.thumb {
            job = job.with_thumb(thumb);
        }
        Ok(job)
    }
}

pub(super) fn print_created(release: &Release) {
    println!(
        "created release #{} ({} {})",
        release.id, release.kind, release.ordinal
    );
}

pub async fn run_post(cfg: &ScanflowConfig, args: ReleaseArgs) -> Result<()> {
    let remote = require_server(&cfg.remote, "remote", "SCANFLOW_REMOTE")?;
    let job = args.into_job(cfg, remote)?;
    let release = publish(AnsiRows::stderr(), None, job, cfg.jobs.progress_capacity).await?;
    print_created(&release);
    Ok(())
}
