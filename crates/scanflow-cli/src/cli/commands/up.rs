//! Up command: upload the archive, then post its release metadata.

use anyhow::Result;
use scanflow_core::config::ScanflowConfig;
use scanflow_core::job::AnsiRows;
use scanflow_core::release::{publish, FileUploadJob};

use super::post::{print_created, ReleaseArgs};
use super::require_server;

/// With `meta_only` the archive is assumed to be on the download server
/// already and only the metadata is posted.
pub async fn run_up(cfg: &ScanflowConfig, args: ReleaseArgs, meta_only: bool) -> Result<()> {
    let remote = require_server(&cfg.remote, "remote", "SCANFLOW_REMOTE")?;
    let upload = if meta_only {
        None
    } else {
        let server = require_server(&cfg.dl_server, "dl_server", "SCANFLOW_DLSERV")?;
        Some(FileUploadJob::new(server, &args.file, cfg.upload_settings()))
    };
    let job = args.into_job(cfg, remote)?;
    let release = publish(AnsiRows::stderr(), upload, job, cfg.jobs.progress_capacity).await?;
    print_created(&release);
    Ok(())
}
