//! Upload command: send archives to the download server.

use anyhow::Result;
use scanflow_core::config::ScanflowConfig;
use scanflow_core::release::FileUploadJob;
use std::path::PathBuf;

use super::{new_group, require_server, run_group};

pub async fn run_upload(cfg: &ScanflowConfig, files: Vec<PathBuf>) -> Result<()> {
    let server = require_server(&cfg.dl_server, "dl_server", "SCANFLOW_DLSERV")?;
    let settings = cfg.upload_settings();
    let mut group = new_group(cfg);
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        group.push(name, FileUploadJob::new(server, path, settings.clone()));
    }
    run_group(group).await
}
