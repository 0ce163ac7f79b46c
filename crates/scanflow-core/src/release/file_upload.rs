//! Archive upload to the download server.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use url::form_urlencoded;

use crate::checksum;
use crate::job::{report, Job, JobFuture, ProgressTx};
use crate::upload::{upload_with_progress, UploadBody, UploadRequest, UploadSettings};

use super::remote::expect_status;

/// Uploads one file as the raw request body to `/upload` on the download
/// server. The server answers `201 Created` once the digest checks out.
#[derive(Debug, Clone)]
pub struct FileUploadJob {
    server: String,
    path: PathBuf,
    settings: UploadSettings,
}

/// Request target carrying the file name and its digest.
fn upload_target(name: &str, sha256: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("Name", name)
        .append_pair("Sha256", sha256)
        .finish();
    format!("/upload?{query}")
}

impl FileUploadJob {
    pub fn new(server: impl Into<String>, path: impl Into<PathBuf>, settings: UploadSettings) -> Self {
        Self {
            server: server.into(),
            path: path.into(),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn run(self, progress: ProgressTx) -> Result<()> {
        let name = self
            .path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", self.path.display()))?;

        report(&progress, "Hashing...").await;
        let path = self.path.clone();
        let digest = tokio::task::spawn_blocking(move || checksum::sha256_path(&path))
            .await
            .context("hash task panicked")??;

        let body = UploadBody::file(&self.path)
            .await
            .with_context(|| format!("open {}", self.path.display()))?;
        let request = UploadRequest::post(&self.server, upload_target(&name, &digest), body);
        tracing::info!(file = %name, server = %self.server, "uploading archive");
        let response = upload_with_progress(request, Some(progress.clone()), &self.settings)
            .await
            .with_context(|| format!("upload {name} to {}", self.server))?;
        expect_status(&response, 201).with_context(|| format!("upload {name}"))?;
        Ok(())
    }
}

impl Job for FileUploadJob {
    fn begin(self: Box<Self>, progress: ProgressTx) -> JobFuture {
        Box::pin(self.run(progress))
    }
}
