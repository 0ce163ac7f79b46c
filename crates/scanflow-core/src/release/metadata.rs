//! Release metadata posted to the remote release server.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::job::{report, Job, JobFuture, ProgressTx};
use crate::upload::{upload_with_progress, MultipartBody, UploadBody, UploadRequest, UploadSettings};

use super::remote::expect_status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseKind {
    Chapter,
    Volume,
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseKind::Chapter => f.write_str("chapter"),
            ReleaseKind::Volume => f.write_str("volume"),
        }
    }
}

impl FromStr for ReleaseKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "ch" | "chapter" => Ok(ReleaseKind::Chapter),
            "v" | "vol" | "volume" => Ok(ReleaseKind::Volume),
            other => bail!("unknown release kind {other:?} (expected chapter or volume)"),
        }
    }
}

/// The `data` document of a release; `id` is assigned by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Release {
    #[serde(default)]
    pub id: u64,
    pub series_id: u64,
    pub kind: ReleaseKind,
    pub ordinal: u32,
    pub filename: String,
    pub filesize: u64,
    #[serde(rename = "NSFW", default)]
    pub nsfw: bool,
    #[serde(rename = "ISBN", default)]
    pub isbn: String,
    #[serde(default)]
    pub notes: String,
}

impl Release {
    /// A new release for `archive`, named and sized from the file on disk.
    pub fn for_archive(series_id: u64, kind: ReleaseKind, ordinal: u32, archive: &Path) -> Result<Self> {
        let meta =
            std::fs::metadata(archive).with_context(|| format!("stat {}", archive.display()))?;
        let filename = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", archive.display()))?;
        Ok(Self {
            id: 0,
            series_id,
            kind,
            ordinal,
            filename,
            filesize: meta.len(),
            nsfw: false,
            isbn: String::new(),
            notes: String::new(),
        })
    }
}

#[derive(Deserialize)]
struct Created {
    #[serde(rename = "Id")]
    id: u64,
}

/// Posts a [`Release`] to `/release/create` as a multipart form: the JSON
/// record in `data`, plus optional `cover` and `thumb` images. Progress is
/// measured against the image bytes.
#[derive(Debug)]
pub struct MetadataPostJob {
    remote: String,
    release: Release,
    cover: Option<PathBuf>,
    thumb: Option<PathBuf>,
    settings: UploadSettings,
    created: Option<oneshot::Sender<Release>>,
}

impl MetadataPostJob {
    pub fn new(remote: impl Into<String>, release: Release, settings: UploadSettings) -> Self {
        Self {
            remote: remote.into(),
            release,
            cover: None,
            thumb: None,
            settings,
            created: None,
        }
    }

    pub fn with_cover(mut self, path: impl Into<PathBuf>) -> Self {
        self.cover = Some(path.into());
        self
    }

    pub fn with_thumb(mut self, path: impl Into<PathBuf>) -> Self {
        self.thumb = Some(path.into());
        self
    }

    pub fn release(&self) -> &Release {
        &self.release
    }

    /// Receive the release as created, with its server-assigned id.
    pub fn created(&mut self) -> oneshot::Receiver<Release> {
        let (tx, rx) = oneshot::channel();
        self.created = Some(tx);
        rx
    }

    async fn form(&self) -> Result<MultipartBody> {
        let mut form = MultipartBody::new();
        let data = serde_json::to_string(&self.release).context("encode release")?;
        form.add_field("data", data);
        for (field, path) in [("cover", &self.cover), ("thumb", &self.thumb)] {
            if let Some(path) = path {
                form.add_file(field, path)
                    .await
                    .with_context(|| format!("{field} {}", path.display()))?;
            }
        }
        Ok(form)
    }

    async fn run(self, progress: ProgressTx) -> Result<()> {
        let form = self.form().await?;
        let request = UploadRequest::post(&self.remote, "/release/create", UploadBody::Multipart(form))
            .with_header("Accept", "application/json");
        tracing::info!(remote = %self.remote, file = %self.release.filename, "posting release metadata");
        let response = upload_with_progress(request, Some(progress.clone()), &self.settings)
            .await
            .with_context(|| format!("post release to {}", self.remote))?;
        expect_status(&response, 201).context("post release")?;

        let created: Created =
            serde_json::from_slice(&response.body).context("decode created release")?;
        let mut release = self.release;
        release.id = created.id;
        tracing::info!(id = release.id, "release created");
        report(&progress, format!("created release #{}", release.id)).await;
        if let Some(tx) = self.created {
            let _ = tx.send(release);
        }
        Ok(())
    }
}

impl Job for MetadataPostJob {
    fn begin(self: Box<Self>, progress: ProgressTx) -> JobFuture {
        Box::pin(self.run(progress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release() -> Release {
        Release {
            id: 0,
            series_id: 12,
            kind: ReleaseKind::Volume,
            ordinal: 3,
            filename: "Series v03 [grp].zip".into(),
            filesize: 52_428_800,
            nsfw: false,
            isbn: "978-4-08-870000-0".into(),
            notes: "Enjoy!".into(),
        }
    }

    #[test]
    fn release_uses_server_field_names() {
        let json = serde_json::to_value(release()).unwrap();
        assert_eq!(json["SeriesId"], 12);
        assert_eq!(json["Kind"], "volume");
        assert_eq!(json["NSFW"], false);
        assert_eq!(json["ISBN"], "978-4-08-870000-0");
        assert_eq!(json["Filesize"], 52_428_800u64);
        assert_eq!(json["Id"], 0);
    }

    #[test]
    fn kind_parses_short_names() {
        assert_eq!("ch".parse::<ReleaseKind>().unwrap(), ReleaseKind::Chapter);
        assert_eq!("Volume".parse::<ReleaseKind>().unwrap(), ReleaseKind::Volume);
        assert!("omake".parse::<ReleaseKind>().is_err());
    }

    #[test]
    fn for_archive_takes_name_and_size_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("Series c007 [grp].zip");
        std::fs::write(&archive, vec![1u8; 4321]).unwrap();
        let r = Release::for_archive(9, ReleaseKind::Chapter, 7, &archive).unwrap();
        assert_eq!(r.filename, "Series c007 [grp].zip");
        assert_eq!(r.filesize, 4321);
        assert_eq!((r.series_id, r.ordinal, r.id), (9, 7, 0));

        let err = Release::for_archive(9, ReleaseKind::Chapter, 7, &dir.path().join("gone.zip"))
            .unwrap_err();
        assert!(err.to_string().starts_with("stat "));
    }

    #[tokio::test]
    async fn form_counts_only_image_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let cover = dir.path().join("cover.jpg");
        std::fs::write(&cover, vec![0u8; 300]).unwrap();
        let job = MetadataPostJob::new("remote", release(), UploadSettings::default())
            .with_cover(&cover);
        let form = job.form().await.unwrap();
        assert_eq!(form.file_bytes(), 300);

        let missing = MetadataPostJob::new("remote", release(), UploadSettings::default())
            .with_thumb(dir.path().join("thumb.jpg"));
        let err = missing.form().await.unwrap_err();
        assert!(err.to_string().starts_with("thumb "));
    }
}
