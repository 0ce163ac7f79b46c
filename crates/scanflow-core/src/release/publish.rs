//! Upload an archive, then post its release.

use anyhow::{Context, Result};

use crate::job::{Group, RowRenderer};

use super::{FileUploadJob, MetadataPostJob, Release};

/// Runs `upload` (if any) as a one-job group, then `post` in a second group
/// drawn below it. The post is only sent once the upload has succeeded.
/// Returns the release as created by the server.
pub async fn publish<R: RowRenderer>(
    mut rows: R,
    upload: Option<FileUploadJob>,
    mut post: MetadataPostJob,
    progress_capacity: usize,
) -> Result<Release> {
    let name = post.release().filename.clone();

    if let Some(upload) = upload {
        let mut group = Group::with_progress_capacity(progress_capacity);
        group.push(name.clone(), upload);
        group.run(&mut rows).await.context("upload archive")?;
    } else {
        tracing::info!(file = %name, "metadata only; archive upload skipped");
    }

    let created = post.created();
    let mut group = Group::with_progress_capacity(progress_capacity);
    group.push(format!("{name} metadata"), post);
    group.run(&mut rows).await.context("post metadata")?;
    created.await.context("release was not returned")
}
