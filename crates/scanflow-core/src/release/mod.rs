//! Release workflow jobs: packing page archives, uploading them and posting
//! release metadata.

mod archive;
mod file_upload;
mod metadata;
mod publish;
mod remote;

pub use archive::ArchiveJob;
pub use file_upload::FileUploadJob;
pub use metadata::{MetadataPostJob, Release, ReleaseKind};
pub use publish::publish;
pub use remote::{expect_status, RemoteError};
