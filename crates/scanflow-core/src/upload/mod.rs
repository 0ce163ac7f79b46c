//! Streaming uploads with live throughput reporting.
//!
//! A request is written over a raw TCP connection through a
//! [`ThroughputSampler`](crate::sampler::ThroughputSampler), so the caller sees
//! rate and percentage while the body is on the wire. The response is then
//! read from the same connection.

mod driver;
mod error;
mod multipart;
mod request;
mod response;

use std::path::Path;

use crate::sampler::SamplerSettings;

pub use driver::upload_with_progress;
pub use error::{ResponseError, UploadError};
pub use multipart::MultipartBody;
pub use response::UploadResponse;

/// Request framing and pacing parameters.
#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub user_agent: String,
    /// Bytes read from the body source per write.
    pub chunk_size: usize,
    pub sampler: SamplerSettings,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("scanflow/", env!("CARGO_PKG_VERSION")).to_string(),
            chunk_size: 32 * 1024,
            sampler: SamplerSettings::default(),
        }
    }
}

/// Request entity.
#[derive(Debug)]
pub enum UploadBody {
    /// A plain file of known length, sent with `Content-Length`.
    File { file: tokio::fs::File, len: u64 },
    /// A form streamed with chunked transfer encoding.
    Multipart(MultipartBody),
    /// A small in-memory body.
    Bytes(Vec<u8>),
}

impl UploadBody {
    /// Open `path` as a plain-file body.
    pub async fn file(path: &Path) -> std::io::Result<Self> {
        let file = tokio::fs::File::open(path).await?;
        let len = file.metadata().await?.len();
        Ok(UploadBody::File { file, len })
    }

    /// Bytes progress is measured against: the file length, the form's file
    /// parts, or the byte body's length.
    pub fn declared_len(&self) -> u64 {
        match self {
            UploadBody::File { len, .. } => *len,
            UploadBody::Multipart(form) => form.file_bytes(),
            UploadBody::Bytes(b) => b.len() as u64,
        }
    }
}

/// One request to send through [`upload_with_progress`].
#[derive(Debug)]
pub struct UploadRequest {
    /// `host[:port]`; port 80 when absent. Also used as the `Host` header.
    pub host: String,
    pub method: String,
    /// Request target, including any query string.
    pub path: String,
    pub body: UploadBody,
    /// Expected bytes for progress reporting; 0 disables status lines.
    pub total: u64,
    pub headers: Vec<(String, String)>,
}

impl UploadRequest {
    pub fn post(host: impl Into<String>, path: impl Into<String>, body: UploadBody) -> Self {
        let total = body.declared_len();
        Self {
            host: host.into(),
            method: "POST".to_string(),
            path: path.into(),
            body,
            total,
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = total;
        self
    }
}

/// Socket address for `host`, defaulting the port to 80.
pub(crate) fn dial_addr(host: &str) -> String {
    match host.rsplit_once(':') {
        Some((_, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            host.to_string()
        }
        _ => format!("{host}:80"),
    }
}
