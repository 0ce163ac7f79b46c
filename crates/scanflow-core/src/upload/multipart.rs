//! Streaming `multipart/form-data` bodies.
//!
//! Parts are described up front and only read while the body is being sent,
//! so a form carrying large files never sits in memory.

use std::path::{Path, PathBuf};

use tokio::io::AsyncReadExt;

use super::error::UploadError;
use super::request::ChunkedBody;

#[derive(Debug, Clone)]
enum Part {
    Field {
        name: String,
        value: String,
    },
    File {
        field: String,
        filename: String,
        path: PathBuf,
        len: u64,
    },
}

/// A form whose file parts are streamed from disk.
#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    parts: Vec<Part>,
}

impl Default for MultipartBody {
    fn default() -> Self {
        Self::new()
    }
}

/// 30 hex digits from the thread-local CSPRNG.
fn random_boundary() -> String {
    hex::encode(rand::random::<[u8; 15]>())
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::with_boundary(random_boundary())
    }

    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.parts.push(Part::Field {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Add a file part; the file's size is read now, its contents when sent.
    pub async fn add_file(&mut self, field: impl Into<String>, path: &Path) -> std::io::Result<&mut Self> {
        let len = tokio::fs::metadata(path).await?.len();
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        self.parts.push(Part::File {
            field: field.into(),
            filename,
            path: path.to_path_buf(),
            len,
        });
        Ok(self)
    }

    /// Total size of the file parts; what progress percentages are measured against.
    pub fn file_bytes(&self) -> u64 {
        self.parts
            .iter()
            .map(|p| match p {
                Part::File { len, .. } => *len,
                Part::Field { .. } => 0,
            })
            .sum()
    }

    fn part_header(&self, index: usize, part: &Part) -> String {
        let lead = if index == 0 { "" } else { "\r\n" };
        match part {
            Part::Field { name, .. } => format!(
                "{lead}--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n",
                self.boundary,
                escape_quotes(name)
            ),
            Part::File {
                field, filename, ..
            } => format!(
                "{lead}--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                self.boundary,
                escape_quotes(field),
                escape_quotes(filename)
            ),
        }
    }

    pub(super) async fn stream(
        &self,
        out: &mut ChunkedBody<'_>,
        chunk_size: usize,
    ) -> Result<(), UploadError> {
        for (i, part) in self.parts.iter().enumerate() {
            out.send(self.part_header(i, part).as_bytes()).await?;
            match part {
                Part::Field { value, .. } => out.send(value.as_bytes()).await?,
                Part::File { path, .. } => {
                    let mut file = tokio::fs::File::open(path).await.map_err(UploadError::Body)?;
                    let mut buf = vec![0u8; chunk_size];
                    loop {
                        let n = file.read(&mut buf).await.map_err(UploadError::Body)?;
                        if n == 0 {
                            break;
                        }
                        out.send(&buf[..n]).await?;
                    }
                }
            }
        }
        let lead = if self.parts.is_empty() { "" } else { "\r\n" };
        out.send(format!("{lead}--{}--\r\n", self.boundary).as_bytes())
            .await
    }
}
