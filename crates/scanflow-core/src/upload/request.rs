//! HTTP/1.1 request framing over a sampler handle.

use tokio::io::AsyncReadExt;

use crate::sampler::SamplerHandle;

use super::error::UploadError;
use super::{UploadBody, UploadRequest, UploadSettings};

/// Serialize the request line and headers.
///
/// Plain files and byte bodies are sent with `Content-Length`; multipart bodies
/// carry their boundary and go out chunked. Caller headers replace defaults
/// with the same name.
pub(super) fn encode_head(req: &UploadRequest, settings: &UploadSettings) -> String {
    let mut headers: Vec<(String, String)> = vec![
        ("Host".into(), req.host.clone()),
        ("User-Agent".into(), settings.user_agent.clone()),
    ];
    match &req.body {
        UploadBody::File { len, .. } => headers.push(("Content-Length".into(), len.to_string())),
        UploadBody::Bytes(b) => headers.push(("Content-Length".into(), b.len().to_string())),
        UploadBody::Multipart(form) => {
            headers.push(("Content-Type".into(), form.content_type()));
            headers.push(("Transfer-Encoding".into(), "chunked".into()));
        }
    }
    headers.push(("Connection".into(), "close".into()));

    for (name, value) in &req.headers {
        match headers.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(existing) => existing.1 = value.clone(),
            None => headers.push((name.clone(), value.clone())),
        }
    }

    let mut head = format!("{} {} HTTP/1.1\r\n", req.method, req.path);
    for (name, value) in headers {
        head.push_str(&name);
        head.push_str(": ");
        head.push_str(&value);
        head.push_str("\r\n");
    }
    head.push_str("\r\n");
    head
}

/// `Transfer-Encoding: chunked` framing; one chunk per `send`.
pub(crate) struct ChunkedBody<'a> {
    sink: &'a SamplerHandle,
}

impl<'a> ChunkedBody<'a> {
    pub(super) fn new(sink: &'a SamplerHandle) -> Self {
        Self { sink }
    }

    pub(super) async fn send(&mut self, data: &[u8]) -> Result<(), UploadError> {
        if data.is_empty() {
            return Ok(());
        }
        let mut frame = format!("{:x}\r\n", data.len()).into_bytes();
        frame.extend_from_slice(data);
        frame.extend_from_slice(b"\r\n");
        self.sink.write_all(&frame).await.map_err(UploadError::Write)
    }

    async fn finish(self) -> Result<(), UploadError> {
        self.sink
            .write_all(b"0\r\n\r\n")
            .await
            .map_err(UploadError::Write)
    }
}

/// Write head and body through the sampler.
pub(super) async fn write_request(
    head: String,
    body: UploadBody,
    sink: &SamplerHandle,
    chunk_size: usize,
) -> Result<(), UploadError> {
    sink.write_all(head.as_bytes())
        .await
        .map_err(UploadError::Write)?;

    match body {
        UploadBody::Bytes(bytes) => sink.write_all(&bytes).await.map_err(UploadError::Write),
        UploadBody::File { mut file, len } => {
            let mut buf = vec![0u8; chunk_size];
            let mut sent = 0u64;
            while sent < len {
                let want = buf.len().min((len - sent) as usize);
                let n = file.read(&mut buf[..want]).await.map_err(UploadError::Body)?;
                if n == 0 {
                    return Err(UploadError::Body(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        format!("file ended after {sent} of {len} bytes"),
                    )));
                }
                sink.write_all(&buf[..n]).await.map_err(UploadError::Write)?;
                sent += n as u64;
            }
            Ok(())
        }
        UploadBody::Multipart(form) => {
            let mut chunked = ChunkedBody::new(sink);
            form.stream(&mut chunked, chunk_size).await?;
            chunked.finish().await
        }
    }
}
