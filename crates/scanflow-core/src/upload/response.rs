//! HTTP/1.x response reading from the upload connection.
//!
//! The head is parsed by `httparse`; this module only frames the body.
//! Every size taken from the server is bounded before anything is read.

use std::borrow::Cow;
use std::io;

use httparse::Status;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use super::error::ResponseError;

/// Largest response head accepted.
const MAX_HEAD: usize = 64 * 1024;
/// Largest single head or chunk-size line.
const MAX_LINE: u64 = 8 * 1024;
const MAX_HEADERS: usize = 64;
/// Largest response body accepted. Release servers answer with small JSON.
const MAX_BODY: u64 = 16 * 1024 * 1024;

/// A fully read response.
#[derive(Debug, Clone)]
pub struct UploadResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl UploadResponse {
    /// First header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

fn malformed(msg: impl Into<String>) -> ResponseError {
    ResponseError::Malformed(msg.into())
}

fn too_large() -> ResponseError {
    malformed(format!("body larger than {MAX_BODY} bytes"))
}

/// Append one line, terminator included, to `buf`. Returns 0 at EOF.
async fn read_line<R: AsyncBufRead + Unpin>(
    r: &mut R,
    buf: &mut Vec<u8>,
) -> Result<usize, ResponseError> {
    let n = (&mut *r).take(MAX_LINE).read_until(b'\n', buf).await?;
    if n as u64 == MAX_LINE && !buf.ends_with(b"\n") {
        return Err(malformed("line too long"));
    }
    Ok(n)
}

fn is_blank(line: &[u8]) -> bool {
    line == b"\r\n" || line == b"\n"
}

/// Read lines up to and including the blank line ending a head.
async fn read_head<R: AsyncBufRead + Unpin>(r: &mut R) -> Result<Vec<u8>, ResponseError> {
    let mut head = Vec::new();
    loop {
        let start = head.len();
        if read_line(r, &mut head).await? == 0 {
            return Err(malformed(if head.is_empty() {
                "connection closed before status line"
            } else {
                "connection closed inside headers"
            }));
        }
        if is_blank(&head[start..]) && start > 0 {
            return Ok(head);
        }
        if head.len() > MAX_HEAD {
            return Err(malformed("response head too large"));
        }
    }
}

fn parse_head(head: &[u8]) -> Result<UploadResponse, ResponseError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parsed = httparse::Response::new(&mut headers);
    match parsed.parse(head) {
        Ok(Status::Complete(_)) => {}
        Ok(Status::Partial) => return Err(malformed("incomplete response head")),
        Err(e) => return Err(malformed(format!("bad response head: {e}"))),
    }
    let status = parsed
        .code
        .ok_or_else(|| malformed("missing status code"))?;
    Ok(UploadResponse {
        status,
        reason: parsed.reason.unwrap_or("").to_string(),
        headers: parsed
            .headers
            .iter()
            .map(|h| {
                (
                    h.name.to_string(),
                    String::from_utf8_lossy(h.value).trim().to_string(),
                )
            })
            .collect(),
        body: Vec::new(),
    })
}

/// Append exactly `len` bytes to `body`, growing it only as data arrives.
async fn read_exact_into<R: AsyncBufRead + Unpin>(
    r: &mut R,
    body: &mut Vec<u8>,
    len: u64,
) -> Result<(), ResponseError> {
    let got = (&mut *r).take(len).read_to_end(body).await?;
    if (got as u64) < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("body ended after {got} of {len} bytes"),
        )
        .into());
    }
    Ok(())
}

async fn read_chunked<R: AsyncBufRead + Unpin>(r: &mut R) -> Result<Vec<u8>, ResponseError> {
    let mut body = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        if read_line(r, &mut line).await? == 0 {
            return Err(malformed("connection closed inside chunked body"));
        }
        let size = match httparse::parse_chunk_size(&line) {
            Ok(Status::Complete((_, size))) => size,
            _ => {
                return Err(malformed(format!(
                    "bad chunk size line {:?}",
                    String::from_utf8_lossy(&line).trim_end()
                )))
            }
        };
        if size == 0 {
            // Trailers, up to the blank line.
            loop {
                line.clear();
                if read_line(r, &mut line).await? == 0 || is_blank(&line) {
                    return Ok(body);
                }
            }
        }
        match (body.len() as u64).checked_add(size) {
            Some(total) if total <= MAX_BODY => {}
            _ => return Err(too_large()),
        }
        read_exact_into(r, &mut body, size).await?;
        line.clear();
        read_line(r, &mut line).await?;
        if !is_blank(&line) {
            return Err(malformed("chunk not terminated by CRLF"));
        }
    }
}

/// Read one response: status line, headers, then the body as framed by
/// `Transfer-Encoding: chunked`, `Content-Length`, or connection close.
/// Interim `1xx` responses are skipped. Bodies over 16 MiB are refused.
pub(super) async fn read_response<R: AsyncBufRead + Unpin>(
    r: &mut R,
) -> Result<UploadResponse, ResponseError> {
    let mut resp = loop {
        let head = read_head(r).await?;
        let resp = parse_head(&head)?;
        if !(100..200).contains(&resp.status) {
            break resp;
        }
    };

    let chunked = resp
        .header("transfer-encoding")
        .is_some_and(|te| te.to_ascii_lowercase().contains("chunked"));
    if chunked {
        resp.body = read_chunked(r).await?;
    } else if let Some(len) = resp.header("content-length") {
        let len: u64 = len
            .parse()
            .map_err(|_| malformed(format!("bad Content-Length {len:?}")))?;
        if len > MAX_BODY {
            return Err(too_large());
        }
        read_exact_into(r, &mut resp.body, len).await?;
    } else if resp.status != 204 && resp.status != 304 {
        (&mut *r).take(MAX_BODY + 1).read_to_end(&mut resp.body).await?;
        if resp.body.len() as u64 > MAX_BODY {
            return Err(too_large());
        }
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn parse(raw: &[u8]) -> Result<UploadResponse, ResponseError> {
        let mut r = raw;
        read_response(&mut r).await
    }

    fn is_malformed(res: &Result<UploadResponse, ResponseError>) -> bool {
        matches!(res, Err(ResponseError::Malformed(_)))
    }

    #[tokio::test]
    async fn content_length_body() {
        let resp = parse(b"HTTP/1.1 201 Created\r\nContent-Length: 11\r\nX-Id: 7\r\n\r\n{\"Id\":1234}")
            .await
            .unwrap();
        assert_eq!(resp.status, 201);
        assert_eq!(resp.reason, "Created");
        assert_eq!(resp.header("x-id"), Some("7"));
        assert_eq!(resp.body_text(), "{\"Id\":1234}");
        assert!(resp.is_success());
    }

    #[tokio::test]
    async fn chunked_body_with_extension_and_trailer() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n3;x=y\r\nOK:\r\na\r\ntmp_12.zip\r\n0\r\nX-Trailer: 1\r\n\r\n";
        let resp = parse(raw).await.unwrap();
        assert_eq!(resp.body_text(), "OK:tmp_12.zip");
    }

    #[tokio::test]
    async fn body_until_close_and_interim_continue() {
        let raw = b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.0 400 Bad Request\r\n\r\n{\"Error\":\"bad hash\"}";
        let resp = parse(raw).await.unwrap();
        assert_eq!(resp.status, 400);
        assert!(!resp.is_success());
        assert_eq!(resp.body_text(), "{\"Error\":\"bad hash\"}");
    }

    #[tokio::test]
    async fn garbage_is_malformed() {
        assert!(is_malformed(&parse(b"SSH-2.0-OpenSSH\r\n\r\n").await));
        assert!(is_malformed(&parse(b"").await));
        assert!(is_malformed(
            &parse(b"HTTP/1.1 200 OK\r\nContent-Length: ten\r\n\r\n").await
        ));
        assert!(matches!(
            parse(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nshort").await,
            Err(ResponseError::Io(_))
        ));
    }

    #[tokio::test]
    async fn oversized_content_length_is_refused_before_reading() {
        let res = parse(b"HTTP/1.1 200 OK\r\nContent-Length: 18446744073709551615\r\n\r\nx").await;
        assert!(is_malformed(&res));
        let res = parse(b"HTTP/1.1 200 OK\r\nContent-Length: 53687091200\r\n\r\nx").await;
        assert!(is_malformed(&res));
    }

    #[tokio::test]
    async fn oversized_chunk_is_refused() {
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n1\r\nx\r\nffffffffffffffff\r\nx";
        assert!(is_malformed(&parse(raw).await));
        let raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n1000001\r\nx";
        assert!(is_malformed(&parse(raw).await));
    }

    #[tokio::test]
    async fn endless_header_line_is_refused() {
        let mut raw = b"HTTP/1.1 200 OK\r\nX-Junk: ".to_vec();
        raw.extend(std::iter::repeat(b'a').take(MAX_LINE as usize + 10));
        assert!(is_malformed(&parse(&raw).await));
    }
}
