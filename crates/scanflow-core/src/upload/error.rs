//! Upload error types.

use std::io;

/// Why an upload did not produce a response.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The TCP connection could not be established.
    #[error("connect to {addr}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    /// Writing the request to the connection failed.
    #[error("write request")]
    Write(#[source] io::Error),
    /// Reading the local body source (file or form part) failed.
    #[error("read request body")]
    Body(#[source] io::Error),
    /// The response was unreadable or not HTTP/1.x.
    #[error("read response")]
    Response(#[from] ResponseError),
}

#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("malformed response: {0}")]
    Malformed(String),
}
