//! Status checks for responses from the release servers.

use serde::Deserialize;

use crate::upload::UploadResponse;

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("expected status {want}, got {status} {reason}")]
    UnexpectedStatus {
        want: u16,
        status: u16,
        reason: String,
    },
    #[error("server responded {status} {reason}: {message}")]
    Rejected {
        status: u16,
        reason: String,
        message: String,
    },
}

/// Error document the servers send with a failure status.
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "Error", default)]
    error: String,
}

/// Require `want`; otherwise surface the server's `{"Error": ...}` message
/// when the body carries one.
pub fn expect_status(resp: &UploadResponse, want: u16) -> Result<(), RemoteError> {
    if resp.status == want {
        return Ok(());
    }
    match serde_json::from_slice::<ErrorBody>(&resp.body) {
        Ok(body) if !body.error.is_empty() => Err(RemoteError::Rejected {
            status: resp.status,
            reason: resp.reason.clone(),
            message: body.error,
        }),
        _ => Err(RemoteError::UnexpectedStatus {
            want,
            status: resp.status,
            reason: resp.reason.clone(),
        }),
    }
}
