//! Byte-sink side of the sampler: writes are handed to the reporting loop.

use std::io;
use tokio::sync::{mpsc, oneshot};

pub(super) struct WriteRequest {
    pub(super) data: Vec<u8>,
    pub(super) reply: oneshot::Sender<io::Result<usize>>,
}

/// Cloneable writer for a [`ThroughputSampler`](super::ThroughputSampler).
///
/// Each write is a rendezvous with the sampler's reporting loop, which performs
/// the actual sink write and replies with its count or error unchanged.
/// Writes only make progress while `report` is running.
#[derive(Clone, Debug)]
pub struct SamplerHandle {
    pub(super) requests: mpsc::Sender<WriteRequest>,
}

fn sampler_closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "throughput sampler is no longer reporting")
}

impl SamplerHandle {
    /// Write `buf` through the sampler. Returns what the underlying sink returned.
    pub async fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let (reply, rx) = oneshot::channel();
        let req = WriteRequest {
            data: buf.to_vec(),
            reply,
        };
        self.requests.send(req).await.map_err(|_| sampler_closed())?;
        rx.await.map_err(|_| sampler_closed())?
    }

    /// Write all of `buf`, retrying on short writes.
    pub async fn write_all(&self, mut buf: &[u8]) -> io::Result<()> {
        while !buf.is_empty() {
            match self.write(buf).await? {
                0 => return Err(io::ErrorKind::WriteZero.into()),
                n => buf = &buf[n..],
            }
        }
        Ok(())
    }
}
