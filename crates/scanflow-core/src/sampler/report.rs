//! The sampler's reporting loop: sole owner of the sink and the rate buckets.

use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Duration, Instant, MissedTickBehavior};

use super::handle::{SamplerHandle, WriteRequest};
use super::ring::RateRing;
use super::status;
use super::SamplerSettings;

/// Shortest tick; `interval_at` rejects a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Wraps a byte sink and measures what is written to it.
///
/// Created together with a [`SamplerHandle`]; nothing is written until
/// [`report`](Self::report) runs.
pub struct ThroughputSampler<W> {
    sink: W,
    requests: mpsc::Receiver<WriteRequest>,
    progress: mpsc::Sender<String>,
    ring: RateRing,
    interval: Duration,
    written: u64,
    total: u64,
}

impl<W> ThroughputSampler<W>
where
    W: AsyncWrite + Unpin,
{
    /// `total` is the expected byte count; 0 means unknown and disables status lines.
    pub fn new(
        sink: W,
        total: u64,
        progress: mpsc::Sender<String>,
        settings: SamplerSettings,
    ) -> (Self, SamplerHandle) {
        let (tx, requests) = mpsc::channel(1);
        let sampler = Self {
            sink,
            requests,
            progress,
            ring: RateRing::new(settings.initial_slots, settings.capacity),
            interval: settings.interval.max(MIN_INTERVAL),
            written: 0,
            total,
        };
        (sampler, SamplerHandle { requests: tx })
    }

    /// Bytes the sink has accepted so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Serve writes and emit status lines until `done` fires or the sink fails.
    ///
    /// `done` carries the writer side's outcome, which becomes the result.
    /// A sink error is returned to the writer that caused it and a copy of it
    /// ends the loop. Returns the sink so the caller can keep using the
    /// connection.
    pub async fn report(mut self, mut done: oneshot::Receiver<io::Result<()>>) -> (W, io::Result<()>) {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                biased;

                signal = &mut done => {
                    break signal.unwrap_or_else(|_| {
                        Err(io::Error::new(io::ErrorKind::Other, "writer stopped without signalling"))
                    });
                }

                Some(req) = self.requests.recv() => {
                    if let Err(err) = self.serve_write(req).await {
                        break Err(err);
                    }
                }

                _ = ticker.tick() => self.tick().await,
            }
        };

        if result.is_ok() {
            if let Err(err) = self.sink.flush().await {
                tracing::debug!(error = %err, "flush after upload body failed");
            }
        }
        if self.total > 0 && self.written >= self.total {
            self.emit(status::done_line(self.total)).await;
        }
        (self.sink, result)
    }

    /// Perform one sink write and reply. On failure the original error goes to
    /// the writer and an equivalent one is returned to stop the loop.
    async fn serve_write(&mut self, req: WriteRequest) -> io::Result<()> {
        let res = self.sink.write(&req.data).await;
        let n = match &res {
            Ok(n) => *n,
            Err(_) => 0,
        };
        self.ring.record(n as u64);
        self.written += n as u64;

        let stop = res
            .as_ref()
            .err()
            .map(|e| io::Error::new(e.kind(), e.to_string()));
        // The writer may have given up waiting; the bytes still count.
        let _ = req.reply.send(res);
        match stop {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn tick(&mut self) {
        if self.total == 0 {
            return;
        }
        let rate = self.ring.mean() as f64 / self.interval.as_secs_f64();
        let line = status::progress_line(self.written, self.total, rate);
        self.emit(line).await;
        self.ring.advance();
    }

    async fn emit(&self, line: String) {
        if self.progress.send(line).await.is_err() {
            tracing::trace!("sampler progress receiver dropped");
        }
    }
}
