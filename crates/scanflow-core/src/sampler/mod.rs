//! Throughput sampler: a byte sink that reports its own write rate.
//!
//! A [`ThroughputSampler`] owns the real sink. Writers go through a
//! [`SamplerHandle`]; every write is forwarded to [`ThroughputSampler::report`],
//! which is the only code that touches the sink and the rate buckets. The same
//! loop wakes on a fixed interval and sends a status line such as
//! `"1.50 MiB/4.00 MiB @ 812.00 KiB/s (37%)"` on the progress channel.

mod handle;
mod report;
mod ring;
mod status;


use std::time::Duration;

pub use handle::SamplerHandle;
pub use report::ThroughputSampler;

/// Timing and averaging parameters for a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerSettings {
    /// Time between status lines.
    pub interval: Duration,
    /// Buckets averaged over when the sampler starts.
    pub initial_slots: usize,
    /// Maximum buckets; the ring grows one bucket per tick up to this.
    pub capacity: usize,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(250),
            initial_slots: 16,
            capacity: 16,
        }
    }
}
