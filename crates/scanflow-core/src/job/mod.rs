//! Jobs and job groups.
//!
//! A [`Job`] is a unit of long-running work that reports free-form progress
//! strings on a channel and finishes with `Ok(())` or an error. A [`Group`]
//! runs a fixed set of jobs concurrently, draws one terminal row per job and
//! returns the first error it observes.

mod group;
mod render;


use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use tokio::sync::mpsc;

pub use group::Group;
pub use render::{AnsiRows, RowRenderer};

/// Where a job sends its progress strings.
pub type ProgressTx = mpsc::Sender<String>;

/// Future returned by [`Job::begin`].
pub type JobFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// A unit of work run by a [`Group`].
///
/// The job reports through `progress` and must eventually return; the group
/// imposes no timeout.
pub trait Job: Send + 'static {
    fn begin(self: Box<Self>, progress: ProgressTx) -> JobFuture;
}

/// Job backed by a closure; see [`from_fn`].
pub struct FnJob<F>(F);

impl<F, Fut> Job for FnJob<F>
where
    F: FnOnce(ProgressTx) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn begin(self: Box<Self>, progress: ProgressTx) -> JobFuture {
        Box::pin((self.0)(progress))
    }
}

/// Turn an async closure into a [`Job`].
pub fn from_fn<F, Fut>(f: F) -> FnJob<F>
where
    F: FnOnce(ProgressTx) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    FnJob(f)
}

/// Send a progress line, ignoring a group that stopped listening.
pub async fn report(progress: &ProgressTx, line: impl Into<String>) {
    let _ = progress.send(line.into()).await;
}
