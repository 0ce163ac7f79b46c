//! Concurrent job group with one display row per job.

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;

use super::render::RowRenderer;
use super::{Job, ProgressTx};

const DEFAULT_PROGRESS_CAPACITY: usize = 5;

struct Running {
    slot: usize,
    name: String,
    job: Box<dyn Job>,
}

struct ProgressEvent {
    slot: usize,
    line: String,
}

struct Completion {
    slot: usize,
    outcome: Result<()>,
}

/// A fixed, ordered set of jobs run concurrently.
///
/// Jobs are drawn in insertion order; the slot returned by [`push`](Self::push)
/// is the job's row for the whole run.
pub struct Group {
    jobs: Vec<Running>,
    progress_capacity: usize,
}

impl Default for Group {
    fn default() -> Self {
        Self::new()
    }
}

impl Group {
    pub fn new() -> Self {
        Self::with_progress_capacity(DEFAULT_PROGRESS_CAPACITY)
    }

    /// `capacity` is how many progress lines a job may queue before it waits.
    pub fn with_progress_capacity(capacity: usize) -> Self {
        Self {
            jobs: Vec::new(),
            progress_capacity: capacity.max(1),
        }
    }

    /// Add a job; returns its slot.
    pub fn push(&mut self, name: impl Into<String>, job: impl Job) -> usize {
        let slot = self.jobs.len();
        self.jobs.push(Running {
            slot,
            name: name.into(),
            job: Box::new(job),
        });
        slot
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Run every job and wait until all succeed or one fails.
    ///
    /// The first error observed is returned immediately. Jobs still running at
    /// that point are neither cancelled nor awaited; they keep running detached
    /// and their progress is no longer drawn.
    pub async fn run<R: RowRenderer>(self, mut renderer: R) -> Result<()> {
        let total = self.jobs.len();
        if total == 0 {
            return Ok(());
        }

        let width = self
            .jobs
            .iter()
            .map(|r| r.name.chars().count())
            .max()
            .unwrap_or(0);
        let names: Vec<String> = self.jobs.iter().map(|r| r.name.clone()).collect();

        if let Err(e) = renderer.reserve(total) {
            tracing::warn!(error = %e, "could not reserve job rows");
        }

        let (progress_tx, mut progress_rx) = mpsc::channel::<ProgressEvent>(1);
        let (done_tx, mut done_rx) = mpsc::channel::<Completion>(1);
        for running in self.jobs {
            tokio::spawn(drive(
                running,
                self.progress_capacity,
                progress_tx.clone(),
                done_tx.clone(),
            ));
        }
        drop(progress_tx);
        drop(done_tx);

        let mut draw = |slot: usize, status: &str| {
            let line = format!("{:<width$}   {}", names[slot], status, width = width);
            if let Err(e) = renderer.render(total - slot, &line) {
                tracing::warn!(slot, error = %e, "could not draw job row");
            }
        };

        let mut outstanding = total;
        loop {
            // Progress first: a job's last status must not land after its final row.
            tokio::select! {
                biased;

                Some(ev) = progress_rx.recv() => draw(ev.slot, &ev.line),

                Some(done) = done_rx.recv() => match done.outcome {
                    Err(err) => {
                        draw(done.slot, "Error");
                        tracing::warn!(job = %names[done.slot], error = %format!("{err:#}"), "job failed; abandoning group");
                        return Err(err);
                    }
                    Ok(()) => {
                        draw(done.slot, "Done");
                        tracing::debug!(job = %names[done.slot], "job done");
                        outstanding -= 1;
                        if outstanding == 0 {
                            return Ok(());
                        }
                    }
                },

                else => return Err(anyhow!("{outstanding} job(s) stopped without reporting an outcome")),
            }
        }
    }
}

/// Per-job worker: starts the job, forwards its progress, reports its outcome.
async fn drive(
    running: Running,
    capacity: usize,
    progress: mpsc::Sender<ProgressEvent>,
    done: mpsc::Sender<Completion>,
) {
    let Running { slot, name, job } = running;
    let forward = |line: String| progress.send(ProgressEvent { slot, line });

    if forward("Waiting...".to_string()).await.is_err() {
        return;
    }

    let (tx, mut rx): (ProgressTx, _) = mpsc::channel(capacity);
    let mut task = tokio::spawn(job.begin(tx));
    tracing::debug!(slot, job = %name, "job started");

    let outcome = loop {
        tokio::select! {
            biased;

            Some(line) = rx.recv() => {
                if forward(line).await.is_err() {
                    // Group already returned; the job keeps running on its own.
                    return;
                }
            }

            joined = &mut task => {
                break joined.unwrap_or_else(|e| Err(anyhow!("job {name} panicked: {e}")));
            }
        }
    };

    // Anything the job queued right before returning is still shown.
    rx.close();
    while let Ok(line) = rx.try_recv() {
        if forward(line).await.is_err() {
            return;
        }
    }

    let _ = done.send(Completion { slot, outcome }).await;
}
