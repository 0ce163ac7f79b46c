//! Drives one request through a sampler over a TCP connection.

use std::io::{self, Write};

use crossterm::cursor::MoveToColumn;
use crossterm::queue;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use tokio::io::BufReader;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::job::ProgressTx;
use crate::sampler::ThroughputSampler;

use super::error::UploadError;
use super::request::{encode_head, write_request};
use super::response::{read_response, UploadResponse};
use super::{dial_addr, UploadRequest, UploadSettings};

fn print_status(status: &str) -> io::Result<()> {
    let mut err = io::stderr().lock();
    queue!(
        err,
        Clear(ClearType::FromCursorDown),
        Print(status),
        MoveToColumn(0)
    )?;
    err.flush()
}

/// Prints status lines in place on stderr when nobody else consumes them.
fn spawn_status_printer() -> (ProgressTx, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<String>(1);
    let handle = tokio::spawn(async move {
        while let Some(status) = rx.recv().await {
            if let Err(e) = print_status(&status) {
                tracing::debug!(error = %e, "could not print upload status");
            }
        }
        eprintln!();
    });
    (tx, handle)
}

/// Send `request` and return the server's response.
///
/// The body is written on its own task through a throughput sampler while
/// this task runs the sampler's reporting loop. Status lines go to `progress`,
/// or are printed to stderr when it is `None`. Nothing is retried.
pub async fn upload_with_progress(
    request: UploadRequest,
    progress: Option<ProgressTx>,
    settings: &UploadSettings,
) -> Result<UploadResponse, UploadError> {
    let head = encode_head(&request, settings);
    let UploadRequest {
        host,
        path,
        body,
        total,
        ..
    } = request;
    let addr = dial_addr(&host);

    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|source| UploadError::Connect {
            addr: addr.clone(),
            source,
        })?;
    let (read_half, write_half) = stream.into_split();
    tracing::debug!(%addr, %path, total, "upload started");

    let (progress, printer) = match progress {
        Some(tx) => (tx, None),
        None => {
            let (tx, handle) = spawn_status_printer();
            (tx, Some(handle))
        }
    };
    let (sampler, handle) = ThroughputSampler::new(write_half, total, progress, settings.sampler);

    let (done_tx, done_rx) = oneshot::channel();
    let chunk_size = settings.chunk_size.max(1);
    let writer = tokio::spawn(async move {
        let res = write_request(head, body, &handle, chunk_size).await;
        let signal = match &res {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(io::ErrorKind::Other, e.to_string())),
        };
        let _ = done_tx.send(signal);
        res
    });

    let (write_half, reported) = sampler.report(done_rx).await;
    let written = writer.await.unwrap_or_else(|e| {
        Err(UploadError::Write(io::Error::new(
            io::ErrorKind::Other,
            format!("request writer panicked: {e}"),
        )))
    });
    if let Some(printer) = printer {
        let _ = printer.await;
    }
    written?;
    reported.map_err(UploadError::Write)?;

    let mut reader = BufReader::new(read_half);
    let response = read_response(&mut reader).await?;
    drop(write_half);
    tracing::info!(%addr, %path, status = response.status, "upload finished");
    Ok(response)
}
