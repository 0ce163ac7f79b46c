//! Zip packing of page images.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::job::{Job, JobFuture, ProgressTx};

/// Packs files into a deflated zip archive, reporting `"i / n"` per entry.
#[derive(Debug, Clone)]
pub struct ArchiveJob {
    dest: PathBuf,
    files: Vec<PathBuf>,
    overwrite: bool,
}

impl ArchiveJob {
    pub fn new(dest: impl Into<PathBuf>, files: Vec<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            files,
            overwrite: false,
        }
    }

    /// Archive every regular file directly inside `dir`, in name order.
    pub fn from_dir(dest: impl Into<PathBuf>, dir: &Path) -> Result<Self> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        if files.is_empty() {
            bail!("no files to pack in {}", dir.display());
        }
        files.sort();
        Ok(Self::new(dest, files))
    }

    /// Replace an existing archive instead of refusing.
    pub fn overwrite(mut self, yes: bool) -> Self {
        self.overwrite = yes;
        self
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    fn pack(&self, progress: &ProgressTx) -> Result<()> {
        if !self.overwrite && self.dest.exists() {
            bail!(
                "{} already exists (use --overwrite to replace it)",
                self.dest.display()
            );
        }
        let out = File::create(&self.dest)
            .with_context(|| format!("create {}", self.dest.display()))?;
        let res = self.write_entries(BufWriter::new(out), progress);
        if res.is_err() {
            let _ = fs::remove_file(&self.dest);
        }
        res
    }

    fn write_entries(&self, out: BufWriter<File>, progress: &ProgressTx) -> Result<()> {
        let mut zip = ZipWriter::new(out);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let n = self.files.len();
        for (i, path) in self.files.iter().enumerate() {
            let name = path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .with_context(|| format!("{} has no file name", path.display()))?;
            let mut src = File::open(path).with_context(|| format!("open {}", path.display()))?;
            zip.start_file(name, options)?;
            io::copy(&mut src, &mut zip).with_context(|| format!("pack {}", path.display()))?;
            let _ = progress.blocking_send(format!("{} / {}", i + 1, n));
        }
        zip.finish()?;
        tracing::debug!(dest = %self.dest.display(), entries = n, "archive written");
        Ok(())
    }
}

impl Job for ArchiveJob {
    fn begin(self: Box<Self>, progress: ProgressTx) -> JobFuture {
        Box::pin(async move {
            tokio::task::spawn_blocking(move || self.pack(&progress))
                .await
                .context("archive task panicked")?
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn pages(dir: &Path, n: usize) -> Vec<PathBuf> {
        (1..=n)
            .map(|i| {
                let p = dir.join(format!("{i:03}.png"));
                fs::write(&p, vec![i as u8; 2048]).unwrap();
                p
            })
            .collect()
    }

    async fn run(job: ArchiveJob) -> (Result<()>, Vec<String>) {
        let (tx, mut rx) = mpsc::channel(64);
        let res = Box::new(job).begin(tx).await;
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        (res, lines)
    }

    #[tokio::test]
    async fn packs_every_file_and_counts_entries() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("res");
        fs::create_dir(&src).unwrap();
        pages(&src, 3);
        let dest = dir.path().join("ch01.zip");

        let job = ArchiveJob::from_dir(&dest, &src).unwrap();
        let (res, lines) = run(job).await;
        res.unwrap();
        assert_eq!(lines, vec!["1 / 3", "2 / 3", "3 / 3"]);

        let mut archive = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);
        let entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), "001.png");
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        assert_eq!(entry.size(), 2048);
    }

    #[tokio::test]
    async fn existing_archive_is_kept_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let files = pages(dir.path(), 1);
        let dest = dir.path().join("vol01.zip");
        fs::write(&dest, b"keep me").unwrap();

        let (res, lines) = run(ArchiveJob::new(&dest, files.clone())).await;
        assert!(res.unwrap_err().to_string().contains("already exists"));
        assert!(lines.is_empty());
        assert_eq!(fs::read(&dest).unwrap(), b"keep me");

        let (res, _) = run(ArchiveJob::new(&dest, files).overwrite(true)).await;
        res.unwrap();
        assert_ne!(fs::read(&dest).unwrap(), b"keep me");
    }

    #[tokio::test]
    async fn missing_page_removes_partial_archive() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = pages(dir.path(), 2);
        files.push(dir.path().join("404.png"));
        let dest = dir.path().join("ch02.zip");

        let (res, lines) = run(ArchiveJob::new(&dest, files)).await;
        assert!(format!("{:#}", res.unwrap_err()).contains("404.png"));
        assert_eq!(lines.len(), 2);
        assert!(!dest.exists());
    }

    #[test]
    fn empty_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ArchiveJob::from_dir(dir.path().join("x.zip"), dir.path()).is_err());
    }
}
