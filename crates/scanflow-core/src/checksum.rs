//! SHA-256 digests of release archives.
//!
//! The upload server verifies the digest sent in the query string, so it is
//! computed up front, before any byte goes over the wire.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const BUF_SIZE: usize = 64 * 1024;

/// Hash everything `reader` yields and return the digest as lowercase hex.
pub fn sha256_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; BUF_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute SHA-256 of a file. Reads in chunks; suitable for large archives.
pub fn sha256_path(path: &Path) -> Result<String> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    sha256_reader(f).with_context(|| format!("read {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sha256_path_empty_file() {
        let f = tempfile::NamedTempFile::new().unwrap();
        let digest = sha256_path(f.path()).unwrap();
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_reader_matches_file_digest() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"hello\n").unwrap();
        f.flush().unwrap();
        let from_file = sha256_path(f.path()).unwrap();
        let from_slice = sha256_reader(&b"hello\n"[..]).unwrap();
        assert_eq!(from_file, from_slice);
        assert_eq!(
            from_slice,
            "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03"
        );
    }

    #[test]
    fn sha256_path_missing_file_names_path() {
        let err = sha256_path(Path::new("/nonexistent/vol01.zip")).unwrap_err();
        assert!(format!("{err:#}").contains("vol01.zip"));
    }
}
