//! Transient source files handed to the toolchain.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};

use crate::error::{DriverError, DriverResult};

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(1);

const SCRATCH_PREFIX: &str = "main";
const SCRATCH_EXTENSION: &str = "go";

/// A uniquely named source file that is removed when dropped.
#[derive(Debug)]
pub struct ScratchSource {
    path: PathBuf,
}

impl ScratchSource {
    /// Creates the file in `dir` and writes `content` to it in full.
    pub fn create(dir: &Path, content: &[u8]) -> DriverResult<Self> {
        let scratch = Self::create_with(dir, |file| {
            file.write_all(content)?;
            file.flush()
        })?;
        debug!(
            "created scratch source {} ({} bytes)",
            scratch.path.display(),
            content.len()
        );
        Ok(scratch)
    }

    /// Creates the file in `dir` and hands it to `write`. A file that was
    /// created but could not be written is removed again before the error
    /// is returned.
    fn create_with<W>(dir: &Path, write: W) -> DriverResult<Self>
    where
        W: FnOnce(&mut File) -> io::Result<()>,
    {
        let path = dir.join(unique_name());
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .map_err(|source| DriverError::ArtifactCreation {
                path: path.clone(),
                source,
            })?;
        let scratch = Self { path };
        write(&mut file).map_err(|source| DriverError::ArtifactCreation {
            path: scratch.path.clone(),
            source,
        })?;
        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchSource {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("removed scratch source {}", self.path.display()),
            Err(err) => warn!(
                "failed removing scratch source {}: {err}",
                self.path.display()
            ),
        }
    }
}

/// Runs `f` with the path of a fresh scratch file holding `content`. The
/// file is gone by the time this returns, whatever `f` did.
pub fn with_scratch_source<T>(
    dir: &Path,
    content: &[u8],
    f: impl FnOnce(&Path) -> DriverResult<T>,
) -> DriverResult<T> {
    let scratch = ScratchSource::create(dir, content)?;
    f(scratch.path())
}

fn unique_name() -> String {
    let nonce = SCRATCH_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!(
        "{SCRATCH_PREFIX}-{}-{}-{nonce}.{SCRATCH_EXTENSION}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0),
    )
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use super::*;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).expect("read scratch dir").count()
    }

    #[test]
    fn writes_content_and_removes_on_drop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let scratch = ScratchSource::create(dir.path(), b"package main").expect("create");
        let path = scratch.path().to_path_buf();
        assert_eq!(path.extension().and_then(|ext| ext.to_str()), Some("go"));
        assert_eq!(std::fs::read(&path).expect("read back"), b"package main");

        drop(scratch);
        assert!(!path.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn names_are_unique_within_a_process() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = ScratchSource::create(dir.path(), b"a").expect("first");
        let second = ScratchSource::create(dir.path(), b"b").expect("second");
        assert_ne!(first.path(), second.path());
        assert_eq!(entries(dir.path()), 2);
    }

    #[test]
    fn removed_when_closure_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut seen = None;
        let result: DriverResult<()> = with_scratch_source(dir.path(), b"x", |path| {
            seen = Some(path.to_path_buf());
            Err(DriverError::ToolchainFailed {
                program: "go".to_string(),
                code: Some(1),
                output: String::new(),
            })
        });
        assert!(result.is_err());
        let seen = seen.expect("closure should run");
        assert!(!seen.exists());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn removed_when_closure_panics() {
        let dir = tempfile::tempdir().expect("tempdir");
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let _ = with_scratch_source(dir.path(), b"x", |_| -> DriverResult<()> {
                panic!("toolchain exploded");
            });
        }));
        assert!(outcome.is_err());
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn failed_write_removes_the_created_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ScratchSource::create_with(dir.path(), |file| {
            file.write_all(b"package ")?;
            Err(io::Error::new(io::ErrorKind::StorageFull, "no space left on device"))
        })
        .expect_err("write fails");
        assert_eq!(err.kind(), "artifact");
        assert!(err.to_string().contains("no space left on device"));
        assert_eq!(entries(dir.path()), 0);
    }

    #[test]
    fn missing_scratch_dir_is_an_artifact_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("does-not-exist");
        let err = ScratchSource::create(&missing, b"x").expect_err("dir is missing");
        assert_eq!(err.kind(), "artifact");
        assert!(err.to_string().contains("does-not-exist"));
    }
}
