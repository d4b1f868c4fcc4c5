//! Durable per-source offset records and per-source run locks

use crate::error::ScanError;
use log::{debug, warn};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Persists the last processed line count for each monitored source
///
/// One small file per source, named by the source's offset key and containing
/// a single decimal integer. Saves go through a temp file and an atomic
/// rename, so a crash mid-write leaves either the old or the new value on
/// disk, never a torn one.
#[derive(Debug)]
pub struct OffsetStore {
    dir: PathBuf,
}

impl OffsetStore {
    /// Create a store rooted at the given directory
    ///
    /// The directory is expected to exist; the binary creates it at startup.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load the stored offset for a source
    ///
    /// Absence is not an error: a source seen for the first time starts at 0.
    /// An unreadable or corrupt record also yields 0 with a warning, which at
    /// worst re-processes lines (detectors are stateless counters, so
    /// re-processing is safe).
    pub fn load(&self, key: &str) -> u64 {
        let path = self.record_path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => match contents.trim().parse::<u64>() {
                Ok(offset) => offset,
                Err(_) => {
                    warn!(
                        "Corrupt offset record {} ({:?}), restarting from 0",
                        path.display(),
                        contents.trim()
                    );
                    0
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => 0,
            Err(e) => {
                warn!(
                    "Cannot read offset record {}: {}, restarting from 0",
                    path.display(),
                    e
                );
                0
            }
        }
    }

    /// Persist the offset for a source, overwriting any prior value
    ///
    /// # Errors
    ///
    /// Returns `ScanError::OffsetPersist` if the temp file cannot be written
    /// or renamed into place. The caller logs this at elevated severity since
    /// a lost offset risks re-processing or skipping data next run.
    pub fn save(&self, key: &str, offset: u64) -> Result<(), ScanError> {
        let path = self.record_path(key);
        let tmp_path = self.dir.join(format!(".{}.tmp", key));

        let write_result = (|| {
            let mut tmp = fs::File::create(&tmp_path)?;
            write!(tmp, "{}", offset)?;
            tmp.sync_all()?;
            fs::rename(&tmp_path, &path)
        })();

        write_result.map_err(|source| {
            let _ = fs::remove_file(&tmp_path);
            ScanError::OffsetPersist {
                key: key.to_string(),
                source,
            }
        })?;

        debug!("Saved offset {} for {}", offset, key);
        Ok(())
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

/// Exclusive per-source lock guarding against overlapping invocations
///
/// A slow run still holding the lock when the next scheduled run starts must
/// not race it on the same offset record. The lock is a file created with
/// `create_new`; if it already exists, the source is skipped for this
/// invocation rather than blocking. The file is removed on drop.
#[derive(Debug)]
pub struct SourceLock {
    path: PathBuf,
}

impl SourceLock {
    /// Try to acquire the lock for a source
    ///
    /// Returns `Ok(None)` when another run already holds the lock — the
    /// caller logs and skips the source this invocation.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::LockFailed` on unexpected filesystem errors
    /// (permissions, missing lock directory).
    pub fn acquire(dir: &Path, key: &str) -> Result<Option<Self>, ScanError> {
        let path = dir.join(format!("{}.lock", key));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // Record the holder for operator inspection of stale locks.
                let _ = write!(file, "{}", std::process::id());
                Ok(Some(Self { path }))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(ScanError::LockFailed(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        }
    }
}

impl Drop for SourceLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove lock file {}: {}", self.path.display(), e);
        }
    }
}
