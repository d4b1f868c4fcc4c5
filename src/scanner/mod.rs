//! Incremental log scanning: offset persistence and tail reading
//!
//! Each monitored file is identified by a stable offset key derived from its
//! path. The [`OffsetStore`] remembers how many lines of the file previous
//! runs have consumed, and [`reader::read_new`] returns exactly the lines
//! appended since then.

mod offset_store;
mod reader;

pub use offset_store::{OffsetStore, SourceLock};
pub use reader::read_new;

use std::path::{Path, PathBuf};

/// Kind of log format a monitored source contains
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// SSH authentication log (`/var/log/auth.log` style)
    SshAuth,
    /// Web server access log (common/combined layout)
    HttpAccess,
}

/// A log file monitored across runs
///
/// Defined by configuration and immutable during a run.
#[derive(Debug, Clone)]
pub struct MonitoredSource {
    /// Path to the log file
    pub path: PathBuf,
    /// Log format of the file
    pub kind: SourceKind,
}

impl MonitoredSource {
    pub fn new(path: impl Into<PathBuf>, kind: SourceKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Stable key identifying this source in the offset store
    ///
    /// Derived deterministically from the path by replacing every character
    /// outside `[A-Za-z0-9._-]` with `_` and trimming leading underscores, so
    /// `/var/log/auth.log` becomes `var_log_auth.log`. Distinct real-world
    /// log paths map to distinct keys.
    pub fn offset_key(&self) -> String {
        sanitize_path(&self.path)
    }
}

fn sanitize_path(path: &Path) -> String {
    let sanitized: String = path
        .to_string_lossy()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    sanitized.trim_start_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_key_is_sanitized() {
        let source = MonitoredSource::new("/var/log/auth.log", SourceKind::SshAuth);
        assert_eq!(source.offset_key(), "var_log_auth.log");
    }

    #[test]
    fn test_offset_key_is_stable() {
        let a = MonitoredSource::new("/var/log/nginx/access.log", SourceKind::HttpAccess);
        let b = MonitoredSource::new("/var/log/nginx/access.log", SourceKind::HttpAccess);
        assert_eq!(a.offset_key(), b.offset_key());
    }

    #[test]
    fn test_distinct_paths_give_distinct_keys() {
        let a = MonitoredSource::new("/var/log/auth.log", SourceKind::SshAuth);
        let b = MonitoredSource::new("/var/log/nginx/access.log", SourceKind::HttpAccess);
        assert_ne!(a.offset_key(), b.offset_key());
    }

    #[test]
    fn test_offset_key_handles_spaces() {
        let source = MonitoredSource::new("/var/log/my app/access log", SourceKind::HttpAccess);
        assert_eq!(source.offset_key(), "var_log_my_app_access_log");
    }
}
