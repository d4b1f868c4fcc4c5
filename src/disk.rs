//! Filesystem usage checking
//!
//! Unlike the log detectors, disk checking carries no incremental state: the
//! current usage table is queried directly on every run. The operating system
//! boundary is the [`UsageProbe`] trait; production uses `df -P`, tests
//! substitute a mock.

use crate::error::ProbeError;
use log::debug;
use std::process::Command;

#[cfg(test)]
use mockall::automock;

/// Usage of one mounted filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesystemUsage {
    /// Device identifier (e.g., `/dev/sda1`)
    pub device: String,
    /// Used capacity in percent, 0-100
    pub use_percent: u8,
    /// Mount point (e.g., `/var`)
    pub mount_point: String,
}

/// Source of the per-filesystem usage table
#[cfg_attr(test, automock)]
pub trait UsageProbe {
    /// Query usage for all mounted filesystems
    ///
    /// # Errors
    ///
    /// Returns `ProbeError` if the underlying query cannot be executed.
    fn usage(&self) -> Result<Vec<FilesystemUsage>, ProbeError>;
}

/// Production probe backed by `df -P`
///
/// The POSIX `-P` format is one record per line:
/// `Filesystem 1024-blocks Used Available Capacity Mounted on`.
/// Rows that do not parse (headers, pseudo-filesystems with `-` capacity)
/// are skipped rather than treated as errors.
#[derive(Debug, Default)]
pub struct DfProbe;

impl UsageProbe for DfProbe {
    fn usage(&self) -> Result<Vec<FilesystemUsage>, ProbeError> {
        let output = Command::new("df")
            .arg("-P")
            .output()
            .map_err(|e| ProbeError::SubprocessSpawn(format!("df: {}", e)))?;

        if !output.status.success() {
            return Err(ProbeError::SubprocessSpawn(format!(
                "df exited with status {}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_df_output(&stdout))
    }
}

/// Parse `df -P` output into usage records, skipping unparseable rows
fn parse_df_output(output: &str) -> Vec<FilesystemUsage> {
    output
        .lines()
        .skip(1) // header
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 6 {
                debug!("Skipping short df row: {:?}", line);
                return None;
            }
            let use_percent = fields[4].trim_end_matches('%').parse::<u8>().ok()?;
            Some(FilesystemUsage {
                device: fields[0].to_string(),
                use_percent,
                // Mount points can contain spaces; everything after the
                // capacity column belongs to the mount path.
                mount_point: fields[5..].join(" "),
            })
        })
        .collect()
}

/// Flags filesystems at or above the configured usage threshold
#[derive(Debug)]
pub struct DiskUsageChecker {
    threshold_percent: u8,
}

impl DiskUsageChecker {
    pub fn new(threshold_percent: u8) -> Self {
        Self { threshold_percent }
    }

    /// Filesystems at or above the threshold, in probe order
    pub fn over_threshold<'a>(&self, usage: &'a [FilesystemUsage]) -> Vec<&'a FilesystemUsage> {
        usage
            .iter()
            .filter(|fs| fs.use_percent >= self.threshold_percent)
            .collect()
    }

    /// Query the probe and produce an alert message if any filesystem is
    /// at or above the threshold
    ///
    /// Returns `None` when everything is below the threshold.
    ///
    /// # Errors
    ///
    /// Returns `ProbeError` if the usage table cannot be queried.
    pub fn check(&self, probe: &dyn UsageProbe) -> Result<Option<String>, ProbeError> {
        let usage = probe.usage()?;
        let overused = self.over_threshold(&usage);
        if overused.is_empty() {
            return Ok(None);
        }

        let detail = overused
            .iter()
            .map(|fs| format!("  {} ({}%) on {}", fs.device, fs.use_percent, fs.mount_point))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Some(format!(
            "💾 Disk: {} filesystem(s) at or above {}% usage:\n{}",
            overused.len(),
            self.threshold_percent,
            detail
        )))
    }
}
