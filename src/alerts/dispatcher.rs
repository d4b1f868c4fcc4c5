//! Alert batch rendering, snapshot persistence and transport fan-out

use crate::alerts::Transport;
use crate::error::AlertError;
use chrono::{DateTime, Local};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

/// One run's worth of alert messages plus run metadata
#[derive(Debug, Clone)]
pub struct AlertBatch {
    /// Host the run executed on
    pub hostname: String,
    /// When the batch was dispatched
    pub timestamp: DateTime<Local>,
    /// Human-readable run interval text (label only)
    pub window_label: String,
    /// Alert messages in aggregation order
    pub messages: Vec<String>,
}

/// What a dispatch attempt accomplished
#[derive(Debug)]
pub struct DispatchOutcome {
    /// Path of the persisted snapshot, if writing it succeeded
    pub snapshot: Option<PathBuf>,
    /// Transports that delivered successfully
    pub delivered: usize,
    /// Transports that failed (logged, not raised)
    pub failed: usize,
}

/// Renders alert batches and hands them to each enabled transport
///
/// Dispatch is best-effort: the snapshot is written first and kept no matter
/// what the transports do, and each transport is attempted independently so
/// one unreachable endpoint never blocks another.
pub struct AlertDispatcher {
    snapshot_dir: PathBuf,
    transports: Vec<Box<dyn Transport>>,
}

impl AlertDispatcher {
    /// Create a dispatcher persisting snapshots under the given directory
    pub fn new(snapshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_dir: snapshot_dir.into(),
            transports: Vec::new(),
        }
    }

    /// Register an enabled transport
    pub fn add_transport(&mut self, transport: Box<dyn Transport>) {
        self.transports.push(transport);
    }

    /// Number of registered transports
    pub fn transport_count(&self) -> usize {
        self.transports.len()
    }

    /// Render the notification subject for a batch
    pub fn render_subject(batch: &AlertBatch) -> String {
        format!(
            "[logwarden] {} alert(s) on {} at {}",
            batch.messages.len(),
            batch.hostname,
            batch.timestamp.format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// Render the notification body for a batch
    ///
    /// Window label and host first, then the messages in aggregation order
    /// separated by blank lines.
    pub fn render_body(batch: &AlertBatch) -> String {
        format!(
            "Window: {}\nHost: {}\n\n{}\n",
            batch.window_label,
            batch.hostname,
            batch.messages.join("\n\n")
        )
    }

    /// Persist the rendered text and fan out to every transport
    ///
    /// The caller guarantees the batch is non-empty (an empty run never
    /// reaches the dispatcher). Snapshot write failure and transport failures
    /// are logged and reflected in the outcome, never raised.
    pub fn dispatch(&self, batch: &AlertBatch) -> DispatchOutcome {
        let subject = Self::render_subject(batch);
        let body = Self::render_body(batch);

        let snapshot = match self.persist_snapshot(batch, &subject, &body) {
            Ok(path) => {
                info!("Alert snapshot written to {}", path.display());
                Some(path)
            }
            Err(e) => {
                error!("Failed to persist alert snapshot: {}", e);
                None
            }
        };

        let mut delivered = 0;
        let mut failed = 0;
        for transport in &self.transports {
            match transport.send(&subject, &body) {
                Ok(()) => {
                    info!("Alert delivered via {}", transport.name());
                    delivered += 1;
                }
                Err(e) => {
                    error!("Transport {} failed: {}", transport.name(), e);
                    failed += 1;
                }
            }
        }

        DispatchOutcome {
            snapshot,
            delivered,
            failed,
        }
    }

    /// Write the rendered alert to a uniquely named timestamped file
    ///
    /// The filename carries the full timestamp to second granularity; a
    /// collision within the same second is an accepted rare edge case.
    fn persist_snapshot(
        &self,
        batch: &AlertBatch,
        subject: &str,
        body: &str,
    ) -> Result<PathBuf, AlertError> {
        let filename = format!("alert_{}.txt", batch.timestamp.format("%Y-%m-%d_%H-%M-%S"));
        let path = self.snapshot_dir.join(filename);
        fs::write(&path, format!("{}\n\n{}", subject, body))?;
        Ok(path)
    }

    /// Directory snapshots are written to
    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }
}
