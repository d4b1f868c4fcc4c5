//! Single-invocation run orchestration
//!
//! One run sequences the SSH detector, the HTTP detector and the disk
//! checker, then dispatches the aggregated alerts if there are any. Detector
//! ordering is fixed for operational log readability; the three are
//! independent. Every per-source and per-transport error is recovered
//! locally — only directory setup in the binary is fatal.

use crate::alerts::{AlertAggregator, AlertBatch, AlertDispatcher, EmailTransport, SlackTransport};
use crate::config::Config;
use crate::detectors::{DetectionResult, HttpErrorDetector, SshFailureDetector};
use crate::disk::{DfProbe, DiskUsageChecker, UsageProbe};
use crate::scanner::{read_new, MonitoredSource, OffsetStore, SourceKind, SourceLock};
use chrono::Local;
use log::{error, info, warn};
use std::path::PathBuf;
use std::process::Command;

/// What one invocation accomplished
#[derive(Debug)]
pub struct RunSummary {
    /// Number of alert messages the run produced
    pub alerts: usize,
    /// Snapshot path when the run dispatched alerts
    pub snapshot: Option<PathBuf>,
    /// Sources skipped because another run held their lock
    pub sources_skipped: usize,
}

/// Execute one complete run against the given configuration
///
/// Errors below the setup level (missing log files, lock contention, probe
/// failures, offset persistence failures, transport failures) are logged and
/// recovered; the run always completes.
pub fn execute(config: &Config) -> RunSummary {
    execute_with_probe(config, &DfProbe)
}

/// Run with an injectable disk usage probe (tests substitute a mock)
pub fn execute_with_probe(config: &Config, probe: &dyn UsageProbe) -> RunSummary {
    let store = OffsetStore::new(config.offsets_dir());
    let mut aggregator = AlertAggregator::new();
    let window_label = config.window_label();
    let mut sources_skipped = 0;

    // SSH failed logins
    let ssh_source = MonitoredSource::new(&config.scan.auth_log, SourceKind::SshAuth);
    let ssh_detector =
        SshFailureDetector::new(config.thresholds.ssh_fail, config.scan.max_top_entries);
    scan_source(
        config,
        &store,
        &ssh_source,
        &mut sources_skipped,
        &mut aggregator,
        |batch| {
            let result = ssh_detector.detect(batch);
            log_detection("ssh", &result);
            result
                .threshold_breached
                .then(|| ssh_detector.format_alert(&result, &window_label))
        },
    );

    // HTTP server errors
    match config.scan.web_access_log {
        Some(ref access_log) => {
            let http_source = MonitoredSource::new(access_log, SourceKind::HttpAccess);
            let http_detector = HttpErrorDetector::new(config.thresholds.http_5xx);
            scan_source(
                config,
                &store,
                &http_source,
                &mut sources_skipped,
                &mut aggregator,
                |batch| {
                    let result = http_detector.detect(batch);
                    log_detection("http", &result);
                    result
                        .threshold_breached
                        .then(|| http_detector.format_alert(&result, &window_label))
                },
            );
        }
        None => info!("No web access log configured, skipping HTTP detector"),
    }

    // Disk usage
    let checker = DiskUsageChecker::new(config.thresholds.disk_usage_percent);
    match checker.check(probe) {
        Ok(Some(message)) => aggregator.add(message),
        Ok(None) => info!(
            "Disk usage below {}% on all filesystems",
            config.thresholds.disk_usage_percent
        ),
        Err(e) => error!("Disk usage check failed: {}", e),
    }

    // Dispatch once at the end; a run with zero messages notifies nobody.
    let alerts = aggregator.len();
    let snapshot = if aggregator.is_empty() {
        info!("No alerts this run");
        None
    } else {
        let dispatcher = build_dispatcher(config);
        let batch = AlertBatch {
            hostname: hostname(),
            timestamp: Local::now(),
            window_label,
            messages: aggregator.drain(),
        };
        let outcome = dispatcher.dispatch(&batch);
        info!(
            "Dispatched {} alert(s): {} transport(s) delivered, {} failed",
            alerts, outcome.delivered, outcome.failed
        );
        outcome.snapshot
    };

    RunSummary {
        alerts,
        snapshot,
        sources_skipped,
    }
}

/// Process one monitored log source end to end
///
/// Acquires the per-source lock (skipping the source this run on
/// contention), reads the lines appended since the stored offset, runs the
/// detector, and saves the new offset unconditionally — a non-breaching scan
/// still advances the offset.
fn scan_source<F>(
    config: &Config,
    store: &OffsetStore,
    source: &MonitoredSource,
    sources_skipped: &mut usize,
    aggregator: &mut AlertAggregator,
    detect: F,
) where
    F: FnOnce(&[String]) -> Option<String>,
{
    let key = source.offset_key();

    if !source.path.exists() {
        warn!(
            "Log file {} not found, skipping this run",
            source.path.display()
        );
        return;
    }

    let _lock = match SourceLock::acquire(&config.locks_dir(), &key) {
        Ok(Some(lock)) => lock,
        Ok(None) => {
            warn!(
                "Another run holds the lock for {}, skipping this invocation",
                source.path.display()
            );
            *sources_skipped += 1;
            return;
        }
        Err(e) => {
            error!("Cannot lock {}: {}", source.path.display(), e);
            *sources_skipped += 1;
            return;
        }
    };

    let last_offset = store.load(&key);
    let (batch, new_offset) = match read_new(&source.path, last_offset) {
        Ok(read) => read,
        Err(e) => {
            error!("Failed to read {}: {}", source.path.display(), e);
            return;
        }
    };
    info!(
        "Scanned {}: {} new line(s) (offset {} -> {})",
        source.path.display(),
        batch.len(),
        last_offset,
        new_offset
    );

    if let Some(message) = detect(&batch) {
        aggregator.add(message);
    }

    // Elevated severity: a lost offset risks re-processing or skipping
    // lines on the next run, but must not abort this one.
    if let Err(e) = store.save(&key, new_offset) {
        error!("{}", e);
    }
}

fn log_detection(detector: &str, result: &DetectionResult) {
    if result.threshold_breached {
        warn!(
            "{} detector breached threshold with {} matching line(s)",
            detector, result.count
        );
    } else {
        info!(
            "{} detector: {} matching line(s), below threshold",
            detector, result.count
        );
    }
}

/// Build the dispatcher with every transport the configuration enables
fn build_dispatcher(config: &Config) -> AlertDispatcher {
    let mut dispatcher = AlertDispatcher::new(config.snapshots_dir());

    if config.notify.email {
        dispatcher.add_transport(Box::new(EmailTransport::new(&config.notify.email_to)));
    }
    if config.notify.slack {
        match SlackTransport::new(&config.notify.slack_webhook_url) {
            Ok(transport) => dispatcher.add_transport(Box::new(transport)),
            Err(e) => error!("Cannot initialize slack transport: {}", e),
        }
    }

    dispatcher
}

/// Host name for alert subjects, with a fallback when unavailable
fn hostname() -> String {
    Command::new("hostname")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "unknown-host".to_string())
}
