//! Configuration loading and validation
//!
//! All tunables live in one explicit [`Config`] struct with documented
//! defaults. The struct is deserialized from a TOML file once at startup,
//! validated, and then passed by reference to every component — no
//! environment lookups are scattered across call sites.

use crate::error::ConfigError;
use log::warn;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level application configuration
///
/// Every section has sensible defaults, so an empty TOML file (or no file at
/// all) yields a working configuration that scans `/var/log/auth.log` with
/// notifications disabled.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log sources and scan window settings
    pub scan: ScanConfig,
    /// Detection thresholds
    pub thresholds: ThresholdConfig,
    /// State directory for offsets, locks and alert snapshots
    pub state: StateConfig,
    /// Notification transport toggles and endpoints
    pub notify: NotifyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig::default(),
            thresholds: ThresholdConfig::default(),
            state: StateConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

/// Log source paths and scan window settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Path to the SSH authentication log
    pub auth_log: PathBuf,
    /// Path to the web server access log; unset or empty disables the
    /// HTTP 5xx detector
    pub web_access_log: Option<PathBuf>,
    /// Human-readable scan interval in minutes, used only to label alerts
    pub window_minutes: u64,
    /// Maximum number of entries in a ranked breakdown (top IPs, top paths)
    pub max_top_entries: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            auth_log: PathBuf::from("/var/log/auth.log"),
            web_access_log: None,
            window_minutes: 10,
            max_top_entries: 5,
        }
    }
}

/// Detection thresholds
///
/// A count equal to the threshold breaches; one less does not.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Failed SSH login attempts per run that trigger an alert
    pub ssh_fail: usize,
    /// HTTP 5xx responses per run that trigger an alert
    pub http_5xx: usize,
    /// Filesystem usage percentage at or above which an alert fires
    pub disk_usage_percent: u8,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            ssh_fail: 5,
            http_5xx: 10,
            disk_usage_percent: 90,
        }
    }
}

/// State directory layout
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Base directory holding `offsets/`, `locks/` and `snapshots/`
    pub dir: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("/var/lib/logwarden"),
        }
    }
}

/// Notification transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Whether to send alert emails
    pub email: bool,
    /// Recipient address for alert emails
    pub email_to: String,
    /// Whether to post alerts to a chat webhook
    pub slack: bool,
    /// Webhook URL receiving `{"text": <body>}` payloads
    pub slack_webhook_url: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            email: false,
            email_to: String::new(),
            slack: false,
            slack_webhook_url: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// A missing file is not an error: a warning is logged and defaults are
    /// used, matching the behavior of invoking the binary with no `--config`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be read, fails to
    /// parse, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!(
                "Config file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::ReadError(format!("{}: {}", path.display(), e))
        })?;
        let mut config: Config = toml::from_str(&contents)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    /// Normalize values that deserialize ambiguously
    ///
    /// An empty `web_access_log` string means "disabled", the same as leaving
    /// the key out entirely.
    fn normalize(&mut self) {
        if let Some(ref path) = self.scan.web_access_log {
            if path.as_os_str().is_empty() {
                self.scan.web_access_log = None;
            }
        }
    }

    /// Validate configuration values once at startup
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` describing the first invalid
    /// value encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thresholds.ssh_fail == 0 {
            return Err(ConfigError::ValidationError(
                "thresholds.ssh_fail must be at least 1".to_string(),
            ));
        }
        if self.thresholds.http_5xx == 0 {
            return Err(ConfigError::ValidationError(
                "thresholds.http_5xx must be at least 1".to_string(),
            ));
        }
        if self.thresholds.disk_usage_percent == 0 || self.thresholds.disk_usage_percent > 100 {
            return Err(ConfigError::ValidationError(format!(
                "thresholds.disk_usage_percent must be in 1..=100, got {}",
                self.thresholds.disk_usage_percent
            )));
        }
        if self.scan.max_top_entries == 0 {
            return Err(ConfigError::ValidationError(
                "scan.max_top_entries must be at least 1".to_string(),
            ));
        }
        if self.scan.window_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "scan.window_minutes must be at least 1".to_string(),
            ));
        }
        if self.notify.email && self.notify.email_to.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "notify.email is enabled but notify.email_to is empty".to_string(),
            ));
        }
        if self.notify.slack {
            let url = self.notify.slack_webhook_url.trim();
            if url.is_empty() {
                return Err(ConfigError::ValidationError(
                    "notify.slack is enabled but notify.slack_webhook_url is empty".to_string(),
                ));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationError(format!(
                    "notify.slack_webhook_url is not an http(s) URL: {}",
                    url
                )));
            }
        }
        Ok(())
    }

    /// Directory holding per-source offset records
    pub fn offsets_dir(&self) -> PathBuf {
        self.state.dir.join("offsets")
    }

    /// Directory holding per-source lock files
    pub fn locks_dir(&self) -> PathBuf {
        self.state.dir.join("locks")
    }

    /// Directory holding timestamped alert snapshots
    pub fn snapshots_dir(&self) -> PathBuf {
        self.state.dir.join("snapshots")
    }

    /// Human-readable window label attached to alerts
    ///
    /// Labels only — detection always covers all new lines regardless of the
    /// real elapsed time between runs.
    pub fn window_label(&self) -> String {
        format!("last {} minutes", self.scan.window_minutes)
    }
}
