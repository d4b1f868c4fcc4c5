//! Outbound notification transports
//!
//! Each transport delivers a rendered alert independently; failures are
//! reported to the caller, which logs them and moves on to the next
//! transport. Nothing here retries or blocks beyond a bounded timeout.

use crate::error::AlertError;
use log::debug;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

#[cfg(test)]
use mockall::automock;

/// Timeout for a single webhook POST so an unreachable endpoint cannot
/// stall the whole run.
const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// An outbound notification channel
#[cfg_attr(test, automock)]
pub trait Transport {
    /// Short channel name for log lines (e.g., `email`, `slack`)
    fn name(&self) -> &str;

    /// Deliver one rendered alert
    ///
    /// # Errors
    ///
    /// Returns `AlertError::TransportFailed` (or `HttpError`) when delivery
    /// fails; the dispatcher treats this as non-fatal.
    fn send(&self, subject: &str, body: &str) -> Result<(), AlertError>;
}

/// Email delivery via the system `mail` command
///
/// The body is piped to `mail -s <subject> <recipient>`, delegating MTA
/// configuration to the host.
#[derive(Debug)]
pub struct EmailTransport {
    recipient: String,
}

impl EmailTransport {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
        }
    }
}

impl Transport for EmailTransport {
    fn name(&self) -> &str {
        "email"
    }

    fn send(&self, subject: &str, body: &str) -> Result<(), AlertError> {
        debug!("Sending alert email to {}", self.recipient);

        let mut child = Command::new("mail")
            .arg("-s")
            .arg(subject)
            .arg(&self.recipient)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AlertError::TransportFailed(format!("failed to spawn mail: {}", e)))?;

        child
            .stdin
            .take()
            .ok_or_else(|| AlertError::TransportFailed("mail stdin unavailable".to_string()))?
            .write_all(body.as_bytes())
            .map_err(|e| AlertError::TransportFailed(format!("failed to write mail body: {}", e)))?;

        let output = child
            .wait_with_output()
            .map_err(|e| AlertError::TransportFailed(format!("mail did not complete: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AlertError::TransportFailed(format!(
                "mail exited with status {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Chat delivery via an incoming-webhook URL
///
/// POSTs a `{"text": <body>}` JSON payload, the format Slack-compatible
/// webhooks accept.
#[derive(Debug)]
pub struct SlackTransport {
    webhook_url: String,
    client: reqwest::blocking::Client,
}

impl SlackTransport {
    /// Create a transport for the given webhook URL
    ///
    /// # Errors
    ///
    /// Returns `AlertError::HttpError` if the HTTP client cannot be built.
    pub fn new(webhook_url: impl Into<String>) -> Result<Self, AlertError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()?;
        Ok(Self {
            webhook_url: webhook_url.into(),
            client,
        })
    }
}

impl Transport for SlackTransport {
    fn name(&self) -> &str {
        "slack"
    }

    fn send(&self, _subject: &str, body: &str) -> Result<(), AlertError> {
        debug!("Posting alert to webhook");

        let response = self
            .client
            .post(self.webhook_url.as_str())
            .json(&serde_json::json!({ "text": body }))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::TransportFailed(format!(
                "webhook returned status {}",
                status
            )));
        }

        Ok(())
    }
}
