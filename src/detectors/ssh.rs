//! SSH failed-authentication detector

use crate::detectors::{format_breakdown, rank_top_n, DetectionResult};
use regex::Regex;

/// Textual markers sshd writes for a failed authentication attempt.
/// Matched case-sensitively against the known log phrasing.
const FAILURE_MARKERS: [&str; 3] = [
    "Failed password for",
    "Invalid user",
    "authentication failure",
];

/// Detects brute-force patterns in SSH authentication logs
///
/// Counts every line carrying a failed-authentication marker and ranks the
/// originating IPv4 addresses. A line that matches a marker but has no
/// extractable `from <ip>` token still counts toward the total; it just
/// contributes nothing to the breakdown.
#[derive(Debug)]
pub struct SshFailureDetector {
    threshold: usize,
    max_top_ips: usize,
    from_ip: Regex,
}

impl SshFailureDetector {
    /// Create a detector with the configured threshold and breakdown size
    pub fn new(threshold: usize, max_top_ips: usize) -> Self {
        Self {
            threshold,
            max_top_ips,
            from_ip: Regex::new(r"from (\d{1,3}(?:\.\d{1,3}){3})")
                .expect("hardcoded IPv4 pattern is valid"),
        }
    }

    /// Scan a batch of new auth log lines
    pub fn detect(&self, lines: &[String]) -> DetectionResult {
        let matching: Vec<&String> = lines
            .iter()
            .filter(|line| FAILURE_MARKERS.iter().any(|m| line.contains(m)))
            .collect();

        let ips = matching.iter().filter_map(|line| {
            self.from_ip
                .captures(line)
                .map(|caps| caps[1].to_string())
        });
        let breakdown = rank_top_n(ips, self.max_top_ips);

        let count = matching.len();
        DetectionResult {
            count,
            breakdown,
            threshold_breached: count >= self.threshold,
        }
    }

    /// Render the alert message for a breaching result
    pub fn format_alert(&self, result: &DetectionResult, window_label: &str) -> String {
        let mut message = format!(
            "🚨 SSH: {} failed login attempts in the {} (threshold {})",
            result.count, window_label, self.threshold
        );
        if !result.breakdown.is_empty() {
            message.push_str("\nTop offending IPs:\n");
            message.push_str(&format_breakdown(&result.breakdown));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_line(ip: &str) -> String {
        format!(
            "Aug 25 14:02:11 web1 sshd[4242]: Failed password for root from {} port 52211 ssh2",
            ip
        )
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_counts_each_failure_marker() {
        let batch = lines(&[
            "Aug 25 14:02:11 web1 sshd[1]: Failed password for root from 203.0.113.5 port 1 ssh2",
            "Aug 25 14:02:12 web1 sshd[2]: Invalid user admin from 203.0.113.5 port 2",
            "Aug 25 14:02:13 web1 sshd[3]: pam_unix(sshd:auth): authentication failure; rhost=203.0.113.5",
            "Aug 25 14:02:14 web1 sshd[4]: Accepted password for deploy from 198.51.100.7 port 3 ssh2",
        ]);

        let detector = SshFailureDetector::new(5, 5);
        let result = detector.detect(&batch);
        assert_eq!(result.count, 3);
        assert!(!result.threshold_breached);
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        let batch = lines(&["Aug 25 14:02:11 web1 sshd[1]: failed password for root from 203.0.113.5"]);

        let detector = SshFailureDetector::new(1, 5);
        let result = detector.detect(&batch);
        assert_eq!(result.count, 0);
    }

    #[test]
    fn test_threshold_boundary() {
        let detector = SshFailureDetector::new(5, 5);

        let four: Vec<String> = (0..4).map(|_| failed_line("203.0.113.5")).collect();
        assert!(!detector.detect(&four).threshold_breached);

        let five: Vec<String> = (0..5).map(|_| failed_line("203.0.113.5")).collect();
        assert!(detector.detect(&five).threshold_breached);
    }

    #[test]
    fn test_breakdown_ranks_ips_by_occurrence() {
        let batch = vec![
            failed_line("203.0.113.5"),
            failed_line("198.51.100.2"),
            failed_line("203.0.113.5"),
            failed_line("203.0.113.5"),
            failed_line("192.0.2.99"),
        ];

        let detector = SshFailureDetector::new(5, 5);
        let result = detector.detect(&batch);
        assert_eq!(
            result.breakdown,
            vec![
                ("203.0.113.5".to_string(), 3),
                ("198.51.100.2".to_string(), 1),
                ("192.0.2.99".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_breakdown_tie_broken_by_first_seen() {
        let batch = vec![
            failed_line("10.0.0.1"),
            failed_line("10.0.0.2"),
            failed_line("10.0.0.1"),
            failed_line("10.0.0.2"),
            failed_line("10.0.0.3"),
        ];

        let detector = SshFailureDetector::new(1, 5);
        let result = detector.detect(&batch);
        assert_eq!(
            result.breakdown,
            vec![
                ("10.0.0.1".to_string(), 2),
                ("10.0.0.2".to_string(), 2),
                ("10.0.0.3".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_breakdown_truncated_to_max_top_ips() {
        let batch = vec![
            failed_line("10.0.0.1"),
            failed_line("10.0.0.2"),
            failed_line("10.0.0.3"),
            failed_line("10.0.0.4"),
        ];

        let detector = SshFailureDetector::new(1, 2);
        let result = detector.detect(&batch);
        assert_eq!(result.breakdown.len(), 2);
        assert_eq!(result.count, 4);
    }

    #[test]
    fn test_line_without_extractable_ip_still_counts() {
        let batch = lines(&[
            "Aug 25 14:02:13 web1 sshd[3]: pam_unix(sshd:auth): authentication failure; logname= uid=0",
        ]);

        let detector = SshFailureDetector::new(1, 5);
        let result = detector.detect(&batch);
        assert_eq!(result.count, 1);
        assert!(result.breakdown.is_empty());
        assert!(result.threshold_breached);
    }

    #[test]
    fn test_empty_batch() {
        let detector = SshFailureDetector::new(5, 5);
        let result = detector.detect(&[]);
        assert_eq!(result.count, 0);
        assert!(result.breakdown.is_empty());
        assert!(!result.threshold_breached);
    }

    #[test]
    fn test_alert_message_contents() {
        let batch: Vec<String> = (0..6).map(|_| failed_line("203.0.113.5")).collect();
        let detector = SshFailureDetector::new(5, 5);
        let result = detector.detect(&batch);

        let message = detector.format_alert(&result, "last 10 minutes");
        assert!(message.contains("6 failed login attempts"));
        assert!(message.contains("last 10 minutes"));
        assert!(message.contains("203.0.113.5: 6"));
    }
}
