//! HTTP 5xx spike detector for common/combined access logs

use crate::detectors::{format_breakdown, rank_top_n, DetectionResult};
use regex::Regex;

/// Whitespace field index of the status code in the common/combined layout:
/// `host ident user [date tz] "METHOD path proto" status bytes ...`
const STATUS_FIELD_INDEX: usize = 8;

/// Extract the status code field from an access log line
///
/// Returns the raw three-digit field so the caller can test it lexically.
/// Lines that do not have a plausible status at the expected position yield
/// `None` and are treated as non-matching, not as errors.
pub fn extract_status_code(line: &str) -> Option<&str> {
    let field = line.split_whitespace().nth(STATUS_FIELD_INDEX)?;
    if field.len() == 3 && field.bytes().all(|b| b.is_ascii_digit()) {
        Some(field)
    } else {
        None
    }
}

/// Detects server error spikes in web access logs
///
/// Counts lines whose status field is a three-digit code starting with `5`
/// and ranks the request paths producing them. Malformed lines are silently
/// excluded from the count.
#[derive(Debug)]
pub struct HttpErrorDetector {
    threshold: usize,
    max_top_paths: usize,
    request_path: Regex,
}

impl HttpErrorDetector {
    /// Create a detector with the configured threshold
    ///
    /// The path breakdown is truncated to the top 5 paths.
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            max_top_paths: 5,
            request_path: Regex::new(r#""(?:GET|POST|PUT|DELETE|HEAD|OPTIONS|PATCH) (\S+)"#)
                .expect("hardcoded request line pattern is valid"),
        }
    }

    /// Extract the request path from the quoted request line
    pub fn extract_request_path<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.request_path
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Scan a batch of new access log lines
    pub fn detect(&self, lines: &[String]) -> DetectionResult {
        let matching: Vec<&String> = lines
            .iter()
            .filter(|line| {
                extract_status_code(line).is_some_and(|status| status.starts_with('5'))
            })
            .collect();

        let paths = matching.iter().filter_map(|line| {
            self.extract_request_path(line).map(str::to_string)
        });
        let breakdown = rank_top_n(paths, self.max_top_paths);

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
            "🔥 HTTP: {} server errors (5xx) in the {} (threshold {})",
            result.count, window_label, self.threshold
        );
        if !result.breakdown.is_empty() {
            message.push_str("\nTop failing paths:\n");
            message.push_str(&format_breakdown(&result.breakdown));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn access_line(method: &str, path: &str, status: u16) -> String {
        format!(
            "203.0.113.9 - - [25/Aug/2026:14:03:22 +0000] \"{} {} HTTP/1.1\" {} 512 \"-\" \"curl/8.0\"",
            method, path, status
        )
    }

    #[test]
    fn test_extract_status_code_combined_layout() {
        let line = access_line("GET", "/index.html", 200);
        assert_eq!(extract_status_code(&line), Some("200"));
    }

    #[test]
    fn test_extract_status_code_malformed_line() {
        assert_eq!(extract_status_code("not an access log line"), None);
        assert_eq!(extract_status_code(""), None);
        // Field at the status position exists but is not a 3-digit code.
        assert_eq!(
            extract_status_code("a b c d e f g h notastatus j"),
            None
        );
    }

    #[test]
    fn test_only_5xx_lines_count() {
        let batch = vec![
            access_line("GET", "/", 200),
            access_line("GET", "/api/orders", 500),
            access_line("POST", "/api/orders", 502),
            access_line("GET", "/health", 404),
            access_line("GET", "/api/orders", 503),
        ];

        let detector = HttpErrorDetector::new(10);
        let result = detector.detect(&batch);
        assert_eq!(result.count, 3);
        assert!(!result.threshold_breached);
    }

    #[test]
    fn test_malformed_lines_are_silently_excluded() {
        let batch = vec![
            access_line("GET", "/api", 500),
            "garbage line".to_string(),
            String::new(),
        ];

        let detector = HttpErrorDetector::new(1);
        let result = detector.detect(&batch);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_threshold_boundary() {
        let detector = HttpErrorDetector::new(10);

        let nine: Vec<String> = (0..9).map(|_| access_line("GET", "/x", 500)).collect();
        assert!(!detector.detect(&nine).threshold_breached);

        let ten: Vec<String> = (0..10).map(|_| access_line("GET", "/x", 500)).collect();
        assert!(detector.detect(&ten).threshold_breached);
    }

    #[test]
    fn test_breakdown_ranks_paths() {
        let batch = vec![
            access_line("GET", "/api/orders", 500),
            access_line("GET", "/checkout", 502),
            access_line("POST", "/api/orders", 500),
            access_line("GET", "/api/orders", 503),
        ];

        let detector = HttpErrorDetector::new(1);
        let result = detector.detect(&batch);
        assert_eq!(
            result.breakdown,
            vec![
                ("/api/orders".to_string(), 3),
                ("/checkout".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_breakdown_truncated_to_top_five() {
        let batch: Vec<String> = (0..7)
            .map(|i| access_line("GET", &format!("/path{}", i), 500))
            .collect();

        let detector = HttpErrorDetector::new(1);
        let result = detector.detect(&batch);
        assert_eq!(result.breakdown.len(), 5);
        assert_eq!(result.count, 7);
    }

    #[test]
    fn test_5xx_line_without_parsable_request_still_counts() {
        // Status field parses but the request part is mangled.
        let batch =
            vec!["1.2.3.4 - - [25/Aug/2026:14:03:22 +0000] \"BREW /teapot HTTP/1.1\" 500 0".to_string()];

        let detector = HttpErrorDetector::new(1);
        let result = detector.detect(&batch);
        assert_eq!(result.count, 1);
        assert!(result.breakdown.is_empty());
    }

    #[test]
    fn test_alert_message_contents() {
        let batch: Vec<String> = (0..12).map(|_| access_line("GET", "/api", 500)).collect();
        let detector = HttpErrorDetector::new(10);
        let result = detector.detect(&batch);

        let message = detector.format_alert(&result, "last 10 minutes");
        assert!(message.contains("12 server errors"));
        assert!(message.contains("last 10 minutes"));
        assert!(message.contains("/api: 12"));
    }
}
