//! Threshold-based detectors over batches of new log lines
//!
//! Each detector is a pure function from a line batch to a
//! [`DetectionResult`]: it counts matching lines, ranks a top-N breakdown of
//! extracted labels, and decides whether the configured threshold was
//! crossed. Detectors hold no state between runs, so re-processing the same
//! batch after a crash is harmless.

mod http;
mod ssh;

pub use http::HttpErrorDetector;
pub use ssh::SshFailureDetector;

use std::collections::HashMap;

/// Outcome of running one detector over one batch of lines
///
/// Ephemeral — exists only within one detector invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
    /// Number of lines that matched the detector's patterns
    pub count: usize,
    /// Ranked `(label, occurrences)` pairs, highest first, truncated to the
    /// configured top N
    pub breakdown: Vec<(String, usize)>,
    /// Whether `count` met or exceeded the configured threshold
    pub threshold_breached: bool,
}

/// Rank labels by occurrence count, descending, truncated to `n`
///
/// Ties are broken by first appearance in the input, so the ranking is
/// deterministic for a given batch: with counts `{a: 3, b: 3}` and `a` seen
/// first, the order is `[a, b]`.
pub fn rank_top_n<I>(labels: I, n: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = String>,
{
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (index, label) in labels.into_iter().enumerate() {
        let entry = counts.entry(label).or_insert((0, index));
        entry.0 += 1;
    }

    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(label, (count, first_seen))| (label, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(n);
    ranked.into_iter().map(|(label, count, _)| (label, count)).collect()
}

/// Render a ranked breakdown as indented detail lines
pub(crate) fn format_breakdown(breakdown: &[(String, usize)]) -> String {
    breakdown
        .iter()
        .map(|(label, count)| format!("  {}: {}", label, count))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn test_rank_orders_by_count_descending() {
        let labels = ["b", "a", "a", "c", "a", "b"].map(String::from);
        let ranked = rank_top_n(labels, 5);
        assert_eq!(
            ranked,
            vec![
                ("a".to_string(), 3),
                ("b".to_string(), 2),
                ("c".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_rank_breaks_ties_by_first_seen() {
        // a and b both occur 3 times; a appeared first.
        let labels = ["a", "b", "a", "b", "c", "a", "b"].map(String::from);
        let ranked = rank_top_n(labels, 5);
        assert_eq!(
            ranked,
            vec![
                ("a".to_string(), 3),
                ("b".to_string(), 3),
                ("c".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_rank_truncates_to_n() {
        let labels = ["a", "b", "c", "d"].map(String::from);
        let ranked = rank_top_n(labels, 2);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_rank_empty_input() {
        let ranked = rank_top_n(std::iter::empty(), 5);
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_format_breakdown() {
        let breakdown = vec![("203.0.113.5".to_string(), 7), ("198.51.100.2".to_string(), 3)];
        assert_eq!(
            format_breakdown(&breakdown),
            "  203.0.113.5: 7\n  198.51.100.2: 3"
        );
    }

    #[quickcheck]
    fn prop_rank_is_sorted_and_bounded(labels: Vec<u8>, n: usize) -> bool {
        let n = (n % 10) + 1;
        let ranked = rank_top_n(labels.iter().map(|l| l.to_string()), n);

        let sorted = ranked.windows(2).all(|w| w[0].1 >= w[1].1);
        let bounded = ranked.len() <= n;
        let counted: usize = ranked.iter().map(|(_, c)| c).sum();
        sorted && bounded && counted <= labels.len()
    }

    #[quickcheck]
    fn prop_rank_counts_are_exact_when_unbounded(labels: Vec<u8>) -> bool {
        let ranked = rank_top_n(labels.iter().map(|l| l.to_string()), usize::MAX);
        let total: usize = ranked.iter().map(|(_, c)| c).sum();
        total == labels.len()
    }
}
