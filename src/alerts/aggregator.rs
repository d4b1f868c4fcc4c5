//! Per-run alert message collection

/// Collects alert messages produced during one run
///
/// A fresh instance is created per run and passed explicitly to each detector
/// and checker — no module-level state. Messages are kept in insertion order;
/// there is no deduplication or rate limiting, every qualifying detection in
/// a run produces one message.
#[derive(Debug, Default)]
pub struct AlertAggregator {
    messages: Vec<String>,
}

impl AlertAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the run's batch
    pub fn add(&mut self, message: String) {
        self.messages.push(message);
    }

    /// Whether the run produced no alerts
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages collected so far
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Take all collected messages, leaving the aggregator empty
    pub fn drain(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_aggregator_is_empty() {
        let aggregator = AlertAggregator::new();
        assert!(aggregator.is_empty());
        assert_eq!(aggregator.len(), 0);
    }

    #[test]
    fn test_drain_preserves_insertion_order() {
        let mut aggregator = AlertAggregator::new();
        aggregator.add("ssh alert".to_string());
        aggregator.add("http alert".to_string());
        aggregator.add("disk alert".to_string());

        let drained = aggregator.drain();
        assert_eq!(drained, vec!["ssh alert", "http alert", "disk alert"]);
    }

    #[test]
    fn test_drain_empties_the_aggregator() {
        let mut aggregator = AlertAggregator::new();
        aggregator.add("alert".to_string());

        let _ = aggregator.drain();
        assert!(aggregator.is_empty());
        assert!(aggregator.drain().is_empty());
    }

    #[test]
    fn test_duplicate_messages_are_kept() {
        let mut aggregator = AlertAggregator::new();
        aggregator.add("same".to_string());
        aggregator.add("same".to_string());
        assert_eq!(aggregator.len(), 2);
    }
}
