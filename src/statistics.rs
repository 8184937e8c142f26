use crate::bounce_errors;
use crate::classifier::{AuthFailureEvent, DeliveryEvent, LineClassifier, Outcome};
use std::collections::{BTreeMap, HashMap};

/// Running totals for one analysis run.
///
/// Fed one event at a time while the logs are read; the read views are
/// meant for after the last line.
#[derive(Debug, Default)]
pub struct ReportAggregator {
    outcome_counts: HashMap<Outcome, u64>,
    rejected_lines: Vec<String>,
    bounced_lines: Vec<String>,
    bounce_error_tally: BTreeMap<&'static str, u64>,
    // sender -> index into auth_failure_order; keeps first-seen order for output
    auth_failure_index: HashMap<String, usize>,
    auth_failure_order: Vec<(String, String)>,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, event: Option<DeliveryEvent>) {
        let Some(event) = event else {
            return;
        };

        *self.outcome_counts.entry(event.outcome.clone()).or_insert(0) += 1;

        let Some(raw_line) = event.raw_line else {
            return;
        };
        match event.outcome {
            Outcome::Rejected => self.rejected_lines.push(raw_line),
            Outcome::Bounced => {
                for phrase in bounce_errors::matching_phrases(&raw_line) {
                    *self.bounce_error_tally.entry(phrase).or_insert(0) += 1;
                }
                self.bounced_lines.push(raw_line);
            }
            _ => {}
        }
    }

    /// Last write wins: a sender keeps only its most recent recipient.
    pub fn ingest_auth_failure(&mut self, event: Option<AuthFailureEvent>) {
        let Some(AuthFailureEvent { sender, recipient }) = event else {
            return;
        };

        match self.auth_failure_index.get(&sender) {
            Some(&idx) => self.auth_failure_order[idx].1 = recipient,
            None => {
                self.auth_failure_index
                    .insert(sender.clone(), self.auth_failure_order.len());
                self.auth_failure_order.push((sender, recipient));
            }
        }
    }

    /// Classify `line` both ways and ingest whatever it yields.
    pub fn ingest_line(&mut self, classifier: &LineClassifier, line: &str) {
        self.ingest(classifier.classify(line));
        self.ingest_auth_failure(classifier.classify_auth_failure(line));
    }

    /// Zero for tokens never seen.
    pub fn outcome_count(&self, token: &str) -> u64 {
        self.outcome_counts
            .get(&Outcome::from(token))
            .copied()
            .unwrap_or(0)
    }

    /// All seen outcome tokens with their counts, ordered by token.
    pub fn outcome_counts(&self) -> BTreeMap<&str, u64> {
        self.outcome_counts
            .iter()
            .map(|(outcome, count)| (outcome.as_str(), *count))
            .collect()
    }

    pub fn total_events(&self) -> u64 {
        self.outcome_counts.values().sum()
    }

    pub fn rejected_lines(&self) -> &[String] {
        &self.rejected_lines
    }

    pub fn bounced_lines(&self) -> &[String] {
        &self.bounced_lines
    }

    /// Only phrases that matched at least once.
    pub fn bounce_error_tally(&self) -> &BTreeMap<&'static str, u64> {
        &self.bounce_error_tally
    }

    /// `(sender, recipient)` pairs in the order senders were first seen.
    pub fn auth_failures(&self) -> &[(String, String)] {
        &self.auth_failure_order
    }

    pub fn auth_failure_for(&self, sender: &str) -> Option<&str> {
        self.auth_failure_index
            .get(sender)
            .map(|&idx| self.auth_failure_order[idx].1.as_str())
    }
}
