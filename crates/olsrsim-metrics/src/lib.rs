//! Metrics infrastructure for the OLSR simulator.
//!
//! This crate re-exports the `metrics` facade and declares every metric the
//! simulator emits as a structured [`Metric`] constant, so call sites never
//! spell a metric name twice and descriptions live in one place.
//!
//! # Example
//!
//! ```rust,ignore
//! use olsrsim_metrics::{metric_defs, metrics, describe_metrics};
//!
//! // Register descriptions once at startup.
//! describe_metrics();
//!
//! metrics::counter!(metric_defs::MESSAGES_SENT.name, "kind" => "HELLO").increment(1);
//! ```

pub use metrics;

use metrics::{describe_counter, Unit};

/// The kind of metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// A monotonically increasing counter.
    Counter,
}

/// A metric declaration with its metadata.
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "olsrsim.messages_sent").
    pub name: &'static str,
    /// The kind of metric.
    pub kind: MetricKind,
    /// Human-readable description.
    pub description: &'static str,
    /// The unit of measurement.
    pub unit: Option<Unit>,
    /// Expected label keys for this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            kind: MetricKind::Counter,
            description: "",
            unit: None,
            labels: &[],
        }
    }

    /// Sets the description.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets the expected label keys.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Register this metric's description with the installed recorder.
    pub fn describe(&self) {
        match self.kind {
            MetricKind::Counter => match self.unit {
                Some(unit) => describe_counter!(self.name, unit, self.description),
                None => describe_counter!(self.name, self.description),
            },
        }
    }
}

/// All metrics emitted by the simulator.
pub mod metric_defs {
    use super::Metric;
    use metrics::Unit;

    /// Messages handed to the medium by any node, by kind.
    pub const MESSAGES_SENT: Metric = Metric::counter("olsrsim.messages_sent")
        .with_description("Messages transmitted by nodes")
        .with_unit(Unit::Count)
        .with_labels(&["kind"]);

    /// Messages delivered to a receiver over an up link.
    pub const MESSAGES_DELIVERED: Metric = Metric::counter("olsrsim.messages_delivered")
        .with_description("Messages delivered over up links")
        .with_unit(Unit::Count)
        .with_labels(&["kind"]);

    /// Messages dropped because the link was down or unknown.
    pub const MESSAGES_DROPPED: Metric = Metric::counter("olsrsim.messages_dropped")
        .with_description("Messages dropped by the link oracle")
        .with_unit(Unit::Count)
        .with_labels(&["kind"]);

    /// Ticks processed by the coordinator.
    pub const TICKS_RUN: Metric = Metric::counter("olsrsim.ticks_run")
        .with_description("Simulation ticks processed")
        .with_unit(Unit::Count);

    /// Every metric, for bulk registration.
    pub const ALL: &[&Metric] = &[
        &MESSAGES_SENT,
        &MESSAGES_DELIVERED,
        &MESSAGES_DROPPED,
        &TICKS_RUN,
    ];
}

/// Register descriptions for all simulator metrics. Call once at startup,
/// after installing a recorder.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_are_namespaced_and_unique() {
        let mut names: Vec<&str> = metric_defs::ALL.iter().map(|m| m.name).collect();
        assert!(names.iter().all(|n| n.starts_with("olsrsim.")));
        names.sort();
        names.dedup();
        assert_eq!(names.len(), metric_defs::ALL.len());
    }

    #[test]
    fn counters_declare_their_labels() {
        assert_eq!(metric_defs::MESSAGES_SENT.kind, MetricKind::Counter);
        assert_eq!(metric_defs::MESSAGES_SENT.labels, &["kind"]);
        assert!(!metric_defs::MESSAGES_SENT.description.is_empty());
    }

    #[test]
    fn describe_does_not_panic_without_recorder() {
        describe_metrics();
    }
}
