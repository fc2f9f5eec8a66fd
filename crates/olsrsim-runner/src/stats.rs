//! Simulation-level counters.

use std::fmt;

use olsr_packet::MessageKind;
use olsrsim_metrics::{metric_defs, metrics};

/// Counters accumulated over a simulation run.
///
/// `messages_dropped` counts per potential receiver: a broadcast that
/// three down links swallow counts three drops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationStats {
    /// Ticks processed by the coordinator.
    pub ticks_run: u64,
    /// Messages handed to the medium by any node.
    pub messages_sent: u64,
    /// Deliveries over up links.
    pub messages_delivered: u64,
    /// Deliveries suppressed by down or unknown links.
    pub messages_dropped: u64,
    /// HELLO messages sent.
    pub hello_sent: u64,
    /// TC messages sent (originals and forwards).
    pub tc_sent: u64,
    /// DATA messages sent.
    pub data_sent: u64,
}

impl SimulationStats {
    pub(crate) fn record_tick(&mut self) {
        self.ticks_run += 1;
        metrics::counter!(metric_defs::TICKS_RUN.name).increment(1);
    }

    pub(crate) fn record_sent(&mut self, kind: MessageKind) {
        self.messages_sent += 1;
        match kind {
            MessageKind::Hello => self.hello_sent += 1,
            MessageKind::Tc => self.tc_sent += 1,
            MessageKind::Data => self.data_sent += 1,
        }
        metrics::counter!(metric_defs::MESSAGES_SENT.name, "kind" => kind.as_str()).increment(1);
    }

    pub(crate) fn record_delivered(&mut self, kind: MessageKind) {
        self.messages_delivered += 1;
        metrics::counter!(metric_defs::MESSAGES_DELIVERED.name, "kind" => kind.as_str())
            .increment(1);
    }

    pub(crate) fn record_dropped(&mut self, kind: MessageKind) {
        self.messages_dropped += 1;
        metrics::counter!(metric_defs::MESSAGES_DROPPED.name, "kind" => kind.as_str())
            .increment(1);
    }
}

impl fmt::Display for SimulationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks run:          {}", self.ticks_run)?;
        writeln!(
            f,
            "messages sent:      {} (hello {}, tc {}, data {})",
            self.messages_sent, self.hello_sent, self.tc_sent, self.data_sent
        )?;
        writeln!(f, "messages delivered: {}", self.messages_delivered)?;
        write!(f, "messages dropped:   {}", self.messages_dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_kind_counters_track_totals() {
        let mut stats = SimulationStats::default();
        stats.record_sent(MessageKind::Hello);
        stats.record_sent(MessageKind::Hello);
        stats.record_sent(MessageKind::Tc);
        stats.record_sent(MessageKind::Data);

        assert_eq!(stats.messages_sent, 4);
        assert_eq!(stats.hello_sent, 2);
        assert_eq!(stats.tc_sent, 1);
        assert_eq!(stats.data_sent, 1);
    }

    #[test]
    fn display_is_single_block() {
        let stats = SimulationStats::default();
        let rendered = stats.to_string();
        assert!(rendered.contains("messages sent"));
        assert!(!rendered.ends_with('\n'));
    }
}
