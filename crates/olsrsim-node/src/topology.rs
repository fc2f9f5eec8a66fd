//! Topology table and TC message processing rules.

use std::collections::BTreeMap;

use olsr_packet::TcMessage;
use olsrsim_common::{NodeId, Tick};

/// Knowledge that `dst_mpr` recently claimed `dst` as one of its MPR
/// selectors: a usable last-hop edge towards `dst`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyEntry {
    /// The advertised MPR selector (a reachable destination).
    pub dst: NodeId,
    /// The TC originator (last hop towards `dst`).
    pub dst_mpr: NodeId,
    /// Sequence number the entry was created under.
    pub ms_seq_num: u32,
    /// Absolute expiry tick; evicted once `hold_until <= now`.
    pub hold_until: Tick,
}

/// Two-level topology mapping: destination, then advertising MPR. At most
/// one entry per `(dst, dst_mpr)` pair.
pub type TopologyTable = BTreeMap<NodeId, BTreeMap<NodeId, TopologyEntry>>;

/// Fold a received TC message into the topology table.
///
/// A new `(dst, dst_mpr)` pair is inserted with the message's sequence
/// number. An existing pair is refreshed only when the message carries a
/// strictly newer sequence; equal or older sequences are ignored. The
/// refresh touches `hold_until` but leaves the stored `ms_seq_num` at its
/// original value, so a sequence between the stored one and the newest
/// seen would still count as new. This mirrors the reference behavior the
/// engine is specified against.
pub fn update_topology(msg: &TcMessage, topology: &mut TopologyTable, hold_until: Tick) {
    for &dst in &msg.ms {
        let entries = topology.entry(dst).or_default();
        match entries.get_mut(&msg.src) {
            None => {
                entries.insert(
                    msg.src,
                    TopologyEntry {
                        dst,
                        dst_mpr: msg.src,
                        ms_seq_num: msg.seq,
                        hold_until,
                    },
                );
            }
            Some(entry) => {
                if entry.ms_seq_num < msg.seq {
                    entry.hold_until = hold_until;
                }
            }
        }
    }
}

/// Drop expired entries at the inner-map level; destinations whose last
/// edge expired disappear entirely.
pub fn evict_expired(topology: &mut TopologyTable, now: Tick) {
    for entries in topology.values_mut() {
        entries.retain(|_, entry| entry.hold_until > now);
    }
    topology.retain(|_, entries| !entries.is_empty());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tc(src: u32, seq: u32, ms: &[u32]) -> TcMessage {
        TcMessage {
            src: NodeId::new(src),
            from_nbr: NodeId::new(src),
            seq,
            ms: ms.iter().copied().map(NodeId::new).collect(),
        }
    }

    fn entry_for(topology: &TopologyTable, dst: u32, mpr: u32) -> Option<TopologyEntry> {
        topology
            .get(&NodeId::new(dst))
            .and_then(|entries| entries.get(&NodeId::new(mpr)))
            .copied()
    }

    #[test]
    fn first_tc_creates_entries_per_destination() {
        let mut topology = TopologyTable::new();

        update_topology(&tc(5, 7, &[9, 11]), &mut topology, Tick::new(150));

        assert_eq!(
            entry_for(&topology, 9, 5),
            Some(TopologyEntry {
                dst: NodeId::new(9),
                dst_mpr: NodeId::new(5),
                ms_seq_num: 7,
                hold_until: Tick::new(150),
            })
        );
        assert!(entry_for(&topology, 11, 5).is_some());
    }

    #[test]
    fn equal_sequence_does_not_touch_hold() {
        let mut topology = TopologyTable::new();
        update_topology(&tc(5, 7, &[9]), &mut topology, Tick::new(150));

        update_topology(&tc(5, 7, &[9]), &mut topology, Tick::new(180));

        assert_eq!(entry_for(&topology, 9, 5).unwrap().hold_until, Tick::new(150));
    }

    #[test]
    fn older_sequence_is_ignored() {
        let mut topology = TopologyTable::new();
        update_topology(&tc(5, 7, &[9]), &mut topology, Tick::new(150));

        update_topology(&tc(5, 3, &[9]), &mut topology, Tick::new(180));

        assert_eq!(entry_for(&topology, 9, 5).unwrap().hold_until, Tick::new(150));
    }

    #[test]
    fn newer_sequence_refreshes_hold_but_not_stored_seq() {
        let mut topology = TopologyTable::new();
        update_topology(&tc(5, 7, &[9]), &mut topology, Tick::new(150));

        update_topology(&tc(5, 9, &[9]), &mut topology, Tick::new(180));

        let entry = entry_for(&topology, 9, 5).unwrap();
        assert_eq!(entry.hold_until, Tick::new(180));
        // The stored sequence stays at its creation value; see the module
        // docs for why seq 8 would still refresh after this.
        assert_eq!(entry.ms_seq_num, 7);
    }

    #[test]
    fn distinct_originators_keep_separate_entries() {
        let mut topology = TopologyTable::new();

        update_topology(&tc(5, 7, &[9]), &mut topology, Tick::new(150));
        update_topology(&tc(6, 2, &[9]), &mut topology, Tick::new(160));

        assert_eq!(topology[&NodeId::new(9)].len(), 2);
        assert_eq!(entry_for(&topology, 9, 6).unwrap().ms_seq_num, 2);
    }

    #[test]
    fn eviction_drops_expired_and_empty_destinations() {
        let mut topology = TopologyTable::new();
        update_topology(&tc(5, 7, &[9]), &mut topology, Tick::new(150));
        update_topology(&tc(6, 2, &[9]), &mut topology, Tick::new(200));

        evict_expired(&mut topology, Tick::new(150));
        assert_eq!(topology[&NodeId::new(9)].len(), 1);

        evict_expired(&mut topology, Tick::new(200));
        assert!(topology.is_empty());
    }
}
