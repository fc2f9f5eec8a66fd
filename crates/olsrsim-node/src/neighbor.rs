//! One-hop and two-hop neighbor tables and the HELLO state machine.

use std::collections::{BTreeMap, BTreeSet};

use olsr_packet::HelloMessage;
use olsrsim_common::{NodeId, Tick};

/// Link state of a one-hop neighbor.
///
/// A neighbor is never selected as a relay while unidirectional; MPR
/// status implies a confirmed mutual link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborState {
    /// We have heard them; they have not yet confirmed hearing us.
    Unidirectional,
    /// Mutual link confirmed.
    Bidirectional,
    /// Bidirectional and currently selected by us as a multi-point relay.
    Mpr,
}

/// A one-hop neighbor table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneHopNeighbor {
    /// The neighbor's address.
    pub neighbor_id: NodeId,
    /// Current link state.
    pub state: NeighborState,
    /// Absolute tick at which the entry expires; evicted once
    /// `hold_until <= now`.
    pub hold_until: Tick,
}

/// One-hop neighbors, keyed by neighbor id.
pub type OneHopTable = BTreeMap<NodeId, OneHopNeighbor>;

/// Two-hop reachability: for each one-hop neighbor, the set of nodes it
/// announced in its latest HELLO. A snapshot, not an accumulation.
pub type TwoHopTable = BTreeMap<NodeId, BTreeSet<NodeId>>;

/// Apply a received HELLO to the one-hop table.
///
/// A previously unknown sender enters as unidirectional. A known sender
/// has its hold refreshed, and is promoted to bidirectional if our own id
/// appears anywhere in its announced lists, which proves it hears us.
/// Promotion never demotes: an entry already past Unidirectional keeps its
/// state (MPR status is owned by the relay selection pass).
pub fn update_one_hop(
    msg: &HelloMessage,
    one_hop: &mut OneHopTable,
    hold_until: Tick,
    own_id: NodeId,
) {
    match one_hop.get_mut(&msg.src) {
        None => {
            one_hop.insert(
                msg.src,
                OneHopNeighbor {
                    neighbor_id: msg.src,
                    state: NeighborState::Unidirectional,
                    hold_until,
                },
            );
        }
        Some(entry) => {
            entry.hold_until = hold_until;
            if entry.state == NeighborState::Unidirectional {
                let heard_us = msg
                    .unidir
                    .iter()
                    .chain(&msg.bidir)
                    .chain(&msg.mpr)
                    .any(|&id| id == own_id);
                if heard_us {
                    entry.state = NeighborState::Bidirectional;
                }
            }
        }
    }
}

/// Apply a received HELLO to the two-hop table.
///
/// The set for the sender is rebuilt from scratch out of its unidir and
/// bidir lists, excluding our own id. The mpr list is not a statement of
/// one-hop reachability from the sender and is left out.
pub fn update_two_hop(msg: &HelloMessage, two_hop: &mut TwoHopTable, own_id: NodeId) {
    let reachable: BTreeSet<NodeId> = msg
        .unidir
        .iter()
        .chain(&msg.bidir)
        .copied()
        .filter(|&id| id != own_id)
        .collect();
    two_hop.insert(msg.src, reachable);
}
