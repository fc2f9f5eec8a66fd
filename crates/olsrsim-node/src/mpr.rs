//! Multi-point relay selection.

use std::collections::BTreeSet;

use olsrsim_common::NodeId;

use crate::neighbor::{NeighborState, OneHopTable, TwoHopTable};

/// Recompute the MPR set and reassign one-hop neighbor states in place.
///
/// Candidates are the non-unidirectional one-hop neighbors that announced
/// a two-hop set, consumed in ascending id order until every announced
/// two-hop node is covered. Selected entries become [`NeighborState::Mpr`];
/// entries that lose selection fall back to bidirectional.
///
/// Selection is by ascending NodeId, not by coverage count as RFC 3626
/// specifies, so covers are valid but not minimal. The order is part of
/// the engine's determinism contract and is pinned by tests.
///
/// The pass is idempotent: running it twice over unchanged tables yields
/// the same states.
pub fn calculate_mprs(one_hop: &mut OneHopTable, two_hop: &TwoHopTable) {
    let mut candidates: Vec<NodeId> = two_hop
        .keys()
        .filter(|id| {
            one_hop
                .get(*id)
                .is_some_and(|e| e.state != NeighborState::Unidirectional)
        })
        .copied()
        .collect();
    // BTreeMap keys come out ascending already; candidates is sorted.

    let mut uncovered: BTreeSet<NodeId> = candidates
        .iter()
        .flat_map(|id| two_hop[id].iter().copied())
        .collect();

    let mut selected = BTreeSet::new();
    let mut next = 0;
    while !uncovered.is_empty() {
        let chosen = candidates[next];
        next += 1;
        selected.insert(chosen);
        for covered in &two_hop[&chosen] {
            uncovered.remove(covered);
        }
    }

    for (id, entry) in one_hop.iter_mut() {
        if selected.contains(id) {
            entry.state = NeighborState::Mpr;
        } else if entry.state == NeighborState::Mpr {
            entry.state = NeighborState::Bidirectional;
        }
    }
}
