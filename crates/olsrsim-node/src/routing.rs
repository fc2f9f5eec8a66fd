//! Routing table computation.
//!
//! Routes are shortest paths by hop count over the edges this node can
//! currently vouch for: its own bidirectional (or MPR) one-hop links, plus
//! the last-hop edges `dst_mpr -> dst` learned from TC messages. All edges
//! weigh one hop, so a breadth-first search from self is the whole
//! computation. Frontier expansion visits neighbors in ascending id order,
//! keeping the resulting table deterministic.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use olsrsim_common::NodeId;

use crate::neighbor::{NeighborState, OneHopTable};
use crate::topology::TopologyTable;

/// A routing table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingEntry {
    /// Destination address.
    pub dst: NodeId,
    /// One-hop neighbor to hand the message to.
    pub next_hop: NodeId,
    /// Path length in hops.
    pub distance: u32,
}

/// Compute the routing table from the current neighbor and topology tables.
///
/// Returns entries sorted by destination. Unreachable nodes simply have no
/// row. Unidirectional neighbors are not usable first hops and contribute
/// nothing.
pub fn compute_routes(
    own_id: NodeId,
    one_hop: &OneHopTable,
    topology: &TopologyTable,
) -> Vec<RoutingEntry> {
    // Last-hop edges from the topology table, grouped by the advertising
    // MPR so the search can walk mpr -> selector.
    let mut edges: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();
    for (dst, entries) in topology {
        for mpr in entries.keys() {
            edges.entry(*mpr).or_default().insert(*dst);
        }
    }

    let mut routes: BTreeMap<NodeId, RoutingEntry> = BTreeMap::new();
    let mut queue = VecDeque::new();

    for entry in one_hop.values() {
        if entry.state == NeighborState::Unidirectional {
            continue;
        }
        routes.insert(
            entry.neighbor_id,
            RoutingEntry {
                dst: entry.neighbor_id,
                next_hop: entry.neighbor_id,
                distance: 1,
            },
        );
        queue.push_back(entry.neighbor_id);
    }

    while let Some(current) = queue.pop_front() {
        let Some(reachable) = edges.get(&current) else {
            continue;
        };
        let via = routes[&current];
        for &dst in reachable {
            if dst == own_id || routes.contains_key(&dst) {
                continue;
            }
            routes.insert(
                dst,
                RoutingEntry {
                    dst,
                    next_hop: via.next_hop,
                    distance: via.distance + 1,
                },
            );
            queue.push_back(dst);
        }
    }

    routes.into_values().collect()
}

#[cfg(test)]
mod tests {
    use olsrsim_common::Tick;

    use super::*;
    use crate::neighbor::OneHopNeighbor;
    use crate::topology::{update_topology, TopologyTable};
    use olsr_packet::TcMessage;

    fn one_hop(entries: &[(u32, NeighborState)]) -> OneHopTable {
        entries
            .iter()
            .map(|&(id, state)| {
                (
                    NodeId::new(id),
                    OneHopNeighbor {
                        neighbor_id: NodeId::new(id),
                        state,
                        hold_until: Tick::new(20),
                    },
                )
            })
            .collect()
    }

    fn topology(edges: &[(u32, &[u32])]) -> TopologyTable {
        let mut table = TopologyTable::new();
        for &(mpr, dsts) in edges {
            let msg = TcMessage {
                src: NodeId::new(mpr),
                from_nbr: NodeId::new(mpr),
                seq: 0,
                ms: dsts.iter().copied().map(NodeId::new).collect(),
            };
            update_topology(&msg, &mut table, Tick::new(100));
        }
        table
    }

    #[test]
    fn bidirectional_neighbors_route_directly() {
        let routes = compute_routes(
            NodeId::new(0),
            &one_hop(&[
                (1, NeighborState::Bidirectional),
                (2, NeighborState::Unidirectional),
            ]),
            &TopologyTable::new(),
        );

        assert_eq!(
            routes,
            vec![RoutingEntry {
                dst: NodeId::new(1),
                next_hop: NodeId::new(1),
                distance: 1,
            }]
        );
    }

    #[test]
    fn topology_edges_extend_reach_through_the_first_hop() {
        // 0 - 1 (bidir), and TC told us node 1 relays for node 2.
        let routes = compute_routes(
            NodeId::new(0),
            &one_hop(&[(1, NeighborState::Mpr)]),
            &topology(&[(1, &[2]), (2, &[3])]),
        );

        assert_eq!(
            routes,
            vec![
                RoutingEntry {
                    dst: NodeId::new(1),
                    next_hop: NodeId::new(1),
                    distance: 1,
                },
                RoutingEntry {
                    dst: NodeId::new(2),
                    next_hop: NodeId::new(1),
                    distance: 2,
                },
                RoutingEntry {
                    dst: NodeId::new(3),
                    next_hop: NodeId::new(1),
                    distance: 3,
                },
            ]
        );
    }

    #[test]
    fn direct_link_wins_over_topology_detour() {
        // Node 2 is both a direct neighbor and advertised behind node 1.
        let routes = compute_routes(
            NodeId::new(0),
            &one_hop(&[
                (1, NeighborState::Bidirectional),
                (2, NeighborState::Bidirectional),
            ]),
            &topology(&[(1, &[2])]),
        );

        let to_2 = routes.iter().find(|r| r.dst == NodeId::new(2)).unwrap();
        assert_eq!(to_2.distance, 1);
        assert_eq!(to_2.next_hop, NodeId::new(2));
    }

    #[test]
    fn own_id_never_appears_as_destination() {
        let routes = compute_routes(
            NodeId::new(0),
            &one_hop(&[(1, NeighborState::Bidirectional)]),
            &topology(&[(1, &[0])]),
        );

        assert!(routes.iter().all(|r| r.dst != NodeId::new(0)));
    }

    #[test]
    fn detached_topology_edges_are_unreachable() {
        // An edge 5 -> 6 with no path to node 5 contributes nothing.
        let routes = compute_routes(
            NodeId::new(0),
            &one_hop(&[(1, NeighborState::Bidirectional)]),
            &topology(&[(5, &[6])]),
        );

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].dst, NodeId::new(1));
    }
}
