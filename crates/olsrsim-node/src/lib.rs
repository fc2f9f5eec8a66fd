//! Per-node OLSR protocol engine.
//!
//! A [`Node`] owns four time-indexed tables (one-hop neighbors, two-hop
//! neighbors, the topology table, and the MPR selector set) and advances
//! them one discrete tick at a time via [`Node::tick`]. Each tick
//! dispatches at most one incoming message, runs the periodic HELLO/TC
//! emitters, fires the one-shot data message when due, sweeps expired
//! entries, and recomputes the routing table.
//!
//! The engine is fully synchronous: it consumes typed messages and a
//! monotonic tick and returns the messages to transmit. Scheduling, the
//! medium, and link state all live in the harness.
//!
//! # Module Structure
//!
//! - [`neighbor`] - One-hop/two-hop tables and the HELLO state machine
//! - [`mpr`] - Greedy multi-point relay selection
//! - [`topology`] - Topology table and TC processing rules
//! - [`routing`] - Hop-count routing table computation
//! - [`node`] - The [`Node`] engine and tick loop

pub mod mpr;
pub mod neighbor;
pub mod node;
pub mod routing;
pub mod topology;

pub use neighbor::{NeighborState, OneHopNeighbor, OneHopTable, TwoHopTable};
pub use node::{Node, NodeError, NodeMessage};
pub use routing::RoutingEntry;
pub use topology::{TopologyEntry, TopologyTable};
