//! Simulation harness for the OLSR node engine.
//!
//! The runner owns everything around the protocol core: parsing the node
//! configuration and link-state schedule, answering link queries through
//! the [`LinkTopology`] oracle, running each node on its own thread, and
//! driving them all in lockstep from the [`Coordinator`].
//!
//! ## Architecture
//!
//! Each node runs on a dedicated thread with a command channel in and a
//! shared report channel out. Per tick the coordinator:
//!
//! 1. Broadcasts `Tick { now }` to every node thread
//! 2. Collects a `TickComplete` report (with outgoing messages) from each
//! 3. Routes every outgoing message through the link oracle at `now`,
//!    delivering to each receiver whose link from the sender is up
//!
//! Deliveries are enqueued before the next tick begins, in ascending
//! sender order, so runs are fully deterministic. A node consumes at most
//! one buffered message per tick; the rest wait their turn in its inbox.

pub mod config;
pub mod coordinator;
pub mod link_state;
pub mod node_thread;
pub mod stats;

pub use config::{read_node_configs, ConfigError, NodeConfig};
pub use coordinator::{Coordinator, SimError};
pub use link_state::{LinkStateError, LinkTopology};
pub use node_thread::{spawn_node_thread, NodeCommand, NodeReport, NodeThreadHandle};
pub use stats::SimulationStats;

pub use olsrsim_common::{NodeId, Tick};
pub use olsrsim_node::{Node, NodeMessage};
