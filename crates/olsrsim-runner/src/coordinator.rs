//! The lockstep tick driver.

use std::collections::BTreeMap;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;
use tracing::{info, warn};

use olsr_packet::OlsrMessage;
use olsrsim_common::{NodeId, Tick};
use olsrsim_node::Node;

use crate::link_state::LinkTopology;
use crate::node_thread::{spawn_node_thread, NodeCommand, NodeReport, NodeThreadHandle};
use crate::stats::SimulationStats;

/// How long shutdown waits for each straggling node thread.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors that can abort a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    /// A node thread's command channel closed unexpectedly.
    #[error("node {0}: command channel closed")]
    CommandChannelClosed(NodeId),

    /// The shared report channel closed with reports outstanding.
    #[error("report channel closed unexpectedly")]
    ReportChannelClosed,

    /// A node aborted its tick.
    #[error("node {node}: {message}")]
    Node {
        /// The node that failed.
        node: NodeId,
        /// Its reported failure.
        message: String,
    },

    /// A node shut down while the run was still in progress.
    #[error("node shut down mid-run")]
    UnexpectedShutdown,

    /// One or more node threads panicked during shutdown.
    #[error("node thread panicked: {0}")]
    ThreadPanic(String),
}

/// Drives all node threads in lockstep and routes their messages through
/// the link oracle.
pub struct Coordinator {
    handles: Vec<NodeThreadHandle>,
    report_rx: Receiver<NodeReport>,
    report_tx: Sender<NodeReport>,
    topology: LinkTopology,
    current_tick: Tick,
    stats: SimulationStats,
}

impl Coordinator {
    /// Create a coordinator over the given link oracle, with no nodes yet.
    pub fn new(topology: LinkTopology) -> Self {
        let (report_tx, report_rx) = crossbeam_channel::unbounded();
        Coordinator {
            handles: Vec::new(),
            report_rx,
            report_tx,
            topology,
            current_tick: Tick::ZERO,
            stats: SimulationStats::default(),
        }
    }

    /// Spawn a thread for the given node engine and register it.
    pub fn add_node(&mut self, node: Node) {
        let handle = spawn_node_thread(node, self.report_tx.clone());
        self.handles.push(handle);
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.handles.len()
    }

    /// The next tick to be run.
    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    /// Run the simulation for `ticks` further ticks.
    pub fn run(&mut self, ticks: u64) -> Result<SimulationStats, SimError> {
        info!(nodes = self.handles.len(), ticks, "simulation starting");
        for _ in 0..ticks {
            self.step()?;
        }
        info!(
            sent = self.stats.messages_sent,
            delivered = self.stats.messages_delivered,
            "simulation finished"
        );
        Ok(self.stats.clone())
    }

    /// Run a single tick: broadcast it, collect every node's outgoing
    /// messages, then route them for delivery before the next tick.
    fn step(&mut self) -> Result<(), SimError> {
        let now = self.current_tick;

        for handle in &self.handles {
            handle
                .send(NodeCommand::Tick { now })
                .map_err(|_| SimError::CommandChannelClosed(handle.id()))?;
        }

        // Collect one TickComplete per node. Keyed by sender so routing
        // below runs in ascending node order regardless of report arrival.
        let mut outgoing: BTreeMap<NodeId, Vec<OlsrMessage>> = BTreeMap::new();
        let mut pending = self.handles.len();
        while pending > 0 {
            match self.report_rx.recv() {
                Ok(NodeReport::TickComplete { node, outgoing: msgs }) => {
                    outgoing.insert(node, msgs);
                    pending -= 1;
                }
                Ok(NodeReport::Error { node, message }) => {
                    warn!(%node, %message, "node aborted; tearing simulation down");
                    return Err(SimError::Node { node, message });
                }
                Ok(NodeReport::Shutdown { .. }) => return Err(SimError::UnexpectedShutdown),
                Err(_) => return Err(SimError::ReportChannelClosed),
            }
        }

        for (&sender, msgs) in &outgoing {
            for msg in msgs {
                self.stats.record_sent(msg.kind());
                for handle in &self.handles {
                    let receiver = handle.id();
                    if receiver == sender {
                        continue;
                    }
                    if self.topology.query(sender, receiver, now) {
                        handle
                            .send(NodeCommand::Deliver(msg.clone()))
                            .map_err(|_| SimError::CommandChannelClosed(receiver))?;
                        self.stats.record_delivered(msg.kind());
                    } else {
                        self.stats.record_dropped(msg.kind());
                    }
                }
            }
        }

        self.stats.record_tick();
        self.current_tick = now + 1;
        Ok(())
    }

    /// Stop all node threads and hand their engines back, sorted by id.
    pub fn shutdown(self) -> Result<Vec<Node>, SimError> {
        for handle in &self.handles {
            // A thread that already died has a closed channel; its absence
            // is noticed below.
            let _ = handle.send(NodeCommand::Shutdown);
        }

        let mut nodes = Vec::with_capacity(self.handles.len());
        let mut pending = self.handles.len();
        while pending > 0 {
            match self.report_rx.recv_timeout(SHUTDOWN_TIMEOUT) {
                Ok(NodeReport::Shutdown { node }) => {
                    nodes.push(*node);
                    pending -= 1;
                }
                Ok(_) => {
                    // Stale tick reports from the final round.
                }
                Err(_) => break,
            }
        }

        let mut panics = Vec::new();
        for handle in self.handles {
            let id = handle.id();
            if handle.join().is_err() {
                panics.push(id.to_string());
            }
        }
        if !panics.is_empty() {
            return Err(SimError::ThreadPanic(panics.join(", ")));
        }

        nodes.sort_by_key(|node| node.id());
        Ok(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_coordinator_runs_and_shuts_down() {
        let mut coordinator = Coordinator::new(LinkTopology::new());
        let stats = coordinator.run(10).unwrap();
        assert_eq!(stats.ticks_run, 10);
        assert_eq!(stats.messages_sent, 0);
        assert!(coordinator.shutdown().unwrap().is_empty());
    }

    #[test]
    fn isolated_nodes_send_but_never_deliver() {
        // Two nodes, no links: everything is dropped by the oracle.
        let mut coordinator = Coordinator::new(LinkTopology::new());
        coordinator.add_node(Node::new(NodeId::new(0)));
        coordinator.add_node(Node::new(NodeId::new(1)));

        let stats = coordinator.run(11).unwrap();

        // Per node: HELLO at 0, 5, 10 and TC at 0, 10.
        assert_eq!(stats.messages_sent, 10);
        assert_eq!(stats.hello_sent, 6);
        assert_eq!(stats.tc_sent, 4);
        assert_eq!(stats.messages_delivered, 0);
        assert_eq!(stats.messages_dropped, 10);

        let nodes = coordinator.shutdown().unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.one_hop_neighbors().is_empty()));
    }

    #[test]
    fn one_way_link_yields_a_unidirectional_neighbor() {
        let topology = LinkTopology::from_reader("0 1 0 up\n".as_bytes()).unwrap();
        let mut coordinator = Coordinator::new(topology);
        coordinator.add_node(Node::new(NodeId::new(0)));
        coordinator.add_node(Node::new(NodeId::new(1)));

        coordinator.run(12).unwrap();
        let nodes = coordinator.shutdown().unwrap();

        // Node 1 hears node 0 but never confirms the reverse direction.
        let entry = &nodes[1].one_hop_neighbors()[&NodeId::new(0)];
        assert_eq!(entry.state, olsrsim_node::NeighborState::Unidirectional);
        assert!(nodes[0].one_hop_neighbors().is_empty());
    }

    #[test]
    fn nodes_are_returned_sorted_by_id() {
        let mut coordinator = Coordinator::new(LinkTopology::new());
        coordinator.add_node(Node::new(NodeId::new(5)));
        coordinator.add_node(Node::new(NodeId::new(1)));
        coordinator.add_node(Node::new(NodeId::new(3)));

        coordinator.run(1).unwrap();
        let nodes = coordinator.shutdown().unwrap();

        let ids: Vec<u32> = nodes.iter().map(|n| n.id().as_u32()).collect();
        assert_eq!(ids, vec![1, 3, 5]);
    }
}
