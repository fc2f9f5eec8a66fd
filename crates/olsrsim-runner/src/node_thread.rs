//! Per-node threading infrastructure.
//!
//! Each simulated node runs on its own thread, owning its [`Node`] engine
//! and an inbox of not-yet-consumed messages. The coordinator drives the
//! thread over a command channel and receives results on a shared report
//! channel.
//!
//! The inbox realizes the at-most-one-message-per-tick contract: deliveries
//! queue up in arrival order and the engine consumes exactly one per tick,
//! if any is waiting.

use std::collections::VecDeque;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender};
use tracing::debug;

use olsr_packet::OlsrMessage;
use olsrsim_common::{NodeId, Tick};
use olsrsim_node::Node;

/// Commands sent from the coordinator to a node thread.
#[derive(Debug)]
pub enum NodeCommand {
    /// Run one tick of the node engine at the given time.
    ///
    /// The thread consumes at most one inbox message and reports back with
    /// [`NodeReport::TickComplete`].
    Tick {
        /// The current simulation time.
        now: Tick,
    },

    /// A message delivered over an up link; queued into the inbox.
    Deliver(OlsrMessage),

    /// Stop the node thread, handing the engine back for inspection.
    Shutdown,
}

/// Reports sent from a node thread back to the coordinator.
#[derive(Debug)]
pub enum NodeReport {
    /// The tick ran; here is what the node wants transmitted.
    TickComplete {
        /// Which node completed.
        node: NodeId,
        /// Messages to route, in emission order.
        outgoing: Vec<OlsrMessage>,
    },

    /// The tick failed. The node has aborted; its thread exits.
    Error {
        /// Which node failed.
        node: NodeId,
        /// Description of the failure.
        message: String,
    },

    /// The node shut down; its engine is returned for final inspection.
    Shutdown {
        /// The node engine, with all tables intact.
        node: Box<Node>,
    },
}

/// Handle to a running node thread, held by the coordinator.
pub struct NodeThreadHandle {
    cmd_tx: Sender<NodeCommand>,
    id: NodeId,
    thread: JoinHandle<()>,
}

impl NodeThreadHandle {
    /// Send a command to the node thread.
    pub fn send(
        &self,
        cmd: NodeCommand,
    ) -> Result<(), crossbeam_channel::SendError<NodeCommand>> {
        self.cmd_tx.send(cmd)
    }

    /// The node's address.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether the thread has exited (possibly due to a panic).
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Join the node thread, blocking until it exits.
    pub fn join(self) -> Result<(), Box<dyn std::any::Any + Send + 'static>> {
        self.thread.join()
    }
}

/// Spawn a node thread around the given engine.
///
/// The thread begins listening for commands immediately and exits on
/// [`NodeCommand::Shutdown`], on a failed tick, or when the command
/// channel closes.
pub fn spawn_node_thread(node: Node, report_tx: Sender<NodeReport>) -> NodeThreadHandle {
    let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded();
    let id = node.id();

    let thread = thread::Builder::new()
        .name(format!("node-{id}"))
        .spawn(move || {
            node_thread_main(node, cmd_rx, report_tx);
        })
        .expect("failed to spawn node thread");

    NodeThreadHandle { cmd_tx, id, thread }
}

/// Main loop for a node thread.
fn node_thread_main(mut node: Node, cmd_rx: Receiver<NodeCommand>, report_tx: Sender<NodeReport>) {
    let mut inbox: VecDeque<OlsrMessage> = VecDeque::new();

    loop {
        match cmd_rx.recv() {
            Ok(NodeCommand::Deliver(msg)) => {
                inbox.push_back(msg);
            }
            Ok(NodeCommand::Tick { now }) => {
                let incoming = inbox.pop_front();
                match node.tick(now, incoming) {
                    Ok(outgoing) => {
                        let report = NodeReport::TickComplete {
                            node: node.id(),
                            outgoing,
                        };
                        if report_tx.send(report).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        let _ = report_tx.send(NodeReport::Error {
                            node: node.id(),
                            message: err.to_string(),
                        });
                        break;
                    }
                }
            }
            Ok(NodeCommand::Shutdown) => {
                debug!(node = %node.id(), "node thread shutting down");
                let _ = report_tx.send(NodeReport::Shutdown {
                    node: Box::new(node),
                });
                break;
            }
            Err(_) => {
                // Coordinator dropped us.
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use olsr_packet::{HelloMessage, TcMessage};

    use super::*;

    fn hello(src: u32) -> OlsrMessage {
        OlsrMessage::Hello(HelloMessage {
            src: NodeId::new(src),
            unidir: vec![],
            bidir: vec![],
            mpr: vec![],
        })
    }

    #[test]
    fn tick_reports_outgoing_messages() {
        let (report_tx, report_rx) = crossbeam_channel::unbounded();
        let handle = spawn_node_thread(Node::new(NodeId::new(0)), report_tx);

        handle.send(NodeCommand::Tick { now: Tick::ZERO }).unwrap();

        let NodeReport::TickComplete { node, outgoing } = report_rx.recv().unwrap() else {
            panic!("expected TickComplete");
        };
        assert_eq!(node, NodeId::new(0));
        // Tick 0 emits a HELLO and a TC.
        assert_eq!(outgoing.len(), 2);

        handle.send(NodeCommand::Shutdown).unwrap();
        assert!(matches!(
            report_rx.recv().unwrap(),
            NodeReport::Shutdown { .. }
        ));
        handle.join().unwrap();
    }

    #[test]
    fn inbox_drains_one_message_per_tick() {
        let (report_tx, report_rx) = crossbeam_channel::unbounded();
        let handle = spawn_node_thread(Node::new(NodeId::new(0)), report_tx);

        handle.send(NodeCommand::Deliver(hello(1))).unwrap();
        handle.send(NodeCommand::Deliver(hello(2))).unwrap();

        // Two non-emitting ticks, each consuming one queued HELLO.
        handle.send(NodeCommand::Tick { now: Tick::new(1) }).unwrap();
        let _ = report_rx.recv().unwrap();
        handle.send(NodeCommand::Tick { now: Tick::new(2) }).unwrap();
        let _ = report_rx.recv().unwrap();

        handle.send(NodeCommand::Shutdown).unwrap();
        let NodeReport::Shutdown { node } = report_rx.recv().unwrap() else {
            panic!("expected Shutdown");
        };
        // Both senders are discovered: one per tick.
        assert_eq!(node.one_hop_neighbors().len(), 2);
        handle.join().unwrap();
    }

    #[test]
    fn shutdown_returns_the_engine_with_state() {
        let (report_tx, report_rx) = crossbeam_channel::unbounded();
        let handle = spawn_node_thread(Node::new(NodeId::new(7)), report_tx);

        let tc = OlsrMessage::Tc(TcMessage {
            src: NodeId::new(5),
            from_nbr: NodeId::new(5),
            seq: 3,
            ms: vec![NodeId::new(9)],
        });
        handle.send(NodeCommand::Deliver(tc)).unwrap();
        handle.send(NodeCommand::Tick { now: Tick::new(1) }).unwrap();
        let _ = report_rx.recv().unwrap();

        handle.send(NodeCommand::Shutdown).unwrap();
        let NodeReport::Shutdown { node } = report_rx.recv().unwrap() else {
            panic!("expected Shutdown");
        };
        assert_eq!(node.id(), NodeId::new(7));
        assert!(node.topology_table().contains_key(&NodeId::new(9)));
        handle.join().unwrap();
    }
}
