//! The per-node engine and tick loop.

use std::collections::BTreeSet;
use std::fmt;
use std::io::{self, Write};

use thiserror::Error;
use tracing::{debug, trace};

use olsr_packet::{codec, DataMessage, HelloMessage, OlsrMessage, TcMessage};
use olsrsim_common::{
    NodeId, Tick, DEFAULT_NEIGHBOR_HOLD, DEFAULT_TOPOLOGY_HOLD, HELLO_INTERVAL, TC_INTERVAL,
};

use crate::mpr;
use crate::neighbor::{self, NeighborState, OneHopTable, TwoHopTable};
use crate::routing::{self, RoutingEntry};
use crate::topology::{self, TopologyTable};

/// Errors raised by a node during a tick.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Writing to an input or output log sink failed. Fatal for the node;
    /// retrying would not improve determinism.
    #[error("node {node}: log write failed: {source}")]
    LogWrite {
        /// The node whose sink failed.
        node: NodeId,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// The one-shot application message a node is configured to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMessage {
    /// Payload text; may contain spaces.
    pub text: String,
    /// Final destination.
    pub destination: NodeId,
    /// The tick at which to emit.
    pub send_at: Tick,
}

/// A simulated OLSR node.
///
/// Owns its four protocol tables exclusively; nothing is shared across
/// nodes. Drive it by calling [`Node::tick`] once per simulated tick with
/// at most one incoming message.
pub struct Node {
    id: NodeId,
    current_time: Tick,
    tc_sequence_num: u32,
    neighbor_hold_time: u64,
    topology_hold_time: u64,
    one_hop: OneHopTable,
    two_hop: TwoHopTable,
    topology: TopologyTable,
    ms_set: BTreeSet<NodeId>,
    routing_table: Vec<RoutingEntry>,
    data_msg: Option<NodeMessage>,
    data_sent: bool,
    /// Every message received is written here in wire form.
    input_log: Box<dyn Write + Send>,
    /// Every message transmitted is written here in wire form.
    output_log: Box<dyn Write + Send>,
}

impl Node {
    /// Create a node with default hold times and discarding log sinks.
    pub fn new(id: NodeId) -> Self {
        Node {
            id,
            current_time: Tick::ZERO,
            tc_sequence_num: 0,
            neighbor_hold_time: DEFAULT_NEIGHBOR_HOLD,
            topology_hold_time: DEFAULT_TOPOLOGY_HOLD,
            one_hop: OneHopTable::new(),
            two_hop: TwoHopTable::new(),
            topology: TopologyTable::new(),
            ms_set: BTreeSet::new(),
            routing_table: Vec::new(),
            data_msg: None,
            data_sent: false,
            input_log: Box::new(io::sink()),
            output_log: Box::new(io::sink()),
        }
    }

    /// Configure the one-shot data message.
    pub fn with_data_message(mut self, msg: NodeMessage) -> Self {
        self.data_msg = Some(msg);
        self
    }

    /// Override the neighbor and topology hold times, in ticks.
    pub fn with_hold_times(mut self, neighbor: u64, topology: u64) -> Self {
        self.neighbor_hold_time = neighbor;
        self.topology_hold_time = topology;
        self
    }

    /// Set the sink receiving all messages this node receives.
    pub fn with_input_log(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.input_log = sink;
        self
    }

    /// Set the sink receiving all messages this node transmits.
    pub fn with_output_log(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.output_log = sink;
        self
    }

    /// This node's address.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The node's current clock value.
    pub fn current_time(&self) -> Tick {
        self.current_time
    }

    /// The next TC sequence number to be emitted.
    pub fn tc_sequence_num(&self) -> u32 {
        self.tc_sequence_num
    }

    /// The one-hop neighbor table.
    pub fn one_hop_neighbors(&self) -> &OneHopTable {
        &self.one_hop
    }

    /// The two-hop neighbor table.
    pub fn two_hop_neighbors(&self) -> &TwoHopTable {
        &self.two_hop
    }

    /// The topology table.
    pub fn topology_table(&self) -> &TopologyTable {
        &self.topology
    }

    /// The MPR selector set: neighbors whose latest HELLO named this node
    /// as one of their relays.
    pub fn ms_set(&self) -> &BTreeSet<NodeId> {
        &self.ms_set
    }

    /// The routing table as of the end of the last tick.
    pub fn routing_table(&self) -> &[RoutingEntry] {
        &self.routing_table
    }

    /// Advance the node by one tick.
    ///
    /// Fixed order: dispatch the incoming message if any, run the
    /// periodic HELLO and TC emitters, fire the one-shot data message when
    /// due, sweep expired table entries, recompute routes, advance the
    /// clock. Returns the messages to transmit this tick, in emission
    /// order.
    pub fn tick(
        &mut self,
        now: Tick,
        incoming: Option<OlsrMessage>,
    ) -> Result<Vec<OlsrMessage>, NodeError> {
        let mut outgoing = Vec::new();

        if let Some(msg) = incoming {
            self.log_line(&codec::encode(&msg), LogSink::Input)?;
            trace!(node = %self.id, tick = %now, kind = %msg.kind(), "received");
            self.dispatch(msg, now, &mut outgoing)?;
        }

        if now.is_multiple_of(HELLO_INTERVAL) {
            let hello = OlsrMessage::Hello(self.hello_message());
            self.emit(hello, &mut outgoing)?;
        }
        if now.is_multiple_of(TC_INTERVAL) {
            let tc = OlsrMessage::Tc(self.tc_message());
            self.emit(tc, &mut outgoing)?;
        }
        if let Some(data) = self.due_data_message(now) {
            self.emit(OlsrMessage::Data(data), &mut outgoing)?;
        }

        self.evict_expired(now);
        self.routing_table = routing::compute_routes(self.id, &self.one_hop, &self.topology);

        self.current_time = now + 1;
        Ok(outgoing)
    }

    /// De-multiplex an incoming message to its handler.
    fn dispatch(
        &mut self,
        msg: OlsrMessage,
        now: Tick,
        outgoing: &mut Vec<OlsrMessage>,
    ) -> Result<(), NodeError> {
        match msg {
            OlsrMessage::Hello(hello) => self.handle_hello(&hello, now),
            OlsrMessage::Tc(tc) => self.handle_tc(tc, now, outgoing)?,
            OlsrMessage::Data(data) => self.handle_data(&data),
        }
        Ok(())
    }

    /// Process a HELLO: refresh the one-hop entry, snapshot the two-hop
    /// set, reselect MPRs, and track whether the sender selects us.
    fn handle_hello(&mut self, msg: &HelloMessage, now: Tick) {
        let hold_until = now + self.neighbor_hold_time;
        neighbor::update_one_hop(msg, &mut self.one_hop, hold_until, self.id);
        neighbor::update_two_hop(msg, &mut self.two_hop, self.id);
        mpr::calculate_mprs(&mut self.one_hop, &self.two_hop);

        if msg.mpr.contains(&self.id) {
            self.ms_set.insert(msg.src);
        } else {
            self.ms_set.remove(&msg.src);
        }
    }

    /// Process a TC: fold it into the topology table, then flood it on
    /// with ourselves as the last hop. Our own TCs coming back around are
    /// dropped to break the loop.
    fn handle_tc(
        &mut self,
        mut msg: TcMessage,
        now: Tick,
        outgoing: &mut Vec<OlsrMessage>,
    ) -> Result<(), NodeError> {
        if msg.src == self.id {
            return Ok(());
        }

        topology::update_topology(&msg, &mut self.topology, now + self.topology_hold_time);

        msg.from_nbr = self.id;
        self.emit(OlsrMessage::Tc(msg), outgoing)
    }

    /// Process a DATA message. Relaying would need the routing table; for
    /// now reception is recorded (the input log already has the wire
    /// line) and the message goes no further.
    fn handle_data(&mut self, msg: &DataMessage) {
        debug!(node = %self.id, src = %msg.src, dst = %msg.dst, "received data message");
    }

    /// Build the periodic HELLO from the one-hop table, partitioned by
    /// state. Lists come out ascending by id.
    fn hello_message(&self) -> HelloMessage {
        let mut unidir = Vec::new();
        let mut bidir = Vec::new();
        let mut mpr = Vec::new();
        for entry in self.one_hop.values() {
            match entry.state {
                NeighborState::Unidirectional => unidir.push(entry.neighbor_id),
                NeighborState::Bidirectional => bidir.push(entry.neighbor_id),
                NeighborState::Mpr => mpr.push(entry.neighbor_id),
            }
        }
        HelloMessage {
            src: self.id,
            unidir,
            bidir,
            mpr,
        }
    }

    /// Build the periodic TC announcing the MS set, consuming one
    /// sequence number.
    fn tc_message(&mut self) -> TcMessage {
        let msg = TcMessage {
            src: self.id,
            from_nbr: self.id,
            seq: self.tc_sequence_num,
            ms: self.ms_set.iter().copied().collect(),
        };
        self.tc_sequence_num += 1;
        msg
    }

    /// The one-shot data message, if this is its tick. Next hop is the
    /// destination itself until data relaying is wired to the routing
    /// table.
    fn due_data_message(&mut self, now: Tick) -> Option<DataMessage> {
        let msg = self.data_msg.as_ref()?;
        if self.data_sent || now != msg.send_at {
            return None;
        }
        self.data_sent = true;
        Some(DataMessage {
            src: self.id,
            dst: msg.destination,
            next_hop: msg.destination,
            from_nbr: self.id,
            payload: msg.text.clone(),
        })
    }

    /// Sweep expired entries. An expiring one-hop neighbor takes its
    /// announced two-hop set and its MS membership with it; topology
    /// entries expire independently.
    fn evict_expired(&mut self, now: Tick) {
        let expired: Vec<NodeId> = self
            .one_hop
            .values()
            .filter(|entry| entry.hold_until <= now)
            .map(|entry| entry.neighbor_id)
            .collect();
        for id in expired {
            debug!(node = %self.id, neighbor = %id, tick = %now, "neighbor expired");
            self.one_hop.remove(&id);
            self.two_hop.remove(&id);
            self.ms_set.remove(&id);
        }

        topology::evict_expired(&mut self.topology, now);
    }

    /// Log and queue an outgoing message.
    fn emit(
        &mut self,
        msg: OlsrMessage,
        outgoing: &mut Vec<OlsrMessage>,
    ) -> Result<(), NodeError> {
        self.log_line(&codec::encode(&msg), LogSink::Output)?;
        trace!(node = %self.id, kind = %msg.kind(), "sent");
        outgoing.push(msg);
        Ok(())
    }

    fn log_line(&mut self, line: &str, sink: LogSink) -> Result<(), NodeError> {
        let writer = match sink {
            LogSink::Input => &mut self.input_log,
            LogSink::Output => &mut self.output_log,
        };
        writeln!(writer, "{line}").map_err(|source| NodeError::LogWrite {
            node: self.id,
            source,
        })
    }
}

enum LogSink {
    Input,
    Output,
}

// The log sinks are opaque writers, so Debug covers the tables only.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("current_time", &self.current_time)
            .field("tc_sequence_num", &self.tc_sequence_num)
            .field("one_hop", &self.one_hop)
            .field("two_hop", &self.two_hop)
            .field("topology", &self.topology)
            .field("ms_set", &self.ms_set)
            .field("routing_table", &self.routing_table)
            .finish_non_exhaustive()
    }
}
