//! OLSR message types.

use std::fmt;

use olsrsim_common::NodeId;

use crate::codec;

/// The kind tag of an OLSR message, as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Periodic one-hop neighbor broadcast.
    Hello,
    /// Flooded topology control message.
    Tc,
    /// Application data message.
    Data,
}

impl MessageKind {
    /// The wire keyword for this kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Hello => "HELLO",
            MessageKind::Tc => "TC",
            MessageKind::Data => "DATA",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A HELLO message: the sender's current view of its one-hop neighborhood,
/// partitioned by link state.
///
/// Receivers look for their own id in any of the three lists to conclude
/// the link back to `src` is bidirectional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloMessage {
    /// Originating node.
    pub src: NodeId,
    /// Neighbors heard but not yet known to hear us.
    pub unidir: Vec<NodeId>,
    /// Neighbors with a confirmed mutual link.
    pub bidir: Vec<NodeId>,
    /// Bidirectional neighbors currently selected as multi-point relays.
    pub mpr: Vec<NodeId>,
}

/// A topology control (TC) message advertising the sender's MPR selector
/// set, flooded through the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcMessage {
    /// Originating node.
    pub src: NodeId,
    /// The neighbor this copy was last forwarded by.
    pub from_nbr: NodeId,
    /// Originator's sequence number, for duplicate suppression.
    pub seq: u32,
    /// The originator's MPR selector set.
    pub ms: Vec<NodeId>,
}

/// An application data message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataMessage {
    /// Originating node.
    pub src: NodeId,
    /// Final destination.
    pub dst: NodeId,
    /// The neighbor this copy should be handled by next.
    pub next_hop: NodeId,
    /// The neighbor this copy was last forwarded by.
    pub from_nbr: NodeId,
    /// The payload text; may contain spaces.
    pub payload: String,
}

/// A tagged OLSR message, as delivered by the simulated medium.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OlsrMessage {
    /// A [`HelloMessage`].
    Hello(HelloMessage),
    /// A [`TcMessage`].
    Tc(TcMessage),
    /// A [`DataMessage`].
    Data(DataMessage),
}

impl OlsrMessage {
    /// The kind tag of this message.
    pub const fn kind(&self) -> MessageKind {
        match self {
            OlsrMessage::Hello(_) => MessageKind::Hello,
            OlsrMessage::Tc(_) => MessageKind::Tc,
            OlsrMessage::Data(_) => MessageKind::Data,
        }
    }

    /// The originating node of this message.
    pub fn src(&self) -> NodeId {
        match self {
            OlsrMessage::Hello(m) => m.src,
            OlsrMessage::Tc(m) => m.src,
            OlsrMessage::Data(m) => m.src,
        }
    }
}

impl fmt::Display for HelloMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::encode_hello(self))
    }
}

impl fmt::Display for TcMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::encode_tc(self))
    }
}

impl fmt::Display for DataMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::encode_data(self))
    }
}

impl fmt::Display for OlsrMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&codec::encode(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags() {
        let hello = OlsrMessage::Hello(HelloMessage {
            src: NodeId::new(1),
            unidir: vec![],
            bidir: vec![],
            mpr: vec![],
        });
        assert_eq!(hello.kind(), MessageKind::Hello);
        assert_eq!(hello.kind().as_str(), "HELLO");
        assert_eq!(hello.src(), NodeId::new(1));
    }
}
