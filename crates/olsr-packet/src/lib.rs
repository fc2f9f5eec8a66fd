//! OLSR message types and wire codec.
//!
//! This crate defines the three OLSR message kinds exchanged by simulated
//! nodes and the line-based text format they are serialized in:
//!
//! ```text
//! HELLO: * <src> HELLO UNIDIR <ids…> BIDIR <ids…> MPR <ids…>
//! TC:    * <fromnbr> TC <src> <seq> MS <ids…>
//! DATA:  <nxtHop> <fromnbr> DATA <src> <dst> <payload>
//! ```
//!
//! Messages cross the simulated medium as typed values; the wire form is
//! used for the per-node input/output logs and anywhere a message needs to
//! be read back from text. The leading `*` marks a broadcast with no
//! specific next hop. Empty id lists render as an empty field with the
//! section keyword kept in place.

pub mod codec;
pub mod error;
pub mod types;

pub use codec::{encode, parse};
pub use error::{PacketError, PacketResult};
pub use types::{DataMessage, HelloMessage, MessageKind, OlsrMessage, TcMessage};
