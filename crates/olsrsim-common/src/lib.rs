//! Shared types for the OLSR simulator.
//!
//! This crate defines the two fundamental identifiers that every other crate
//! speaks in: [`NodeId`] for node addresses and [`Tick`] for discrete
//! simulation time. It also carries the protocol timing constants so the
//! node engine and the harness agree on cadence without a config round-trip.

use std::fmt;
use std::num::ParseIntError;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

/// Interval, in ticks, between periodic HELLO emissions.
pub const HELLO_INTERVAL: u64 = 5;

/// Interval, in ticks, between periodic TC emissions.
pub const TC_INTERVAL: u64 = 10;

/// Default hold time for one-hop neighbor entries, in ticks.
pub const DEFAULT_NEIGHBOR_HOLD: u64 = 15;

/// Default hold time for topology table entries, in ticks.
pub const DEFAULT_TOPOLOGY_HOLD: u64 = 30;

/// A unique identifier differentiating nodes in the simulated network.
///
/// Every non-negative value is a valid address; ordering is total and is
/// relied on wherever iteration order reaches emitted output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a node id from its raw value.
    pub const fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// The raw numeric value.
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId(id)
    }
}

impl FromStr for NodeId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u32>().map(NodeId)
    }
}

/// A discrete unit of simulated time.
///
/// Ticks are monotonic and start at [`Tick::ZERO`]. All protocol timing
/// (emission cadence, hold expiry) is expressed in whole ticks; there is no
/// wall-clock coupling anywhere in the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tick(u64);

impl Tick {
    /// The start of simulated time.
    pub const ZERO: Tick = Tick(0);

    /// Create a tick from its raw value.
    pub const fn new(t: u64) -> Self {
        Tick(t)
    }

    /// The raw tick count.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Whether this tick falls on a multiple of `interval`.
    ///
    /// Tick zero is a multiple of every interval, so all periodic emitters
    /// fire on the very first tick.
    pub const fn is_multiple_of(&self, interval: u64) -> bool {
        self.0 % interval == 0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add<u64> for Tick {
    type Output = Tick;

    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl AddAssign<u64> for Tick {
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_ordering_follows_raw_value() {
        let mut ids = vec![NodeId::new(7), NodeId::new(0), NodeId::new(3)];
        ids.sort();
        assert_eq!(ids, vec![NodeId::new(0), NodeId::new(3), NodeId::new(7)]);
    }

    #[test]
    fn node_id_parses_any_non_negative_integer() {
        assert_eq!("0".parse::<NodeId>().unwrap(), NodeId::new(0));
        assert_eq!("4294967295".parse::<NodeId>().unwrap(), NodeId::new(u32::MAX));
        assert!("-1".parse::<NodeId>().is_err());
        assert!("x".parse::<NodeId>().is_err());
    }

    #[test]
    fn tick_arithmetic() {
        let mut t = Tick::ZERO;
        t += 4;
        assert_eq!(t + 1, Tick::new(5));
        assert!(Tick::new(10).is_multiple_of(5));
        assert!(Tick::ZERO.is_multiple_of(5));
        assert!(!Tick::new(7).is_multiple_of(5));
    }
}
