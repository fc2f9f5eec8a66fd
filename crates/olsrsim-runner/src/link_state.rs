//! Link-state schedule parsing and the link oracle.
//!
//! The schedule is one link-state change per line, sorted by
//! non-decreasing time:
//!
//! ```text
//! <fromNode> <toNode> <time> <up|down>
//! ```
//!
//! Links are directional: `0 1 5 up` says nothing about the 1→0
//! direction. The oracle answers whether a link is up at a tick by
//! locating the most recent event at or before it; a link that has never
//! appeared in the schedule is down.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Read};

use thiserror::Error;

use olsrsim_common::{NodeId, Tick};

/// Errors that can occur while reading the link-state schedule.
#[derive(Debug, Error)]
pub enum LinkStateError {
    /// Reading the input stream failed.
    #[error("read link-state schedule: {0}")]
    Io(#[from] std::io::Error),

    /// A line did not match the expected shape.
    #[error("link-state line {line}: {reason}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },

    /// Event times must be non-decreasing across the whole input.
    #[error("link-state line {line}: time {time} is earlier than a previous entry")]
    NonMonotonicTime {
        /// 1-based line number.
        line: usize,
        /// The out-of-order time.
        time: Tick,
    },
}

/// A single scheduled change on a directional link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LinkEvent {
    time: Tick,
    up: bool,
}

/// The network-topology oracle: the full link-state schedule, queryable
/// at any tick.
#[derive(Debug, Default)]
pub struct LinkTopology {
    /// from → to → events, chronological within each link.
    links: BTreeMap<NodeId, BTreeMap<NodeId, Vec<LinkEvent>>>,
}

impl LinkTopology {
    /// An oracle with no links; every query answers down.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a schedule from a stream, enforcing non-decreasing times.
    pub fn from_reader<R: Read>(input: R) -> Result<Self, LinkStateError> {
        let reader = BufReader::new(input);
        let mut topology = LinkTopology::new();
        let mut current_time = Tick::ZERO;

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let line_no = index + 1;
            let (from, to, time, up) =
                parse_line(trimmed).map_err(|reason| LinkStateError::Malformed {
                    line: line_no,
                    reason,
                })?;

            if time < current_time {
                return Err(LinkStateError::NonMonotonicTime {
                    line: line_no,
                    time,
                });
            }
            current_time = time;

            topology
                .links
                .entry(from)
                .or_default()
                .entry(to)
                .or_default()
                .push(LinkEvent { time, up });
        }

        Ok(topology)
    }

    /// Whether the link `from → to` is up at `at`.
    pub fn query(&self, from: NodeId, to: NodeId, at: Tick) -> bool {
        let Some(events) = self.links.get(&from).and_then(|dsts| dsts.get(&to)) else {
            return false;
        };
        // Events are chronological; the last one at or before `at` wins.
        let idx = events.partition_point(|event| event.time <= at);
        idx > 0 && events[idx - 1].up
    }
}

fn parse_line(line: &str) -> Result<(NodeId, NodeId, Tick, bool), String> {
    let mut tokens = line.split_whitespace();
    let from = parse_id(tokens.next(), "from node")?;
    let to = parse_id(tokens.next(), "to node")?;
    let time = match tokens.next() {
        Some(token) => Tick::new(
            token
                .parse::<u64>()
                .map_err(|_| format!("invalid time {token:?}"))?,
        ),
        None => return Err("missing time".to_string()),
    };
    let up = match tokens.next() {
        Some("up") => true,
        Some("down") => false,
        Some(other) => return Err(format!("invalid link state {other:?}, expected up or down")),
        None => return Err("missing link state".to_string()),
    };
    if let Some(extra) = tokens.next() {
        return Err(format!("unexpected trailing field {extra:?}"));
    }
    Ok((from, to, time, up))
}

fn parse_id(token: Option<&str>, field: &str) -> Result<NodeId, String> {
    let token = token.ok_or_else(|| format!("missing {field}"))?;
    token
        .parse::<NodeId>()
        .map_err(|_| format!("invalid {field} {token:?}"))
}
