//! Node configuration input parsing.
//!
//! One line per node:
//!
//! ```text
//! <nodeID> <destinationID> "<payload>" <sendAtTick>
//! ```
//!
//! The payload is double-quoted and may contain spaces. A line carrying
//! only a node id declares a node with no message to send. Blank lines are
//! skipped. Any malformed line is fatal for startup.

use std::io::{BufRead, BufReader, Read};

use thiserror::Error;

use olsrsim_common::{NodeId, Tick};
use olsrsim_node::NodeMessage;

/// Errors that can occur while reading the node configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the input stream failed.
    #[error("read node configuration: {0}")]
    Io(#[from] std::io::Error),

    /// A line did not match the expected shape.
    #[error("node configuration line {line}: {reason}")]
    Malformed {
        /// 1-based line number.
        line: usize,
        /// What was wrong.
        reason: String,
    },
}

/// Configuration for a single node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    /// The node's address.
    pub id: NodeId,
    /// The one-shot data message, if the node has one to send.
    pub message: Option<NodeMessage>,
}

/// Read all node configurations from a stream.
pub fn read_node_configs<R: Read>(input: R) -> Result<Vec<NodeConfig>, ConfigError> {
    let reader = BufReader::new(input);
    let mut configs = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let config = parse_line(trimmed).map_err(|reason| ConfigError::Malformed {
            line: index + 1,
            reason,
        })?;
        configs.push(config);
    }
    Ok(configs)
}

fn parse_line(line: &str) -> Result<NodeConfig, String> {
    let (id_token, rest) = split_token(line);
    let id = id_token
        .parse::<NodeId>()
        .map_err(|_| format!("invalid node id {id_token:?}"))?;

    let rest = rest.trim_start();
    if rest.is_empty() {
        return Ok(NodeConfig { id, message: None });
    }

    let (dst_token, rest) = split_token(rest);
    let destination = dst_token
        .parse::<NodeId>()
        .map_err(|_| format!("invalid destination id {dst_token:?}"))?;

    let rest = rest.trim_start();
    let Some(quoted) = rest.strip_prefix('"') else {
        return Err(format!("expected quoted payload, got {rest:?}"));
    };
    let Some(close) = quoted.find('"') else {
        return Err("unterminated payload quote".to_string());
    };
    let text = quoted[..close].to_string();

    let send_at_token = quoted[close + 1..].trim();
    let send_at = send_at_token
        .parse::<u64>()
        .map_err(|_| format!("invalid send tick {send_at_token:?}"))?;

    Ok(NodeConfig {
        id,
        message: Some(NodeMessage {
            text,
            destination,
            send_at: Tick::new(send_at),
        }),
    })
}

/// Split off the first whitespace-delimited token.
fn split_token(s: &str) -> (&str, &str) {
    s.split_once(char::is_whitespace).unwrap_or((s, ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_config_line() {
        let configs = read_node_configs("0 2 \"(0 -> 2)\" 30\n".as_bytes()).unwrap();

        assert_eq!(
            configs,
            vec![NodeConfig {
                id: NodeId::new(0),
                message: Some(NodeMessage {
                    text: "(0 -> 2)".to_string(),
                    destination: NodeId::new(2),
                    send_at: Tick::new(30),
                }),
            }]
        );
    }

    #[test]
    fn payload_may_contain_spaces() {
        let configs = read_node_configs("1 3 \"hello out there\" 12\n".as_bytes()).unwrap();
        assert_eq!(
            configs[0].message.as_ref().unwrap().text,
            "hello out there"
        );
    }

    #[test]
    fn bare_id_declares_a_silent_node() {
        let configs = read_node_configs("4\n".as_bytes()).unwrap();
        assert_eq!(
            configs,
            vec![NodeConfig {
                id: NodeId::new(4),
                message: None,
            }]
        );
    }

    #[test]
    fn skips_blank_lines() {
        let configs = read_node_configs("0 1 \"x\" 5\n\n2\n".as_bytes()).unwrap();
        assert_eq!(configs.len(), 2);
    }

    #[test]
    fn malformed_lines_name_their_line_number() {
        let err = read_node_configs("0 1 \"ok\" 5\nbogus line here\n".as_bytes()).unwrap_err();
        let ConfigError::Malformed { line, .. } = err else {
            panic!("expected Malformed, got {err}");
        };
        assert_eq!(line, 2);
    }

    #[test]
    fn rejects_unterminated_payload() {
        let err = read_node_configs("0 1 \"open 5\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn rejects_missing_quotes() {
        let err = read_node_configs("0 1 payload 5\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("quoted payload"));
    }

    #[test]
    fn rejects_bad_send_tick() {
        let err = read_node_configs("0 1 \"x\" soon\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("send tick"));
    }
}
