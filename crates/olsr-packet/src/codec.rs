//! Line-based wire codec for OLSR messages.
//!
//! Each message serializes to a single line of space-separated fields. The
//! codec is lossless on field contents: parsing an encoded line yields a
//! message equal to the original.

use olsrsim_common::NodeId;

use crate::error::{PacketError, PacketResult};
use crate::types::{DataMessage, HelloMessage, MessageKind, OlsrMessage, TcMessage};

/// Render an id list as space-separated decimal values.
fn id_list(ids: &[NodeId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn encode_hello(msg: &HelloMessage) -> String {
    format!(
        "* {} HELLO UNIDIR {} BIDIR {} MPR {}",
        msg.src,
        id_list(&msg.unidir),
        id_list(&msg.bidir),
        id_list(&msg.mpr),
    )
}

pub(crate) fn encode_tc(msg: &TcMessage) -> String {
    format!(
        "* {} TC {} {} MS {}",
        msg.from_nbr,
        msg.src,
        msg.seq,
        id_list(&msg.ms),
    )
}

pub(crate) fn encode_data(msg: &DataMessage) -> String {
    format!(
        "{} {} DATA {} {} {}",
        msg.next_hop, msg.from_nbr, msg.src, msg.dst, msg.payload,
    )
}

/// Encode a message to its wire line (no trailing newline).
pub fn encode(msg: &OlsrMessage) -> String {
    match msg {
        OlsrMessage::Hello(m) => encode_hello(m),
        OlsrMessage::Tc(m) => encode_tc(m),
        OlsrMessage::Data(m) => encode_data(m),
    }
}

/// Parse a single node id token.
fn parse_id(token: &str, field: &'static str) -> PacketResult<NodeId> {
    token
        .parse::<NodeId>()
        .map_err(|_| PacketError::invalid_field(field, token))
}

/// Parse a wire line back into a message.
///
/// The message kind is identified by the third whitespace-separated field;
/// any other keyword there is an [`PacketError::UnknownKind`].
pub fn parse(line: &str) -> PacketResult<OlsrMessage> {
    let line = line.trim_end_matches(['\r', '\n']);
    let kind = line
        .split_whitespace()
        .nth(2)
        .ok_or_else(|| PacketError::invalid_format(line))?;

    match kind {
        k if k == MessageKind::Hello.as_str() => parse_hello(line).map(OlsrMessage::Hello),
        k if k == MessageKind::Tc.as_str() => parse_tc(line).map(OlsrMessage::Tc),
        k if k == MessageKind::Data.as_str() => parse_data(line).map(OlsrMessage::Data),
        other => Err(PacketError::UnknownKind(other.to_string())),
    }
}

fn parse_hello(line: &str) -> PacketResult<HelloMessage> {
    let mut tokens = line.split_whitespace();
    expect_token(&mut tokens, "*", "broadcast marker")?;
    let src = parse_id(next_field(&mut tokens, "src")?, "src")?;
    expect_token(&mut tokens, "HELLO", "kind keyword")?;
    expect_token(&mut tokens, "UNIDIR", "UNIDIR section")?;

    // The three id lists are delimited by their section keywords; an empty
    // list is simply the absence of ids before the next keyword.
    let mut unidir = Vec::new();
    let mut bidir = Vec::new();
    let mut mpr = Vec::new();
    let mut section = &mut unidir;
    let mut seen_bidir = false;
    let mut seen_mpr = false;
    for token in tokens {
        match token {
            "BIDIR" if !seen_bidir && !seen_mpr => {
                seen_bidir = true;
                section = &mut bidir;
            }
            "MPR" if seen_bidir && !seen_mpr => {
                seen_mpr = true;
                section = &mut mpr;
            }
            _ => section.push(parse_id(token, "neighbor id")?),
        }
    }
    if !seen_bidir {
        return Err(PacketError::MissingField("BIDIR section"));
    }
    if !seen_mpr {
        return Err(PacketError::MissingField("MPR section"));
    }

    Ok(HelloMessage {
        src,
        unidir,
        bidir,
        mpr,
    })
}

fn parse_tc(line: &str) -> PacketResult<TcMessage> {
    let mut tokens = line.split_whitespace();
    expect_token(&mut tokens, "*", "broadcast marker")?;
    let from_nbr = parse_id(next_field(&mut tokens, "fromnbr")?, "fromnbr")?;
    expect_token(&mut tokens, "TC", "kind keyword")?;
    let src = parse_id(next_field(&mut tokens, "src")?, "src")?;
    let seq_token = next_field(&mut tokens, "seq")?;
    let seq = seq_token
        .parse::<u32>()
        .map_err(|_| PacketError::invalid_field("seq", seq_token))?;
    expect_token(&mut tokens, "MS", "MS section")?;

    let ms = tokens
        .map(|token| parse_id(token, "ms id"))
        .collect::<PacketResult<Vec<_>>>()?;

    Ok(TcMessage {
        src,
        from_nbr,
        seq,
        ms,
    })
}

fn parse_data(line: &str) -> PacketResult<DataMessage> {
    // The payload is the remainder of the line and may contain spaces, so
    // DATA splits positionally instead of by whitespace runs.
    let mut fields = line.splitn(6, ' ');
    let next_hop = parse_id(next_field(&mut fields, "nxtHop")?, "nxtHop")?;
    let from_nbr = parse_id(next_field(&mut fields, "fromnbr")?, "fromnbr")?;
    expect_token(&mut fields, "DATA", "kind keyword")?;
    let src = parse_id(next_field(&mut fields, "src")?, "src")?;
    let dst = parse_id(next_field(&mut fields, "dst")?, "dst")?;
    let payload = fields
        .next()
        .ok_or(PacketError::MissingField("payload"))?
        .to_string();

    Ok(DataMessage {
        src,
        dst,
        next_hop,
        from_nbr,
        payload,
    })
}

fn next_field<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    field: &'static str,
) -> PacketResult<&'a str> {
    tokens.next().ok_or(PacketError::MissingField(field))
}

fn expect_token<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    expected: &str,
    field: &'static str,
) -> PacketResult<()> {
    let token = next_field(tokens, field)?;
    if token == expected {
        Ok(())
    } else {
        Err(PacketError::invalid_format(format!(
            "expected {expected:?} for {field}, got {token:?}"
        )))
    }
}
