//! Decoder for single `/proc/net/tcp` lines
//!
//! A data line looks like:
//!
//! ```text
//!   46: 010310AC:9C4C 030310AC:1770 01 00000150:00000000 01:00000019 00000000  1000 0 54165 ...
//!   sl  local         remote        st tx_queue:rx_queue tr:tm->when  retrnsmt uid  timeout inode
//! ```
//!
//! Addresses are the raw 32-bit word of a `__be32` printed with `%08X`, so the
//! hex digits are in host byte order. Ports are printed already converted to
//! host order and need no swap.
use crate::error::{DecodeError, EndpointFault, LineFault};
use crate::kernel::{ConnectionRecord, SocketState, TcpState};
use chrono::{DateTime, FixedOffset};
use std::net::Ipv4Addr;

/// First token of the header line.
pub const HEADER_MARKER: &str = "sl";

const UID_FIELD: usize = 7;
const INODE_FIELD: usize = 9;

/// What to do with state codes outside the kernel's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatePolicy {
    /// Reject the line with `UnknownState`.
    #[default]
    Strict,
    /// Keep the raw digits with no mapped state.
    Passthrough,
}

/// True if the line is the table header.
pub fn is_header(line: &str) -> bool {
    line.split_whitespace().next() == Some(HEADER_MARKER)
}

/// Decode one data line into a record stamped with `captured_at`.
pub fn decode(
    line: &str,
    captured_at: DateTime<FixedOffset>,
    policy: StatePolicy,
) -> Result<ConnectionRecord, DecodeError> {
    let fields: Vec<&str> = line.split_whitespace().collect();

    if fields.first() == Some(&HEADER_MARKER) {
        return Err(DecodeError::MalformedLine(LineFault::Header));
    }
    if fields.len() < 4 {
        return Err(DecodeError::MalformedLine(LineFault::TooFewFields(fields.len())));
    }

    let slot = decode_slot(fields[0])?;
    let (local_address, local_port) = decode_endpoint(fields[1])?;
    let (remote_address, remote_port) = decode_endpoint(fields[2])?;
    let state = decode_state(fields[3], policy)?;

    Ok(ConnectionRecord {
        captured_at,
        slot,
        local_address,
        local_port,
        remote_address,
        remote_port,
        state,
        uid: fields.get(UID_FIELD).and_then(|f| f.parse().ok()),
        inode: fields.get(INODE_FIELD).and_then(|f| f.parse().ok()),
    })
}

fn decode_slot(field: &str) -> Result<u32, DecodeError> {
    field
        .strip_suffix(':')
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| DecodeError::MalformedLine(LineFault::BadSlot(field.to_string())))
}

/// Decode an `ADDRHEX:PORTHEX` field.
pub fn decode_endpoint(field: &str) -> Result<(Ipv4Addr, u16), DecodeError> {
    let malformed = |fault: EndpointFault| DecodeError::MalformedEndpoint {
        field: field.to_string(),
        fault,
    };

    let (addr_hex, port_hex) = field
        .split_once(':')
        .ok_or_else(|| malformed(EndpointFault::MissingSeparator))?;
    if addr_hex.is_empty() || port_hex.is_empty() {
        return Err(malformed(EndpointFault::EmptyPart));
    }
    if !is_hex(addr_hex) || !is_hex(port_hex) {
        return Err(malformed(EndpointFault::InvalidHex));
    }
    if addr_hex.len() != 8 {
        return Err(malformed(EndpointFault::AddressLength(addr_hex.len())));
    }

    let word = native_word(addr_hex).map_err(malformed)?;
    let port = decode_port(port_hex)?;

    Ok((network_address(word), port))
}

/// Step one of the address decode: the 8 hex digits are the bytes of a 32-bit
/// word as it sits in host memory. Read them back in native order.
pub fn native_word(addr_hex: &str) -> Result<u32, EndpointFault> {
    let mut raw = [0u8; 4];
    hex::decode_to_slice(addr_hex, &mut raw).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { .. } => EndpointFault::InvalidHex,
        _ => EndpointFault::AddressLength(addr_hex.len()),
    })?;
    Ok(u32::from_ne_bytes(raw))
}

/// Step two: lay the word out in network byte order for dotted-quad display.
pub fn network_address(word: u32) -> Ipv4Addr {
    Ipv4Addr::from(word.to_be_bytes())
}

/// Ports are host-order already. Digits are validated hex by the caller.
fn decode_port(port_hex: &str) -> Result<u16, DecodeError> {
    let significant = port_hex.trim_start_matches('0');
    if significant.len() > 4 {
        return Err(DecodeError::PortRange(port_hex.to_string()));
    }
    if significant.is_empty() {
        return Ok(0);
    }
    u16::from_str_radix(significant, 16).map_err(|_| DecodeError::PortRange(port_hex.to_string()))
}

fn decode_state(field: &str, policy: StatePolicy) -> Result<SocketState, DecodeError> {
    let state = u8::from_str_radix(field, 16)
        .ok()
        .filter(|_| is_hex(field))
        .and_then(TcpState::from_code);

    match (state, policy) {
        (None, StatePolicy::Strict) => Err(DecodeError::UnknownState(field.to_string())),
        (state, _) => Ok(SocketState {
            code: field.to_string(),
            state,
        }),
    }
}

fn is_hex(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_hexdigit())
}
