//! Kernel connection-table data structures
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Serialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use thiserror::Error;

pub mod decoder;
pub mod table;

/// TCP socket states as numbered by the kernel (`include/net/tcp_states.h`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TcpState {
    Established = 1,
    SynSent = 2,
    SynRecv = 3,
    FinWait1 = 4,
    FinWait2 = 5,
    TimeWait = 6,
    Close = 7,
    CloseWait = 8,
    LastAck = 9,
    Listen = 10,
    Closing = 11,
}

impl TcpState {
    pub const ALL: [TcpState; 11] = [
        TcpState::Established,
        TcpState::SynSent,
        TcpState::SynRecv,
        TcpState::FinWait1,
        TcpState::FinWait2,
        TcpState::TimeWait,
        TcpState::Close,
        TcpState::CloseWait,
        TcpState::LastAck,
        TcpState::Listen,
        TcpState::Closing,
    ];

    /// Map a kernel state code. Anything outside 1..=11 has no state.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=11 => Some(Self::ALL[code as usize - 1]),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            TcpState::Established => "ESTABLISHED",
            TcpState::SynSent => "SYN_SENT",
            TcpState::SynRecv => "SYN_RECV",
            TcpState::FinWait1 => "FIN_WAIT1",
            TcpState::FinWait2 => "FIN_WAIT2",
            TcpState::TimeWait => "TIME_WAIT",
            TcpState::Close => "CLOSE",
            TcpState::CloseWait => "CLOSE_WAIT",
            TcpState::LastAck => "LAST_ACK",
            TcpState::Listen => "LISTEN",
            TcpState::Closing => "CLOSING",
        }
    }
}

impl fmt::Display for TcpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown TCP state {0:?} (expected a name such as LISTEN or a code 1-11)")]
pub struct ParseStateError(String);

impl FromStr for TcpState {
    type Err = ParseStateError;

    /// Accepts `LISTEN`, `listen`, `fin-wait1` or a decimal code such as `10`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| ParseStateError(s.to_string()));
        }
        let wanted = s.replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| ParseStateError(s.to_string()))
    }
}

/// The state column of one socket: the digits as the kernel wrote them, plus
/// the mapped state when the code is in the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocketState {
    pub code: String,
    pub state: Option<TcpState>,
}

/// One decoded row of the connection table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionRecord {
    #[serde(serialize_with = "serialize_rfc3339")]
    pub captured_at: DateTime<FixedOffset>,
    pub slot: u32,
    pub local_address: Ipv4Addr,
    pub local_port: u16,
    pub remote_address: Ipv4Addr,
    pub remote_port: u16,
    pub state: SocketState,
    pub uid: Option<u32>,
    pub inode: Option<u64>,
}

impl ConnectionRecord {
    /// Capture time as RFC3339 with offset, whole seconds.
    pub fn captured_at_rfc3339(&self) -> String {
        self.captured_at.to_rfc3339_opts(SecondsFormat::Secs, false)
    }

    pub fn local_endpoint(&self) -> String {
        format!("{}:{}", self.local_address, self.local_port)
    }

    pub fn remote_endpoint(&self) -> String {
        format!("{}:{}", self.remote_address, self.remote_port)
    }
}

fn serialize_rfc3339<S: serde::Serializer>(
    at: &DateTime<FixedOffset>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Secs, false))
}
