//! Scan configuration
use crate::kernel::decoder::StatePolicy;
use crate::kernel::table::PROC_NET_TCP;
use crate::kernel::{ConnectionRecord, TcpState};
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Everything one scan needs to know. Built by the CLI or by callers directly.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub table_path: PathBuf,
    pub state_policy: StatePolicy,
    pub filter: RecordFilter,
    /// Render capture times in UTC instead of the local offset.
    pub utc: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            table_path: PathBuf::from(PROC_NET_TCP),
            state_policy: StatePolicy::default(),
            filter: RecordFilter::default(),
            utc: false,
        }
    }
}

/// Selects the connections touching a given peer, port or set of states.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub address: Option<Ipv4Addr>,
    pub port: Option<u16>,
    /// Empty matches any state.
    pub states: Vec<TcpState>,
}

impl RecordFilter {
    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.port.is_none() && self.states.is_empty()
    }

    pub fn matches(&self, record: &ConnectionRecord) -> bool {
        if let Some(address) = self.address {
            if record.local_address != address && record.remote_address != address {
                return false;
            }
        }
        if let Some(port) = self.port {
            if record.local_port != port && record.remote_port != port {
                return false;
            }
        }
        if !self.states.is_empty() {
            match record.state.state {
                Some(state) if self.states.contains(&state) => {}
                _ => return false,
            }
        }
        true
    }
}
