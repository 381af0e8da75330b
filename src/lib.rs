//! Library crate for iptracking: decodes the kernel TCP connection table

pub mod config;
pub mod error;
pub mod kernel;
pub mod scanner;

// CLI modules
pub mod cli {
    pub mod args;
}

// Format modules
pub mod formats {
    pub mod csv;
    pub mod json;
    pub mod jsonl;
    pub mod table;
    pub mod text;
    pub mod traits;
}

pub use config::{RecordFilter, ScanConfig};
pub use error::{DecodeError, SourceError, TrackError};
pub use kernel::decoder::{decode, StatePolicy};
pub use kernel::table::ConnectionTable;
pub use kernel::{ConnectionRecord, SocketState, TcpState};
pub use scanner::{scan, scan_path, ScanSummary};
