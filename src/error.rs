//! Error types for reading and decoding the connection table
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the connection-table source. These end the scan.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open connection table {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read modification time of {}", path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("read failed after line {line}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
}

/// Why a line as a whole was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineFault {
    Header,
    TooFewFields(usize),
    BadSlot(String),
}

impl std::fmt::Display for LineFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineFault::Header => write!(f, "header line"),
            LineFault::TooFewFields(n) => write!(f, "expected at least 4 fields, found {}", n),
            LineFault::BadSlot(slot) => write!(f, "bad slot index {:?}", slot),
        }
    }
}

/// Why an `ADDRHEX:PORTHEX` field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointFault {
    MissingSeparator,
    EmptyPart,
    AddressLength(usize),
    InvalidHex,
}

impl std::fmt::Display for EndpointFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointFault::MissingSeparator => write!(f, "missing ':' separator"),
            EndpointFault::EmptyPart => write!(f, "empty address or port"),
            EndpointFault::AddressLength(n) => {
                write!(f, "address must be 8 hex digits, got {}", n)
            }
            EndpointFault::InvalidHex => write!(f, "not hexadecimal"),
        }
    }
}

/// Per-line decode failures. The scan logs these and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed line: {0}")]
    MalformedLine(LineFault),

    #[error("malformed endpoint {field:?}: {fault}")]
    MalformedEndpoint { field: String, fault: EndpointFault },

    #[error("port 0x{0} out of range")]
    PortRange(String),

    #[error("unknown socket state code {0:?}")]
    UnknownState(String),
}

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("output write failed")]
    Io(#[from] io::Error),

    #[error("CSV encoding failed")]
    Csv(#[from] csv::Error),

    #[error("JSON encoding failed")]
    Json(#[from] serde_json::Error),
}
