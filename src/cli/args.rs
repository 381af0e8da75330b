//! Command-line argument parsing for iptracking
use crate::config::{RecordFilter, ScanConfig};
use crate::formats::traits::{OutputDestination, OutputFormat};
use crate::kernel::decoder::StatePolicy;
use crate::kernel::table::PROC_NET_TCP;
use crate::kernel::TcpState;
use clap::{Parser, ValueEnum};
use std::net::Ipv4Addr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "iptracking", version)]
#[command(about = "Decode the kernel TCP connection table into readable records", long_about = None)]
pub struct Cli {
    /// Path to the connection table
    #[arg(value_name = "TABLE", default_value = PROC_NET_TCP)]
    pub table: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "record")]
    pub format: OutputFormatArg,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Keep state codes outside the kernel table instead of skipping the line
    #[arg(long)]
    pub passthrough_states: bool,

    /// Only connections with this local or remote address
    #[arg(long, value_name = "IP")]
    pub address: Option<Ipv4Addr>,

    /// Only connections with this local or remote port
    #[arg(long)]
    pub port: Option<u16>,

    /// Only connections in this state (name or code, repeatable)
    #[arg(long = "state", value_name = "STATE")]
    pub states: Vec<TcpState>,

    /// Render capture times in UTC
    #[arg(long)]
    pub utc: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,

    /// Enable verbose output (status messages)
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormatArg {
    Record,
    Table,
    Csv,
    Json,
    Jsonl,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Record => OutputFormat::Record,
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Jsonl => OutputFormat::Jsonl,
        }
    }
}

impl Cli {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            table_path: self.table.clone(),
            state_policy: if self.passthrough_states {
                StatePolicy::Passthrough
            } else {
                StatePolicy::Strict
            },
            filter: RecordFilter {
                address: self.address,
                port: self.port,
                states: self.states.clone(),
            },
            utc: self.utc,
        }
    }

    pub fn destination(&self) -> OutputDestination {
        match &self.output {
            Some(path) => OutputDestination::File(path.clone()),
            None => OutputDestination::Stdout,
        }
    }

    /// Default log filter, used when `RUST_LOG` is unset.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Debug
        } else if self.verbose {
            log::LevelFilter::Info
        } else {
            log::LevelFilter::Warn
        }
    }
}
