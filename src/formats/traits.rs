//! Record sink trait and output selection
use crate::error::TrackError;
use crate::kernel::ConnectionRecord;
use chrono::{DateTime, FixedOffset};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Receives decoded records one at a time, in table order.
pub trait RecordSink {
    /// Called once before the first record with the snapshot being scanned.
    fn begin(&mut self, _source: &Path, _captured_at: DateTime<FixedOffset>) -> Result<(), TrackError> {
        Ok(())
    }

    fn accept(&mut self, record: &ConnectionRecord) -> Result<(), TrackError>;

    /// Called once after the last record. Buffering sinks write here.
    fn finish(&mut self) -> Result<(), TrackError> {
        Ok(())
    }
}

/// Keeps records in memory for callers that want values, not text.
impl RecordSink for Vec<ConnectionRecord> {
    fn accept(&mut self, record: &ConnectionRecord) -> Result<(), TrackError> {
        self.push(record.clone());
        Ok(())
    }
}

impl<S: RecordSink + ?Sized> RecordSink for Box<S> {
    fn begin(&mut self, source: &Path, captured_at: DateTime<FixedOffset>) -> Result<(), TrackError> {
        (**self).begin(source, captured_at)
    }

    fn accept(&mut self, record: &ConnectionRecord) -> Result<(), TrackError> {
        (**self).accept(record)
    }

    fn finish(&mut self) -> Result<(), TrackError> {
        (**self).finish()
    }
}

/// Enum for output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Record,
    Table,
    Csv,
    Json,
    Jsonl,
}

/// Enum for output destination
#[derive(Debug, Clone)]
pub enum OutputDestination {
    Stdout,
    File(std::path::PathBuf),
}

/// Builds the sink for a format and destination
pub struct OutputWriter;

impl OutputWriter {
    pub fn open(
        format: OutputFormat,
        destination: &OutputDestination,
    ) -> Result<Box<dyn RecordSink>, TrackError> {
        let out: Box<dyn Write> = match destination {
            OutputDestination::Stdout => Box::new(io::stdout().lock()),
            OutputDestination::File(path) => Box::new(BufWriter::new(File::create(path)?)),
        };
        Ok(Self::wrap(format, out))
    }

    pub fn wrap<W: Write + 'static>(format: OutputFormat, out: W) -> Box<dyn RecordSink> {
        match format {
            OutputFormat::Record => Box::new(crate::formats::text::LineSink::new(out)),
            OutputFormat::Table => Box::new(crate::formats::table::TableSink::new(out)),
            OutputFormat::Csv => Box::new(crate::formats::csv::CsvSink::new(out)),
            OutputFormat::Json => Box::new(crate::formats::json::JsonSink::new(out)),
            OutputFormat::Jsonl => Box::new(crate::formats::jsonl::JsonlSink::new(out)),
        }
    }
}
