//! JSON output formatter
use crate::error::TrackError;
use crate::formats::traits::RecordSink;
use crate::kernel::ConnectionRecord;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use std::io::Write;
use std::path::Path;

#[derive(serde::Serialize)]
struct OutputWrapper<'a> {
    source: Option<&'a str>,
    captured_at: Option<&'a str>,
    count: usize,
    results: &'a [ConnectionRecord],
}

/// Buffers the scan and writes one pretty JSON document with metadata.
pub struct JsonSink<W: Write> {
    out: W,
    source: Option<String>,
    captured_at: Option<String>,
    records: Vec<ConnectionRecord>,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            source: None,
            captured_at: None,
            records: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for JsonSink<W> {
    fn begin(&mut self, source: &Path, captured_at: DateTime<FixedOffset>) -> Result<(), TrackError> {
        self.source = Some(source.display().to_string());
        self.captured_at = Some(captured_at.to_rfc3339_opts(SecondsFormat::Secs, false));
        Ok(())
    }

    fn accept(&mut self, record: &ConnectionRecord) -> Result<(), TrackError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), TrackError> {
        let wrapper = OutputWrapper {
            source: self.source.as_deref(),
            captured_at: self.captured_at.as_deref(),
            count: self.records.len(),
            results: &self.records,
        };
        serde_json::to_writer_pretty(&mut self.out, &wrapper)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
