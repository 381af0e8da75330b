//! JSONL (JSON Lines) output formatter
use crate::error::TrackError;
use crate::formats::traits::RecordSink;
use crate::kernel::ConnectionRecord;
use std::io::Write;

/// Writes every record as one compact JSON object per line
pub struct JsonlSink<W: Write> {
    out: W,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordSink for JsonlSink<W> {
    fn accept(&mut self, record: &ConnectionRecord) -> Result<(), TrackError> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), TrackError> {
        self.out.flush()?;
        Ok(())
    }
}
