//! Line-per-record text output, the default rendering
use crate::error::TrackError;
use crate::formats::traits::RecordSink;
use crate::kernel::ConnectionRecord;
use std::io::Write;

/// Writes `LastModifiedTime .. LocalAddress .. RemoteAddress .. TCPCode ..`
/// for every record as soon as it arrives.
pub struct LineSink<W: Write> {
    out: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Render one record in the line format.
pub fn format_line(record: &ConnectionRecord) -> String {
    format!(
        "LastModifiedTime {} LocalAddress {} RemoteAddress {} TCPCode {}",
        record.captured_at_rfc3339(),
        record.local_endpoint(),
        record.remote_endpoint(),
        record.state.code,
    )
}

impl<W: Write> RecordSink for LineSink<W> {
    fn accept(&mut self, record: &ConnectionRecord) -> Result<(), TrackError> {
        writeln!(self.out, "{}", format_line(record))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), TrackError> {
        self.out.flush()?;
        Ok(())
    }
}
