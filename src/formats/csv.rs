//! CSV output formatter
use crate::error::TrackError;
use crate::formats::traits::RecordSink;
use crate::kernel::ConnectionRecord;
use csv::Writer;
use std::io::Write;

const HEADER: [&str; 10] = [
    "captured_at",
    "slot",
    "local_addr",
    "local_port",
    "remote_addr",
    "remote_port",
    "state_code",
    "state",
    "uid",
    "inode",
];

/// CSV sink that writes one row per record
pub struct CsvSink<W: Write> {
    wtr: Writer<W>,
    header_written: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            wtr: Writer::from_writer(out),
            header_written: false,
        }
    }

    pub fn into_inner(self) -> Result<W, TrackError> {
        self.wtr
            .into_inner()
            .map_err(|e| TrackError::Io(e.into_error()))
    }

    fn write_header(&mut self) -> Result<(), TrackError> {
        if !self.header_written {
            self.wtr.write_record(HEADER)?;
            self.header_written = true;
        }
        Ok(())
    }
}

impl<W: Write> RecordSink for CsvSink<W> {
    fn accept(&mut self, record: &ConnectionRecord) -> Result<(), TrackError> {
        self.write_header()?;
        self.wtr.write_record(&[
            record.captured_at_rfc3339(),
            record.slot.to_string(),
            record.local_address.to_string(),
            record.local_port.to_string(),
            record.remote_address.to_string(),
            record.remote_port.to_string(),
            record.state.code.clone(),
            record.state.state.map(|s| s.to_string()).unwrap_or_default(),
            record.uid.map(|v| v.to_string()).unwrap_or_default(),
            record.inode.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), TrackError> {
        // An empty scan still gets a header row.
        self.write_header()?;
        self.wtr.flush()?;
        Ok(())
    }
}
