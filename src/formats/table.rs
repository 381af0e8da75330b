//! Text (table) output formatter
use crate::error::TrackError;
use crate::formats::traits::RecordSink;
use crate::kernel::ConnectionRecord;
use prettytable::{Cell, Row, Table};
use std::io::Write;

/// Collects rows and prints one aligned table when the scan finishes.
pub struct TableSink<W: Write> {
    out: W,
    table: Table,
}

impl<W: Write> TableSink<W> {
    pub fn new(out: W) -> Self {
        let mut table = Table::new();
        table.set_format(*prettytable::format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

        // Header
        table.set_titles(Row::new(vec![
            Cell::new("SL").style_spec("c"),
            Cell::new("CAPTURED_AT").style_spec("c"),
            Cell::new("LOCAL_ADDR").style_spec("c"),
            Cell::new("LOCAL_PORT").style_spec("c"),
            Cell::new("REMOTE_ADDR").style_spec("c"),
            Cell::new("REMOTE_PORT").style_spec("c"),
            Cell::new("STATE").style_spec("c"),
            Cell::new("UID").style_spec("c"),
            Cell::new("INODE").style_spec("c"),
        ]));

        Self { out, table }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

impl<W: Write> RecordSink for TableSink<W> {
    fn accept(&mut self, record: &ConnectionRecord) -> Result<(), TrackError> {
        let state = match record.state.state {
            Some(state) => state.to_string(),
            None => record.state.code.clone(),
        };
        self.table.add_row(Row::new(vec![
            Cell::new(&record.slot.to_string()),
            Cell::new(&record.captured_at_rfc3339()),
            Cell::new(&record.local_address.to_string()),
            Cell::new(&record.local_port.to_string()),
            Cell::new(&record.remote_address.to_string()),
            Cell::new(&record.remote_port.to_string()),
            Cell::new(&state),
            Cell::new(&optional(record.uid)),
            Cell::new(&optional(record.inode)),
        ]));
        Ok(())
    }

    fn finish(&mut self) -> Result<(), TrackError> {
        self.table.print(&mut self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
