//! Line source over a `/proc/net/tcp` style connection table
use crate::error::SourceError;
use crate::kernel::decoder::is_header;
use chrono::{DateTime, FixedOffset, Local};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Default location of the IPv4 TCP table on Linux.
pub const PROC_NET_TCP: &str = "/proc/net/tcp";

/// One raw data line and its 1-based position in the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub number: usize,
    pub text: String,
}

/// A snapshot of the connection table: capture time plus a single-pass
/// sequence of data lines. The header line is skipped.
pub struct ConnectionTable<R> {
    captured_at: DateTime<FixedOffset>,
    reader: R,
    line_number: usize,
    done: bool,
}

impl ConnectionTable<BufReader<File>> {
    /// Open the table at `path`, stamping it with the file's mtime.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let modified = file
            .metadata()
            .and_then(|meta| meta.modified())
            .map_err(|source| SourceError::Stat {
                path: path.to_path_buf(),
                source,
            })?;

        let captured_at = DateTime::<Local>::from(modified).fixed_offset();
        debug!("Opened {} (modified {})", path.display(), captured_at.to_rfc3339());

        Ok(Self::from_reader(BufReader::new(file), captured_at))
    }
}

impl<R: BufRead> ConnectionTable<R> {
    /// Wrap an already open reader.
    pub fn from_reader(reader: R, captured_at: DateTime<FixedOffset>) -> Self {
        Self {
            captured_at,
            reader,
            line_number: 0,
            done: false,
        }
    }

    pub fn captured_at(&self) -> DateTime<FixedOffset> {
        self.captured_at
    }

    /// Bytes that are not UTF-8 become U+FFFD; the decoder rejects such a
    /// line on its own. Only reader failures end the sequence.
    fn read_line(&mut self) -> Option<Result<RawLine, SourceError>> {
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                let mut text = String::from_utf8_lossy(&buf).into_owned();
                let trimmed = text.trim_end_matches(['\n', '\r']).len();
                text.truncate(trimmed);
                Some(Ok(RawLine {
                    number: self.line_number,
                    text,
                }))
            }
            Err(source) => Some(Err(SourceError::Read {
                line: self.line_number,
                source,
            })),
        }
    }
}

impl<R: BufRead> Iterator for ConnectionTable<R> {
    type Item = Result<RawLine, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.read_line() {
                Some(Ok(line)) if line.number == 1 && is_header(&line.text) => continue,
                Some(Ok(line)) => return Some(Ok(line)),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
