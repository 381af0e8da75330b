//! Drives one snapshot from the line source through the decoder into a sink
use crate::config::ScanConfig;
use crate::error::TrackError;
use crate::formats::traits::RecordSink;
use crate::kernel::decoder::decode;
use crate::kernel::table::ConnectionTable;
use chrono::{Offset, Utc};
use log::{debug, info, warn};
use std::io::BufRead;

/// Counts from one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub emitted: usize,
    pub filtered: usize,
    pub skipped: usize,
}

/// Open the configured table and scan it once.
pub fn scan_path<S: RecordSink + ?Sized>(
    config: &ScanConfig,
    sink: &mut S,
) -> Result<ScanSummary, TrackError> {
    info!("Reading connection table {}", config.table_path.display());
    let table = ConnectionTable::open(&config.table_path)?;
    scan(table, config, sink)
}

/// Decode every data line of `table` and hand matching records to `sink`.
///
/// Lines that fail to decode are logged and skipped. A read failure stops the
/// scan; the sink is still finished so records already accepted get written.
pub fn scan<R: BufRead, S: RecordSink + ?Sized>(
    table: ConnectionTable<R>,
    config: &ScanConfig,
    sink: &mut S,
) -> Result<ScanSummary, TrackError> {
    let mut captured_at = table.captured_at();
    if config.utc {
        captured_at = captured_at.with_timezone(&Utc.fix());
    }

    sink.begin(&config.table_path, captured_at)?;

    let mut summary = ScanSummary::default();
    let mut failure = None;
    for line in table {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                failure = Some(e);
                break;
            }
        };
        match decode(&line.text, captured_at, config.state_policy) {
            Ok(record) => {
                if !config.filter.matches(&record) {
                    summary.filtered += 1;
                    continue;
                }
                debug!(
                    "line {}: {} -> {} {}",
                    line.number,
                    record.local_endpoint(),
                    record.remote_endpoint(),
                    record.state.code
                );
                sink.accept(&record)?;
                summary.emitted += 1;
            }
            Err(e) => {
                warn!("skipped line {}: {}: {:?}", line.number, e, line.text);
                summary.skipped += 1;
            }
        }
    }

    // Flush what was already accepted even when the read broke off.
    sink.finish()?;
    if let Some(e) = failure {
        return Err(e.into());
    }

    info!(
        "Scan complete: {} emitted, {} filtered, {} skipped",
        summary.emitted, summary.filtered, summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecordFilter;
    use crate::error::SourceError;
    use crate::formats::json::JsonSink;
    use crate::kernel::decoder::StatePolicy;
    use crate::kernel::{ConnectionRecord, TcpState};
    use chrono::{DateTime, FixedOffset, TimeZone};
    use std::io::{self, BufReader, Cursor, Read};

    fn stamp() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(8 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 15, 13, 54, 30)
            .unwrap()
    }

    const TABLE: &str = concat!(
        "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode\n",
        "   0: 0100007F:0CEA 00000000:0000 0A 00000000:00000000 00:00000000 00000000   124        0 19387 1\n",
        "   1: 0100007F:0016\n",
        "   2: 010310AC:9C4C 030310AC:1770 01 00000150:00000000 01:00000019 00000000  1000        0 54165 1\n",
        "   3: 0100007F:A2C4 0100007F:0CEA 06 00000000:00000000 03:00000B4F 00000000     0        0 0 3\n",
    );

    fn run(config: &ScanConfig) -> (ScanSummary, Vec<ConnectionRecord>) {
        let table = ConnectionTable::from_reader(Cursor::new(TABLE), stamp());
        let mut records = Vec::new();
        let summary = scan(table, config, &mut records).unwrap();
        (summary, records)
    }

    #[test]
    fn skips_malformed_lines_and_keeps_going() {
        let (summary, records) = run(&ScanConfig::default());
        assert_eq!(
            summary,
            ScanSummary {
                emitted: 3,
                filtered: 0,
                skipped: 1
            }
        );
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.captured_at == stamp()));
        assert_eq!(
            records.iter().map(|r| r.slot).collect::<Vec<_>>(),
            vec![0, 2, 3]
        );
    }

    #[test]
    fn filter_counts_rejected_records() {
        let config = ScanConfig {
            filter: RecordFilter {
                port: Some(3306),
                ..Default::default()
            },
            ..Default::default()
        };
        let (summary, records) = run(&config);
        assert_eq!(summary.emitted, 2);
        assert_eq!(summary.filtered, 1);
        assert!(records.iter().all(|r| r.local_port == 3306 || r.remote_port == 3306));

        let config = ScanConfig {
            filter: RecordFilter {
                states: vec![TcpState::TimeWait],
                ..Default::default()
            },
            ..Default::default()
        };
        let (_, records) = run(&config);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].state.code, "06");
    }

    #[test]
    fn utc_rendering_keeps_the_instant() {
        let config = ScanConfig {
            utc: true,
            ..Default::default()
        };
        let (_, records) = run(&config);
        assert_eq!(records[0].captured_at, stamp());
        assert_eq!(records[0].captured_at_rfc3339(), "2024-03-15T05:54:30+00:00");
    }

    #[test]
    fn unknown_states_follow_policy() {
        let table = "   0: 0100007F:0CEA 00000000:0000 00\n   1: 0100007F:0CEA 00000000:0000 0A\n";

        let mut strict: Vec<ConnectionRecord> = Vec::new();
        let summary = scan(
            ConnectionTable::from_reader(Cursor::new(table), stamp()),
            &ScanConfig::default(),
            &mut strict,
        )
        .unwrap();
        assert_eq!((summary.emitted, summary.skipped), (1, 1));

        let mut loose: Vec<ConnectionRecord> = Vec::new();
        let config = ScanConfig {
            state_policy: StatePolicy::Passthrough,
            ..Default::default()
        };
        let summary = scan(
            ConnectionTable::from_reader(Cursor::new(table), stamp()),
            &config,
            &mut loose,
        )
        .unwrap();
        assert_eq!((summary.emitted, summary.skipped), (2, 0));
        assert_eq!(loose[0].state.code, "00");
    }

    /// Yields its data, then fails every later read.
    struct FailAfter {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::Other, "device gone")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn read_failure_still_writes_buffered_records() {
        let reader = BufReader::new(FailAfter {
            data: Cursor::new(TABLE.as_bytes().to_vec()),
        });
        let table = ConnectionTable::from_reader(reader, stamp());
        let mut sink = JsonSink::new(Vec::new());

        let err = scan(table, &ScanConfig::default(), &mut sink).unwrap_err();
        assert!(matches!(err, TrackError::Source(SourceError::Read { line: 5, .. })));

        let doc: serde_json::Value = serde_json::from_slice(&sink.into_inner()).unwrap();
        assert_eq!(doc["count"], 3);
        assert_eq!(doc["source"], "/proc/net/tcp");
        assert_eq!(doc["captured_at"], "2024-03-15T13:54:30+08:00");
        assert_eq!(doc["results"][1]["slot"], 2);
    }

    #[test]
    fn invalid_utf8_line_is_skipped_and_scan_continues() {
        let mut input = b"   0: 0100007F:0CEA 00000000:0000 0A\n".to_vec();
        input.extend_from_slice(b"   1: \xff\xfe bad\n");
        input.extend_from_slice(b"   2: 0100007F:0016 00000000:0000 0A\n");

        let mut records: Vec<ConnectionRecord> = Vec::new();
        let summary = scan(
            ConnectionTable::from_reader(Cursor::new(input), stamp()),
            &ScanConfig::default(),
            &mut records,
        )
        .unwrap();
        assert_eq!((summary.emitted, summary.skipped), (2, 1));
        assert_eq!(records[1].slot, 2);
        assert_eq!(records[1].local_port, 22);
    }

    #[test]
    fn missing_table_is_fatal() {
        let config = ScanConfig {
            table_path: "/nonexistent/iptracking/tcp".into(),
            ..Default::default()
        };
        let mut records: Vec<ConnectionRecord> = Vec::new();
        let err = scan_path(&config, &mut records).unwrap_err();
        assert!(matches!(err, TrackError::Source(SourceError::Open { .. })));
        assert!(records.is_empty());
    }
}
