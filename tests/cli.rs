use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::File;
use std::io::Write;
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;

// 2024-03-15T05:54:30Z
const MTIME_SECS: u64 = 1_710_482_070;

const HEADER: &str = "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode";

fn kernel_hex(octets: [u8; 4]) -> String {
    format!("{:08X}", u32::from_ne_bytes(octets))
}

fn data_line(slot: u32, local: [u8; 4], lport: u16, remote: [u8; 4], rport: u16, state: &str) -> String {
    format!(
        "  {:>2}: {}:{:04X} {}:{:04X} {} 00000000:00000000 00:00000000 00000000  1000        0 {} 1 0000000000000000 100 0 0 10 0",
        slot,
        kernel_hex(local),
        lport,
        kernel_hex(remote),
        rport,
        state,
        54000 + slot
    )
}

/// Three good lines, one malformed line, known mtime.
fn fixture() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    writeln!(file, "{}", data_line(0, [0, 0, 0, 0], 22, [0, 0, 0, 0], 0, "0A")).unwrap();
    writeln!(file, "{}", data_line(1, [172, 16, 10, 39], 10050, [10, 0, 0, 108], 39020, "01")).unwrap();
    writeln!(file, "   2: 0100007F:0CEA").unwrap();
    writeln!(file, "{}", data_line(3, [127, 0, 0, 1], 41668, [127, 0, 0, 1], 3306, "06")).unwrap();
    file.flush().unwrap();

    let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(MTIME_SECS);
    File::options()
        .write(true)
        .open(file.path())
        .unwrap()
        .set_modified(mtime)
        .unwrap();
    file
}

fn iptracking() -> Command {
    let mut cmd = Command::cargo_bin("iptracking").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn emits_three_records_and_one_skip_diagnostic() {
    let table = fixture();
    let output = iptracking()
        .arg(table.path())
        .arg("--utc")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines
        .iter()
        .all(|l| l.starts_with("LastModifiedTime 2024-03-15T05:54:30+00:00 ")));
    assert_eq!(
        lines[1],
        "LastModifiedTime 2024-03-15T05:54:30+00:00 LocalAddress 172.16.10.39:10050 RemoteAddress 10.0.0.108:39020 TCPCode 01"
    );

    assert_eq!(stderr.matches("skipped line").count(), 1);
    assert!(stderr.contains("skipped line 4"));
    assert!(!stderr.contains("fatal"));
}

#[test]
fn missing_table_is_reported_as_fatal() {
    iptracking()
        .arg("/nonexistent/iptracking/tcp")
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("fatal"))
        .stderr(predicate::str::contains("cannot open connection table"));
}

#[test]
fn filters_by_address() {
    let table = fixture();
    iptracking()
        .arg(table.path())
        .args(["--address", "10.0.0.108"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RemoteAddress 10.0.0.108:39020"))
        .stdout(predicate::str::contains("TCPCode 0A").not());
}

#[test]
fn jsonl_output_to_file() {
    let table = fixture();
    let out = tempfile::tempdir().unwrap();
    let path = out.path().join("records.jsonl");

    iptracking()
        .arg(table.path())
        .args(["--utc", "--format", "jsonl", "--state", "TIME_WAIT", "--output"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let text = std::fs::read_to_string(&path).unwrap();
    let rows: Vec<serde_json::Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["local_address"], "127.0.0.1");
    assert_eq!(rows[0]["local_port"], 41668);
    assert_eq!(rows[0]["remote_port"], 3306);
    assert_eq!(rows[0]["state"]["state"], "TIME_WAIT");
    assert_eq!(rows[0]["inode"], 54003);
    assert_eq!(rows[0]["captured_at"], "2024-03-15T05:54:30+00:00");
}

#[test]
fn verbose_reports_summary() {
    let table = fixture();
    iptracking()
        .arg(table.path())
        .arg("-v")
        .assert()
        .success()
        .stderr(predicate::str::contains("3 emitted, 0 filtered, 1 skipped"));
}
