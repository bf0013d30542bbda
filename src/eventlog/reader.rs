//! Reporting reader for the event log
//!
//! Reads every line, drops the ones that are blank or not JSON objects,
//! and fills missing fields with defaults so records written by older
//! versions (`path` instead of `file`, float timestamps, `"SAFE FILE"`
//! statuses) come out in the same shape as current ones.

use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One record as served to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub event: String,
    pub file: String,
    pub entropy: Option<f64>,
    pub status: String,
    pub timestamp: i64,
    pub action: String,
    pub message: String,
}

/// Read the whole log. A missing file is an empty history.
pub fn read_all(path: &Path) -> anyhow::Result<Vec<ReportEntry>> {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let now = chrono::Utc::now().timestamp();
    let mut entries = Vec::new();

    // Split on raw bytes so one line of bad UTF-8 cannot end the read
    for line in BufReader::new(file).split(b'\n') {
        let line = line?;
        if let Some(entry) = parse_line(&String::from_utf8_lossy(&line), now) {
            entries.push(entry);
        }
    }

    Ok(entries)
}

/// Parse one log line; `now` stands in for a missing timestamp
pub fn parse_line(line: &str, now: i64) -> Option<ReportEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let object = match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => map,
        _ => return None,
    };

    let file = text(&object, "file").or_else(|| text(&object, "path"));
    let timestamp = object.get("timestamp").and_then(|t| match t {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        _ => None,
    });

    Some(ReportEntry {
        event: text(&object, "event").unwrap_or_else(dash),
        file: file.unwrap_or_else(dash),
        entropy: object.get("entropy").and_then(Value::as_f64),
        status: text(&object, "status").unwrap_or_else(dash),
        timestamp: timestamp.unwrap_or(now),
        action: text(&object, "action").unwrap_or_else(dash),
        message: text(&object, "message").unwrap_or_else(dash),
    })
}

fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn dash() -> String {
    "-".to_string()
}

/// Render the whole log as a JSON array
pub fn to_json(entries: &[ReportEntry]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::Status;
    use crate::eventlog::{ClassificationRecord, EventLog};
    use crate::watcher::{EventKind, Observation};
    use std::path::PathBuf;

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path().join("events.json"));

        let records = vec![
            ClassificationRecord::new(
                Observation { path: PathBuf::from("/d/a"), kind: EventKind::Scan, size: Some(10) },
                Some(0.0),
                Status::Safe,
            ),
            ClassificationRecord::new(
                Observation { path: PathBuf::from("/d/b"), kind: EventKind::Modify, size: Some(4096) },
                Some(7.953_124_871_223),
                Status::Suspicious,
            )
            .with_action("Quarantined to /q/b.quarantine"),
            ClassificationRecord::new(
                Observation { path: PathBuf::from("/d/c"), kind: EventKind::Delete, size: None },
                None,
                Status::Info,
            ),
        ];
        for r in &records {
            log.append(r).unwrap();
        }

        let entries = read_all(log.path()).unwrap();
        assert_eq!(entries.len(), records.len());
        for (entry, record) in entries.iter().zip(&records) {
            assert_eq!(entry.event, record.observation.kind.as_str());
            assert_eq!(entry.status, record.status.as_str());
            assert_eq!(entry.entropy, record.entropy);
            assert_eq!(entry.file, record.observation.path.to_string_lossy());
            assert_eq!(entry.action, record.action);
            assert_eq!(entry.timestamp, record.timestamp);
        }
    }

    #[test]
    fn test_legacy_record_defaults() {
        let line = r#"{"timestamp": 1700000000.75, "event": "CREATE", "path": "/home/u/x", "entropy": 4.2, "status": "SAFE FILE"}"#;
        let entry = parse_line(line, 0).unwrap();

        assert_eq!(entry.file, "/home/u/x");
        assert_eq!(entry.timestamp, 1_700_000_000);
        assert_eq!(entry.entropy, Some(4.2));
        assert_eq!(entry.status, "SAFE FILE");
        assert_eq!(entry.action, "-");
        assert_eq!(entry.message, "-");
    }

    #[test]
    fn test_missing_fields() {
        let entry = parse_line(r#"{"entropy": "high"}"#, 42).unwrap();
        assert_eq!(entry.event, "-");
        assert_eq!(entry.file, "-");
        assert_eq!(entry.entropy, None);
        assert_eq!(entry.status, "-");
        assert_eq!(entry.timestamp, 42);
    }

    #[test]
    fn test_bad_lines_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.json");
        std::fs::write(
            &path,
            "\n{\"event\":\"SCAN\",\"file\":\"/a\"}\nnot json\n[1,2]\n   \n{\"event\":\"DELETE\",\"file\":\"/b\",\"entropy\":null}\n{\"event\":",
        )
        .unwrap();

        let entries = read_all(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event, "SCAN");
        assert_eq!(entries[1].file, "/b");
        assert_eq!(entries[1].entropy, None);
    }

    #[test]
    fn test_missing_log_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_all(&dir.path().join("none.json")).unwrap().is_empty());
    }

    #[test]
    fn test_to_json_array() {
        let entry = parse_line(r#"{"event":"SCAN","file":"/a","entropy":1.0,"status":"SAFE","timestamp":5}"#, 0).unwrap();
        let json = to_json(&[entry]).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["action"], "-");
        assert_eq!(value[0]["timestamp"], 5);
    }
}
