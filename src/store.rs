//! Append-only persistence for diagnostic results: a headerless CSV tabular
//! store plus a plain-text narrative log for human audit. File handles are
//! opened per operation and closed on return; nothing is ever rewritten.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

use crate::records::{LogRow, now_stamp};

const SEPARATOR_WIDTH: usize = 40;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("log store has not been created yet")]
    NotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub struct RecordStore {
    csv_path: PathBuf,
    narrative_path: PathBuf,
}

impl RecordStore {
    pub fn new(csv_path: impl Into<PathBuf>, narrative_path: impl Into<PathBuf>) -> Self {
        Self { csv_path: csv_path.into(), narrative_path: narrative_path.into() }
    }

    pub fn csv_path(&self) -> &std::path::Path { &self.csv_path }

    /// Append one row to the tabular store, creating the file on first use.
    pub fn append_row(&self, row: &LogRow) -> Result<(), StoreError> {
        let file = OpenOptions::new().append(true).create(true).open(&self.csv_path)?;
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        wtr.write_record([&row.timestamp, &row.command, &row.target, &row.result, &row.status])?;
        wtr.flush()?;
        Ok(())
    }

    /// Append a timestamped narrative block with the raw command output,
    /// terminated by a 40-dash separator line.
    pub fn append_narrative(&self, command: &str, target: &str, raw: &str) -> Result<(), StoreError> {
        let mut file = OpenOptions::new().append(true).create(true).open(&self.narrative_path)?;
        writeln!(file, "[{}] {} {}", now_stamp(), command, target)?;
        write!(file, "{}", raw)?;
        if !raw.ends_with('\n') { writeln!(file)?; }
        writeln!(file, "{}", "-".repeat(SEPARATOR_WIDTH))?;
        file.flush()?;
        Ok(())
    }

    /// All rows ever appended, in append order. `StoreError::NotFound` means
    /// no diagnostic has been logged yet; callers surface that as an
    /// informational state, not a failure.
    pub fn read_rows(&self) -> Result<Vec<LogRow>, StoreError> {
        let file = open_existing(&self.csv_path)?;
        let mut rdr = csv::ReaderBuilder::new().has_headers(false).from_reader(file);
        let mut rows = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            rows.push(LogRow {
                timestamp: rec.get(0).unwrap_or("").to_string(),
                command: rec.get(1).unwrap_or("").to_string(),
                target: rec.get(2).unwrap_or("").to_string(),
                result: rec.get(3).unwrap_or("").to_string(),
                status: rec.get(4).unwrap_or("").to_string(),
            });
        }
        Ok(rows)
    }

    /// Full narrative text. `Ok("")` means the store exists but holds no
    /// entries, which callers report separately from `NotFound`.
    pub fn read_narrative(&self) -> Result<String, StoreError> {
        match std::fs::read_to_string(&self.narrative_path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

fn open_existing(path: &std::path::Path) -> Result<std::fs::File, StoreError> {
    match std::fs::File::open(path) {
        Ok(f) => Ok(f),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("diag.csv"), dir.path().join("diag.txt"));
        (dir, store)
    }

    #[test]
    fn rows_round_trip_in_append_order() {
        let (_dir, store) = temp_store();
        for i in 0..3 {
            let row = LogRow::new("ping", &format!("host{}", i), "13", "Success");
            store.append_row(&row).unwrap();
        }
        let rows = store.read_rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].target, "host0");
        assert_eq!(rows[2].target, "host2");
        assert_eq!(rows[1].command, "ping");
        assert_eq!(rows[1].status, "Success");
    }

    #[test]
    fn read_is_idempotent() {
        let (_dir, store) = temp_store();
        store.append_row(&LogRow::new("arp", "local", "2 devices", "Captured")).unwrap();
        let first = store.read_rows().unwrap();
        let second = store.read_rows().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn append_never_truncates() {
        let (_dir, store) = temp_store();
        store.append_row(&LogRow::new("ping", "a", "1", "Success")).unwrap();
        store.append_row(&LogRow::new("ping", "b", "2", "Failed")).unwrap();
        let rows = store.read_rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].target, "a");
    }

    #[test]
    fn comma_in_field_survives_round_trip() {
        let (_dir, store) = temp_store();
        store.append_row(&LogRow::new("ipconfig", "all", "AA-BB, 10.0.0.5", "Captured")).unwrap();
        let rows = store.read_rows().unwrap();
        assert_eq!(rows[0].result, "AA-BB, 10.0.0.5");
    }

    #[test]
    fn missing_store_is_not_found() {
        let (_dir, store) = temp_store();
        assert!(matches!(store.read_rows(), Err(StoreError::NotFound)));
        assert!(matches!(store.read_narrative(), Err(StoreError::NotFound)));
    }

    #[test]
    fn narrative_block_format() {
        let (_dir, store) = temp_store();
        store.append_narrative("PING", "example.com", "raw ping output").unwrap();
        let text = store.read_narrative().unwrap();
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with('['));
        assert!(header.ends_with("] PING example.com"));
        assert_eq!(lines.next().unwrap(), "raw ping output");
        assert_eq!(lines.next().unwrap(), "-".repeat(40));
    }

    #[test]
    fn empty_narrative_reads_empty_string() {
        let (_dir, store) = temp_store();
        std::fs::write(store.narrative_path.clone(), "").unwrap();
        assert_eq!(store.read_narrative().unwrap(), "");
    }
}
