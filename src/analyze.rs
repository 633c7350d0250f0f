use serde::Serialize;

use crate::records::LogRow;

/// Aggregate view over the tabular store. Count vectors keep the order in
/// which a key first appeared so repeated runs display identically.
#[derive(Clone, Debug, Serialize)]
pub struct LogReport {
    pub total: usize,
    pub by_command: Vec<(String, usize)>,
    pub by_status: Vec<(String, usize)>,
}

/// Aggregate every row unconditionally. `None` is the distinct
/// "log is empty" state, not a zero-filled report.
pub fn analyze(rows: &[LogRow]) -> Option<LogReport> {
    if rows.is_empty() { return None; }
    let mut by_command: Vec<(String, usize)> = Vec::new();
    let mut by_status: Vec<(String, usize)> = Vec::new();
    for row in rows {
        bump(&mut by_command, &row.command);
        bump(&mut by_status, &row.status);
    }
    Some(LogReport { total: rows.len(), by_command, by_status })
}

fn bump(counts: &mut Vec<(String, usize)>, key: &str) {
    if let Some(entry) = counts.iter_mut().find(|(k, _)| k == key) {
        entry.1 += 1;
    } else {
        counts.push((key.to_string(), 1));
    }
}
