use serde::{Deserialize, Serialize};

/// Outcome of a single diagnostic run, stored verbatim in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagStatus {
    Success,
    Failed,
    Captured,
}

impl DiagStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagStatus::Success => "Success",
            DiagStatus::Failed => "Failed",
            DiagStatus::Captured => "Captured",
        }
    }
}

impl std::fmt::Display for DiagStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Packet statistics extracted from ping output. Every field carries a
/// sentinel default so a record is complete even when nothing matched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PingStats {
    pub transmitted: u32,
    pub received: u32,
    pub loss: String,
    pub avg_ms: String,
    pub status: DiagStatus,
}

impl Default for PingStats {
    fn default() -> Self {
        Self {
            transmitted: 0,
            received: 0,
            loss: "100%".to_string(),
            avg_ms: "N/A".to_string(),
            status: DiagStatus::Failed,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupResult {
    pub address: String,
    pub status: DiagStatus,
}

impl Default for LookupResult {
    fn default() -> Self {
        Self { address: "Not found".to_string(), status: DiagStatus::Failed }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub mac: String,
    pub ipv4: String,
}

impl Default for InterfaceInfo {
    fn default() -> Self {
        Self { mac: "Not found".to_string(), ipv4: "Not found".to_string() }
    }
}

/// One qualifying line from the ARP table. Entries keep file order and are
/// not deduplicated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArpEntry {
    pub ip: String,
    pub mac: String,
}

/// One row of the tabular store: exactly five fields, fixed order. Status is
/// kept as free text because rows read back from disk are never re-typed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRow {
    pub timestamp: String,
    pub command: String,
    pub target: String,
    pub result: String,
    pub status: String,
}

impl LogRow {
    pub fn new(command: &str, target: &str, result: &str, status: &str) -> Self {
        Self {
            timestamp: now_stamp(),
            command: command.to_string(),
            target: target.to_string(),
            result: result.to_string(),
            status: status.to_string(),
        }
    }
}

pub fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
