//! Injectable diagnostic sink: how the vault reports its own failures.
//!
//! Every degraded operation (a clean attempt abandoned, a rename race lost,
//! an append that failed) emits one [`DiagRecord`] before returning its
//! `bool`/`Option` to the caller. The host crash reporter supplies the sink;
//! the vault itself never writes to its own log directory. Records are
//! self-contained JSON lines assembled in memory and emitted with a single
//! write so concurrent processes tailing the same stream never interleave
//! partial lines.

#![allow(missing_docs)]

use std::io::Write;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Severity level for diagnostic records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
}

/// The vault operation a record pertains to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultOp {
    Initialize,
    Maintain,
    Rotate,
    Clean,
    Refill,
    Consume,
    Recycle,
    Append,
    CreateLog,
}

/// A single diagnostic record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagRecord {
    /// ISO 8601 UTC timestamp.
    pub ts: String,
    /// Vault operation identifier.
    pub op: VaultOp,
    /// Severity level.
    pub severity: Severity,
    /// Affected filesystem path (when applicable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// CLV error code if the operation degraded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    /// Freeform details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl DiagRecord {
    /// Create a new record stamped with the current UTC time.
    pub fn new(op: VaultOp, severity: Severity) -> Self {
        Self {
            ts: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            op,
            severity,
            path: None,
            error_code: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_error(mut self, err: &crate::core::errors::VaultError) -> Self {
        self.error_code = Some(err.code().to_string());
        self.details = Some(err.to_string());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Destination for diagnostic records. Implementations must be cheap and
/// must never panic: a sink failure during crash handling would destroy the
/// very report we are trying to save.
pub trait DiagSink: Send + Sync {
    fn record(&self, record: DiagRecord);
}

/// Sink that writes one JSON line per record to stderr with a `[CLV]`
/// prefix. Serialization failures are discarded.
#[derive(Debug, Default)]
pub struct StderrSink;

impl DiagSink for StderrSink {
    fn record(&self, record: DiagRecord) {
        if let Ok(json) = serde_json::to_string(&record) {
            let line = format!("[CLV] {json}\n");
            let _ = std::io::stderr().write_all(line.as_bytes());
        }
    }
}

/// Sink that discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl DiagSink for NullSink {
    fn record(&self, _record: DiagRecord) {}
}

/// Sink that retains records in memory, for tests and inspection.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<DiagRecord>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records seen so far.
    pub fn records(&self) -> Vec<DiagRecord> {
        self.records.lock().clone()
    }

    /// Count of warning-severity records.
    pub fn warning_count(&self) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.severity == Severity::Warning)
            .count()
    }
}

impl DiagSink for MemorySink {
    fn record(&self, record: DiagRecord) {
        self.records.lock().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::VaultError;

    #[test]
    fn record_serializes_to_single_json_line() {
        let record = DiagRecord::new(VaultOp::Clean, Severity::Warning)
            .with_path("/tmp/placeholder_1.dirty.crashlog")
            .with_details("abandoned");
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"op\":\"clean\""));
        assert!(json.contains("\"severity\":\"warning\""));
    }

    #[test]
    fn absent_fields_are_omitted() {
        let record = DiagRecord::new(VaultOp::Maintain, Severity::Info);
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("path"));
        assert!(!json.contains("error_code"));
        assert!(!json.contains("details"));
    }

    #[test]
    fn with_error_captures_code_and_message() {
        let err = VaultError::RaceLost {
            path: "/tmp/x".into(),
        };
        let record = DiagRecord::new(VaultOp::Consume, Severity::Info).with_error(&err);
        assert_eq!(record.error_code.as_deref(), Some("CLV-3002"));
        assert!(record.details.unwrap().contains("/tmp/x"));
    }

    #[test]
    fn memory_sink_collects_and_counts() {
        let sink = MemorySink::new();
        sink.record(DiagRecord::new(VaultOp::Refill, Severity::Info));
        sink.record(DiagRecord::new(VaultOp::Refill, Severity::Warning));
        sink.record(DiagRecord::new(VaultOp::Append, Severity::Warning));
        assert_eq!(sink.records().len(), 3);
        assert_eq!(sink.warning_count(), 2);
    }

    #[test]
    fn null_sink_discards() {
        let sink = NullSink;
        sink.record(DiagRecord::new(VaultOp::Initialize, Severity::Info));
    }
}
