//! Append-only audit sinks
//!
//! `AuditLogger` writes records to a JSONL file, one line per record, flushed
//! immediately. `MemoryAuditLog` keeps them in process.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{ChronicleError, ChronicleResult};
use crate::models::ActorId;

use super::entry::AuditLogRecord;

/// Destination for audit records
///
/// Sinks only ever append; records are never updated or removed.
pub trait AuditSink {
    fn append(&self, record: &AuditLogRecord) -> ChronicleResult<()>;
}

impl<S: AuditSink + ?Sized> AuditSink for &S {
    fn append(&self, record: &AuditLogRecord) -> ChronicleResult<()> {
        (**self).append(record)
    }
}

/// Criteria for `AuditLogger::query`
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub entity_type: Option<String>,
    /// Matches the affected id or any related id
    pub entity_id: Option<String>,
    pub actor_id: Option<ActorId>,
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub fn matches(&self, record: &AuditLogRecord) -> bool {
        if let Some(entity_type) = &self.entity_type {
            if !record.entity_type.eq_ignore_ascii_case(entity_type) {
                return false;
            }
        }
        if let Some(id) = &self.entity_id {
            if !record.concerns(id) {
                return false;
            }
        }
        if let Some(actor) = self.actor_id {
            if record.actor_id != actor {
                return false;
            }
        }
        true
    }
}

/// Handles writing audit records to the audit log file
///
/// The log file uses a line-delimited JSON format (JSONL) where each line
/// is a complete JSON object representing one audit record.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    /// Create a new AuditLogger that writes to the specified path
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Read all audit records from the log file
    ///
    /// Returns records in write order (oldest first).
    pub fn read_all(&self) -> ChronicleResult<Vec<AuditLogRecord>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| ChronicleError::Io(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| {
                ChronicleError::Io(format!(
                    "Failed to read audit log line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            if line.trim().is_empty() {
                continue;
            }

            let record: AuditLogRecord = serde_json::from_str(&line).map_err(|e| {
                ChronicleError::Json(format!(
                    "Failed to parse audit record at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;

            records.push(record);
        }

        Ok(records)
    }

    /// Read the most recent N records from the log
    pub fn read_recent(&self, count: usize) -> ChronicleResult<Vec<AuditLogRecord>> {
        let mut records = self.read_all()?;
        let start = records.len().saturating_sub(count);
        Ok(records.split_off(start))
    }

    /// Records matching `filter`, newest first
    pub fn query(&self, filter: &AuditFilter) -> ChronicleResult<Vec<AuditLogRecord>> {
        let matching = self
            .read_all()?
            .into_iter()
            .rev()
            .filter(|record| filter.matches(record));

        Ok(match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    /// Get the number of records in the audit log
    pub fn entry_count(&self) -> ChronicleResult<usize> {
        if !self.log_path.exists() {
            return Ok(0);
        }

        let file = File::open(&self.log_path)
            .map_err(|e| ChronicleError::Io(format!("Failed to open audit log: {}", e)))?;

        let reader = BufReader::new(file);
        let count = reader
            .lines()
            .map_while(Result::ok)
            .filter(|line| !line.trim().is_empty())
            .count();

        Ok(count)
    }

    /// Check if the audit log file exists
    pub fn exists(&self) -> bool {
        self.log_path.exists()
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}

impl AuditSink for AuditLogger {
    /// Appends the record as a JSON line and flushes it
    fn append(&self, record: &AuditLogRecord) -> ChronicleResult<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| ChronicleError::Json(format!("Failed to serialize audit record: {}", e)))?;

        if let Some(parent) = self.log_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ChronicleError::Io(format!("Failed to create audit directory: {}", e)))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| ChronicleError::Io(format!("Failed to open audit log: {}", e)))?;

        writeln!(file, "{}", json)
            .map_err(|e| ChronicleError::Io(format!("Failed to write audit record: {}", e)))?;

        file.flush()
            .map_err(|e| ChronicleError::Io(format!("Failed to flush audit log: {}", e)))?;

        Ok(())
    }
}

/// In-process audit sink
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    records: RwLock<Vec<AuditLogRecord>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record appended so far
    pub fn records(&self) -> Vec<AuditLogRecord> {
        self.records
            .read()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemoryAuditLog {
    fn append(&self, record: &AuditLogRecord) -> ChronicleResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|_| ChronicleError::Storage("Audit log lock poisoned".into()))?;
        records.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::entry::{AuditAction, AuditData, AuditState};
    use crate::models::AuditLogId;
    use chrono::Utc;
    use tempfile::TempDir;

    fn create_test_logger() -> (AuditLogger, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");
        let logger = AuditLogger::new(log_path);
        (logger, temp_dir)
    }

    fn record(entity_type: &str, id: &str, actor: u64) -> AuditLogRecord {
        AuditLogRecord {
            id: AuditLogId::new(),
            entity_type: entity_type.to_string(),
            affected_entity_id: id.to_string(),
            related_entity_ids: Vec::new(),
            tracking_state: AuditState::Created,
            audit_data: AuditData::new(),
            actor_id: ActorId::new(actor),
            action: AuditAction::CREATE,
            comment: None,
            source: "test".to_string(),
            ip: None,
            user_agent: None,
            added_on: Utc::now(),
        }
    }

    #[test]
    fn test_append_and_read() {
        let (logger, _temp) = create_test_logger();
        logger.append(&record("Order", "1", 7)).unwrap();

        let records = logger.read_all().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entity_type, "Order");
        assert_eq!(records[0].actor_id, ActorId::new(7));
    }

    #[test]
    fn test_read_recent() {
        let (logger, _temp) = create_test_logger();
        for i in 0..10 {
            logger.append(&record("Order", &i.to_string(), 1)).unwrap();
        }

        assert_eq!(logger.entry_count().unwrap(), 10);
        let recent = logger.read_recent(3).unwrap();
        let ids: Vec<_> = recent.iter().map(|r| r.affected_entity_id.as_str()).collect();
        assert_eq!(ids, vec!["7", "8", "9"]);
    }

    #[test]
    fn test_query_filters_newest_first() {
        let (logger, _temp) = create_test_logger();
        logger.append(&record("Order", "1", 7)).unwrap();
        logger.append(&record("TaxRate", "VAT", 7)).unwrap();
        logger.append(&record("Order", "2", 8)).unwrap();
        let mut line = record("OrderLine", "5", 7);
        line.related_entity_ids = vec!["1".to_string()];
        logger.append(&line).unwrap();

        let by_actor = logger
            .query(&AuditFilter {
                actor_id: Some(ActorId::new(7)),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(by_actor.len(), 3);
        assert_eq!(by_actor[0].entity_type, "OrderLine");

        let orders = logger
            .query(&AuditFilter {
                entity_type: Some("order".to_string()),
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].affected_entity_id, "2");

        let about_one = logger
            .query(&AuditFilter {
                entity_id: Some("1".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(about_one.len(), 2);
    }

    #[test]
    fn test_empty_log() {
        let (logger, _temp) = create_test_logger();

        assert!(!logger.exists());
        assert_eq!(logger.entry_count().unwrap(), 0);
        assert!(logger.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_survives_restart() {
        let (logger, temp) = create_test_logger();
        logger.append(&record("Order", "1", 7)).unwrap();

        let reopened = AuditLogger::new(temp.path().join("audit.log"));
        assert_eq!(reopened.read_all().unwrap().len(), 1);
    }

    #[test]
    fn test_memory_sink_through_reference() {
        let sink = MemoryAuditLog::new();
        let by_ref: &dyn AuditSink = &sink;
        by_ref.append(&record("Order", "1", 7)).unwrap();
        (&sink).append(&record("Order", "2", 7)).unwrap();
        assert_eq!(sink.len(), 2);
    }
}
