//! Audit domain
//!
//! Operation outcomes recorded on a fire-and-forget side channel. The actor
//! is passed explicitly by the caller of every account operation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of whoever issued the request, used only for auditing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub const ANONYMOUS: &'static str = "anonymous";

    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();

        if id.trim().is_empty() {
            Self::anonymous()
        } else {
            Self(id)
        }
    }

    pub fn anonymous() -> Self {
        Self(Self::ANONYMOUS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of an audit record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One audited operation outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub level: AuditLevel,
    pub operation: String,
    pub actor_id: ActorId,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        level: AuditLevel,
        operation: impl Into<String>,
        actor_id: &ActorId,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            operation: operation.into(),
            actor_id: actor_id.clone(),
            message: message.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn error(operation: impl Into<String>, actor_id: &ActorId, message: impl Into<String>) -> Self {
        Self::new(AuditLevel::Error, operation, actor_id, message)
    }
}

/// Non-blocking recorder of audit records
///
/// `record` must return immediately and never fail; delivery is best-effort
/// and at most once.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: AuditRecord);
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Audit sink that keeps every record in memory
    #[derive(Debug, Default)]
    pub struct RecordingAuditSink {
        records: Mutex<Vec<AuditRecord>>,
    }

    impl RecordingAuditSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn records(&self) -> Vec<AuditRecord> {
            self.records.lock().unwrap().clone()
        }

        pub fn operations(&self) -> Vec<String> {
            self.records().into_iter().map(|r| r.operation).collect()
        }
    }

    impl AuditSink for RecordingAuditSink {
        fn record(&self, record: AuditRecord) {
            self.records.lock().unwrap().push(record);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_actor_is_anonymous() {
        assert_eq!(ActorId::new("  ").as_str(), ActorId::ANONYMOUS);
        assert_eq!(ActorId::new("admin-1").as_str(), "admin-1");
    }

    #[test]
    fn test_error_record() {
        let actor = ActorId::new("admin-1");
        let record = AuditRecord::error("create_account", &actor, "Email already exists");

        assert_eq!(record.level, AuditLevel::Error);
        assert_eq!(record.operation, "create_account");
        assert_eq!(record.actor_id, actor);
    }

    #[test]
    fn test_recording_sink_keeps_records() {
        let sink = mock::RecordingAuditSink::new();
        sink.record(AuditRecord::error("delete_account", &ActorId::anonymous(), "boom"));

        assert_eq!(sink.operations(), vec!["delete_account".to_string()]);
    }
}
