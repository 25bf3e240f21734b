//! Audit infrastructure - Bounded channel sink drained by a background writer

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::audit::{AuditLevel, AuditRecord, AuditSink};

/// Audit sink that hands records to a background task
///
/// `record` never blocks; when the buffer is full or the writer is gone the
/// record is dropped and counted.
#[derive(Debug)]
pub struct ChannelAuditSink {
    sender: mpsc::Sender<AuditRecord>,
    dropped: AtomicU64,
}

impl ChannelAuditSink {
    pub fn new(buffer_size: usize) -> (Self, mpsc::Receiver<AuditRecord>) {
        let (sender, receiver) = mpsc::channel(buffer_size.max(1));

        (
            Self {
                sender,
                dropped: AtomicU64::new(0),
            },
            receiver,
        )
    }

    /// Records discarded so far
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl AuditSink for ChannelAuditSink {
    fn record(&self, record: AuditRecord) {
        if let Err(e) = self.sender.try_send(record) {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;

            match e {
                mpsc::error::TrySendError::Full(record) => tracing::warn!(
                    operation = %record.operation,
                    dropped = total,
                    "Audit buffer full, dropping record"
                ),
                mpsc::error::TrySendError::Closed(record) => tracing::warn!(
                    operation = %record.operation,
                    dropped = total,
                    "Audit writer stopped, dropping record"
                ),
            }
        }
    }
}

/// Drains audit records into structured log events under the `audit` target
pub struct AuditWriter {
    receiver: mpsc::Receiver<AuditRecord>,
}

impl AuditWriter {
    pub fn new(receiver: mpsc::Receiver<AuditRecord>) -> Self {
        Self { receiver }
    }

    /// Runs until every sender is dropped, returning how many records were written
    pub async fn run(mut self) -> u64 {
        let mut written = 0;

        while let Some(record) = self.receiver.recv().await {
            write_record(&record);
            written += 1;
        }

        tracing::debug!(written, "Audit writer finished");
        written
    }
}

fn write_record(record: &AuditRecord) {
    let operation = record.operation.as_str();
    let actor_id = record.actor_id.as_str();
    let recorded_at = record.recorded_at.to_rfc3339();

    match record.level {
        AuditLevel::Debug => {
            tracing::debug!(target: "audit", operation, actor_id, %recorded_at, "{}", record.message)
        }
        AuditLevel::Info => {
            tracing::info!(target: "audit", operation, actor_id, %recorded_at, "{}", record.message)
        }
        AuditLevel::Warn => {
            tracing::warn!(target: "audit", operation, actor_id, %recorded_at, "{}", record.message)
        }
        AuditLevel::Error => {
            tracing::error!(target: "audit", operation, actor_id, %recorded_at, "{}", record.message)
        }
    }
}

/// Create a channel sink and spawn its writer on the current runtime
pub fn spawn_audit_writer(buffer_size: usize) -> (Arc<ChannelAuditSink>, JoinHandle<u64>) {
    let (sink, receiver) = ChannelAuditSink::new(buffer_size);
    let handle = tokio::spawn(AuditWriter::new(receiver).run());

    (Arc::new(sink), handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit::ActorId;

    fn record(operation: &str) -> AuditRecord {
        AuditRecord::error(operation, &ActorId::new("admin-1"), "failed")
    }

    #[tokio::test]
    async fn test_record_is_delivered() {
        let (sink, mut receiver) = ChannelAuditSink::new(8);

        sink.record(record("create_account"));

        let delivered = receiver.recv().await.unwrap();
        assert_eq!(delivered.operation, "create_account");
        assert_eq!(delivered.actor_id.as_str(), "admin-1");
        assert_eq!(sink.dropped(), 0);
    }

    #[tokio::test]
    async fn test_full_buffer_drops_without_blocking() {
        let (sink, mut receiver) = ChannelAuditSink::new(1);

        sink.record(record("first"));
        sink.record(record("second"));

        assert_eq!(sink.dropped(), 1);
        assert_eq!(receiver.recv().await.unwrap().operation, "first");
    }

    #[tokio::test]
    async fn test_closed_writer_drops() {
        let (sink, receiver) = ChannelAuditSink::new(4);
        drop(receiver);

        sink.record(record("delete_account"));

        assert_eq!(sink.dropped(), 1);
    }

    #[tokio::test]
    async fn test_writer_drains_until_senders_close() {
        let (sink, handle) = spawn_audit_writer(16);

        sink.record(record("create_account"));
        sink.record(record("authenticate"));
        drop(sink);

        assert_eq!(handle.await.unwrap(), 2);
    }
}
