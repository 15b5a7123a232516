//! Outbound interfaces the engines depend on abstractly: notification
//! delivery, archival, and compression. All three are best-effort from the
//! engine's point of view — a sink failing must never fail the write that
//! triggered it.

use accord_core::{AgentId, ContextChange, ContextId, Value, VersionId};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// An event pushed to a context's subscribers after a successful mutation.
#[derive(Debug, Clone)]
pub struct ContextChangedEvent {
    pub context_id: ContextId,
    pub changes: Vec<ContextChange>,
    pub new_version_id: VersionId,
}

#[async_trait]
pub trait NotificationSink: Send + Sync + std::fmt::Debug {
    async fn emit(&self, subscriber_id: AgentId, event: ContextChangedEvent);
}

#[async_trait]
pub trait ArchivalSink: Send + Sync + std::fmt::Debug {
    async fn archive(
        &self,
        context_id: ContextId,
        version: VersionId,
        content: Value,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) -> anyhow::Result<()>;
}

#[async_trait]
pub trait CompressionSink: Send + Sync + std::fmt::Debug {
    async fn compress(&self, context_id: ContextId, content: &Value) -> anyhow::Result<Value>;
}

/// A sink that does nothing, used when no external notification/archival/
/// compression service is configured. Matches the spec's requirement that
/// these services being unavailable must never block or fail a write.
#[derive(Debug, Default)]
pub struct NoopSink;

#[async_trait]
impl NotificationSink for NoopSink {
    async fn emit(&self, _subscriber_id: AgentId, _event: ContextChangedEvent) {}
}

#[async_trait]
impl ArchivalSink for NoopSink {
    async fn archive(
        &self,
        _context_id: ContextId,
        _version: VersionId,
        _content: Value,
        _timestamp: chrono::DateTime<chrono::Utc>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl CompressionSink for NoopSink {
    async fn compress(&self, _context_id: ContextId, content: &Value) -> anyhow::Result<Value> {
        Ok(content.clone())
    }
}

struct PendingNotification {
    subscriber_id: AgentId,
    event: ContextChangedEvent,
}

/// Bounded, drop-oldest queue in front of a `NotificationSink`. The engine
/// enqueues and returns immediately; a background task drains the queue so
/// emission never blocks the mutating operation that triggered it.
#[derive(Debug)]
pub struct NotificationDispatcher {
    queue: Arc<parking_lot::Mutex<VecDeque<PendingNotification>>>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
    sink: Arc<dyn NotificationSink>,
}

impl std::fmt::Debug for PendingNotification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingNotification")
            .field("subscriber_id", &self.subscriber_id)
            .field("context_id", &self.event.context_id)
            .finish()
    }
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>, capacity: usize) -> Self {
        Self {
            queue: Arc::new(parking_lot::Mutex::new(VecDeque::new())),
            capacity,
            dropped: Arc::new(AtomicU64::new(0)),
            sink,
        }
    }

    /// Enqueue a notification for one subscriber. Non-blocking; drops the
    /// oldest pending entry when the queue is full.
    pub fn enqueue(&self, subscriber_id: AgentId, event: ContextChangedEvent) {
        let mut queue = self.queue.lock();
        if queue.len() >= self.capacity {
            queue.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(capacity = self.capacity, "notification queue full, dropped oldest entry");
        }
        queue.push_back(PendingNotification { subscriber_id, event });
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Drain and deliver whatever is currently queued. Spawned as a
    /// recurring background `tokio::task` by the owning engine; exposed as
    /// a plain method so tests can drive delivery deterministically without
    /// a real scheduler.
    pub async fn drain_once(&self) {
        let pending: Vec<PendingNotification> = {
            let mut queue = self.queue.lock();
            queue.drain(..).collect()
        };
        for item in pending {
            debug!(subscriber_id = %item.subscriber_id, context_id = %item.event.context_id, "delivering notification");
            self.sink.emit(item.subscriber_id, item.event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overflow_drops_oldest_and_counts_it() {
        let dispatcher = NotificationDispatcher::new(Arc::new(NoopSink), 2);
        let context_id = uuid::Uuid::new_v4();
        let agent_id = uuid::Uuid::new_v4();
        for _ in 0..3 {
            dispatcher.enqueue(
                agent_id,
                ContextChangedEvent {
                    context_id,
                    changes: Vec::new(),
                    new_version_id: uuid::Uuid::new_v4(),
                },
            );
        }
        assert_eq!(dispatcher.dropped_count(), 1);
        assert_eq!(dispatcher.queue_len(), 2);
        dispatcher.drain_once().await;
        assert_eq!(dispatcher.queue_len(), 0);
    }
}
