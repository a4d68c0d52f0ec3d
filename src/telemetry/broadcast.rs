use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::broadcast;

/// One log event as sent to live observers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub target: String,
    pub message: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Fan-out of log records to any number of subscribers
///
/// Uses a tokio broadcast channel: slow subscribers lose the oldest
/// records instead of blocking the emitter.
#[derive(Clone)]
pub struct LogBroadcaster {
    sender: Arc<broadcast::Sender<LogRecord>>,
}

impl LogBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogRecord> {
        self.sender.subscribe()
    }

    /// Publish a record; dropped silently when nobody listens
    pub fn emit(&self, record: LogRecord) {
        let _ = self.sender.send(record);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl std::fmt::Debug for LogBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogBroadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
