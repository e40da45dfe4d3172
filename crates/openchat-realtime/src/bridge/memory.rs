//! In-memory event fan-out for single-node deployments.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tokio::sync::broadcast;

use super::ServiceEvent;

/// In-memory subject → broadcast channel map.
#[derive(Debug)]
pub struct MemoryBus {
    /// Subject → broadcast sender
    subjects: RwLock<HashMap<String, broadcast::Sender<ServiceEvent>>>,
    /// Buffer size for subjects
    buffer_size: usize,
}

impl MemoryBus {
    /// Create a new in-memory bus
    pub fn new(buffer_size: usize) -> Self {
        Self {
            subjects: RwLock::new(HashMap::new()),
            buffer_size,
        }
    }

    /// Publish an event to a subject
    pub async fn publish(&self, subject: &str, event: ServiceEvent) {
        let subjects = self.subjects.read().await;
        if let Some(tx) = subjects.get(subject) {
            let _ = tx.send(event);
        }
    }

    /// Subscribe to a subject, returns a receiver
    pub async fn subscribe(&self, subject: &str) -> broadcast::Receiver<ServiceEvent> {
        let mut subjects = self.subjects.write().await;
        let tx = subjects
            .entry(subject.to_string())
            .or_insert_with(|| broadcast::channel(self.buffer_size).0);
        tx.subscribe()
    }
}
