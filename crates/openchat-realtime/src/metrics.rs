//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::room::room::DispatchReport;

/// Engine-level metrics counters.
#[derive(Debug)]
pub struct EngineMetrics {
    /// Total connections established
    pub connections_total: AtomicU64,
    /// Connections currently active
    pub connections_active: AtomicU64,
    /// Total inbound frames accepted
    pub frames_in: AtomicU64,
    /// Total frames queued outbound
    pub frames_out: AtomicU64,
    /// Total outbound frames dropped on dead or congested connections
    pub delivery_failures: AtomicU64,
    /// Total inbound frames rejected at the boundary
    pub frames_rejected: AtomicU64,
    /// Total join attempts rejected
    pub joins_rejected: AtomicU64,
    /// Total duplicate-close races observed
    pub state_inconsistencies: AtomicU64,
}

impl EngineMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            connections_active: AtomicU64::new(0),
            frames_in: AtomicU64::new(0),
            frames_out: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            frames_rejected: AtomicU64::new(0),
            joins_rejected: AtomicU64::new(0),
            state_inconsistencies: AtomicU64::new(0),
        }
    }

    /// Record a joined connection
    pub fn record_connect(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a closed connection
    pub fn record_disconnect(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record one accepted inbound frame
    pub fn record_frame_in(&self) {
        self.frames_in.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of a room dispatch
    pub fn record_dispatch(&self, report: &DispatchReport) {
        self.frames_out
            .fetch_add(report.connections as u64, Ordering::Relaxed);
        self.delivery_failures
            .fetch_add(report.failures as u64, Ordering::Relaxed);
    }

    /// Record one outbound frame queued outside a dispatch
    pub fn record_direct_send(&self, delivered: bool) {
        if delivered {
            self.frames_out.fetch_add(1, Ordering::Relaxed);
        } else {
            self.delivery_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an inbound frame rejected at the boundary
    pub fn record_rejected_frame(&self) {
        self.frames_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a rejected join attempt
    pub fn record_rejected_join(&self) {
        self.joins_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a duplicate-close race
    pub fn record_state_inconsistency(&self) {
        self.state_inconsistencies.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            frames_in: self.frames_in.load(Ordering::Relaxed),
            frames_out: self.frames_out.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            frames_rejected: self.frames_rejected.load(Ordering::Relaxed),
            joins_rejected: self.joins_rejected.load(Ordering::Relaxed),
            state_inconsistencies: self.state_inconsistencies.load(Ordering::Relaxed),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total connections ever established
    pub connections_total: u64,
    /// Currently active connections
    pub connections_active: u64,
    /// Total inbound frames accepted
    pub frames_in: u64,
    /// Total frames queued outbound
    pub frames_out: u64,
    /// Total outbound frames dropped
    pub delivery_failures: u64,
    /// Total inbound frames rejected
    pub frames_rejected: u64,
    /// Total join attempts rejected
    pub joins_rejected: u64,
    /// Total duplicate-close races observed
    pub state_inconsistencies: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_outcomes_accumulate() {
        let metrics = EngineMetrics::new();
        metrics.record_dispatch(&DispatchReport {
            members: 2,
            connections: 3,
            failures: 1,
        });
        metrics.record_dispatch(&DispatchReport {
            members: 1,
            connections: 1,
            failures: 0,
        });

        let snap = metrics.snapshot();
        assert_eq!(snap.frames_out, 4);
        assert_eq!(snap.delivery_failures, 1);
    }

    #[test]
    fn test_connect_and_disconnect_balance() {
        let metrics = EngineMetrics::new();
        metrics.record_connect();
        metrics.record_connect();
        metrics.record_disconnect();

        let snap = metrics.snapshot();
        assert_eq!(snap.connections_total, 2);
        assert_eq!(snap.connections_active, 1);
    }
}
