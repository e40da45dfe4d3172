//! Real-time room engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) room engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Seconds a connection may spend completing the join handshake
    /// before it is forcibly closed.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_seconds: u64,
    /// Per-connection outbound queue depth, in frames.
    #[serde(default = "default_connection_buffer")]
    pub connection_buffer_size: usize,
    /// Maximum accepted inbound frame size in bytes.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Minimum role rank required to receive admin-tagged frames.
    #[serde(default = "default_admin_min_rank")]
    pub admin_min_rank: i16,
    /// Service event bus settings.
    #[serde(default)]
    pub bus: BusConfig,
}

/// Service event bus settings for the room engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Whether room service events are published at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Subject prefix for room service events.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    /// Buffer size of each bus subject's broadcast channel.
    #[serde(default = "default_bus_buffer")]
    pub buffer_size: usize,
    /// Redis URL for the cross-process relay (`bus-relay` feature only).
    #[serde(default)]
    pub redis_url: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_seconds: default_handshake_timeout(),
            connection_buffer_size: default_connection_buffer(),
            max_frame_bytes: default_max_frame_bytes(),
            admin_min_rank: default_admin_min_rank(),
            bus: BusConfig::default(),
        }
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            subject_prefix: default_subject_prefix(),
            buffer_size: default_bus_buffer(),
            redis_url: String::new(),
        }
    }
}

fn default_handshake_timeout() -> u64 {
    10
}

fn default_connection_buffer() -> usize {
    256
}

fn default_max_frame_bytes() -> usize {
    65536
}

fn default_admin_min_rank() -> i16 {
    4
}

fn default_true() -> bool {
    true
}

fn default_subject_prefix() -> String {
    "rooms".to_string()
}

fn default_bus_buffer() -> usize {
    128
}
