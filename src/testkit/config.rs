//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.
//! Avoids each test module defining its own slightly-different defaults.

use crate::infrastructure::config::ConnectionConfig;

/// Endpoint used by every scripted test. Never dialed.
pub const TEST_URL: &str = "ws://chat.test/ws";

/// Manual-connect config with the default retry and heartbeat policy.
pub fn connection() -> ConnectionConfig {
    ConnectionConfig {
        auto_connect: false,
        ..ConnectionConfig::with_url(TEST_URL)
    }
}

/// Manual-connect config with a specific retry budget.
pub fn reconnecting(max_attempts: u32, base_delay_ms: u64) -> ConnectionConfig {
    ConnectionConfig {
        reconnection_attempts: max_attempts,
        reconnection_delay_ms: base_delay_ms,
        ..connection()
    }
}

/// Manual-connect config probing every `interval_ms`.
pub fn heartbeat(interval_ms: u64) -> ConnectionConfig {
    ConnectionConfig {
        heartbeat_interval_ms: interval_ms,
        ..connection()
    }
}
