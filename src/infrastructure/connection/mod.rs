//! Connection management: lifecycle, heartbeat, and reconnection.
//!
//! [`ConnectionManager`] is the handle; a background driver owns the channel
//! and applies [`HeartbeatMonitor`] and [`ReconnectionScheduler`] policy.

mod driver;
pub mod heartbeat;
mod manager;
pub mod reconnect;

pub use heartbeat::{HeartbeatMonitor, HeartbeatRecord, Liveness};
pub use manager::{ConnectionManager, EventReceiver};
pub use reconnect::{ReconnectBudget, ReconnectionScheduler, Schedule};
