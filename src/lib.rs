//! Chatlink - resilient real-time connection management for chat channels.
//!
//! Keeps one logical connection to a chat backend alive across network
//! drops, dead sockets, and host lifecycle changes, and presents a small
//! reliable surface to the payload layer: connect, disconnect, send, and a
//! stream of lifecycle and message events.
//!
//! # Architecture
//!
//! - **`domain`** - Connection state, client identity, wire envelopes, events
//! - **`port`** - The `Transport`/`Channel` seam the manager drives
//! - **`adapter`** - WebSocket transport and the CLI
//! - **`infrastructure`** - Config, the connection driver with heartbeat and
//!   backoff, and the host lifecycle watcher
//!
//! # Features
//!
//! - `testkit` - Scripted in-memory transport and event helpers for tests
//!
//! # Example
//!
//! ```no_run
//! use chatlink::adapter::outbound::WebSocketTransport;
//! use chatlink::infrastructure::config::Config;
//! use chatlink::infrastructure::connection::ConnectionManager;
//!
//! # async fn demo() -> chatlink::error::Result<()> {
//! let config = Config::load("config.toml")?;
//! let (manager, mut events) =
//!     ConnectionManager::spawn(&config.connection, WebSocketTransport::new())?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use domain::{ConnectionEvent, ConnectionState};
pub use infrastructure::connection::ConnectionManager;
pub use infrastructure::environment::{EnvironmentWatcher, HostSignal};
