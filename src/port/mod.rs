//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! Adapters implement them to plug a concrete wire into the connection
//! manager without the manager knowing which one it drives.
//!
//! # Architecture
//!
//! ```text
//!   host signals ──► EnvironmentWatcher ─┐
//!                                        ▼
//!   payload layer ───────────────► ConnectionManager ──► Transport port
//!        ▲                               │                    │
//!        └──────── ConnectionEvent ◄─────┘            WebSocket adapter
//! ```
//!
//! # Available Ports
//!
//! - [`Transport`], [`Channel`] - Opening and driving one bidirectional channel

pub mod outbound;

pub use outbound::{Channel, ChannelProbe, Frame, Transport};
