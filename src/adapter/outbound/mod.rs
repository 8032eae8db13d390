//! Outbound adapters (driven side).

pub mod websocket;

pub use websocket::{WebSocketChannel, WebSocketTransport};
