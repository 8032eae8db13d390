//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`transport`]: In-memory [`Transport`](crate::port::Transport) with a
//!   scripted open sequence and a controllable peer per channel.
//! - [`events`]: Awaiting and draining the event stream under paused time.
//! - [`config`]: Canonical test configurations.

pub mod config;
pub mod events;
pub mod transport;
