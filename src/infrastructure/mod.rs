//! Infrastructure layer.
//!
//! Provides technical concerns that support the application without containing
//! business logic.
//!
//! # Submodules
//!
//! - [`config`] - Configuration loading and validation
//! - [`connection`] - Connection lifecycle, heartbeat, and reconnection
//! - [`environment`] - Host lifecycle signals

pub mod config;
pub mod connection;
pub mod environment;
