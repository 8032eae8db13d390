//! Infrastructure configuration modules.

pub mod connection;
pub mod logging;
pub mod settings;

pub use connection::ConnectionConfig;
pub use logging::{LogFormat, LoggingConfig};
pub use settings::Config;
