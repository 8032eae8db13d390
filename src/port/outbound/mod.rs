//! Outbound ports: what the manager needs from the outside world.

mod transport;

pub use transport::{Channel, ChannelProbe, Frame, Transport};
