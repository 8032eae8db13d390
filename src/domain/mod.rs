//! Transport-agnostic domain types: state, identity, envelopes, events.

pub mod envelope;
pub mod event;
pub mod identity;
pub mod state;

pub use envelope::{ControlKind, Envelope};
pub use event::{close_code, CloseInfo, ConnectionError, ConnectionEvent, SendError};
pub use identity::{ClientId, IdentityProvider};
pub use state::ConnectionState;
