//! Client identity that survives reconnects.

use std::fmt;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

const ID_PREFIX: &str = "client_";
const SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Opaque client identifier - newtype for type safety.
///
/// The inner String is private to ensure all construction goes through
/// the defined constructors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    /// Create a `ClientId` from an existing string (e.g. one assigned by the server).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the client ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ClientId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for ClientId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Generates and holds the identity of one manager instance.
///
/// The identifier is produced once, at construction, and never changes for
/// the lifetime of the provider. Reconnect attempts reuse it so the server
/// registry can correlate them with the same logical session.
#[derive(Debug, Clone)]
pub struct IdentityProvider {
    client_id: ClientId,
}

impl IdentityProvider {
    /// Create a provider with a freshly generated `client_<ms>_<base36>` identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client_id: Self::generate(),
        }
    }

    /// Create a provider around a known identifier.
    #[must_use]
    pub const fn with_id(client_id: ClientId) -> Self {
        Self { client_id }
    }

    #[must_use]
    pub const fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Produce a new identifier: `client_` + epoch milliseconds + `_` + 9 base-36 characters.
    #[must_use]
    pub fn generate() -> ClientId {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
            .collect();

        ClientId(format!(
            "{ID_PREFIX}{}_{suffix}",
            Utc::now().timestamp_millis()
        ))
    }
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}
