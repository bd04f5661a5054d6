//! Configuration values shared by both tunnel legs
//!
//! The shared secret and identifier are plain values handed to constructors;
//! nothing here is global.

use std::fmt;

use tracing::warn;

use crate::constants::{ENV_RELAY_KEY, ENV_RELAY_USER};

/// Raw shared secret, any length
///
/// Normalized into an AES key on every use, see [`crate::crypto::cut_key`].
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(Vec<u8>);

impl SharedSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(secret.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret(<{} bytes>)", self.0.len())
    }
}

/// Identifier and secret agreed out of band between client and relay
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Shared identifier sent in the `X-User` header
    pub user: String,

    /// Shared encryption secret
    pub key: SharedSecret,
}

impl Credentials {
    pub fn new(user: impl Into<String>, key: impl Into<Vec<u8>>) -> Self {
        Self {
            user: user.into(),
            key: SharedSecret::new(key),
        }
    }

    /// Load the relay's credentials from its hosting environment
    ///
    /// Unset variables read as empty, which the relay still accepts: an
    /// empty identifier matches requests without the header and an empty key
    /// falls back to the built-in weak key.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let user = lookup(ENV_RELAY_USER).unwrap_or_default();
        let key = lookup(ENV_RELAY_KEY).unwrap_or_default();

        if user.is_empty() {
            warn!("{} is empty; requests without an identifier will be accepted", ENV_RELAY_USER);
        }

        Self::new(user, key)
    }
}
