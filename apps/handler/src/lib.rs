//! Relay side of the tunnel, hosted as a Lambda function
//!
//! Each invocation carries one sealed request. The handler opens it, replays
//! it against the origin and returns the sealed, text-encoded response as the
//! function result.

use std::time::Duration;

use anyhow::{Context, Result};
use fn_relay_common::constants::{ENV_RELAY_ORIGIN_TIMEOUT, ORIGIN_TIMEOUT_SECS};
use fn_relay_common::{Cipher, Credentials, OriginTransport, Relay, RelayEvent};
use tracing::debug;

pub mod error_handling;
pub mod origin;

use error_handling::sanitize_error;

/// Relay configuration read from the hosting environment
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub credentials: Credentials,
    pub origin_timeout: Duration,
}

impl RelayConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            credentials: Credentials::from_env(),
            origin_timeout: parse_origin_timeout(std::env::var(ENV_RELAY_ORIGIN_TIMEOUT).ok())?,
        })
    }
}

fn parse_origin_timeout(value: Option<String>) -> Result<Duration> {
    let secs = match value {
        Some(v) => v.trim().parse::<u64>().with_context(|| {
            format!("{} must be a whole number of seconds, got {:?}", ENV_RELAY_ORIGIN_TIMEOUT, v)
        })?,
        None => ORIGIN_TIMEOUT_SECS,
    };
    Ok(Duration::from_secs(secs))
}

/// Run one invocation through the relay, collapsing every failure into the
/// same opaque error
pub async fn handle_invocation<O, C>(
    relay: &Relay<O, C>,
    event: RelayEvent,
) -> Result<String, lambda_runtime::Error>
where
    O: OriginTransport,
    C: Cipher,
{
    debug!(
        "Invocation: {}B body, base64={}",
        event.body.len(),
        event.is_base64_encoded
    );
    relay
        .handle(&event)
        .await
        .map_err(|e| sanitize_error(&e).into())
}
