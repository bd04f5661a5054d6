//! Relay leg: one invocation event in, one text-encoded response frame out

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};
use tracing::{debug, info, warn};

use crate::constants::USER_HEADER;
use crate::crypto::Cipher;
use crate::error::{RelayError, Result};
use crate::pipeline::Pipeline;
use crate::protocol::{HttpRequest, HttpResponse, ResponseFrame};
use crate::utils::{decode_text, find_header};

/// Performs the real outbound request on the caller's behalf
pub trait OriginTransport: Send + Sync {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// Inbound invocation event
///
/// Only the fields the relay reads; gateway-specific extras are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayEvent {
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub is_base64_encoded: bool,

    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Stateless relay; safe to share across concurrent invocations
pub struct Relay<O, C> {
    origin: O,
    pipeline: Pipeline<C>,
    user: String,
}

impl<O: OriginTransport, C: Cipher> Relay<O, C> {
    pub fn new(origin: O, cipher: C, user: impl Into<String>) -> Self {
        Self {
            origin,
            pipeline: Pipeline::new(cipher),
            user: user.into(),
        }
    }

    /// Handle one invocation
    ///
    /// The identifier is checked before any decoding. Errors carry no
    /// payload; callers must not reveal which step failed.
    pub async fn handle(&self, event: &RelayEvent) -> Result<String> {
        let presented = find_header(&event.headers, USER_HEADER).unwrap_or("");
        if presented != self.user {
            warn!("Rejected invocation: identifier mismatch");
            return Err(RelayError::Unauthorized);
        }

        let payload = if event.is_base64_encoded {
            decode_text(&event.body)?
        } else {
            event.body.as_bytes().to_vec()
        };

        let request = self.pipeline.open_request(&payload)?.into_http()?;
        debug!(
            "Relaying {} {} ({} header names, {}B body)",
            request.method,
            request.url,
            request.headers.len(),
            request.body.len()
        );

        let method = request.method.clone();
        let url = request.url.clone();
        let response = self.origin.send(request).await?;
        info!("{} {} -> {}", method, url, response.status_code);

        let frame = ResponseFrame::from_http(&response)?;
        self.pipeline.seal_response(&frame)
    }
}
