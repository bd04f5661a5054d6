//! Client leg: intercepted request in, relayed response (or diagnostic) out

use std::fmt;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::constants::RELAY_ERROR_HEADER;
use crate::crypto::Cipher;
use crate::error::{ErrorKind, RelayError, Result};
use crate::pipeline::Pipeline;
use crate::protocol::{HttpRequest, HttpResponse, RequestFrame};
use crate::utils::generate_request_id;

/// Carries a sealed request to the relay endpoint
pub trait RelayTransport: Send + Sync {
    /// POST `payload` with the identifier header and return the full reply body
    ///
    /// Timeouts are the transport's own policy and surface as
    /// [`RelayError::Timeout`].
    fn post(&self, payload: Vec<u8>, user: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Step of the client leg that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BuildRequest,
    SealRequest,
    PostRequest,
    DecodeResponse,
    DecompressResponse,
    DecryptResponse,
    ParseResponse,
}

impl Stage {
    fn of_request(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Framing => Self::BuildRequest,
            _ => Self::SealRequest,
        }
    }

    fn of_response(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Encoding => Self::DecodeResponse,
            ErrorKind::Compression => Self::DecompressResponse,
            ErrorKind::Crypto => Self::DecryptResponse,
            _ => Self::ParseResponse,
        }
    }

    /// Short slug used in the diagnostic header
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BuildRequest => "build-request",
            Self::SealRequest => "seal-request",
            Self::PostRequest => "post-request",
            Self::DecodeResponse => "decode-response",
            Self::DecompressResponse => "decompress-response",
            Self::DecryptResponse => "decrypt-response",
            Self::ParseResponse => "parse-response",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::BuildRequest => "encoding request",
            Self::SealRequest => "encrypting request",
            Self::PostRequest => "posting request to relay",
            Self::DecodeResponse => "decoding relay response",
            Self::DecompressResponse => "decompressing relay response",
            Self::DecryptResponse => "decrypting relay response",
            Self::ParseResponse => "parsing relay response",
        }
    }
}

/// Why a tunneled request produced no real response
#[derive(Debug)]
pub struct TunnelFailure {
    pub stage: Stage,
    pub error: RelayError,
}

impl TunnelFailure {
    fn new(stage: Stage, error: RelayError) -> Self {
        Self { stage, error }
    }

    /// Render as the visible response handed back to the original caller
    pub fn diagnostic_response(&self) -> HttpResponse {
        let status = match self.error {
            RelayError::Timeout => 504,
            _ => 502,
        };

        let mut response = HttpResponse::new(status);
        response.headers.insert(
            "content-type".to_string(),
            vec!["text/plain; charset=utf-8".to_string()],
        );
        response.headers.insert(
            RELAY_ERROR_HEADER.to_string(),
            vec![self.stage.as_str().to_string()],
        );
        response.body = format!("fn-relay: {}\n", self).into_bytes();
        response
    }
}

impl fmt::Display for TunnelFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "an error occurred when {}: {}", self.stage.describe(), self.error)
    }
}

impl std::error::Error for TunnelFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Runs intercepted requests through the relay
pub struct TunnelClient<R, C> {
    transport: R,
    pipeline: Pipeline<C>,
    user: String,
}

impl<R: RelayTransport, C: Cipher> TunnelClient<R, C> {
    pub fn new(transport: R, cipher: C, user: impl Into<String>) -> Self {
        Self {
            transport,
            pipeline: Pipeline::new(cipher),
            user: user.into(),
        }
    }

    /// Tunnel one request; any failure short-circuits into a [`TunnelFailure`]
    pub async fn forward(
        &self,
        request: &HttpRequest,
    ) -> std::result::Result<HttpResponse, TunnelFailure> {
        let request_id = generate_request_id();
        let start = Instant::now();
        debug!("[{}] Tunneling {} {}", request_id, request.method, request.url);

        match self.round_trip(request).await {
            Ok(response) => {
                info!(
                    "[{}] {} {} -> {} ({}ms)",
                    request_id,
                    request.method,
                    request.url,
                    response.status_code,
                    start.elapsed().as_millis()
                );
                Ok(response)
            }
            Err(failure) => {
                error!(
                    "[{}] {} {} failed: {}",
                    request_id, request.method, request.url, failure
                );
                Err(failure)
            }
        }
    }

    async fn round_trip(
        &self,
        request: &HttpRequest,
    ) -> std::result::Result<HttpResponse, TunnelFailure> {
        let sealed = RequestFrame::from_http(request)
            .and_then(|frame| self.pipeline.seal_request(&frame))
            .map_err(|e| TunnelFailure::new(Stage::of_request(e.kind()), e))?;

        let reply = self
            .transport
            .post(sealed, &self.user)
            .await
            .map_err(|e| TunnelFailure::new(Stage::PostRequest, e))?;

        let text = reply_text(&reply).map_err(|e| TunnelFailure::new(Stage::DecodeResponse, e))?;

        self.pipeline
            .open_response(text)
            .and_then(|frame| frame.into_http())
            .map_err(|e| TunnelFailure::new(Stage::of_response(e.kind()), e))
    }
}

/// The reply body as base64 text, without whitespace or a JSON string wrapper
fn reply_text(reply: &[u8]) -> Result<&str> {
    let text = std::str::from_utf8(reply)
        .map_err(|_| RelayError::NoMatchingAlphabet { len: reply.len() })?
        .trim();

    Ok(text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text))
}
