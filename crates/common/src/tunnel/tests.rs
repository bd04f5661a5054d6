//! End-to-end scenarios across both legs
//!
//! The relay transport is an in-memory loopback into a real [`Relay`], so
//! every byte produced by the client leg is consumed by the relay leg.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

use super::*;
use crate::config::SharedSecret;
use crate::crypto::{Cipher, Envelope};
use crate::error::{ErrorKind, RelayError, Result};
use crate::pipeline::Pipeline;
use crate::protocol::{HttpRequest, HttpResponse, ResponseFrame};

const SECRET: &str = "correct horse battery staple";
const USER: &str = "alice";

fn envelope(secret: &str) -> Envelope {
    Envelope::new(SharedSecret::new(secret))
}

/// Origin that records what it was asked and echoes the URL back
#[derive(Default, Clone)]
struct RecordingOrigin {
    seen: Arc<Mutex<Vec<HttpRequest>>>,
}

impl OriginTransport for RecordingOrigin {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut response = HttpResponse::new(200);
        response
            .headers
            .insert("Content-Type".to_string(), vec!["text/plain".to_string()]);
        response.headers.insert(
            "Set-Cookie".to_string(),
            vec!["a=1".to_string(), "b=2".to_string()],
        );
        response.body = format!("you asked for {}", request.url).into_bytes();
        self.seen.lock().unwrap().push(request);
        Ok(response)
    }
}

struct TimeoutOrigin;

impl OriginTransport for TimeoutOrigin {
    async fn send(&self, _request: HttpRequest) -> Result<HttpResponse> {
        Err(RelayError::Timeout)
    }
}

/// Envelope that counts decrypt attempts
#[derive(Clone)]
struct CountingCipher {
    inner: Envelope,
    decrypts: Arc<AtomicUsize>,
}

impl CountingCipher {
    fn new(secret: &str) -> Self {
        Self {
            inner: envelope(secret),
            decrypts: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Cipher for CountingCipher {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.inner.encrypt(plaintext)
    }

    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        self.decrypts.fetch_add(1, Ordering::SeqCst);
        self.inner.decrypt(sealed)
    }
}

/// Client-side transport that invokes a relay in-process, the way a
/// gateway would: body base64-encoded, identifier in a header
struct LoopbackTransport<O, C> {
    relay: Relay<O, C>,
    reencode_url_safe: bool,
}

impl<O: OriginTransport, C: Cipher> RelayTransport for LoopbackTransport<O, C> {
    async fn post(&self, payload: Vec<u8>, user: &str) -> Result<Vec<u8>> {
        let mut headers = HashMap::new();
        headers.insert("X-User".to_string(), user.to_string());
        let event = RelayEvent {
            body: STANDARD.encode(&payload),
            is_base64_encoded: true,
            headers,
        };

        let reply = self
            .relay
            .handle(&event)
            .await
            .map_err(|_| RelayError::Transport("request rejected".to_string()))?;

        if self.reencode_url_safe {
            let raw = STANDARD.decode(&reply).unwrap();
            return Ok(URL_SAFE_NO_PAD.encode(raw).into_bytes());
        }
        Ok(format!("\"{}\"\n", reply).into_bytes())
    }
}

/// Transport answering every post with a fixed body
struct CannedTransport(Vec<u8>);

impl RelayTransport for CannedTransport {
    async fn post(&self, _payload: Vec<u8>, _user: &str) -> Result<Vec<u8>> {
        Ok(self.0.clone())
    }
}

struct StalledTransport;

impl RelayTransport for StalledTransport {
    async fn post(&self, _payload: Vec<u8>, _user: &str) -> Result<Vec<u8>> {
        Err(RelayError::Timeout)
    }
}

fn loopback_client(
    origin: RecordingOrigin,
    client_user: &str,
) -> TunnelClient<LoopbackTransport<RecordingOrigin, Envelope>, Envelope> {
    let relay = Relay::new(origin, envelope(SECRET), USER);
    let transport = LoopbackTransport {
        relay,
        reencode_url_safe: false,
    };
    TunnelClient::new(transport, envelope(SECRET), client_user)
}

#[tokio::test]
async fn test_get_reaches_relay_unchanged() {
    let origin = RecordingOrigin::default();
    let client = loopback_client(origin.clone(), USER);

    let mut request = HttpRequest::new("GET", "http://example.test/");
    request
        .headers
        .insert("Accept".to_string(), vec!["*/*".to_string()]);

    let response = client.forward(&request).await.unwrap();

    let seen = origin.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].url, "http://example.test/");
    assert_eq!(seen[0].headers, request.headers);
    assert!(seen[0].body.is_empty());

    assert_eq!(response.status_code, 200);
    assert_eq!(response.status_text, "200 OK");
    assert_eq!(response.headers["Set-Cookie"], vec!["a=1", "b=2"]);
    assert_eq!(response.body, b"you asked for http://example.test/");
}

#[tokio::test]
async fn test_post_body_survives_roundtrip() {
    let origin = RecordingOrigin::default();
    let client = loopback_client(origin.clone(), USER);

    let mut request = HttpRequest::new("post", "http://example.test/upload?id=7");
    request.body = (0..=255).cycle().take(100_000).collect();

    client.forward(&request).await.unwrap();

    let seen = origin.seen.lock().unwrap();
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].body, request.body);
}

#[tokio::test]
async fn test_identifier_mismatch_rejected_before_decrypt() {
    let cipher = CountingCipher::new(SECRET);
    let decrypts = cipher.decrypts.clone();
    let relay = Relay::new(RecordingOrigin::default(), cipher, USER);

    let sealed = Pipeline::new(envelope(SECRET))
        .seal_request(
            &crate::protocol::RequestFrame::from_http(&HttpRequest::new(
                "GET",
                "http://example.test/",
            ))
            .unwrap(),
        )
        .unwrap();

    let mut headers = HashMap::new();
    headers.insert("x-user".to_string(), "mallory".to_string());
    let event = RelayEvent {
        body: STANDARD.encode(&sealed),
        is_base64_encoded: true,
        headers,
    };

    let err = relay.handle(&event).await.unwrap_err();
    assert!(matches!(err, RelayError::Unauthorized));
    assert_eq!(err.kind(), ErrorKind::Authorization);
    assert_eq!(decrypts.load(Ordering::SeqCst), 0);

    // Missing header is a mismatch too
    let event = RelayEvent {
        headers: HashMap::new(),
        ..event
    };
    assert!(matches!(
        relay.handle(&event).await,
        Err(RelayError::Unauthorized)
    ));
    assert_eq!(decrypts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_identifier_header_is_case_insensitive() {
    let cipher = CountingCipher::new(SECRET);
    let decrypts = cipher.decrypts.clone();
    let relay = Relay::new(RecordingOrigin::default(), cipher, USER);

    let mut headers = HashMap::new();
    headers.insert("X-USER".to_string(), USER.to_string());
    let event = RelayEvent {
        body: STANDARD.encode(b"not gzip"),
        is_base64_encoded: true,
        headers,
    };

    // Passes the gate, then fails on decompression
    assert!(matches!(
        relay.handle(&event).await,
        Err(RelayError::Compression(_))
    ));
    assert_eq!(decrypts.load(Ordering::SeqCst), 0);
}

fn plain_event(body: &str, is_base64_encoded: bool) -> RelayEvent {
    let mut headers = HashMap::new();
    headers.insert("x-user".to_string(), USER.to_string());
    RelayEvent {
        body: body.to_string(),
        is_base64_encoded,
        headers,
    }
}

#[tokio::test]
async fn test_unflagged_body_skips_text_decoding() {
    let relay = Relay::new(RecordingOrigin::default(), envelope(SECRET), USER);

    // Not base64 in any alphabet; used as raw bytes, so gunzip is the first to object
    let err = relay
        .handle(&plain_event("raw <payload> !!", false))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Compression(_)));
    assert_eq!(err.kind(), ErrorKind::Compression);
}

#[tokio::test]
async fn test_flagged_body_goes_through_text_decoding() {
    let relay = Relay::new(RecordingOrigin::default(), envelope(SECRET), USER);

    let err = relay
        .handle(&plain_event("raw <payload> !!", true))
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::NoMatchingAlphabet { .. }));
    assert_eq!(err.kind(), ErrorKind::Encoding);
}

#[tokio::test]
async fn test_client_with_wrong_identifier_gets_diagnostic() {
    let origin = RecordingOrigin::default();
    let client = loopback_client(origin.clone(), "mallory");

    let failure = client
        .forward(&HttpRequest::new("GET", "http://example.test/"))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Stage::PostRequest);
    assert!(origin.seen.lock().unwrap().is_empty());
    assert_eq!(failure.diagnostic_response().status_code, 502);
}

#[tokio::test]
async fn test_relay_with_other_secret_fails_uniformly() {
    let relay = Relay::new(RecordingOrigin::default(), envelope("relay-secret"), USER);
    let transport = LoopbackTransport {
        relay,
        reencode_url_safe: false,
    };
    let client = TunnelClient::new(transport, envelope(SECRET), USER);

    let failure = client
        .forward(&HttpRequest::new("GET", "http://example.test/"))
        .await
        .unwrap_err();

    // Indistinguishable from an identifier mismatch
    assert_eq!(failure.stage, Stage::PostRequest);
    assert_eq!(
        failure.error.to_string(),
        "Transport error: request rejected"
    );
}

#[tokio::test]
async fn test_url_safe_reply_is_accepted() {
    let origin = RecordingOrigin::default();
    let relay = Relay::new(origin, envelope(SECRET), USER);
    let transport = LoopbackTransport {
        relay,
        reencode_url_safe: true,
    };
    let client = TunnelClient::new(transport, envelope(SECRET), USER);

    let response = client
        .forward(&HttpRequest::new("GET", "http://example.test/variant"))
        .await
        .unwrap();
    assert_eq!(response.body, b"you asked for http://example.test/variant");
}

#[tokio::test]
async fn test_origin_failure_propagates() {
    let relay = Relay::new(TimeoutOrigin, envelope(SECRET), USER);
    let sealed = Pipeline::new(envelope(SECRET))
        .seal_request(
            &crate::protocol::RequestFrame::from_http(&HttpRequest::new(
                "GET",
                "http://slow.test/",
            ))
            .unwrap(),
        )
        .unwrap();

    let mut headers = HashMap::new();
    headers.insert("x-user".to_string(), USER.to_string());
    let event = RelayEvent {
        body: STANDARD.encode(&sealed),
        is_base64_encoded: true,
        headers,
    };

    assert!(matches!(
        relay.handle(&event).await,
        Err(RelayError::Timeout)
    ));
}

#[tokio::test]
async fn test_relay_timeout_becomes_gateway_timeout() {
    let client = TunnelClient::new(StalledTransport, envelope(SECRET), USER);

    let failure = client
        .forward(&HttpRequest::new("GET", "http://example.test/"))
        .await
        .unwrap_err();

    assert_eq!(failure.stage, Stage::PostRequest);
    assert_eq!(failure.diagnostic_response().status_code, 504);
}

#[tokio::test]
async fn test_garbage_reply_fails_decode() {
    let client = TunnelClient::new(
        CannedTransport(b"<html>502 Bad Gateway</html>".to_vec()),
        envelope(SECRET),
        USER,
    );

    let failure = client
        .forward(&HttpRequest::new("GET", "http://example.test/"))
        .await
        .unwrap_err();
    assert_eq!(failure.stage, Stage::DecodeResponse);
}

#[tokio::test]
async fn test_reply_sealed_with_other_secret_fails_decrypt() {
    let frame = ResponseFrame::from_http(&HttpResponse::new(200)).unwrap();
    let reply = Pipeline::new(envelope("someone else"))
        .seal_response(&frame)
        .unwrap();

    let client = TunnelClient::new(
        CannedTransport(reply.into_bytes()),
        envelope(SECRET),
        USER,
    );

    let failure = client
        .forward(&HttpRequest::new("GET", "http://example.test/"))
        .await
        .unwrap_err();
    assert_eq!(failure.stage, Stage::DecryptResponse);
    assert!(matches!(failure.error, RelayError::Authentication));
}

#[tokio::test]
async fn test_oversized_headers_fail_before_posting() {
    let client = TunnelClient::new(StalledTransport, envelope(SECRET), USER);

    let mut request = HttpRequest::new("GET", "http://example.test/");
    request
        .headers
        .insert("X-Big".to_string(), vec!["v".repeat(70_000)]);

    let failure = client.forward(&request).await.unwrap_err();
    assert_eq!(failure.stage, Stage::BuildRequest);
    assert!(matches!(
        failure.error,
        RelayError::FieldTooLong {
            field: "header block",
            ..
        }
    ));
}

#[tokio::test]
async fn test_concurrent_requests_are_independent() {
    let origin = RecordingOrigin::default();
    let client = Arc::new(loopback_client(origin.clone(), USER));

    let mut handles = Vec::new();
    for i in 0..16 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let url = format!("http://example.test/item/{}", i);
            let response = client
                .forward(&HttpRequest::new("GET", url.clone()))
                .await
                .unwrap();
            assert_eq!(response.body, format!("you asked for {}", url).into_bytes());
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(origin.seen.lock().unwrap().len(), 16);
}
