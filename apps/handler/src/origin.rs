//! Outbound call to the origin named in a tunneled request

use std::time::Duration;

use fn_relay_common::{
    HttpRequest, HttpResponse, OriginTransport, RelayError, Result, headers_to_map,
    map_to_headers,
};
use http::Method;
use reqwest::Client;
use reqwest::redirect::Policy;
use tracing::debug;

/// Origin transport backed by a pooled `reqwest` client
///
/// Redirects are returned to the caller rather than followed, so the client
/// sees exactly what the origin answered.
#[derive(Debug, Clone)]
pub struct ReqwestOrigin {
    client: Client,
}

impl ReqwestOrigin {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        Ok(Self { client })
    }
}

impl OriginTransport for ReqwestOrigin {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| RelayError::Transport(format!("Invalid method: {}", request.method)))?;

        let mut builder = self
            .client
            .request(method, &request.url)
            .headers(map_to_headers(&request.headers));
        if request.has_body() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await.map_err(origin_error)?;
        let status = response.status();
        let headers = headers_to_map(response.headers());
        let body = response.bytes().await.map_err(origin_error)?;
        debug!("Origin answered {} ({}B)", status, body.len());

        let mut out = HttpResponse::new(status.as_u16());
        out.headers = headers;
        out.body = body.to_vec();
        Ok(out)
    }
}

fn origin_error(e: reqwest::Error) -> RelayError {
    if e.is_timeout() {
        RelayError::Timeout
    } else {
        RelayError::Transport(e.to_string())
    }
}
