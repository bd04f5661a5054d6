//! HTTP proxy listener
//!
//! Accepts proxy-style requests, converts them into [`HttpRequest`]s, runs
//! them through the tunnel and writes back whatever the tunnel produced.

use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use bytes::Bytes;
use http::header::HOST;
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::ext::ReasonPhrase;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, warn};

use fn_relay_common::constants::RELAY_ERROR_HEADER;
use fn_relay_common::utils::strip_hop_by_hop;
use fn_relay_common::{
    Cipher, HttpRequest, HttpResponse, RelayTransport, TunnelClient, headers_to_map,
    map_to_headers,
};

/// Accept connections until the listener fails, one task per connection
pub async fn serve<R, C>(listener: TcpListener, tunnel: Arc<TunnelClient<R, C>>) -> Result<()>
where
    R: RelayTransport + 'static,
    C: Cipher + 'static,
{
    loop {
        let (stream, peer) = listener
            .accept()
            .await
            .context("Failed to accept proxy connection")?;
        let io = TokioIo::new(stream);
        let tunnel = tunnel.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| {
                let tunnel = tunnel.clone();
                async move { Ok::<_, Infallible>(intercept(&*tunnel, req).await) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Connection from {} closed: {}", peer, e);
            }
        });
    }
}

/// Tunnel one intercepted request and produce the response for the caller
pub async fn intercept<R, C, B>(tunnel: &TunnelClient<R, C>, req: Request<B>) -> Response<Full<Bytes>>
where
    R: RelayTransport,
    C: Cipher,
    B: Body,
    B::Error: Display,
{
    if req.method() == Method::CONNECT {
        warn!("Refusing CONNECT {}: TLS interception is not available", req.uri());
        return render(local_diagnostic(
            StatusCode::NOT_IMPLEMENTED,
            "connect",
            "CONNECT tunnels are not supported; send plain HTTP requests through the proxy",
        ));
    }

    let request = match to_http_request(req).await {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejecting request: {:#}", e);
            return render(local_diagnostic(
                StatusCode::BAD_REQUEST,
                "intercept",
                &format!("{:#}", e),
            ));
        }
    };

    let response = match tunnel.forward(&request).await {
        Ok(response) => response,
        Err(failure) => failure.diagnostic_response(),
    };
    render(response)
}

/// Convert an intercepted request into the tunnel's request model
pub async fn to_http_request<B>(req: Request<B>) -> Result<HttpRequest>
where
    B: Body,
    B::Error: Display,
{
    let (parts, body) = req.into_parts();
    let url = absolute_url(&parts.uri, &parts.headers)?;

    let mut headers = headers_to_map(&parts.headers);
    strip_hop_by_hop(&mut headers);
    headers.remove(HOST.as_str());

    let body = body
        .collect()
        .await
        .map_err(|e| anyhow!("Failed to read request body: {}", e))?
        .to_bytes();

    Ok(HttpRequest {
        method: parts.method.to_string(),
        url,
        headers,
        body: body.to_vec(),
    })
}

/// Absolute-form targets pass through; origin-form targets are resolved
/// against the `Host` header
fn absolute_url(uri: &Uri, headers: &HeaderMap) -> Result<String> {
    if uri.scheme().is_some() && uri.authority().is_some() {
        return Ok(uri.to_string());
    }

    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| anyhow!("Request target {} is not absolute and has no Host header", uri))?;

    let path = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    Ok(format!("http://{}{}", host, path))
}

/// Convert a tunnel response into what goes back on the wire
pub fn render(response: HttpResponse) -> Response<Full<Bytes>> {
    let HttpResponse {
        status_code,
        status_text,
        mut headers,
        body,
    } = response;
    strip_hop_by_hop(&mut headers);

    let mut out = Response::new(Full::new(Bytes::from(body)));
    match StatusCode::from_u16(status_code) {
        Ok(status) => {
            *out.status_mut() = status;
            if let Some(reason) = custom_reason(status, &status_text) {
                out.extensions_mut().insert(reason);
            }
        }
        Err(_) => *out.status_mut() = StatusCode::BAD_GATEWAY,
    }
    *out.headers_mut() = map_to_headers(&headers);
    out
}

/// Reason phrase from a `"<code> <reason>"` status line, when it is not the
/// canonical one for `status`
fn custom_reason(status: StatusCode, status_text: &str) -> Option<ReasonPhrase> {
    let reason = status_text
        .strip_prefix(status.as_str())
        .unwrap_or(status_text)
        .trim();
    if reason.is_empty() || status.canonical_reason() == Some(reason) {
        return None;
    }
    ReasonPhrase::try_from(reason.as_bytes()).ok()
}

fn local_diagnostic(status: StatusCode, slug: &str, message: &str) -> HttpResponse {
    let mut response = HttpResponse::new(status.as_u16());
    response.headers.insert(
        "content-type".to_string(),
        vec!["text/plain; charset=utf-8".to_string()],
    );
    response
        .headers
        .insert(RELAY_ERROR_HEADER.to_string(), vec![slug.to_string()]);
    response.body = format!("fn-relay: {}\n", message).into_bytes();
    response
}
