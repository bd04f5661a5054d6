use std::time::Duration;

use fn_relay_common::{RelayError, RelayTransport, Result};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

/// Relay transport over HTTPS using a pooled `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestRelay {
    client: Client,
    endpoint: String,
}

impl ReqwestRelay {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl RelayTransport for ReqwestRelay {
    async fn post(&self, payload: Vec<u8>, user: &str) -> Result<Vec<u8>> {
        debug!("POST {} ({}B)", self.endpoint, payload.len());

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-User", user)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(payload)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::UpstreamStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        Ok(body.to_vec())
    }
}

fn transport_error(e: reqwest::Error) -> RelayError {
    if e.is_timeout() {
        RelayError::Timeout
    } else {
        RelayError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use http_body_util::{BodyExt, Full};
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::{Request, Response};
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    /// Serve a single connection; replies with `status` and echoes
    /// `x-user` + body as `"<user>:<len>"`
    async fn spawn_relay(status: u16, delay: Duration) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let service = service_fn(move |req: Request<hyper::body::Incoming>| async move {
                let user = req
                    .headers()
                    .get("x-user")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let content_type = req
                    .headers()
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let body = req.into_body().collect().await.unwrap().to_bytes();
                tokio::time::sleep(delay).await;

                let reply = format!("{}:{}:{}", user, content_type, body.len());
                Ok::<_, Infallible>(
                    Response::builder()
                        .status(status)
                        .body(Full::new(Bytes::from(reply)))
                        .unwrap(),
                )
            });
            let _ = http1::Builder::new()
                .serve_connection(TokioIo::new(stream), service)
                .await;
        });

        addr
    }

    #[tokio::test]
    async fn test_post_sends_identifier_and_payload() {
        let addr = spawn_relay(200, Duration::ZERO).await;
        let relay = ReqwestRelay::new(format!("http://{}/", addr), Duration::from_secs(5)).unwrap();

        let reply = relay.post(vec![0u8; 42], "alice").await.unwrap();
        assert_eq!(reply, b"alice:application/octet-stream:42");
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let addr = spawn_relay(502, Duration::ZERO).await;
        let relay = ReqwestRelay::new(format!("http://{}/", addr), Duration::from_secs(5)).unwrap();

        assert!(matches!(
            relay.post(vec![1, 2, 3], "alice").await,
            Err(RelayError::UpstreamStatus(502))
        ));
    }

    #[tokio::test]
    async fn test_slow_relay_times_out() {
        let addr = spawn_relay(200, Duration::from_secs(2)).await;
        let relay =
            ReqwestRelay::new(format!("http://{}/", addr), Duration::from_millis(200)).unwrap();

        assert!(matches!(
            relay.post(vec![], "alice").await,
            Err(RelayError::Timeout)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_transport_error() {
        // Bind then drop to get a port nothing listens on
        let addr = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap();
        let relay = ReqwestRelay::new(format!("http://{}/", addr), Duration::from_secs(5)).unwrap();

        assert!(matches!(
            relay.post(vec![], "alice").await,
            Err(RelayError::Transport(_))
        ));
    }
}
