//! Lambda entry point for the relay
//!
//! The function is invoked through an HTTP gateway; the event body is the
//! sealed request and the function result is the sealed response.

use fn_relay_common::{Envelope, Relay, RelayEvent};
use fn_relay_handler::origin::ReqwestOrigin;
use fn_relay_handler::{RelayConfig, handle_invocation};
use lambda_runtime::{Error, LambdaEvent, run, service_fn};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize tracing subscriber for CloudWatch Logs
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    info!("fn-relay handler v{} starting", env!("CARGO_PKG_VERSION"));

    let config = RelayConfig::from_env()?;
    info!("Origin timeout: {:?}", config.origin_timeout);

    let origin = ReqwestOrigin::new(config.origin_timeout)?;
    let cipher = Envelope::new(config.credentials.key.clone());
    let relay = Relay::new(origin, cipher, config.credentials.user.clone());

    // Run the Lambda runtime
    run(service_fn(|event: LambdaEvent<RelayEvent>| {
        handle_invocation(&relay, event.payload)
    }))
    .await
}
