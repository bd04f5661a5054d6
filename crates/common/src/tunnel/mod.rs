//! The two legs of the tunnel, independent of any concrete transport

mod client;
mod relay;

#[cfg(test)]
mod tests;

pub use client::{RelayTransport, Stage, TunnelClient, TunnelFailure};
pub use relay::{OriginTransport, Relay, RelayEvent};
