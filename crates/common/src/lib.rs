//! Common types and transforms for the function relay
//!
//! This crate holds everything shared by the local proxy (client leg) and the
//! serverless handler (relay leg): the binary frame codecs, the sealing
//! pipeline (encrypt, compress, text-encode) and both legs of the tunnel,
//! written against small transport traits so either side can be driven
//! in-process.

pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod pipeline;
pub mod protocol;
pub mod tunnel;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{Credentials, SharedSecret};
pub use crypto::{Cipher, Envelope, cut_key};
pub use error::{ErrorKind, RelayError, Result};
pub use pipeline::Pipeline;
pub use protocol::{HttpRequest, HttpResponse, MethodCode, RequestFrame, ResponseFrame};
pub use tunnel::{
    OriginTransport, Relay, RelayEvent, RelayTransport, Stage, TunnelClient, TunnelFailure,
};
pub use utils::{
    decode_text, encode_text, generate_request_id, gunzip, gzip, headers_to_map, map_to_headers,
};
