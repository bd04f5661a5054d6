//! Error handling and sanitization
//!
//! Every relay failure looks the same from outside: the caller cannot tell
//! an identifier mismatch from a bad key or a malformed frame. The full error
//! is logged internally.

use fn_relay_common::RelayError;
use tracing::error;

/// The only error text an invoker ever sees
pub const REJECTED: &str = "request rejected";

/// Log the full error and return the generic client message
pub fn sanitize_error(e: &RelayError) -> String {
    error!("Relay failed ({:?}): {}", e.kind(), e);
    REJECTED.to_string()
}
