use base64::{
    Engine as _,
    engine::GeneralPurpose,
    engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
};
use tracing::trace;

use crate::error::{RelayError, Result};

/// Alphabets tried by [`decode_text`], in priority order
const CANDIDATES: [(&str, &GeneralPurpose); 4] = [
    ("standard", &STANDARD),
    ("standard-no-pad", &STANDARD_NO_PAD),
    ("url-safe", &URL_SAFE),
    ("url-safe-no-pad", &URL_SAFE_NO_PAD),
];

/// Encode bytes with the canonical alphabet (standard, padded)
pub fn encode_text(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode base64 text without knowing which variant produced it
///
/// Gateways re-encode bodies inconsistently, so the first of the four
/// candidate alphabets that accepts the input wins.
pub fn decode_text(encoded: &str) -> Result<Vec<u8>> {
    for (name, engine) in CANDIDATES {
        if let Ok(decoded) = engine.decode(encoded) {
            trace!("Decoded {} chars as {}", encoded.len(), name);
            return Ok(decoded);
        }
    }

    Err(RelayError::NoMatchingAlphabet { len: encoded.len() })
}
