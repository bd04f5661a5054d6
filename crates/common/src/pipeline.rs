//! Byte-level transforms applied to frames in each direction
//!
//! ```text
//! client -> relay:  frame -> encrypt -> gzip                  (raw bytes)
//! relay -> client:  frame -> encrypt -> gzip -> base64        (text)
//! ```
//!
//! The reply leg is always text-encoded regardless of how the request
//! arrived; clients depend on that asymmetry.

use tracing::debug;

use crate::crypto::Cipher;
use crate::error::Result;
use crate::protocol::{RequestFrame, ResponseFrame};
use crate::utils::{decode_text, encode_text, gunzip, gzip};

#[derive(Debug, Clone)]
pub struct Pipeline<C> {
    cipher: C,
}

impl<C: Cipher> Pipeline<C> {
    pub fn new(cipher: C) -> Self {
        Self { cipher }
    }

    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    /// Client side: frame-encode, encrypt, compress
    pub fn seal_request(&self, frame: &RequestFrame) -> Result<Vec<u8>> {
        let encoded = frame.encode()?;
        let encrypted = self.cipher.encrypt(&encoded)?;
        let compressed = gzip(&encrypted)?;
        debug!(
            "Sealed request: frame={}B encrypted={}B compressed={}B",
            encoded.len(),
            encrypted.len(),
            compressed.len()
        );
        Ok(compressed)
    }

    /// Relay side: decompress, decrypt, frame-decode
    pub fn open_request(&self, payload: &[u8]) -> Result<RequestFrame> {
        let decompressed = gunzip(payload)?;
        let decrypted = self.cipher.decrypt(&decompressed)?;
        RequestFrame::decode(&decrypted)
    }

    /// Relay side: frame-encode, encrypt, compress, text-encode
    pub fn seal_response(&self, frame: &ResponseFrame) -> Result<String> {
        let encoded = frame.encode()?;
        let encrypted = self.cipher.encrypt(&encoded)?;
        let compressed = gzip(&encrypted)?;
        Ok(encode_text(&compressed))
    }

    /// Client side: text-decode, decompress, decrypt, frame-decode
    pub fn open_response(&self, text: &str) -> Result<ResponseFrame> {
        let raw = decode_text(text)?;
        let decompressed = gunzip(&raw)?;
        let decrypted = self.cipher.decrypt(&decompressed)?;
        ResponseFrame::decode(&decrypted)
    }
}
