//! Cryptographic envelope
//!
//! A secret of any length is stretched or cut to an AES key, then payloads
//! are sealed with AES-GCM as `nonce || ciphertext || tag`. The key size
//! (128, 192 or 256 bits) follows from the secret length.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit, Nonce};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use rand::RngCore;
use rand::rngs::OsRng;
use tracing::warn;

use crate::config::SharedSecret;
use crate::constants::{EMPTY_SECRET_FALLBACK_KEY, NONCE_LENGTH};
use crate::error::{RelayError, Result};

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Seal/open seam used by the transport pipeline
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;
    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>>;
}

/// Normalize a secret into a 16, 24 or 32 byte AES key
///
/// | secret length | key |
/// |---|---|
/// | 0 | fixed fallback literal |
/// | 1..8 | tiled to 16 |
/// | 8..24 | tiled to 24 |
/// | 24..32 | tiled to 32 |
/// | 32.. | first 32 bytes |
pub fn cut_key(secret: &[u8]) -> Vec<u8> {
    let target = match secret.len() {
        0 => return EMPTY_SECRET_FALLBACK_KEY.to_vec(),
        1..8 => 16,
        8..24 => 24,
        24..32 => 32,
        _ => return secret[..32].to_vec(),
    };

    secret.iter().copied().cycle().take(target).collect()
}

/// Encrypt with a fresh random nonce, prepended to the output
pub fn encrypt(secret: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let key = cut_key(secret);
    let mut nonce = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce);

    let sealed = match key.len() {
        16 => seal::<Aes128Gcm>(&key, &nonce, plaintext)?,
        24 => seal::<Aes192Gcm>(&key, &nonce, plaintext)?,
        32 => seal::<Aes256Gcm>(&key, &nonce, plaintext)?,
        n => return Err(RelayError::Cipher(format!("unsupported key length {}", n))),
    };

    let mut out = Vec::with_capacity(NONCE_LENGTH + sealed.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Split off the leading nonce and authenticate-and-open the rest
pub fn decrypt(secret: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < NONCE_LENGTH {
        return Err(RelayError::CiphertextTooShort(data.len()));
    }

    let key = cut_key(secret);
    let (nonce, sealed) = data.split_at(NONCE_LENGTH);

    match key.len() {
        16 => open::<Aes128Gcm>(&key, nonce, sealed),
        24 => open::<Aes192Gcm>(&key, nonce, sealed),
        32 => open::<Aes256Gcm>(&key, nonce, sealed),
        n => Err(RelayError::Cipher(format!("unsupported key length {}", n))),
    }
}

fn seal<A: Aead + KeyInit>(key: &[u8], nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = A::new_from_slice(key).map_err(|e| RelayError::Cipher(e.to_string()))?;
    cipher
        .encrypt(Nonce::<A>::from_slice(nonce), plaintext)
        .map_err(|_| RelayError::Cipher("encryption failed".to_string()))
}

fn open<A: Aead + KeyInit>(key: &[u8], nonce: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    let cipher = A::new_from_slice(key).map_err(|e| RelayError::Cipher(e.to_string()))?;
    cipher
        .decrypt(Nonce::<A>::from_slice(nonce), sealed)
        .map_err(|_| RelayError::Authentication)
}

/// AES-GCM envelope bound to a configured secret
///
/// The key is derived again on every call; the envelope only holds the raw
/// secret.
#[derive(Debug, Clone)]
pub struct Envelope {
    secret: SharedSecret,
}

impl Envelope {
    pub fn new(secret: SharedSecret) -> Self {
        if secret.is_empty() {
            warn!("Shared secret is empty; using the built-in fallback key, traffic is NOT private");
        }
        Self { secret }
    }
}

impl Cipher for Envelope {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        encrypt(self.secret.as_bytes(), plaintext)
    }

    fn decrypt(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        decrypt(self.secret.as_bytes(), sealed)
    }
}
