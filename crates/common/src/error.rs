use thiserror::Error;

/// Error types for the relay tunnel
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("{field} too long: {len} bytes (max: {max})")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("Frame truncated while reading {0}")]
    Truncated(&'static str),

    #[error("Malformed header block: {0}")]
    MalformedHeaders(#[from] serde_json::Error),

    #[error("URL is not valid UTF-8")]
    InvalidUrl,

    #[error("Status code out of range: {0}")]
    InvalidStatus(i32),

    #[error("Ciphertext shorter than one nonce ({0} bytes)")]
    CiphertextTooShort(usize),

    #[error("Authentication failed: ciphertext was tampered with or the key is wrong")]
    Authentication,

    #[error("Cipher error: {0}")]
    Cipher(String),

    #[error("No base64 alphabet decodes the payload ({len} chars)")]
    NoMatchingAlphabet { len: usize },

    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timeout waiting for response")]
    Timeout,

    #[error("Relay answered with HTTP status {0}")]
    UpstreamStatus(u16),

    #[error("Identifier does not match")]
    Unauthorized,
}

/// Coarse classification of a [`RelayError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Framing,
    Crypto,
    Encoding,
    Compression,
    Transport,
    Authorization,
}

impl RelayError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FieldTooLong { .. }
            | Self::Truncated(_)
            | Self::MalformedHeaders(_)
            | Self::InvalidUrl
            | Self::InvalidStatus(_) => ErrorKind::Framing,
            Self::CiphertextTooShort(_) | Self::Authentication | Self::Cipher(_) => {
                ErrorKind::Crypto
            }
            Self::NoMatchingAlphabet { .. } => ErrorKind::Encoding,
            Self::Compression(_) => ErrorKind::Compression,
            Self::Transport(_) | Self::Timeout | Self::UpstreamStatus(_) => ErrorKind::Transport,
            Self::Unauthorized => ErrorKind::Authorization,
        }
    }
}

/// Type alias for Results using RelayError
pub type Result<T> = std::result::Result<T, RelayError>;
