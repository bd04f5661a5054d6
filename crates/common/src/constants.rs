/// Maximum URL length in a request frame (u16 length prefix)
pub const MAX_URL_LENGTH: usize = u16::MAX as usize;

/// Maximum serialized header block length (u16 length prefix)
pub const MAX_HEADER_BLOCK_LENGTH: usize = u16::MAX as usize;

/// Maximum status text length in a response frame (u8 length prefix)
pub const MAX_STATUS_TEXT_LENGTH: usize = u8::MAX as usize;

/// AES-GCM nonce length (96 bits)
pub const NONCE_LENGTH: usize = 12;

/// Key used when the configured secret is empty
pub const EMPTY_SECRET_FALLBACK_KEY: &[u8; 16] = b"no key provided!";

/// Placeholder verb for the unknown method code
pub const UNKNOWN_METHOD: &str = "UNKNOWN";

/// Header carrying the shared identifier from client to relay
pub const USER_HEADER: &str = "x-user";

/// Header naming the failed stage on diagnostic responses
pub const RELAY_ERROR_HEADER: &str = "x-relay-error";

/// Upper bound for gunzipped payloads (64 MiB)
pub const MAX_DECOMPRESSED_SIZE: usize = 64 * 1024 * 1024;

/// Environment variable holding the relay's expected identifier
pub const ENV_RELAY_USER: &str = "RELAY_USER";

/// Environment variable holding the relay's shared secret
pub const ENV_RELAY_KEY: &str = "RELAY_KEY";

/// Environment variable overriding the relay's origin request timeout
pub const ENV_RELAY_ORIGIN_TIMEOUT: &str = "RELAY_ORIGIN_TIMEOUT_SECS";

/// Origin request timeout on the relay (under API Gateway's 29s limit)
pub const ORIGIN_TIMEOUT_SECS: u64 = 25;

/// Client timeout waiting for the relay to answer
pub const RELAY_TIMEOUT_SECS: u64 = 30;
