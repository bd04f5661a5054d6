use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::constants::MAX_DECOMPRESSED_SIZE;
use crate::error::{RelayError, Result};

/// Gzip a payload with the default compression level
pub fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2 + 32), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Gunzip a payload, refusing output larger than `MAX_DECOMPRESSED_SIZE`
pub fn gunzip(data: &[u8]) -> Result<Vec<u8>> {
    gunzip_limited(data, MAX_DECOMPRESSED_SIZE)
}

fn gunzip_limited(data: &[u8], limit: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    MultiGzDecoder::new(data)
        .take(limit as u64 + 1)
        .read_to_end(&mut out)?;

    if out.len() > limit {
        return Err(RelayError::Compression(std::io::Error::other(format!(
            "decompressed payload exceeds {} bytes",
            limit
        ))));
    }
    Ok(out)
}
