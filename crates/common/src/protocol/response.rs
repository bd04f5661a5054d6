use super::frame::{FrameReader, Headers, check_len, decode_header_block, encode_header_block};
use crate::constants::{MAX_HEADER_BLOCK_LENGTH, MAX_STATUS_TEXT_LENGTH};
use crate::error::{RelayError, Result};

/// An HTTP response as returned by the origin client and handed back to the proxy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status_code: u16,

    /// Status line text, e.g. "200 OK"
    pub status_text: String,

    /// Response headers as a map of header name to list of values
    pub headers: Headers,

    /// Raw response body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Create a new HTTP response with the canonical status text
    pub fn new(status_code: u16) -> Self {
        let reason = http::StatusCode::from_u16(status_code)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("");

        Self {
            status_code,
            status_text: format!("{} {}", status_code, reason).trim_end().to_string(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Check if the response has a body
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Check if the response is successful (2xx status code)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Binary layout of a tunneled response
///
/// ```text
/// i16 LE status | u8 text_len | status_text | u16 LE header_len | header_block | body..
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub status_code: i16,
    pub status_text: Vec<u8>,
    pub header_block: Vec<u8>,
    pub body: Vec<u8>,
}

impl ResponseFrame {
    pub fn from_http(response: &HttpResponse) -> Result<Self> {
        let status_code = i16::try_from(response.status_code)
            .map_err(|_| RelayError::InvalidStatus(response.status_code as i32))?;

        Ok(Self {
            status_code,
            status_text: response.status_text.as_bytes().to_vec(),
            header_block: encode_header_block(&response.headers)?,
            body: response.body.clone(),
        })
    }

    pub fn into_http(self) -> Result<HttpResponse> {
        let headers = decode_header_block(&self.header_block)?;
        let status_code = u16::try_from(self.status_code)
            .map_err(|_| RelayError::InvalidStatus(self.status_code as i32))?;

        Ok(HttpResponse {
            status_code,
            status_text: String::from_utf8_lossy(&self.status_text).into_owned(),
            headers,
            body: self.body,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        check_len("status text", self.status_text.len(), MAX_STATUS_TEXT_LENGTH)?;
        check_len("header block", self.header_block.len(), MAX_HEADER_BLOCK_LENGTH)?;

        let mut buf = Vec::with_capacity(
            5 + self.status_text.len() + self.header_block.len() + self.body.len(),
        );
        buf.extend_from_slice(&self.status_code.to_le_bytes());
        buf.push(self.status_text.len() as u8);
        buf.extend_from_slice(&self.status_text);
        buf.extend_from_slice(&(self.header_block.len() as u16).to_le_bytes());
        buf.extend_from_slice(&self.header_block);
        buf.extend_from_slice(&self.body);

        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = FrameReader::new(bytes);
        let status_code = reader.read_i16_le("status code")?;
        let text_len = reader.read_u8("status text")? as usize;
        let status_text = reader.take(text_len, "status text")?.to_vec();
        let header_block = reader.read_prefixed_u16("header block")?.to_vec();
        let body = reader.rest().to_vec();

        Ok(Self {
            status_code,
            status_text,
            header_block,
            body,
        })
    }
}
