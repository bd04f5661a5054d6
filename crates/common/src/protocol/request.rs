use super::frame::{FrameReader, Headers, check_len, decode_header_block, encode_header_block};
use super::method::MethodCode;
use crate::constants::{MAX_HEADER_BLOCK_LENGTH, MAX_URL_LENGTH};
use crate::error::{RelayError, Result};

/// An HTTP request as exchanged with the interception proxy and the origin client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpRequest {
    /// HTTP method (GET, POST, PUT, DELETE, etc.)
    pub method: String,

    /// Absolute request URL
    /// Example: "http://example.test/api/v1/users?limit=10"
    pub url: String,

    /// HTTP headers as a map of header name to list of values
    pub headers: Headers,

    /// Raw request body, empty for requests without one
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// Create a new HTTP request without headers or body
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Check if the request has a body
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}

/// Binary layout of a tunneled request
///
/// ```text
/// u16 LE url_len | url | u8 method | u16 LE header_len | header_block | body..
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFrame {
    pub url: Vec<u8>,
    pub method: MethodCode,
    pub header_block: Vec<u8>,
    pub body: Vec<u8>,
}

impl RequestFrame {
    pub fn from_http(request: &HttpRequest) -> Result<Self> {
        Ok(Self {
            url: request.url.as_bytes().to_vec(),
            method: MethodCode::encode(&request.method),
            header_block: encode_header_block(&request.headers)?,
            body: request.body.clone(),
        })
    }

    pub fn into_http(self) -> Result<HttpRequest> {
        let headers = decode_header_block(&self.header_block)?;
        let url = String::from_utf8(self.url).map_err(|_| RelayError::InvalidUrl)?;

        Ok(HttpRequest {
            method: self.method.as_str().to_string(),
            url,
            headers,
            body: self.body,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        check_len("url", self.url.len(), MAX_URL_LENGTH)?;
        check_len("header block", self.header_block.len(), MAX_HEADER_BLOCK_LENGTH)?;

        let mut buf =
            Vec::with_capacity(5 + self.url.len() + self.header_block.len() + self.body.len());
        buf.extend_from_slice(&(self.url.len() as u16).to_le_bytes());
        buf.extend_from_slice(&self.url);
        buf.push(self.method.as_byte());
        buf.extend_from_slice(&(self.header_block.len() as u16).to_le_bytes());
        buf.extend_from_slice(&self.header_block);
        buf.extend_from_slice(&self.body);

        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = FrameReader::new(bytes);
        let url = reader.read_prefixed_u16("url")?.to_vec();
        let method = MethodCode::from_byte(reader.read_u8("method")?);
        let header_block = reader.read_prefixed_u16("header block")?.to_vec();
        let body = reader.rest().to_vec();

        Ok(Self {
            url,
            method,
            header_block,
            body,
        })
    }
}
