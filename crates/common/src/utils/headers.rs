use http::{HeaderMap, HeaderName, HeaderValue};

use crate::protocol::Headers;

/// Connection-scoped headers that must not cross the tunnel
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Convert HTTP headers to our internal format
/// Supports multiple values per header name; opaque bytes that are not UTF-8
/// are replaced rather than dropped
pub fn headers_to_map(headers: &HeaderMap) -> Headers {
    let mut map = Headers::new();

    for (name, value) in headers.iter() {
        let key = name.as_str().to_string();
        let val = String::from_utf8_lossy(value.as_bytes()).into_owned();

        map.entry(key).or_default().push(val);
    }

    map
}

/// Convert our internal header format to HTTP HeaderMap
pub fn map_to_headers(map: &Headers) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, values) in map.iter() {
        if let Ok(header_name) = HeaderName::from_bytes(name.as_bytes()) {
            for value in values {
                if let Ok(header_value) = HeaderValue::from_bytes(value.as_bytes()) {
                    headers.append(header_name.clone(), header_value);
                }
            }
        }
    }

    headers
}

/// Drop hop-by-hop headers (case-insensitive)
pub fn strip_hop_by_hop(map: &mut Headers) {
    map.retain(|name, _| !HOP_BY_HOP.contains(&name.to_ascii_lowercase().as_str()));
}

/// Case-insensitive lookup of a single-valued header map
pub fn find_header<'a, V: AsRef<str>>(
    headers: impl IntoIterator<Item = (&'a String, &'a V)>,
    name: &str,
) -> Option<&'a str>
where
    V: 'a,
{
    headers
        .into_iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_ref())
}
