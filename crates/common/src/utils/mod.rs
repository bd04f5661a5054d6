mod compression;
mod encoding;
mod headers;
mod id;

pub use compression::{gunzip, gzip};
pub use encoding::{decode_text, encode_text};
pub use headers::{find_header, headers_to_map, map_to_headers, strip_hop_by_hop};
pub use id::generate_request_id;
