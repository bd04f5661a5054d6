mod frame;
mod method;
mod request;
mod response;

pub use frame::{Headers, decode_header_block, encode_header_block};
pub use method::MethodCode;
pub use request::{HttpRequest, RequestFrame};
pub use response::{HttpResponse, ResponseFrame};
