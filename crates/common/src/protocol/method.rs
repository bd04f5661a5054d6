use crate::constants::UNKNOWN_METHOD;

/// Compact one-byte code for an HTTP verb
///
/// Encoding is total: any verb outside the nine known ones becomes
/// [`MethodCode::Unknown`], which always decodes to `"UNKNOWN"`. The original
/// spelling of an unrecognized verb is not recoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MethodCode {
    Get = 0,
    Head = 1,
    Post = 2,
    Put = 3,
    Patch = 4,
    Delete = 5,
    Connect = 6,
    Options = 7,
    Trace = 8,
    Unknown = 9,
}

impl MethodCode {
    /// Map a verb (case-insensitive) to its code
    pub fn encode(verb: &str) -> Self {
        match verb.to_ascii_uppercase().as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "CONNECT" => Self::Connect,
            "OPTIONS" => Self::Options,
            "TRACE" => Self::Trace,
            _ => Self::Unknown,
        }
    }

    /// Read a wire byte; bytes past the table read as `Unknown`
    pub fn from_byte(code: u8) -> Self {
        match code {
            0 => Self::Get,
            1 => Self::Head,
            2 => Self::Post,
            3 => Self::Put,
            4 => Self::Patch,
            5 => Self::Delete,
            6 => Self::Connect,
            7 => Self::Options,
            8 => Self::Trace,
            _ => Self::Unknown,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Decode to the textual verb
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Connect => "CONNECT",
            Self::Options => "OPTIONS",
            Self::Trace => "TRACE",
            Self::Unknown => UNKNOWN_METHOD,
        }
    }
}
