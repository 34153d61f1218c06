//! RESP2 Wire Format: Frame Types and Constants
//!
//! Request (always an array of bulk strings):
//! *<argc>\r\n $<len>\r\n<arg>\r\n ...
//!
//! Reply (first byte selects the type, every line ends with CRLF):
//! +<simple string>   -<error>   :<integer>
//! $<len>\r\n<bytes>  ($-1 is the null bulk)
//! *<count> followed by <count> nested replies (*-1 is the null array)

use bytes::Bytes;

// ========================================
// TYPE PREFIXES (first byte of every reply)
// ========================================
pub const PREFIX_SIMPLE: u8 = b'+';
pub const PREFIX_ERROR: u8 = b'-';
pub const PREFIX_INTEGER: u8 = b':';
pub const PREFIX_BULK: u8 = b'$';
pub const PREFIX_ARRAY: u8 = b'*';

pub const CRLF: &[u8] = b"\r\n";

/// Length marker used by both null bulk strings and null arrays.
pub const NULL_LENGTH: i64 = -1;

// ========================================
// FRAMES
// ========================================

/// Reply decoded by `RespCodec` from the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespFrame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Array(Vec<RespFrame>),
    Null,
}

impl RespFrame {
    /// Textual view of string-like replies (simple, bulk). Bulk bytes are decoded lossily.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RespFrame::Simple(s) => Some(s.clone()),
            RespFrame::Bulk(b) => Some(String::from_utf8_lossy(b).into_owned()),
            _ => None,
        }
    }

    /// Short human description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            RespFrame::Simple(s) => format!("+{}", s),
            RespFrame::Error(e) => format!("-{}", e),
            RespFrame::Integer(i) => format!(":{}", i),
            RespFrame::Bulk(b) => format!("${} bytes", b.len()),
            RespFrame::Array(items) => format!("*{} items", items.len()),
            RespFrame::Null => "(nil)".to_string(),
        }
    }
}

/// Command encoded by `RespCodec` to the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub args: Vec<Bytes>,
}

impl Command {
    pub fn new(name: &'static str) -> Self {
        Self {
            args: vec![Bytes::from_static(name.as_bytes())],
        }
    }

    pub fn arg(mut self, value: impl Into<Bytes>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn name(&self) -> String {
        self.args
            .first()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }
}
