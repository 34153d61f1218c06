//! Metadata Parser: pulls numeric fields out of the store's DEBUG OBJECT payload.
//!
//! Payload example:
//! `Value at:0x7f0 refcount:1 encoding:raw serializedlength:5 lru:8826 lru_seconds_idle:12`
//!
//! The payload format belongs to the store and may change between versions;
//! nothing outside this module knows about it.

use thiserror::Error;

pub const SERIALIZED_LENGTH_LABEL: &str = "serializedlength:";
pub const IDLE_SECONDS_LABEL: &str = "lru_seconds_idle:";

/// Payload excerpt length kept in errors.
const PAYLOAD_EXCERPT_CHARS: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMetadata {
    pub serialized_length: u64,
    pub idle_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed debug payload: no integer after `{field}` in {payload:?}")]
pub struct MalformedMetadata {
    pub field: &'static str,
    /// Truncated raw payload.
    pub payload: String,
}

pub fn parse_metadata(payload: &str) -> Result<KeyMetadata, MalformedMetadata> {
    Ok(KeyMetadata {
        serialized_length: labeled_integer(payload, SERIALIZED_LENGTH_LABEL)?,
        idle_secs: labeled_integer(payload, IDLE_SECONDS_LABEL)?,
    })
}

/// Reads the digit run directly following the first occurrence of `label`.
fn labeled_integer(payload: &str, label: &'static str) -> Result<u64, MalformedMetadata> {
    let malformed = || MalformedMetadata {
        field: label.trim_end_matches(':'),
        payload: excerpt(payload),
    };

    let start = payload.find(label).ok_or_else(malformed)? + label.len();
    let rest = &payload[start..];
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());

    rest[..digits_end].parse::<u64>().map_err(|_| malformed())
}

fn excerpt(payload: &str) -> String {
    match payload.char_indices().nth(PAYLOAD_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &payload[..cut]),
        None => payload.to_string(),
    }
}
