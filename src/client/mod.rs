//! Store Client: the key-value store collaborator used by the sampler.
//! `KeyStore` is the seam; `RedisClient` is the RESP implementation.

pub mod connection;
pub mod protocol;

pub use connection::RedisClient;

use bytes::Bytes;
use thiserror::Error;

use crate::client::protocol::ProtocolError;

// ========================================
// SENTINELS
// ========================================

/// TTL reply for a key that exists but never expires.
pub const TTL_NO_EXPIRY: i64 = -1;
/// TTL reply for a key that does not exist.
pub const TTL_MISSING: i64 = -2;
/// TYPE reply for a key that does not exist.
pub const TYPE_NONE: &str = "none";

// ========================================
// PROBE REPLY
// ========================================

/// Outcome of the DEBUG OBJECT leg of a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugReply {
    Payload(String),
    /// The store answered with an error naming a missing key.
    NoSuchKey,
    /// Any other error reply (e.g. DEBUG disabled on the server).
    Rejected(String),
}

impl DebugReply {
    pub fn from_error(message: String) -> Self {
        if message.to_ascii_lowercase().contains("no such key") {
            DebugReply::NoSuchKey
        } else {
            DebugReply::Rejected(message)
        }
    }
}

/// The ordered (type, ttl, debug) triple returned by a single batched probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReply {
    pub key_type: String,
    pub ttl: i64,
    pub debug: DebugReply,
}

// ========================================
// ERRORS
// ========================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out connecting to {addr}")]
    ConnectTimeout { addr: String },

    #[error("timed out waiting for {command} reply")]
    Timeout { command: String },

    #[error("connection closed by the store")]
    Closed,

    #[error("{command} failed: {message}")]
    Command { command: String, message: String },

    #[error("unexpected reply to {command}: {reply}")]
    UnexpectedReply { command: String, reply: String },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

// ========================================
// STORE TRAIT
// ========================================

/// Everything the sampler needs from a store. Each call is one network round trip.
#[allow(async_fn_in_trait)]
pub trait KeyStore {
    /// Total number of keys in the selected database.
    async fn db_size(&mut self) -> Result<u64, StoreError>;

    /// A uniformly random key, or `None` when the keyspace is empty.
    /// Key names are binary-safe and are sent back to the store byte for byte.
    async fn random_key(&mut self) -> Result<Option<Bytes>, StoreError>;

    /// TYPE, TTL and DEBUG OBJECT for `key`, batched into one exchange.
    async fn probe(&mut self, key: &Bytes) -> Result<ProbeReply, StoreError>;
}
