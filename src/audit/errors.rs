use thiserror::Error;

use crate::audit::metadata::MalformedMetadata;
use crate::client::StoreError;
use crate::config::ConfigError;

/// Failures that abort the run. No report is produced.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("{0}")]
    Usage(String),

    #[error("cannot reach the store: {0}")]
    Connection(#[source] StoreError),

    #[error("the keyspace is empty, nothing to sample")]
    EmptyKeyspace,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to encode report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Failures confined to one sample round. The round is skipped and the run continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("key {key:?}: {source}")]
    MalformedMetadata {
        key: String,
        #[source]
        source: MalformedMetadata,
    },

    #[error("key {key:?} vanished before it could be inspected")]
    VanishedKey { key: String },
}
