//! Sampler: drives the sample rounds against a `KeyStore` and folds every
//! usable observation into its shape's accumulator.
//!
//! One round = RANDOMKEY, then one pipelined TYPE/TTL/DEBUG OBJECT exchange.
//! Rounds run strictly one after another.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::audit::errors::{AuditError, SampleError};
use crate::audit::metadata::parse_metadata;
use crate::audit::shape::{normalize, ShapeKey};
use crate::audit::stats::{KeyObservation, SampledKeyStats};
use crate::client::{DebugReply, KeyStore, StoreError, TTL_MISSING, TTL_NO_EXPIRY, TYPE_NONE};

// ========================================
// AUDIT RESULT
// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The overall run deadline passed.
    Deadline,
    /// A store round trip exceeded its timeout.
    RoundTripTimeout,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Deadline => write!(f, "run deadline reached"),
            StopReason::RoundTripTimeout => write!(f, "store round trip timed out"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuditResult {
    /// Key count captured once, before the first round.
    pub db_size: u64,
    /// Number of rounds asked for.
    pub requested: u64,
    pub shapes: HashMap<ShapeKey, SampledKeyStats>,
    pub skipped_malformed: u64,
    pub skipped_vanished: u64,
    pub stopped_early: Option<StopReason>,
}

impl AuditResult {
    pub fn new(db_size: u64, requested: u64) -> Self {
        Self {
            db_size,
            requested,
            ..Self::default()
        }
    }

    /// Folds `obs` into its shape's accumulator, creating it on first sight.
    pub fn record(&mut self, obs: &KeyObservation) {
        self.shapes
            .entry(normalize(&obs.key, &obs.key_type))
            .or_default()
            .fold(obs);
    }

    /// Observations actually folded.
    pub fn folded(&self) -> u64 {
        self.shapes.values().map(|s| s.total_instances).sum()
    }

    pub fn total_sampled_bytes(&self) -> u64 {
        self.shapes.values().map(|s| s.total_serialized_length).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.folded() == self.requested
    }
}

// ========================================
// SAMPLER
// ========================================

pub struct Sampler<S> {
    store: S,
    deadline: Option<Duration>,
}

impl<S: KeyStore> Sampler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            deadline: None,
        }
    }

    /// Stops sampling once `deadline` has elapsed since the run started; the partial result is kept.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub async fn run(&mut self, sample_size: u64) -> Result<AuditResult, AuditError> {
        let started = Instant::now();
        let db_size = self.store.db_size().await?;
        let mut result = AuditResult::new(db_size, sample_size);

        info!("Sampling {} of {} keys", sample_size, db_size);

        for round in 0..sample_size {
            if self.deadline.is_some_and(|d| started.elapsed() >= d) {
                warn!("Run deadline reached after {} of {} rounds", round, sample_size);
                result.stopped_early = Some(StopReason::Deadline);
                break;
            }

            match self.sample_round().await {
                Ok(Ok(obs)) => {
                    debug!("Round {}: {:?} ({}, {} bytes)", round, obs.key, obs.key_type, obs.serialized_length);
                    result.record(&obs);
                }
                Ok(Err(err @ SampleError::MalformedMetadata { .. })) => {
                    warn!("Skipping sample: {}", err);
                    result.skipped_malformed += 1;
                }
                Ok(Err(err @ SampleError::VanishedKey { .. })) => {
                    debug!("Skipping sample: {}", err);
                    result.skipped_vanished += 1;
                }
                Err(AuditError::Store(StoreError::Timeout { command })) => {
                    warn!("{} timed out after {} of {} rounds, stopping", command, round, sample_size);
                    result.stopped_early = Some(StopReason::RoundTripTimeout);
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            "Folded {} samples into {} shapes in {:?}",
            result.folded(),
            result.shapes.len(),
            started.elapsed()
        );
        Ok(result)
    }

    /// Outer error aborts the run; inner error skips this round only.
    async fn sample_round(&mut self) -> Result<Result<KeyObservation, SampleError>, AuditError> {
        let Some(key) = self.store.random_key().await? else {
            return Err(AuditError::EmptyKeyspace);
        };

        let reply = self.store.probe(&key).await?;
        let key = String::from_utf8_lossy(&key).into_owned();

        if reply.key_type == TYPE_NONE || reply.ttl == TTL_MISSING {
            return Ok(Err(SampleError::VanishedKey { key }));
        }
        let payload = match reply.debug {
            DebugReply::Payload(payload) => payload,
            DebugReply::NoSuchKey => return Ok(Err(SampleError::VanishedKey { key })),
            DebugReply::Rejected(message) => {
                return Err(StoreError::Command {
                    command: "DEBUG OBJECT".to_string(),
                    message,
                }
                .into())
            }
        };

        let meta = match parse_metadata(&payload) {
            Ok(meta) => meta,
            Err(source) => return Ok(Err(SampleError::MalformedMetadata { key, source })),
        };

        let ttl = if reply.ttl == TTL_NO_EXPIRY {
            None
        } else {
            u64::try_from(reply.ttl).ok()
        };

        Ok(Ok(KeyObservation {
            key,
            key_type: reply.key_type,
            idle_secs: meta.idle_secs,
            serialized_length: meta.serialized_length,
            ttl,
        }))
    }
}
