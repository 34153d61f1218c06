//! Audit Core: sampling, shape grouping, aggregation and reporting.

pub mod errors;
pub mod metadata;
pub mod report;
pub mod sampler;
pub mod shape;
pub mod stats;

pub use errors::*;
pub use metadata::{parse_metadata, KeyMetadata, MalformedMetadata};
pub use report::{render, render_json};
pub use sampler::{AuditResult, Sampler, StopReason};
pub use shape::{normalize, ShapeKey};
pub use stats::{KeyObservation, SampledKeyStats, MAX_SAMPLE_KEYS};
