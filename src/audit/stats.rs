//! Key Statistics Accumulator: running per-shape aggregates.

use hashlink::LinkedHashSet;
use serde::Serialize;

/// How many distinct example key names a group keeps for display.
pub const MAX_SAMPLE_KEYS: usize = 10;

/// One sampled key, after its metadata payload has been parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyObservation {
    pub key: String,
    pub key_type: String,
    pub idle_secs: u64,
    pub serialized_length: u64,
    /// `None` when the key never expires.
    pub ttl: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SampledKeyStats {
    pub total_instances: u64,
    pub total_idle_secs: u64,
    pub total_serialized_length: u64,
    pub total_keys_with_expiry: u64,
    pub min_serialized_length: Option<u64>,
    pub max_serialized_length: Option<u64>,
    pub min_idle_secs: Option<u64>,
    pub max_idle_secs: Option<u64>,
    pub max_ttl: Option<u64>,
    #[serde(serialize_with = "serialize_names")]
    pub sample_key_names: LinkedHashSet<String>,
}

impl SampledKeyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one observation in. Not idempotent: folding twice counts twice.
    pub fn fold(&mut self, obs: &KeyObservation) {
        self.total_instances += 1;
        self.total_idle_secs = self.total_idle_secs.saturating_add(obs.idle_secs);
        self.total_serialized_length = self
            .total_serialized_length
            .saturating_add(obs.serialized_length);

        if let Some(ttl) = obs.ttl {
            self.total_keys_with_expiry += 1;
            self.max_ttl = Some(self.max_ttl.map_or(ttl, |max| max.max(ttl)));
        }

        extend_range(&mut self.min_idle_secs, &mut self.max_idle_secs, obs.idle_secs);
        extend_range(
            &mut self.min_serialized_length,
            &mut self.max_serialized_length,
            obs.serialized_length,
        );

        if self.sample_key_names.len() < MAX_SAMPLE_KEYS && !self.sample_key_names.contains(&obs.key) {
            self.sample_key_names.insert(obs.key.clone());
        }
    }

    /// Share of keys in this group carrying an expiry; `None` for an empty group.
    pub fn expiry_ratio(&self) -> Option<f64> {
        ratio(self.total_keys_with_expiry, self.total_instances)
    }

    pub fn average_idle_secs(&self) -> Option<f64> {
        ratio(self.total_idle_secs, self.total_instances)
    }
}

/// `part / whole`, or `None` when `whole` is zero.
pub fn ratio(part: u64, whole: u64) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64)
}

fn extend_range(min: &mut Option<u64>, max: &mut Option<u64>, value: u64) {
    *min = Some(min.map_or(value, |m| m.min(value)));
    *max = Some(max.map_or(value, |m| m.max(value)));
}

fn serialize_names<S: serde::Serializer>(
    names: &LinkedHashSet<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(names.iter())
}
