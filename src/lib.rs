pub mod audit;
pub mod client;
pub mod config;

use crate::audit::{AuditError, AuditResult, Sampler};
use crate::client::RedisClient;
use crate::config::Config;

// ========================================
// RUN (one audit against one database)
// ========================================

/// Connects to `host:port`, selects `db` and samples `sample_size` keys.
pub async fn run_audit(
    host: &str,
    port: u16,
    db: i64,
    sample_size: u64,
    config: &Config,
) -> Result<AuditResult, AuditError> {
    let client = RedisClient::connect(host, port, db, &config.connection)
        .await
        .map_err(AuditError::Connection)?;

    let mut sampler = Sampler::new(client).with_deadline(config.audit.run_deadline());
    sampler.run(sample_size).await
}
