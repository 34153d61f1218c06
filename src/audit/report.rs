//! Report Generator: turns a finished `AuditResult` into text or JSON.
//!
//! Groups are ordered by sampled bytes (largest first), ties broken by shape,
//! so the output does not depend on the order keys were sampled in.

use std::fmt::Write;

use serde::Serialize;

use crate::audit::sampler::{AuditResult, StopReason};
use crate::audit::shape::ShapeKey;
use crate::audit::stats::{ratio, SampledKeyStats};

const SEPARATOR: &str =
    "==============================================================================";
const NOT_AVAILABLE: &str = "n/a";

pub fn ordered_groups(result: &AuditResult) -> Vec<(&ShapeKey, &SampledKeyStats)> {
    let mut groups: Vec<_> = result.shapes.iter().collect();
    groups.sort_by(|(ka, a), (kb, b)| {
        b.total_serialized_length
            .cmp(&a.total_serialized_length)
            .then_with(|| ka.cmp(kb))
    });
    groups
}

pub fn render(result: &AuditResult) -> String {
    let mut out = String::new();
    // Writing into a String never fails.
    let _ = write_report(&mut out, result);
    out
}

fn write_report(out: &mut String, result: &AuditResult) -> std::fmt::Result {
    let total_bytes = result.total_sampled_bytes();
    let folded = result.folded();

    writeln!(out, "DB has {} keys", result.db_size)?;
    writeln!(out)?;
    writeln!(out, "Stats for {} sampled keys in {} shapes...", folded, result.shapes.len())?;

    if !result.is_complete() {
        write!(
            out,
            "Only {} of {} requested samples were folded ({} malformed, {} vanished",
            folded, result.requested, result.skipped_malformed, result.skipped_vanished
        )?;
        if let Some(reason) = result.stopped_early {
            write!(out, "; stopped early: {}", reason)?;
        }
        writeln!(out, ")")?;
    }

    if total_bytes == 0 {
        writeln!(out, "No bytes were sampled; memory shares are {}", NOT_AVAILABLE)?;
    } else {
        writeln!(out, "Total sampled memory: {} bytes", total_bytes)?;
    }
    writeln!(out)?;

    for (shape, stats) in ordered_groups(result) {
        let names: Vec<&str> = stats.sample_key_names.iter().map(String::as_str).collect();

        writeln!(out, "{}", SEPARATOR)?;
        writeln!(out, "Keys of the form {} with type {}", shape.pattern, shape.key_type)?;
        writeln!(out, "For example:")?;
        writeln!(out, "{}", names.join(", "))?;
        writeln!(out)?;
        writeln!(
            out,
            "{} of these keys expire ({}), with maximum ttl of {}",
            format_percentage(stats.expiry_ratio()),
            stats.total_keys_with_expiry,
            format_optional(stats.max_ttl)
        )?;
        writeln!(
            out,
            "These keys use {} of the total sampled memory ({} bytes)",
            format_percentage(ratio(stats.total_serialized_length, total_bytes)),
            stats.total_serialized_length
        )?;
        writeln!(
            out,
            "Average idle time: {} seconds - (Max: {} Min: {})",
            stats
                .average_idle_secs()
                .map_or_else(|| NOT_AVAILABLE.to_string(), format_decimal),
            format_optional(stats.max_idle_secs),
            format_optional(stats.min_idle_secs)
        )?;
        writeln!(out)?;
    }

    Ok(())
}

// ========================================
// JSON
// ========================================

#[derive(Serialize)]
struct JsonReport<'a> {
    db_size: u64,
    requested: u64,
    folded: u64,
    skipped_malformed: u64,
    skipped_vanished: u64,
    stopped_early: Option<StopReason>,
    total_sampled_bytes: u64,
    groups: Vec<JsonGroup<'a>>,
}

#[derive(Serialize)]
struct JsonGroup<'a> {
    shape: String,
    pattern: &'a str,
    key_type: &'a str,
    expiry_ratio: Option<f64>,
    memory_share: Option<f64>,
    average_idle_secs: Option<f64>,
    #[serde(flatten)]
    stats: &'a SampledKeyStats,
}

pub fn render_json(result: &AuditResult) -> Result<String, serde_json::Error> {
    let total_bytes = result.total_sampled_bytes();
    let groups = ordered_groups(result)
        .into_iter()
        .map(|(shape, stats)| JsonGroup {
            shape: shape.to_string(),
            pattern: &shape.pattern,
            key_type: &shape.key_type,
            expiry_ratio: stats.expiry_ratio(),
            memory_share: ratio(stats.total_serialized_length, total_bytes),
            average_idle_secs: stats.average_idle_secs(),
            stats,
        })
        .collect();

    serde_json::to_string_pretty(&JsonReport {
        db_size: result.db_size,
        requested: result.requested,
        folded: result.folded(),
        skipped_malformed: result.skipped_malformed,
        skipped_vanished: result.skipped_vanished,
        stopped_early: result.stopped_early,
        total_sampled_bytes: total_bytes,
        groups,
    })
}

// ========================================
// FORMATTING HELPERS
// ========================================

/// `Some(0.5)` -> `50%`, `Some(1.0/3.0)` -> `33.33%`, `None` -> `n/a`.
pub fn format_percentage(ratio: Option<f64>) -> String {
    match ratio {
        Some(r) if r.is_finite() => format!("{}%", format_decimal(r * 100.0)),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// At most two decimals, trailing zeros trimmed.
pub fn format_decimal(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

fn format_optional(value: Option<u64>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| v.to_string())
}
