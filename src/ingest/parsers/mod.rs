// src/ingest/parsers/mod.rs
//! One parser per source format. Each is a pure function
//! `(raw body, source name, aggregation time) -> Vec<Listing>`; a malformed
//! individual item is skipped, only an unparseable payload is an error.

pub mod arbeitnow;
pub mod jobicy;
pub mod remoteok;
pub mod rss;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::ingest::registry::SourceFormat;
use crate::ingest::types::Listing;

/// Dispatch on the registry's format tag.
pub fn parse(
    format: SourceFormat,
    body: &str,
    source: &str,
    now: DateTime<Utc>,
) -> Result<Vec<Listing>> {
    match format {
        SourceFormat::Rss => rss::parse(body, source, now),
        SourceFormat::RemoteOk => remoteok::parse(body, source, now),
        SourceFormat::Arbeitnow => arbeitnow::parse(body, source, now),
        SourceFormat::Jobicy => jobicy::parse(body, source, now),
    }
}

/// Non-empty trimmed string field, if present.
pub(crate) fn text_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn string_list(v: &Value, key: &str, cap: usize) -> Vec<String> {
    v.get(key)
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .take(cap)
                .collect()
        })
        .unwrap_or_default()
}

/// Salary bounds → display text, when both ends are present and positive.
pub(crate) fn salary_range_text(min: Option<i64>, max: Option<i64>) -> Option<String> {
    match (min, max) {
        (Some(lo), Some(hi)) if lo > 0 && hi >= lo => Some(format!("${lo} - ${hi}")),
        (Some(lo), None) if lo > 0 => Some(format!("${lo}+")),
        _ => None,
    }
}
