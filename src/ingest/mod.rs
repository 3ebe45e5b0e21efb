// src/ingest/mod.rs
pub mod fetcher;
pub mod parsers;
pub mod registry;
pub mod types;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::collections::HashSet;

use crate::fallback;
use crate::ingest::fetcher::FeedClient;
use crate::ingest::registry::{SourceFormat, SourceRegistry};
use crate::ingest::types::{DataOrigin, Listing, Snapshot, SourceHealth, SourceStatus};

/// Hard cap on normalized description length (characters, before the marker).
pub const DESCRIPTION_MAX_CHARS: usize = 300;

/// Hard cap on tags kept per listing.
pub const MAX_TAGS: usize = 6;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("jobfeed_listings_total", "Listings parsed from sources.");
        describe_counter!(
            "jobfeed_kept_total",
            "Listings kept after dedup + relevance filtering."
        );
        describe_counter!(
            "jobfeed_filtered_total",
            "Listings dropped by per-source relevance keywords."
        );
        describe_counter!("jobfeed_dedup_total", "Listings removed as duplicates.");
        describe_counter!("jobfeed_source_errors_total", "Source fetch/parse errors.");
        describe_histogram!("jobfeed_parse_ms", "Source parse time in milliseconds.");
        describe_gauge!(
            "jobfeed_last_aggregate_ts",
            "Unix ts of the last aggregation run."
        );
    });
}

/// Normalize a raw description: decode HTML entities, strip tags, collapse
/// whitespace, bound the length with an ellipsis marker.
pub fn clean_description(raw: &str) -> String {
    let mut out = html_escape::decode_html_entities(raw).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > DESCRIPTION_MAX_CHARS {
        out = out.chars().take(DESCRIPTION_MAX_CHARS).collect();
        out.push_str("...");
    }
    out
}

/// Deterministic listing id: short SHA-256 over source + natural key. RSS
/// items have no guaranteed unique natural key across feeds, so the hash
/// covers both fields; identical payloads always derive identical ids.
pub fn listing_id(source: &str, natural_key: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(natural_key.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    let slug: String = source
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    format!("{slug}-{out}")
}

/// Relevance gate: with keywords configured, a listing survives only if
/// title + description (case-folded) contains at least one of them.
pub fn matches_keywords(listing: &Listing, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    let haystack = format!("{} {}", listing.title, listing.description_text).to_lowercase();
    keywords
        .iter()
        .any(|k| haystack.contains(&k.to_lowercase()))
}

/// Cross-source dedup on case-insensitive (title, organization); the first
/// occurrence wins, so merge order (source priority) decides which copy
/// survives. Returns the kept listings and the number dropped.
pub fn dedupe_listings(listings: Vec<Listing>) -> (Vec<Listing>, usize) {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut kept = Vec::with_capacity(listings.len());
    let mut dropped = 0usize;
    for l in listings {
        let key = (l.title.to_lowercase(), l.organization.to_lowercase());
        if !seen.insert(key) {
            dropped += 1;
            continue;
        }
        kept.push(l);
    }
    (kept, dropped)
}

/// Run one full aggregation: fetch every enabled source concurrently,
/// settle all outcomes, merge, dedupe, sort. One slow or dead source never
/// blocks the others past its own timeout, and no failure short-circuits
/// the join — each task reaches a terminal state before the merge.
pub async fn aggregate(
    registry: &SourceRegistry,
    client: &FeedClient,
    now: DateTime<Utc>,
) -> Snapshot {
    ensure_metrics_described();

    let plan = registry.enabled();
    let mut handles = Vec::with_capacity(plan.len());
    for desc in plan {
        let client = client.clone();
        let desc = desc.clone();
        let name = desc.name.clone();
        let format = desc.format;
        handles.push((
            name,
            format,
            tokio::spawn(async move { fetcher::fetch_source(&client, &desc, now).await }),
        ));
    }

    // Await in spawn order: output ordering stays deterministic while the
    // fetches themselves race freely.
    let mut merged: Vec<Listing> = Vec::new();
    let mut source_health: Vec<(String, SourceHealth)> = Vec::new();
    let mut rss_ok = false;
    for (name, format, handle) in handles {
        let report = match handle.await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, source = %name, "fetch task aborted");
                counter!("jobfeed_source_errors_total").increment(1);
                types::SourceReport {
                    source: name,
                    listings: Vec::new(),
                    health: SourceHealth::failed(format!("task aborted: {e}")),
                }
            }
        };
        if report.health.status == SourceStatus::Ok && format == SourceFormat::Rss {
            rss_ok = true;
        }
        merged.extend(report.listings);
        source_health.push((report.source, report.health));
    }

    let (mut listings, dropped) = dedupe_listings(merged);
    // Stable sort: ties keep merge order, which follows source priority.
    listings.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    counter!("jobfeed_kept_total").increment(listings.len() as u64);
    counter!("jobfeed_dedup_total").increment(dropped as u64);
    gauge!("jobfeed_last_aggregate_ts").set(now.timestamp().max(0) as f64);

    if listings.is_empty() {
        tracing::warn!("all sources failed or returned nothing; serving bundled fallback");
        return Snapshot {
            listings: fallback::fallback_listings(now),
            generated_at: now,
            source_health,
            origin: DataOrigin::Fallback,
        };
    }

    let origin = if rss_ok {
        DataOrigin::LiveFeeds
    } else {
        DataOrigin::LiveApis
    };
    tracing::info!(
        kept = listings.len(),
        dedup = dropped,
        sources = source_health.len(),
        "aggregation run complete"
    );

    Snapshot {
        listings,
        generated_at: now,
        source_health,
        origin,
    }
}
