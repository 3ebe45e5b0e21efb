// src/ingest/parsers/remoteok.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde_json::Value;

use crate::extract::{extract_country, extract_experience};
use crate::ingest::parsers::{salary_range_text, string_list, text_field};
use crate::ingest::types::{EmploymentKind, Listing};
use crate::ingest::{clean_description, listing_id, MAX_TAGS};

/// RemoteOK returns a bare JSON array whose first element is a legal/meta
/// row without job fields; real rows carry `position` and `company`.
pub fn parse(body: &str, source: &str, now: DateTime<Utc>) -> Result<Vec<Listing>> {
    let t0 = std::time::Instant::now();
    let root: Value =
        serde_json::from_str(body).with_context(|| format!("parsing {source} json"))?;
    let rows = root
        .as_array()
        .with_context(|| format!("{source} payload is not an array"))?;

    let out: Vec<Listing> = rows
        .iter()
        .filter_map(|row| item_to_listing(row, source, now))
        .collect();

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("jobfeed_parse_ms").record(ms);
    counter!("jobfeed_listings_total").increment(out.len() as u64);
    Ok(out)
}

fn item_to_listing(row: &Value, source: &str, now: DateTime<Utc>) -> Option<Listing> {
    // Skips the metadata row and any malformed item.
    let title = text_field(row, "position")?;
    let organization = text_field(row, "company").unwrap_or_else(|| source.to_string());
    let location_text = text_field(row, "location").unwrap_or_else(|| "Remote".to_string());
    let url = text_field(row, "url").unwrap_or_default();
    let description = clean_description(&text_field(row, "description").unwrap_or_default());

    let published_at = text_field(row, "date")
        .and_then(|d| DateTime::parse_from_rfc3339(&d).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(now);

    let compensation_text = salary_range_text(
        row.get("salary_min").and_then(Value::as_i64),
        row.get("salary_max").and_then(Value::as_i64),
    );

    let probe = format!("{title} {location_text} {description}");
    let seniority = extract_experience(&probe);

    Some(Listing {
        id: listing_id(source, if url.is_empty() { &title } else { &url }),
        country_code: extract_country(&location_text),
        employment_kind: EmploymentKind::infer(&probe),
        compensation_text,
        seniority_band: (!seniority.is_empty()).then_some(seniority),
        published_at,
        title,
        organization,
        location_text,
        description_text: description,
        url,
        source_name: source.to_string(),
        tags: string_list(row, "tags", MAX_TAGS),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_row_and_broken_items_are_skipped() {
        let body = r#"[
            {"legal": "API terms of service apply."},
            {"position": "Rust Engineer", "company": "Acme", "location": "Remote",
             "description": "<p>Build things</p>", "url": "https://remoteok.com/l/1",
             "date": "2026-02-01T12:00:00+00:00", "tags": ["rust", "backend"],
             "salary_min": 90000, "salary_max": 120000},
            {"company": "NoTitle Inc"}
        ]"#;
        let now = Utc::now();
        let out = parse(body, "RemoteOK", now).expect("parse remoteok");
        assert_eq!(out.len(), 1);
        let l = &out[0];
        assert_eq!(l.title, "Rust Engineer");
        assert_eq!(l.organization, "Acme");
        assert_eq!(l.compensation_text.as_deref(), Some("$90000 - $120000"));
        assert_eq!(l.tags, vec!["rust", "backend"]);
        assert_eq!(l.employment_kind, EmploymentKind::Remote);
    }

    #[test]
    fn non_array_payload_is_an_error() {
        assert!(parse(r#"{"error": "rate limited"}"#, "RemoteOK", Utc::now()).is_err());
    }
}
