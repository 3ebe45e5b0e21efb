// src/ingest/parsers/arbeitnow.rs
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use metrics::{counter, histogram};
use serde_json::Value;

use crate::extract::{extract_country, extract_experience};
use crate::ingest::parsers::{string_list, text_field};
use crate::ingest::types::{EmploymentKind, Listing};
use crate::ingest::{clean_description, listing_id, MAX_TAGS};

/// Arbeitnow wraps listings in a `{"data": [...]}` envelope; `created_at`
/// is unix seconds and `remote` is an explicit boolean.
pub fn parse(body: &str, source: &str, now: DateTime<Utc>) -> Result<Vec<Listing>> {
    let t0 = std::time::Instant::now();
    let root: Value =
        serde_json::from_str(body).with_context(|| format!("parsing {source} json"))?;
    let rows = root
        .get("data")
        .and_then(Value::as_array)
        .with_context(|| format!("{source} payload has no data array"))?;

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
    let title = text_field(row, "title")?;
    let organization = text_field(row, "company_name").unwrap_or_else(|| source.to_string());
    let location_text = text_field(row, "location").unwrap_or_else(|| "Remote".to_string());
    let url = text_field(row, "url").unwrap_or_default();
    let description = clean_description(&text_field(row, "description").unwrap_or_default());

    let published_at = row
        .get("created_at")
        .and_then(Value::as_i64)
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or(now);

    let employment_kind = if row.get("remote").and_then(Value::as_bool).unwrap_or(false) {
        EmploymentKind::Remote
    } else {
        let job_types = string_list(row, "job_types", MAX_TAGS).join(" ");
        EmploymentKind::infer(&format!("{title} {job_types}"))
    };

    let probe = format!("{title} {description}");
    let seniority = extract_experience(&probe);

    Some(Listing {
        id: listing_id(source, if url.is_empty() { &title } else { &url }),
        country_code: extract_country(&location_text),
        employment_kind,
        compensation_text: None,
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
    fn data_envelope_parses_and_defaults_gracefully() {
        let body = r#"{"data": [
            {"title": "Backend Developer", "company_name": "Beispiel GmbH",
             "location": "Berlin, Germany", "remote": false,
             "description": "Senior role, Kubernetes", "url": "https://arbeitnow.com/j/1",
             "tags": ["backend"], "job_types": ["full time"], "created_at": 1767225600},
            {"title": "Remote QA", "remote": true},
            {"url": "https://arbeitnow.com/j/untitled"}
        ]}"#;
        let out = parse(body, "Arbeitnow", Utc::now()).expect("parse arbeitnow");
        assert_eq!(out.len(), 2, "untitled row is skipped");

        let first = &out[0];
        assert_eq!(first.country_code, "DE");
        assert_eq!(first.employment_kind, EmploymentKind::Fulltime);
        assert_eq!(first.seniority_band.as_deref(), Some("Senior"));
        assert_eq!(first.published_at.timestamp(), 1767225600);

        let second = &out[1];
        assert_eq!(second.organization, "Arbeitnow");
        assert_eq!(second.location_text, "Remote");
        assert_eq!(second.employment_kind, EmploymentKind::Remote);
    }

    #[test]
    fn missing_envelope_is_an_error() {
        assert!(parse(r#"{"jobs": []}"#, "Arbeitnow", Utc::now()).is_err());
    }
}
