// src/ingest/parsers/jobicy.rs
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use metrics::{counter, histogram};
use serde_json::Value;

use crate::extract::{extract_country, extract_experience};
use crate::ingest::parsers::{salary_range_text, string_list, text_field};
use crate::ingest::types::{EmploymentKind, Listing};
use crate::ingest::{clean_description, listing_id, MAX_TAGS};

/// Jobicy's search-hits envelope: `{"jobs": [...]}` with camelCase fields
/// and `pubDate` as a naive `YYYY-MM-DD HH:MM:SS` string (UTC).
pub fn parse(body: &str, source: &str, now: DateTime<Utc>) -> Result<Vec<Listing>> {
    let t0 = std::time::Instant::now();
    let root: Value =
        serde_json::from_str(body).with_context(|| format!("parsing {source} json"))?;
    let rows = root
        .get("jobs")
        .and_then(Value::as_array)
        .with_context(|| format!("{source} payload has no jobs array"))?;

    let out: Vec<Listing> = rows
        .iter()
        .filter_map(|row| item_to_listing(row, source, now))
        .collect();

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("jobfeed_parse_ms").record(ms);
    counter!("jobfeed_listings_total").increment(out.len() as u64);
    Ok(out)
}

fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn item_to_listing(row: &Value, source: &str, now: DateTime<Utc>) -> Option<Listing> {
    let title = text_field(row, "jobTitle")?;
    let organization = text_field(row, "companyName").unwrap_or_else(|| source.to_string());
    let location_text = text_field(row, "jobGeo").unwrap_or_else(|| "Remote".to_string());
    let url = text_field(row, "url").unwrap_or_default();
    let description = clean_description(
        &text_field(row, "jobDescription")
            .or_else(|| text_field(row, "jobExcerpt"))
            .unwrap_or_default(),
    );

    let published_at = text_field(row, "pubDate")
        .and_then(|d| parse_pub_date(&d))
        .unwrap_or(now);

    let job_type = string_list(row, "jobType", MAX_TAGS).join(" ");
    let probe = format!("{title} {location_text} {job_type}");

    // jobLevel is the board's own band ("Senior", "Any"); fall back to the
    // shared rule list when it is absent or the catch-all value.
    let seniority = text_field(row, "jobLevel")
        .filter(|lvl| !lvl.eq_ignore_ascii_case("any"))
        .unwrap_or_else(|| extract_experience(&format!("{title} {description}")));

    Some(Listing {
        id: listing_id(source, if url.is_empty() { &title } else { &url }),
        country_code: extract_country(&location_text),
        employment_kind: EmploymentKind::infer(&probe),
        compensation_text: salary_range_text(
            row.get("annualSalaryMin").and_then(Value::as_i64),
            row.get("annualSalaryMax").and_then(Value::as_i64),
        ),
        seniority_band: (!seniority.is_empty()).then_some(seniority),
        published_at,
        title,
        organization,
        location_text,
        description_text: description,
        url,
        source_name: source.to_string(),
        tags: string_list(row, "jobIndustry", MAX_TAGS),
    })
}
