// src/ingest/parsers/rss.rs
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use metrics::{counter, histogram};
use once_cell::sync::Lazy;
use quick_xml::de::from_str;
use regex::Regex;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use crate::extract::{extract_country, extract_experience};
use crate::ingest::types::{EmploymentKind, Listing};
use crate::ingest::{clean_description, listing_id, MAX_TAGS};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<String>,
}

fn parse_rfc2822_utc(ts: &str) -> Option<DateTime<Utc>> {
    OffsetDateTime::parse(ts, &Rfc2822)
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

/// Which side of the separator names the organization.
enum OrgSide {
    Left,
    Right,
}

/// Ordered separator rules for inferring the organization from an item
/// title ("Acme: Senior Engineer", "Engineer at Acme"). First rule whose
/// segment is non-empty wins.
const ORG_RULES: [(&str, OrgSide); 4] = [
    (" at ", OrgSide::Right),
    (" - ", OrgSide::Left),
    (" | ", OrgSide::Left),
    (":", OrgSide::Left),
];

fn organization_from_title(title: &str) -> Option<String> {
    for (sep, side) in &ORG_RULES {
        if let Some((left, right)) = title.split_once(sep) {
            let segment = match side {
                OrgSide::Left => left,
                OrgSide::Right => right,
            }
            .trim();
            if !segment.is_empty() {
                return Some(segment.to_string());
            }
        }
    }
    None
}

static RE_COMPENSATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\$\s?\d{1,3}(?:,\d{3})*(?:k)?(?:\s*[-–]\s*\$?\s?\d{1,3}(?:,\d{3})*(?:k)?)?")
        .expect("compensation regex")
});

fn compensation_from(text: &str) -> Option<String> {
    RE_COMPENSATION
        .find(text)
        .map(|m| m.as_str().trim().to_string())
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Parse an RSS feed body into listings. Items without a usable title are
/// skipped; a body that is not RSS at all is an error.
pub fn parse(body: &str, source: &str, now: DateTime<Utc>) -> Result<Vec<Listing>> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(body);
    let rss: Rss = from_str(&xml_clean).with_context(|| format!("parsing {source} rss xml"))?;

    let mut out = Vec::with_capacity(rss.channel.item.len());
    for it in rss.channel.item {
        let title = match it.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => continue,
        };

        let raw_description = it.description.as_deref().unwrap_or_default();
        let description = clean_description(raw_description);
        let organization =
            organization_from_title(&title).unwrap_or_else(|| source.to_string());
        let url = it.link.as_deref().unwrap_or_default().trim().to_string();

        let probe = format!("{title} {description}");
        let employment_kind = EmploymentKind::infer(&probe);

        // RSS items carry no location field of their own; the registry's
        // feeds are remote boards, so that is the location of record.
        let location_text = "Remote".to_string();
        let decoded = html_escape::decode_html_entities(raw_description).to_string();
        let seniority = extract_experience(&probe);

        let mut tags: Vec<String> = it
            .categories
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        tags.truncate(MAX_TAGS);

        out.push(Listing {
            id: listing_id(source, if url.is_empty() { &title } else { &url }),
            country_code: extract_country(&location_text),
            compensation_text: compensation_from(&format!("{title} {decoded}")),
            seniority_band: (!seniority.is_empty()).then_some(seniority),
            published_at: it
                .pub_date
                .as_deref()
                .and_then(parse_rfc2822_utc)
                .unwrap_or(now),
            title,
            organization,
            location_text,
            employment_kind,
            description_text: description,
            url,
            source_name: source.to_string(),
            tags,
        });
    }

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("jobfeed_parse_ms").record(ms);
    counter!("jobfeed_listings_total").increment(out.len() as u64);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_rules_are_ordered() {
        assert_eq!(
            organization_from_title("Senior Engineer at Acme").as_deref(),
            Some("Acme")
        );
        assert_eq!(
            organization_from_title("Acme - Senior Engineer").as_deref(),
            Some("Acme")
        );
        assert_eq!(
            organization_from_title("Acme | Engineer").as_deref(),
            Some("Acme")
        );
        assert_eq!(
            organization_from_title("Acme: Engineer").as_deref(),
            Some("Acme")
        );
        // " at " outranks the colon rule
        assert_eq!(
            organization_from_title("Urgent: Engineer at Acme").as_deref(),
            Some("Acme")
        );
        assert_eq!(organization_from_title("Plain Title"), None);
    }

    #[test]
    fn compensation_regex_finds_ranges_and_single_amounts() {
        assert_eq!(
            compensation_from("Pay: $120,000 - $150,000 per year").as_deref(),
            Some("$120,000 - $150,000")
        );
        assert_eq!(compensation_from("up to $90k").as_deref(), Some("$90k"));
        assert_eq!(compensation_from("competitive salary"), None);
    }

    #[test]
    fn rfc2822_dates_parse_to_utc() {
        let dt = parse_rfc2822_utc("Mon, 02 Mar 2026 10:30:00 +0200").expect("parse");
        assert_eq!(dt.to_rfc3339(), "2026-03-02T08:30:00+00:00");
        assert!(parse_rfc2822_utc("not a date").is_none());
    }
}
