// tests/parsers_rss.rs
use chrono::{TimeZone, Utc};
use jobfeed_aggregator::ingest::parsers::rss;
use jobfeed_aggregator::ingest::types::EmploymentKind;

const WWR_XML: &str = include_str!("fixtures/wwr_rss.xml");

fn fixed_now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap()
}

#[test]
fn fixture_parses_every_titled_item() {
    let listings = rss::parse(WWR_XML, "We Work Remotely", fixed_now()).expect("rss parse ok");
    assert_eq!(listings.len(), 4);
    assert!(listings.iter().all(|l| l.source_name == "We Work Remotely"));
    assert!(listings.iter().all(|l| !l.id.is_empty()));
}

#[test]
fn organizations_come_from_title_separators() {
    let listings = rss::parse(WWR_XML, "We Work Remotely", fixed_now()).expect("rss parse ok");
    let orgs: Vec<&str> = listings.iter().map(|l| l.organization.as_str()).collect();
    assert_eq!(orgs, vec!["Acme Robotics", "Globex", "Initech", "Hooli"]);
}

#[test]
fn descriptions_are_entity_decoded_and_tag_stripped() {
    let listings = rss::parse(WWR_XML, "We Work Remotely", fixed_now()).expect("rss parse ok");
    let acme = &listings[0];
    assert!(!acme.description_text.contains('<'));
    assert!(acme.description_text.contains("remote backend engineer"));
}

#[test]
fn derived_fields_flow_through_the_extractors() {
    let listings = rss::parse(WWR_XML, "We Work Remotely", fixed_now()).expect("rss parse ok");

    let acme = &listings[0];
    assert_eq!(acme.employment_kind, EmploymentKind::Remote);
    assert_eq!(acme.compensation_text.as_deref(), Some("$140,000 - $170,000"));
    assert_eq!(acme.seniority_band.as_deref(), Some("5+ years"));
    assert_eq!(acme.tags, vec!["backend", "rust"]);

    let initech = &listings[2];
    assert_eq!(initech.employment_kind, EmploymentKind::Hybrid);
    assert_eq!(initech.compensation_text, None);
}

#[test]
fn missing_pub_date_falls_back_to_aggregation_time() {
    let now = fixed_now();
    let listings = rss::parse(WWR_XML, "We Work Remotely", now).expect("rss parse ok");

    let acme = &listings[0];
    assert_eq!(acme.published_at.to_rfc3339(), "2026-03-03T09:15:00+00:00");

    let hooli = &listings[3];
    assert_eq!(hooli.published_at, now);
}

#[test]
fn parse_is_idempotent() {
    let now = fixed_now();
    let a = rss::parse(WWR_XML, "We Work Remotely", now).expect("first parse");
    let b = rss::parse(WWR_XML, "We Work Remotely", now).expect("second parse");
    assert_eq!(a, b, "same payload + same clock must yield identical listings");
}

#[test]
fn unparseable_payload_is_a_total_failure() {
    assert!(rss::parse("{\"not\": \"xml\"}", "We Work Remotely", fixed_now()).is_err());
}
