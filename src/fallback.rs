// src/fallback.rs
//! Bundled last-resort dataset. Served when every live source fails or
//! returns nothing, and directly when a caller forces degraded mode, so
//! the query surface never goes empty on a transient outage.

use chrono::{DateTime, Duration, Utc};

use crate::extract::{extract_country, extract_experience};
use crate::ingest::listing_id;
use crate::ingest::types::{EmploymentKind, Listing};

const SOURCE_NAME: &str = "Bundled";

struct Seed {
    title: &'static str,
    organization: &'static str,
    location: &'static str,
    kind: EmploymentKind,
    description: &'static str,
    url: &'static str,
    compensation: Option<&'static str>,
    tags: &'static [&'static str],
    age_hours: i64,
}

const SEEDS: [Seed; 6] = [
    Seed {
        title: "Senior Backend Engineer",
        organization: "Northwind Labs",
        location: "Remote",
        kind: EmploymentKind::Remote,
        description: "Design and operate the ingestion services behind our data platform. \
                      5+ years of experience with distributed systems expected.",
        url: "https://example.com/jobs/senior-backend-engineer",
        compensation: Some("$140,000 - $170,000"),
        tags: &["backend", "distributed-systems"],
        age_hours: 6,
    },
    Seed {
        title: "Platform Engineer",
        organization: "Helios Computing",
        location: "Austin, TX",
        kind: EmploymentKind::Hybrid,
        description: "Build deployment tooling and observability for a hybrid cloud fleet.",
        url: "https://example.com/jobs/platform-engineer",
        compensation: None,
        tags: &["platform", "kubernetes"],
        age_hours: 18,
    },
    Seed {
        title: "Junior Frontend Developer",
        organization: "Brightpath",
        location: "Berlin, Germany",
        kind: EmploymentKind::Fulltime,
        description: "Entry level role on the dashboard team. TypeScript and testing focus.",
        url: "https://example.com/jobs/junior-frontend-developer",
        compensation: None,
        tags: &["frontend", "typescript"],
        age_hours: 30,
    },
    Seed {
        title: "Staff Software Engineer, Search",
        organization: "Quillworks",
        location: "Toronto, ON",
        kind: EmploymentKind::Remote,
        description: "Lead the relevance and ranking roadmap for our search stack.",
        url: "https://example.com/jobs/staff-engineer-search",
        compensation: Some("$180,000+"),
        tags: &["search", "ranking"],
        age_hours: 48,
    },
    Seed {
        title: "DevOps Engineer",
        organization: "Ferrous Systems Co",
        location: "Remote",
        kind: EmploymentKind::Remote,
        description: "Own CI/CD pipelines and infrastructure as code. 3-5 years of \
                      experience with cloud tooling.",
        url: "https://example.com/jobs/devops-engineer",
        compensation: None,
        tags: &["devops", "ci"],
        age_hours: 72,
    },
    Seed {
        title: "Data Engineer",
        organization: "Lakeshore Analytics",
        location: "Amsterdam, Netherlands",
        kind: EmploymentKind::Hybrid,
        description: "Develop batch and streaming pipelines feeding our analytics products.",
        url: "https://example.com/jobs/data-engineer",
        compensation: None,
        tags: &["data", "etl"],
        age_hours: 96,
    },
];

/// Build the bundled listings, dated relative to the aggregation clock so
/// they sort sensibly next to live data.
pub fn fallback_listings(now: DateTime<Utc>) -> Vec<Listing> {
    SEEDS
        .iter()
        .map(|seed| {
            let seniority = extract_experience(&format!("{} {}", seed.title, seed.description));
            Listing {
                id: listing_id(SOURCE_NAME, seed.url),
                title: seed.title.to_string(),
                organization: seed.organization.to_string(),
                location_text: seed.location.to_string(),
                employment_kind: seed.kind,
                description_text: seed.description.to_string(),
                url: seed.url.to_string(),
                published_at: now - Duration::hours(seed.age_hours),
                source_name: SOURCE_NAME.to_string(),
                compensation_text: seed.compensation.map(str::to_string),
                seniority_band: (!seniority.is_empty()).then_some(seniority),
                country_code: extract_country(seed.location),
                tags: seed.tags.iter().map(|t| t.to_string()).collect(),
            }
        })
        .collect()
}
