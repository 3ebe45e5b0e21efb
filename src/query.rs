// src/query.rs
//! Pure view over a snapshot: caller filters in, response envelope out.
//! No I/O, no mutation — the handlers own fetching the snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::registry::SourceRegistry;
use crate::ingest::types::{Listing, Snapshot};

/// Optional caller filters; `"all"` (or absence) disables a filter.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct JobFilters {
    #[serde(rename = "type")]
    pub employment_kind: Option<String>,
    pub source: Option<String>,
    pub search: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "useRSS")]
    pub use_rss: Option<String>,
}

impl JobFilters {
    /// `useRSS=false` forces the bundled dataset, bypassing live fetch.
    pub fn forces_fallback(&self) -> bool {
        self.use_rss.as_deref() == Some("false")
    }
}

fn active(param: &Option<String>) -> Option<&str> {
    param
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

#[derive(Debug, Serialize)]
pub struct ActiveFeed {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub priority: u32,
    #[serde(rename = "isAPI")]
    pub is_api: bool,
}

#[derive(Debug, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<Listing>,
    pub total: usize,
    #[serde(rename = "lastUpdated")]
    pub last_updated: DateTime<Utc>,
    /// Distinct source names present in the filtered result.
    pub sources: Vec<String>,
    #[serde(rename = "dataSource")]
    pub data_source: &'static str,
    /// Every enabled descriptor in the registry, for the UI's source picker.
    #[serde(rename = "activeFeeds")]
    pub active_feeds: Vec<ActiveFeed>,
}

fn matches(listing: &Listing, filters: &JobFilters) -> bool {
    if let Some(kind) = active(&filters.employment_kind) {
        if !listing.employment_kind.as_str().eq_ignore_ascii_case(kind) {
            return false;
        }
    }
    if let Some(source) = active(&filters.source) {
        if !listing
            .source_name
            .to_lowercase()
            .contains(&source.to_lowercase())
        {
            return false;
        }
    }
    if let Some(country) = active(&filters.country) {
        if !listing.country_code.eq_ignore_ascii_case(country) {
            return false;
        }
    }
    if let Some(search) = active(&filters.search) {
        let needle = search.to_lowercase();
        let mut haystack = format!(
            "{} {} {}",
            listing.title, listing.organization, listing.description_text
        );
        for tag in &listing.tags {
            haystack.push(' ');
            haystack.push_str(tag);
        }
        if !haystack.to_lowercase().contains(&needle) {
            return false;
        }
    }
    true
}

/// Apply caller filters over an immutable snapshot and assemble the
/// response envelope.
pub fn apply(snapshot: &Snapshot, registry: &SourceRegistry, filters: &JobFilters) -> JobsResponse {
    let jobs: Vec<Listing> = snapshot
        .listings
        .iter()
        .filter(|l| matches(l, filters))
        .cloned()
        .collect();

    let mut sources: Vec<String> = Vec::new();
    for job in &jobs {
        if !sources.contains(&job.source_name) {
            sources.push(job.source_name.clone());
        }
    }

    let active_feeds = registry
        .enabled()
        .into_iter()
        .map(|d| ActiveFeed {
            name: d.name.clone(),
            kind: d.format.label(),
            priority: d.priority,
            is_api: d.format.is_api(),
        })
        .collect();

    JobsResponse {
        total: jobs.len(),
        jobs,
        last_updated: snapshot.generated_at,
        sources,
        data_source: snapshot.origin.label(),
        active_feeds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::{DataOrigin, EmploymentKind};
    use chrono::TimeZone;

    fn listing(title: &str, org: &str, source: &str, country: &str, kind: EmploymentKind) -> Listing {
        Listing {
            id: format!("{source}-{title}"),
            title: title.into(),
            organization: org.into(),
            location_text: country.into(),
            employment_kind: kind,
            description_text: "ships software".into(),
            url: String::new(),
            published_at: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            source_name: source.into(),
            compensation_text: None,
            seniority_band: None,
            country_code: country.into(),
            tags: vec!["rust".into()],
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot {
            listings: vec![
                listing("Rust Engineer", "Acme", "RemoteOK", "US", EmploymentKind::Remote),
                listing("QA Analyst", "Globex", "Jobicy", "DE", EmploymentKind::Hybrid),
                listing("Support Engineer", "Initech", "RemoteOK", "US", EmploymentKind::Fulltime),
            ],
            generated_at: Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
            source_health: Vec::new(),
            origin: DataOrigin::LiveApis,
        }
    }

    #[test]
    fn no_filters_returns_everything_with_metadata() {
        let reg = SourceRegistry::seed();
        let resp = apply(&snapshot(), &reg, &JobFilters::default());
        assert_eq!(resp.total, 3);
        assert_eq!(resp.sources, vec!["RemoteOK", "Jobicy"]);
        assert_eq!(resp.data_source, "Live APIs");
        assert_eq!(resp.active_feeds.len(), reg.enabled().len());
    }

    #[test]
    fn all_sentinel_is_a_no_op() {
        let reg = SourceRegistry::seed();
        let filters = JobFilters {
            employment_kind: Some("all".into()),
            country: Some("All".into()),
            ..Default::default()
        };
        assert_eq!(apply(&snapshot(), &reg, &filters).total, 3);
    }

    #[test]
    fn kind_source_country_filters_compose() {
        let reg = SourceRegistry::seed();
        let filters = JobFilters {
            employment_kind: Some("remote".into()),
            source: Some("remote".into()),
            country: Some("us".into()),
            ..Default::default()
        };
        let resp = apply(&snapshot(), &reg, &filters);
        assert_eq!(resp.total, 1);
        assert_eq!(resp.jobs[0].title, "Rust Engineer");
    }

    #[test]
    fn search_spans_title_org_description_tags() {
        let reg = SourceRegistry::seed();
        for needle in ["globex", "ships software", "rust engineer", "RUST"] {
            let filters = JobFilters {
                search: Some(needle.into()),
                ..Default::default()
            };
            assert!(
                apply(&snapshot(), &reg, &filters).total >= 1,
                "search for {needle:?} should match"
            );
        }
        let filters = JobFilters {
            search: Some("cobol".into()),
            ..Default::default()
        };
        assert_eq!(apply(&snapshot(), &reg, &filters).total, 0);
    }

    #[test]
    fn use_rss_false_is_the_only_fallback_trigger() {
        assert!(JobFilters {
            use_rss: Some("false".into()),
            ..Default::default()
        }
        .forces_fallback());
        assert!(!JobFilters {
            use_rss: Some("true".into()),
            ..Default::default()
        }
        .forces_fallback());
        assert!(!JobFilters::default().forces_fallback());
    }
}
