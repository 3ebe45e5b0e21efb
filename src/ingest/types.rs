// src/ingest/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a snapshot was produced; drives the `dataSource` marker in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOrigin {
    LiveFeeds,
    LiveApis,
    Fallback,
}

impl DataOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            DataOrigin::LiveFeeds => "Live Feeds",
            DataOrigin::LiveApis => "Live APIs",
            DataOrigin::Fallback => "Mock Data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentKind {
    Remote,
    Hybrid,
    Fulltime,
}

impl EmploymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentKind::Remote => "remote",
            EmploymentKind::Hybrid => "hybrid",
            EmploymentKind::Fulltime => "fulltime",
        }
    }

    /// Keyword inference over free text; defaults to full-time.
    pub fn infer(text: &str) -> Self {
        let t = text.to_lowercase();
        if t.contains("remote") {
            EmploymentKind::Remote
        } else if t.contains("hybrid") {
            EmploymentKind::Hybrid
        } else {
            EmploymentKind::Fulltime
        }
    }
}

/// One normalized job record. `id` is unique within a snapshot after
/// deduplication; `published_at` is always a valid UTC instant (sources
/// that omit or corrupt it get the aggregation time instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub organization: String,
    pub location_text: String,
    pub employment_kind: EmploymentKind,
    pub description_text: String,
    pub url: String,
    #[serde(rename = "publishedDate")]
    pub published_at: DateTime<Utc>,
    pub source_name: String,
    pub compensation_text: Option<String>,
    pub seniority_band: Option<String>,
    pub country_code: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Ok,
    Failed,
}

/// Per-source outcome of one aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceHealth {
    pub status: SourceStatus,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceHealth {
    pub fn ok(count: usize) -> Self {
        Self {
            status: SourceStatus::Ok,
            count,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: SourceStatus::Failed,
            count: 0,
            error: Some(error.into()),
        }
    }
}

/// What one fetch contributes back to the aggregator. The fetcher always
/// returns this — errors are captured in `health`, never thrown upward.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: String,
    pub listings: Vec<Listing>,
    pub health: SourceHealth,
}

/// One complete, immutable aggregation result. Replaces the previous
/// snapshot atomically in the cache.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub listings: Vec<Listing>,
    pub generated_at: DateTime<Utc>,
    pub source_health: Vec<(String, SourceHealth)>,
    pub origin: DataOrigin,
}
