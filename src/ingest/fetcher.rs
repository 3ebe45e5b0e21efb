// src/ingest/fetcher.rs
//! HTTP boundary. Every failure mode (timeout, non-2xx, unparseable body)
//! is captured into the per-source report; nothing propagates upward as an
//! error, so one dead source can never sink an aggregation run.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use metrics::counter;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::ingest::registry::SourceDescriptor;
use crate::ingest::types::{SourceHealth, SourceReport};
use crate::ingest::{matches_keywords, parsers};

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Feeds reject the default library agent; present a browser-class one.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

#[derive(Clone)]
pub struct FeedClient {
    mode: Mode,
}

#[derive(Clone)]
enum Mode {
    Http(reqwest::Client),
    /// Canned bodies keyed by source name; `Err` simulates a transport
    /// failure. Used by tests and never constructed in the binary.
    Fixture(Arc<HashMap<String, Result<String, String>>>),
}

impl FeedClient {
    pub fn http() -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("building http client");
        Self {
            mode: Mode::Http(client),
        }
    }

    pub fn from_fixtures(fixtures: HashMap<String, Result<String, String>>) -> Self {
        Self {
            mode: Mode::Fixture(Arc::new(fixtures)),
        }
    }

    async fn get_body(&self, desc: &SourceDescriptor) -> Result<String> {
        match &self.mode {
            Mode::Http(client) => {
                let resp = client
                    .get(&desc.endpoint)
                    .header(reqwest::header::ACCEPT, desc.format.accept_header())
                    .send()
                    .await
                    .with_context(|| format!("GET {}", desc.endpoint))?;
                let resp = resp
                    .error_for_status()
                    .with_context(|| format!("GET {}", desc.endpoint))?;
                resp.text()
                    .await
                    .with_context(|| format!("reading body from {}", desc.endpoint))
            }
            Mode::Fixture(map) => match map.get(&desc.name) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(e)) => Err(anyhow::anyhow!("{e}")),
                None => Err(anyhow::anyhow!("no fixture for source {}", desc.name)),
            },
        }
    }
}

/// Fetch one source end to end: GET, parse with the descriptor's format,
/// apply the relevance keyword gate. Always returns a report.
pub async fn fetch_source(
    client: &FeedClient,
    desc: &SourceDescriptor,
    now: DateTime<Utc>,
) -> SourceReport {
    let body = match client.get_body(desc).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(source = %desc.name, error = %e, "source fetch failed");
            counter!("jobfeed_source_errors_total").increment(1);
            return SourceReport {
                source: desc.name.clone(),
                listings: Vec::new(),
                health: SourceHealth::failed(format!("{e:#}")),
            };
        }
    };

    let listings = match parsers::parse(desc.format, &body, &desc.name, now) {
        Ok(listings) => listings,
        Err(e) => {
            tracing::warn!(source = %desc.name, error = %e, "source parse failed");
            counter!("jobfeed_source_errors_total").increment(1);
            return SourceReport {
                source: desc.name.clone(),
                listings: Vec::new(),
                health: SourceHealth::failed(format!("{e:#}")),
            };
        }
    };

    let total = listings.len();
    let kept: Vec<_> = listings
        .into_iter()
        .filter(|l| matches_keywords(l, &desc.keywords))
        .collect();
    let filtered = total - kept.len();
    if filtered > 0 {
        counter!("jobfeed_filtered_total").increment(filtered as u64);
    }
    tracing::debug!(
        source = %desc.name,
        parsed = total,
        kept = kept.len(),
        "source fetched"
    );

    SourceReport {
        source: desc.name.clone(),
        health: SourceHealth::ok(kept.len()),
        listings: kept,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::registry::SourceFormat;
    use crate::ingest::types::SourceStatus;

    fn rss_descriptor(keywords: Vec<String>) -> SourceDescriptor {
        SourceDescriptor {
            name: "Board".into(),
            endpoint: "https://board.example/feed.rss".into(),
            format: SourceFormat::Rss,
            enabled: true,
            priority: 1,
            keywords,
        }
    }

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <item><title>Acme: Rust Engineer</title><link>https://board.example/1</link>
    <description>Remote systems work</description>
    <pubDate>Mon, 02 Feb 2026 10:00:00 +0000</pubDate></item>
  <item><title>Acme: Gardener</title><link>https://board.example/2</link>
    <description>On site</description></item>
</channel></rss>"#;

    #[tokio::test]
    async fn transport_failure_becomes_failed_health() {
        let client = FeedClient::from_fixtures(HashMap::from([(
            "Board".to_string(),
            Err("HTTP status 503".to_string()),
        )]));
        let report = fetch_source(&client, &rss_descriptor(vec![]), Utc::now()).await;
        assert_eq!(report.health.status, SourceStatus::Failed);
        assert!(report.listings.is_empty());
        assert!(report.health.error.as_deref().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn keyword_gate_filters_off_topic_items() {
        let client = FeedClient::from_fixtures(HashMap::from([(
            "Board".to_string(),
            Ok(FEED.to_string()),
        )]));
        let desc = rss_descriptor(vec!["engineer".into()]);
        let report = fetch_source(&client, &desc, Utc::now()).await;
        assert_eq!(report.health.status, SourceStatus::Ok);
        assert_eq!(report.health.count, 1);
        assert_eq!(report.listings[0].title, "Acme: Rust Engineer");
    }

    #[tokio::test]
    async fn empty_keyword_list_accepts_everything() {
        let client = FeedClient::from_fixtures(HashMap::from([(
            "Board".to_string(),
            Ok(FEED.to_string()),
        )]));
        let report = fetch_source(&client, &rss_descriptor(vec![]), Utc::now()).await;
        assert_eq!(report.listings.len(), 2);
    }
}
