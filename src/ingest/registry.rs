// src/ingest/registry.rs
//! Source registry: static feed descriptors loaded once at startup.
//!
//! Descriptors come from a TOML file (`FEEDS_CONFIG_PATH`, falling back to
//! `config/feeds.toml`) or, when no file is present, from the built-in seed.
//! They are never mutated at runtime.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_FEEDS_CONFIG_PATH: &str = "FEEDS_CONFIG_PATH";
pub const DEFAULT_FEEDS_CONFIG_PATH: &str = "config/feeds.toml";

/// Wire format of a source. Parser dispatch happens on this tag, fixed at
/// registry construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceFormat {
    Rss,
    RemoteOk,
    Arbeitnow,
    Jobicy,
}

impl SourceFormat {
    pub fn is_api(&self) -> bool {
        !matches!(self, SourceFormat::Rss)
    }

    pub fn accept_header(&self) -> &'static str {
        match self {
            SourceFormat::Rss => "application/rss+xml, application/xml;q=0.9, */*;q=0.8",
            _ => "application/json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceFormat::Rss => "rss",
            SourceFormat::RemoteOk => "remote-ok",
            SourceFormat::Arbeitnow => "arbeitnow",
            SourceFormat::Jobicy => "jobicy",
        }
    }
}

/// Immutable configuration for one feed.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceDescriptor {
    pub name: String,
    pub endpoint: String,
    pub format: SourceFormat,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: u32,
    /// Relevance keywords; empty = accept everything the source returns.
    #[serde(default)]
    pub keywords: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<SourceDescriptor>) -> Self {
        Self { sources }
    }

    /// Load using env var + fallbacks:
    /// 1) $FEEDS_CONFIG_PATH
    /// 2) config/feeds.toml
    /// 3) built-in seed
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_FEEDS_CONFIG_PATH) {
            return Self::load_from(&PathBuf::from(p));
        }
        let default = PathBuf::from(DEFAULT_FEEDS_CONFIG_PATH);
        if default.exists() {
            return Self::load_from(&default);
        }
        Ok(Self::seed())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feeds config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(s).context("parsing feeds config toml")?;
        Ok(Self::new(file.sources))
    }

    /// Built-in registry used when no config file is found.
    pub fn seed() -> Self {
        Self::new(vec![
            SourceDescriptor {
                name: "We Work Remotely".into(),
                endpoint: "https://weworkremotely.com/categories/remote-programming-jobs.rss"
                    .into(),
                format: SourceFormat::Rss,
                enabled: true,
                priority: 1,
                keywords: vec![
                    "engineer".into(),
                    "developer".into(),
                    "software".into(),
                    "backend".into(),
                    "frontend".into(),
                    "devops".into(),
                ],
            },
            SourceDescriptor {
                name: "RemoteOK".into(),
                endpoint: "https://remoteok.com/api".into(),
                format: SourceFormat::RemoteOk,
                enabled: true,
                priority: 2,
                keywords: Vec::new(),
            },
            SourceDescriptor {
                name: "Arbeitnow".into(),
                endpoint: "https://www.arbeitnow.com/api/job-board-api".into(),
                format: SourceFormat::Arbeitnow,
                enabled: true,
                priority: 3,
                keywords: vec!["engineer".into(), "developer".into(), "software".into()],
            },
            SourceDescriptor {
                name: "Jobicy".into(),
                endpoint: "https://jobicy.com/api/v2/remote-jobs?count=50&tag=dev".into(),
                format: SourceFormat::Jobicy,
                enabled: true,
                priority: 4,
                keywords: Vec::new(),
            },
        ])
    }

    pub fn all(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Enabled descriptors, sorted by priority ascending. This is the fetch
    /// and merge order, so ties in the final sort stay deterministic.
    pub fn enabled(&self) -> Vec<&SourceDescriptor> {
        let mut out: Vec<&SourceDescriptor> =
            self.sources.iter().filter(|s| s.enabled).collect();
        out.sort_by_key(|s| s.priority);
        out
    }

    pub fn find(&self, name: &str) -> Option<&SourceDescriptor> {
        self.sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_registry_is_priority_ordered_and_enabled() {
        let reg = SourceRegistry::seed();
        let enabled = reg.enabled();
        assert!(!enabled.is_empty());
        let priorities: Vec<u32> = enabled.iter().map(|s| s.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn toml_roundtrip_with_defaults() {
        let toml = r#"
[[sources]]
name = "Board A"
endpoint = "https://a.example/feed.rss"
format = "rss"
priority = 7

[[sources]]
name = "Board B"
endpoint = "https://b.example/api"
format = "remote-ok"
enabled = false
keywords = ["rust"]
"#;
        let reg = SourceRegistry::from_toml_str(toml).expect("parse registry toml");
        assert_eq!(reg.all().len(), 2);

        let a = reg.find("board a").expect("case-insensitive find");
        assert!(a.enabled, "enabled defaults to true");
        assert_eq!(a.priority, 7);
        assert!(a.keywords.is_empty());
        assert_eq!(a.format, SourceFormat::Rss);
        assert!(!a.format.is_api());

        let b = reg.find("Board B").unwrap();
        assert!(!b.enabled);
        assert_eq!(b.priority, 0);
        assert!(b.format.is_api());

        // disabled sources never reach the fetch plan
        assert_eq!(reg.enabled().len(), 1);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(SourceRegistry::from_toml_str("sources = 3").is_err());
    }
}
