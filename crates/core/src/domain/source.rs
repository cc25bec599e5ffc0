// Source Configuration Domain Model
//
// Loaded once at pipeline start and immutable for the duration of a run.

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Adapter variant selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    Api,
    Rss,
    Scrape,
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterKind::Api => write!(f, "api"),
            AdapterKind::Rss => write!(f, "rss"),
            AdapterKind::Scrape => write!(f, "scrape"),
        }
    }
}

/// Token-bucket parameters: `requests` tokens refill every `interval_ms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_requests")]
    pub requests: u32,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Bucket capacity; defaults to `requests`
    #[serde(default)]
    pub burst: Option<u32>,
    /// Longest wait for a token before the call is skipped for this cycle
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: default_requests(),
            interval_ms: default_interval_ms(),
            burst: None,
            acquire_timeout_ms: default_acquire_timeout_ms(),
        }
    }
}

impl RateLimitConfig {
    pub fn capacity(&self) -> u32 {
        self.burst.unwrap_or(self.requests)
    }
}

fn default_requests() -> u32 {
    1
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_acquire_timeout_ms() -> u64 {
    30_000
}

/// Bounded exponential backoff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_backoff_factor() -> f64 {
    2.0
}

/// CSS selectors for the scrape adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeSelectors {
    pub card: String,
    pub title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub posted_at: Option<String>,
}

/// Adapter-specific connection parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Endpoint (api, scrape) or single feed URL (rss)
    #[serde(default)]
    pub url: Option<String>,
    /// Additional feed URLs (rss); each feed is one page
    #[serde(default)]
    pub feeds: Vec<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Static query parameters sent with every request
    #[serde(default)]
    pub query: BTreeMap<String, String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub max_pages: Option<u32>,
    /// Dotted path to the entry array in a JSON response; root when absent
    #[serde(default)]
    pub items_path: Option<String>,
    /// Leading entries to skip (e.g. a metadata element)
    #[serde(default)]
    pub skip_entries: usize,
    /// Query parameter carrying the page number or offset
    #[serde(default)]
    pub page_param: Option<String>,
    /// Entries per page when `page_param` is an offset
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub keyword_param: Option<String>,
    #[serde(default)]
    pub location_param: Option<String>,
    #[serde(default)]
    pub selectors: Option<ScrapeSelectors>,
}

impl ConnectionParams {
    /// All URLs an rss source reads: `url` first, then `feeds`
    pub fn feed_urls(&self) -> Vec<&str> {
        self.url
            .iter()
            .chain(self.feeds.iter())
            .map(String::as_str)
            .collect()
    }
}

/// Explicit field-mapping table: canonical field -> dotted source path.
///
/// No field guessing happens at normalization time; an unmapped field is
/// simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default)]
    pub salary_min: Option<String>,
    #[serde(default)]
    pub salary_max: Option<String>,
    #[serde(default)]
    pub salary_text: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub posted_at: Option<String>,
    #[serde(default)]
    pub apply_url: Option<String>,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
}

impl FieldMapping {
    /// Mapping matching the record shape each built-in adapter emits
    pub fn defaults_for(kind: AdapterKind) -> Self {
        let path = |p: &str| Some(p.to_string());
        match kind {
            AdapterKind::Api => Self {
                title: path("position"),
                company: path("company"),
                location: path("location"),
                description: path("description"),
                skills: path("tags"),
                salary_min: path("salary_min"),
                salary_max: path("salary_max"),
                posted_at: path("date"),
                apply_url: path("url"),
                ..Default::default()
            },
            AdapterKind::Rss => Self {
                title: path("title"),
                company: path("company"),
                location: path("location"),
                description: path("description"),
                skills: path("categories"),
                salary_text: path("description"),
                posted_at: path("pub_date"),
                apply_url: path("link"),
                ..Default::default()
            },
            AdapterKind::Scrape => Self {
                title: path("title"),
                company: path("company"),
                location: path("location"),
                description: path("description"),
                salary_text: path("description"),
                posted_at: path("posted_at"),
                apply_url: path("link"),
                ..Default::default()
            },
        }
    }

    fn validate(&self, source_name: &str) -> Result<()> {
        let blank = |field: &Option<String>| field.as_deref().map_or(true, |p| p.trim().is_empty());
        if blank(&self.title) {
            return Err(invalid(source_name, "field_map must map 'title'"));
        }
        if blank(&self.company) {
            return Err(invalid(source_name, "field_map must map 'company'"));
        }
        Ok(())
    }
}

/// Per-run query forwarded to the adapter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceQuery {
    /// Trimmed on load; blank entries are dropped
    #[serde(default, deserialize_with = "deserialize_keywords")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Maximum postings taken from this source per cycle
    #[serde(default)]
    pub limit: Option<usize>,
}

fn deserialize_keywords<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect())
}

impl SourceQuery {
    /// Non-blank keywords, trimmed
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty())
    }

    pub fn has_keywords(&self) -> bool {
        self.terms().next().is_some()
    }

    /// True if the text contains any keyword (or no keywords are set)
    pub fn matches_keywords(&self, text: &str) -> bool {
        if !self.has_keywords() {
            return true;
        }
        let lowered = text.to_lowercase();
        self.terms().any(|k| lowered.contains(&k.to_lowercase()))
    }
}

/// Configuration for one job source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub kind: AdapterKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub connection: ConnectionParams,
    /// Explicit mapping; the adapter kind's default table when absent
    #[serde(default)]
    pub field_map: Option<FieldMapping>,
    /// Scan descriptions for known skills
    #[serde(default)]
    pub extract_skills: bool,
    #[serde(default)]
    pub query: SourceQuery,
}

fn default_enabled() -> bool {
    true
}

impl SourceConfig {
    pub fn new(name: impl Into<String>, kind: AdapterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            enabled: true,
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            connection: ConnectionParams::default(),
            field_map: None,
            extract_skills: false,
            query: SourceQuery::default(),
        }
    }

    /// Effective field mapping
    pub fn mapping(&self) -> FieldMapping {
        self.field_map
            .clone()
            .unwrap_or_else(|| FieldMapping::defaults_for(self.kind))
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(invalid(&self.name, "name must not be empty"));
        }
        if self.rate_limit.requests == 0 || self.rate_limit.interval_ms == 0 {
            return Err(invalid(&self.name, "rate limit values must be non-zero"));
        }
        if self.rate_limit.burst == Some(0) {
            return Err(invalid(&self.name, "rate limit burst must be non-zero"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid(&self.name, "retry.max_attempts must be at least 1"));
        }
        if self.retry.backoff_factor.is_nan() || self.retry.backoff_factor < 1.0 {
            return Err(invalid(&self.name, "retry.backoff_factor must be >= 1.0"));
        }
        if self.kind == AdapterKind::Scrape && self.connection.selectors.is_none() {
            return Err(invalid(&self.name, "scrape sources need connection.selectors"));
        }
        if self.connection.feed_urls().is_empty() {
            return Err(invalid(&self.name, "connection.url is required"));
        }
        self.mapping().validate(&self.name)
    }
}

fn invalid(source_name: &str, reason: &str) -> DomainError {
    DomainError::InvalidSourceConfig {
        source_name: source_name.to_string(),
        reason: reason.to_string(),
    }
}
