// Core data structures for the haul harvester

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Upper bound handed to a collection operation; `None` means "everything available"
pub type CollectionLimit = Option<usize>;

/// How the runner invokes a scraper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScraperCategory {
    /// Plain `scrape(limit)`
    #[default]
    Standard,
    /// `analyze_and_scrape(limit)`: collect, then classify and rank
    Analytical,
}

impl ScraperCategory {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Analytical => "analytical",
        }
    }

    /// Create from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" | "working" => Some(Self::Standard),
            "analytical" | "ultra_intelligent" => Some(Self::Analytical),
            _ => None,
        }
    }
}

impl fmt::Display for ScraperCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry-declared readiness of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorStatus {
    #[default]
    Ready,
    Failed,
}

impl DescriptorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

/// Static configuration entry identifying one scrape target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperDescriptor {
    /// Site name, unique within a registry
    pub name: String,

    /// Scraper identity resolved by a [`ScraperFactory`](crate::scraper::ScraperFactory)
    pub scraper: String,

    /// Collection ceiling (`None` = unbounded)
    pub collection_limit: CollectionLimit,

    /// Lower runs first
    pub priority: i32,

    pub status: DescriptorStatus,

    pub category: ScraperCategory,
}

impl ScraperDescriptor {
    /// Create a ready, standard, unbounded descriptor
    pub fn new(name: impl Into<String>, scraper: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            scraper: scraper.into(),
            collection_limit: None,
            priority,
            status: DescriptorStatus::Ready,
            category: ScraperCategory::Standard,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: CollectionLimit) -> Self {
        self.collection_limit = limit;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: ScraperCategory) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: DescriptorStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_ready(&self) -> bool {
        self.status == DescriptorStatus::Ready
    }
}

/// Coarse subject classification of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Ui,
    Character,
    Tileset,
    Environment,
    Weapon,
    Vehicle,
    #[default]
    Other,
}

impl AssetCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ui => "ui",
            Self::Character => "character",
            Self::Tileset => "tileset",
            Self::Environment => "environment",
            Self::Weapon => "weapon",
            Self::Vehicle => "vehicle",
            Self::Other => "other",
        }
    }
}

/// A collected asset record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub title: String,
    pub url: String,
    pub source_site: String,
    pub category: AssetCategory,
    pub asset_type: String,
    pub is_free: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_info: Option<String>,
    pub scraped_at: DateTime<Utc>,
    /// Ranking score set by the analytical pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f64>,
}

impl Asset {
    /// Create an asset stamped with the current time
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source_site: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            source_site: source_site.into(),
            category: AssetCategory::Other,
            asset_type: String::from("2d"),
            is_free: true,
            license_info: None,
            scraped_at: Utc::now(),
            relevance: None,
        }
    }
}

/// Outcome of one site's collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
    Success,
    Error,
}

impl SiteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

/// Items per minute, 0 when no time elapsed
pub fn items_per_minute(item_count: usize, duration_seconds: f64) -> f64 {
    if duration_seconds > 0.0 {
        item_count as f64 / (duration_seconds / 60.0)
    } else {
        0.0
    }
}

/// Result record for one site run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteResult {
    pub site_name: String,
    pub status: SiteStatus,
    pub item_count: usize,
    pub duration_seconds: f64,
    pub items_per_minute: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<Asset>,
}

impl SiteResult {
    /// Build a successful result; the count is always taken from `items`
    pub fn success(
        site_name: impl Into<String>,
        items: Vec<Asset>,
        elapsed: Duration,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let duration_seconds = elapsed.as_secs_f64();
        let item_count = items.len();

        Self {
            site_name: site_name.into(),
            status: SiteStatus::Success,
            item_count,
            duration_seconds,
            items_per_minute: items_per_minute(item_count, duration_seconds),
            error_message: None,
            timestamp,
            items,
        }
    }

    /// Build an error result with zero items
    pub fn failure(
        site_name: impl Into<String>,
        error: impl fmt::Display,
        elapsed: Duration,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut message = error.to_string();
        if message.trim().is_empty() {
            message = String::from("unknown error");
        }

        Self {
            site_name: site_name.into(),
            status: SiteStatus::Error,
            item_count: 0,
            duration_seconds: elapsed.as_secs_f64(),
            items_per_minute: 0.0,
            error_message: Some(message),
            timestamp,
            items: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SiteStatus::Success
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_seconds / 60.0
    }
}

/// Insertion-ordered mapping from site name to [`SiteResult`]
///
/// Serialized as a JSON object whose key order is the insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResults {
    entries: Vec<SiteResult>,
}

impl RunResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a result, replacing any previous entry for the same site in place
    pub fn insert(&mut self, result: SiteResult) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.site_name == result.site_name)
        {
            Some(existing) => *existing = result,
            None => self.entries.push(result),
        }
    }

    pub fn get(&self, site_name: &str) -> Option<&SiteResult> {
        self.entries.iter().find(|r| r.site_name == site_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Results in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, SiteResult> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|r| r.site_name.as_str()).collect()
    }

    pub fn total_items(&self) -> usize {
        self.entries.iter().map(|r| r.item_count).sum()
    }

    pub fn successful_count(&self) -> usize {
        self.entries.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries.len() - self.successful_count()
    }
}

impl<'a> IntoIterator for &'a RunResults {
    type Item = &'a SiteResult;
    type IntoIter = std::slice::Iter<'a, SiteResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for RunResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for result in &self.entries {
            map.serialize_entry(&result.site_name, result)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RunResults {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultsVisitor;

        impl<'de> Visitor<'de> for ResultsVisitor {
            type Value = RunResults;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of site name to site result")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut results = RunResults::new();
                while let Some((name, mut result)) = access.next_entry::<String, SiteResult>()? {
                    result.site_name = name;
                    results.insert(result);
                }
                Ok(results)
            }
        }

        deserializer.deserialize_map(ResultsVisitor)
    }
}

/// Aggregate statistics of a run, computed once at the end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total_items: usize,
    pub successful_site_count: usize,
    pub total_site_count: usize,
    pub total_duration_minutes: f64,
    pub average_rate_per_minute: f64,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
    #[serde(default)]
    pub interrupted: bool,
}
