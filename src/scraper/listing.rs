//! Data-driven listing page scraper with pagination support
//!
//! A [`ListingSpec`] describes where a site lists its assets: one or more page
//! URL templates (with an optional `{page}` placeholder), a CSS selector for
//! the asset links and an optional pattern the link path must match. The
//! [`ListingScraper`] walks those pages and turns each matching link into an
//! [`Asset`].

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

use crate::config::FetcherConfig;
use crate::models::{Asset, CollectionLimit};
use crate::scraper::analysis;
use crate::scraper::fetcher::{AssetFetcher, Politeness};
use crate::scraper::Scraper;
use crate::utils::error::{CollectionError, InitError};
use crate::utils::{normalize_whitespace, title_from_url};

const PAGE_PLACEHOLDER: &str = "{page}";

/// Where and how a site lists its assets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSpec {
    /// Scraper identity this definition is registered under
    pub scraper: String,

    /// Listing URL templates, visited in order
    pub page_urls: Vec<String>,

    /// Value substituted for `{page}` on the first page
    #[serde(default = "default_first_page")]
    pub first_page: u32,

    /// Pages visited per template (0 = until the listing runs dry)
    #[serde(default)]
    pub max_pages: u32,

    /// CSS selector matching asset links
    #[serde(default = "default_link_selector")]
    pub link_selector: String,

    /// Regex the resolved link path must match
    #[serde(default)]
    pub href_pattern: Option<String>,

    #[serde(default = "default_asset_type")]
    pub asset_type: String,

    #[serde(default)]
    pub license: Option<String>,

    #[serde(default = "default_is_free")]
    pub is_free: bool,

    #[serde(default)]
    pub politeness: Politeness,
}

fn default_first_page() -> u32 {
    1
}

fn default_link_selector() -> String {
    String::from("a[href]")
}

fn default_asset_type() -> String {
    String::from("2d")
}

fn default_is_free() -> bool {
    true
}

impl ListingSpec {
    /// Create a spec with defaults for everything but the identity and URLs
    pub fn new(scraper: impl Into<String>, page_urls: &[&str]) -> Self {
        Self {
            scraper: scraper.into(),
            page_urls: page_urls.iter().map(|u| u.to_string()).collect(),
            first_page: default_first_page(),
            max_pages: 0,
            link_selector: default_link_selector(),
            href_pattern: None,
            asset_type: default_asset_type(),
            license: None,
            is_free: default_is_free(),
            politeness: Politeness::default(),
        }
    }

    #[must_use]
    pub fn first_page(mut self, page: u32) -> Self {
        self.first_page = page;
        self
    }

    #[must_use]
    pub fn max_pages(mut self, pages: u32) -> Self {
        self.max_pages = pages;
        self
    }

    #[must_use]
    pub fn link_selector(mut self, selector: &str) -> Self {
        self.link_selector = selector.to_string();
        self
    }

    #[must_use]
    pub fn href_pattern(mut self, pattern: &str) -> Self {
        self.href_pattern = Some(pattern.to_string());
        self
    }

    #[must_use]
    pub fn license(mut self, license: &str) -> Self {
        self.license = Some(license.to_string());
        self
    }

    #[must_use]
    pub fn politeness(mut self, politeness: Politeness) -> Self {
        self.politeness = politeness;
        self
    }

    /// Page numbers to visit for one template
    fn pages(&self, template: &str) -> Box<dyn Iterator<Item = u32> + Send> {
        if !template.contains(PAGE_PLACEHOLDER) {
            return Box::new(std::iter::once(self.first_page));
        }

        match self.max_pages {
            0 => Box::new(self.first_page..),
            n => Box::new(self.first_page..self.first_page.saturating_add(n)),
        }
    }
}

/// Scraper that walks the paginated listings described by a [`ListingSpec`]
pub struct ListingScraper {
    site: String,
    spec: ListingSpec,
    fetcher: AssetFetcher,
    selector: ::scraper::Selector,
    href_pattern: Option<Regex>,
}

impl std::fmt::Debug for ListingScraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingScraper")
            .field("site", &self.site)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl ListingScraper {
    /// Validate the spec and build the scraper
    ///
    /// # Errors
    ///
    /// Returns `InitError::InvalidListing` for an empty URL list, a URL that
    /// does not parse, a bad selector or a bad pattern, and `InitError::Client`
    /// if the HTTP client cannot be built
    pub fn new(
        site: impl Into<String>,
        spec: ListingSpec,
        settings: &FetcherConfig,
    ) -> Result<Self, InitError> {
        let invalid = |reason: String| InitError::InvalidListing {
            scraper: spec.scraper.clone(),
            reason,
        };

        if spec.page_urls.is_empty() {
            return Err(invalid("no page URLs".to_string()));
        }

        for template in &spec.page_urls {
            let sample = template.replace(PAGE_PLACEHOLDER, &spec.first_page.to_string());
            Url::parse(&sample).map_err(|e| invalid(format!("bad page URL '{template}': {e}")))?;
        }

        let selector = ::scraper::Selector::parse(&spec.link_selector)
            .map_err(|e| invalid(format!("bad selector '{}': {e}", spec.link_selector)))?;

        let href_pattern = spec
            .href_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| invalid(format!("bad href pattern: {e}")))?;

        let fetcher = AssetFetcher::new(spec.politeness, settings)?;

        Ok(Self {
            site: site.into(),
            spec,
            fetcher,
            selector,
            href_pattern,
        })
    }

    /// Extract assets from one listing page
    ///
    /// Links are resolved against `page_url`; non-HTTP links and links whose
    /// path does not match the pattern are skipped.
    pub fn extract_assets(&self, html: &str, page_url: &str) -> Vec<Asset> {
        let Ok(base) = Url::parse(page_url) else {
            return Vec::new();
        };
        let document = ::scraper::Html::parse_document(html);

        document
            .select(&self.selector)
            .filter_map(|element| {
                let href = element.value().attr("href")?;
                let resolved = base.join(href).ok()?;

                if !matches!(resolved.scheme(), "http" | "https") {
                    return None;
                }
                if let Some(pattern) = &self.href_pattern {
                    if !pattern.is_match(resolved.path()) {
                        return None;
                    }
                }

                let url = resolved.to_string();
                let text = normalize_whitespace(&element.text().collect::<String>());
                let title = if !text.is_empty() {
                    text
                } else if let Some(attr) = element.value().attr("title") {
                    normalize_whitespace(attr)
                } else {
                    title_from_url(&url)
                };

                Some(Asset {
                    category: analysis::classify(&title, ""),
                    asset_type: self.spec.asset_type.clone(),
                    is_free: self.spec.is_free,
                    license_info: self.spec.license.clone(),
                    scraped_at: Utc::now(),
                    relevance: None,
                    title,
                    url,
                    source_site: self.site.clone(),
                })
            })
            .collect()
    }

    /// Walk every template until the listing runs dry or the limit is reached
    async fn collect(&self, limit: CollectionLimit) -> Result<Vec<Asset>, CollectionError> {
        let reached = |count: usize| limit.is_some_and(|max| count >= max);

        let mut assets = Vec::new();
        let mut seen = HashSet::new();

        'templates: for template in &self.spec.page_urls {
            for (offset, page) in self.spec.pages(template).enumerate() {
                if reached(assets.len()) {
                    break 'templates;
                }

                let url = template.replace(PAGE_PLACEHOLDER, &page.to_string());

                // Past the first page of a template a failure only ends that template
                let html = match self.fetcher.fetch_text(&url).await {
                    Ok(html) => html,
                    Err(e) if offset == 0 => return Err(e.into()),
                    Err(e) if e.is_not_found() => {
                        tracing::debug!(site = %self.site, url = %url, "Listing ended with 404");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(
                            site = %self.site,
                            url = %url,
                            error = %e,
                            kept = assets.len(),
                            "Listing page failed, moving on"
                        );
                        break;
                    }
                };

                let found = self.extract_assets(&html, &url);
                let before = assets.len();

                for asset in found {
                    if reached(assets.len()) {
                        break;
                    }
                    if seen.insert(asset.url.clone()) {
                        assets.push(asset);
                    }
                }

                let new_assets = assets.len() - before;
                tracing::debug!(
                    site = %self.site,
                    page,
                    new_assets,
                    total = assets.len(),
                    "Processed listing page"
                );

                if new_assets == 0 {
                    break;
                }
            }
        }

        tracing::info!(site = %self.site, total = assets.len(), "Completed listing walk");

        Ok(assets)
    }
}

#[async_trait]
impl Scraper for ListingScraper {
    fn site(&self) -> &str {
        &self.site
    }

    async fn scrape(&self, limit: CollectionLimit) -> Result<Vec<Asset>, CollectionError> {
        self.collect(limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scraper(spec: ListingSpec) -> ListingScraper {
        ListingScraper::new("test", spec, &FetcherConfig::default()).unwrap()
    }

    #[test]
    fn test_pages_iteration() {
        let spec = ListingSpec::new("x", &["https://a.test/?page={page}"]).max_pages(3);
        let pages: Vec<u32> = spec.pages("https://a.test/?page={page}").collect();
        assert_eq!(pages, vec![1, 2, 3]);

        let single: Vec<u32> = spec.pages("https://a.test/static.html").collect();
        assert_eq!(single, vec![1]);

        let unbounded = ListingSpec::new("x", &[]).first_page(0);
        let first: Vec<u32> = unbounded.pages("{page}").take(4).collect();
        assert_eq!(first, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_invalid_specs_rejected() {
        let settings = FetcherConfig::default();

        let empty = ListingSpec::new("x", &[]);
        assert!(matches!(
            ListingScraper::new("s", empty, &settings),
            Err(InitError::InvalidListing { .. })
        ));

        let bad_url = ListingSpec::new("x", &["not a url {page}"]);
        assert!(ListingScraper::new("s", bad_url, &settings).is_err());

        let bad_selector = ListingSpec::new("x", &["https://a.test/"]).link_selector("a[[");
        assert!(ListingScraper::new("s", bad_selector, &settings).is_err());

        let bad_pattern = ListingSpec::new("x", &["https://a.test/"]).href_pattern("(");
        assert!(ListingScraper::new("s", bad_pattern, &settings).is_err());
    }

    #[test]
    fn test_extract_assets() {
        let spec = ListingSpec::new("x", &["https://kenney.test/assets?page={page}"])
            .href_pattern(r"^/assets/[a-z0-9-]+/?$")
            .license("CC0 1.0 Universal");
        let scraper = scraper(spec);

        let html = r#"
            <html><body>
              <a href="/assets/pixel-platformer">Pixel   Platformer</a>
              <a href="/assets/ui-pack" title="UI Pack"></a>
              <a href="/assets/category:2D">2D</a>
              <a href="/about">About</a>
              <a href="mailto:someone@kenney.test">Mail</a>
              <a href="https://kenney.test/assets/tiny-ships/"></a>
            </body></html>
        "#;

        let assets = scraper.extract_assets(html, "https://kenney.test/assets?page=1");
        let titles: Vec<_> = assets.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Pixel Platformer", "UI Pack", "Tiny Ships"]);

        assert_eq!(assets[0].url, "https://kenney.test/assets/pixel-platformer");
        assert_eq!(assets[0].source_site, "test");
        assert_eq!(assets[0].license_info.as_deref(), Some("CC0 1.0 Universal"));
        assert_eq!(assets[1].category, crate::models::AssetCategory::Ui);
        assert_eq!(assets[2].category, crate::models::AssetCategory::Vehicle);
    }
}
