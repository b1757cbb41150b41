//! Built-in listing definitions and the default scraper factory

use std::collections::HashMap;

use crate::config::{Config, FetcherConfig};
use crate::models::ScraperDescriptor;
use crate::scraper::fetcher::Politeness;
use crate::scraper::listing::{ListingScraper, ListingSpec};
use crate::scraper::{Scraper, ScraperFactory};
use crate::utils::error::InitError;

/// Listing definitions for the sites of the built-in registry
pub fn builtin_listings() -> Vec<ListingSpec> {
    vec![
        ListingSpec::new("kenney", &["https://kenney.nl/assets?page={page}"])
            .max_pages(10)
            .href_pattern(r"^/assets/[a-z0-9-]+/?$")
            .license("CC0 1.0 Universal")
            .politeness(Politeness::new(30, 1_000, 3_000)),
        ListingSpec::new(
            "opengameart",
            &[
                "https://opengameart.org/art-search-advanced?field_art_type_tid%5B%5D=9&page={page}",
                "https://opengameart.org/art-search-advanced?field_art_type_tid%5B%5D=10&page={page}",
                "https://opengameart.org/art-search-advanced?field_art_type_tid%5B%5D=12&page={page}",
            ],
        )
        .first_page(0)
        .max_pages(2)
        .link_selector("div.views-row a[href], div.art-preview a[href]")
        .href_pattern(r"^/content/[^/]+$")
        .license("Various Open Licenses")
        .politeness(Politeness::new(8, 3_000, 7_000)),
        ListingSpec::new(
            "craftpix",
            &[
                "https://craftpix.net/category/freebies/page/{page}/",
                "https://craftpix.net/category/free-game-assets/page/{page}/",
                "https://craftpix.net/category/free-2d-game-assets/page/{page}/",
            ],
        )
        .max_pages(3)
        .link_selector("div.product-item a[href], div.item-product a[href]")
        .href_pattern(r"^/(freebies|product)/[^/]+/?$")
        .license("Free for commercial use"),
        ListingSpec::new(
            "gameicons",
            &[
                "https://game-icons.net/tags/game.html",
                "https://game-icons.net/tags/weapon.html",
                "https://game-icons.net/tags/armor.html",
                "https://game-icons.net/tags/magic.html",
                "https://game-icons.net/tags/creature.html",
                "https://game-icons.net/tags/item.html",
            ],
        )
        .link_selector("div.icon a[href]")
        .href_pattern(r"\.html$")
        .license("CC BY 3.0")
        .politeness(Politeness::new(8, 2_000, 6_000)),
    ]
}

/// Factory backed by a table of listing definitions
#[derive(Debug, Clone)]
pub struct CatalogFactory {
    fetcher: FetcherConfig,
    listings: HashMap<String, ListingSpec>,
}

impl CatalogFactory {
    /// Built-in listings, with config-supplied listings added or replacing them
    pub fn from_config(config: &Config) -> Self {
        let mut factory = Self::with_listings(config.fetcher.clone(), builtin_listings());
        for spec in &config.listings {
            factory.insert(spec.clone());
        }
        factory
    }

    pub fn with_listings(fetcher: FetcherConfig, listings: Vec<ListingSpec>) -> Self {
        let listings = listings
            .into_iter()
            .map(|spec| (spec.scraper.clone(), spec))
            .collect();

        Self { fetcher, listings }
    }

    /// Register a listing, replacing any definition with the same identity
    pub fn insert(&mut self, spec: ListingSpec) {
        self.listings.insert(spec.scraper.clone(), spec);
    }

    pub fn listing(&self, scraper: &str) -> Option<&ListingSpec> {
        self.listings.get(scraper)
    }
}

impl ScraperFactory for CatalogFactory {
    fn build(&self, descriptor: &ScraperDescriptor) -> Result<Box<dyn Scraper>, InitError> {
        if !descriptor.is_ready() {
            return Err(InitError::Disabled(descriptor.name.clone()));
        }

        let spec = self
            .listings
            .get(&descriptor.scraper)
            .cloned()
            .ok_or_else(|| InitError::UnknownScraper(descriptor.scraper.clone()))?;

        let scraper = ListingScraper::new(&descriptor.name, spec, &self.fetcher)?;
        Ok(Box::new(scraper))
    }
}
