//! Scraper capability and the built-in scraper implementations
//!
//! A scraper is anything that can produce a finite list of [`Asset`]s for one
//! site. The runner only ever talks to the [`Scraper`] trait; which concrete
//! implementation backs a registry entry is decided by a [`ScraperFactory`].

pub mod analysis;
pub mod catalog;
pub mod fetcher;
pub mod listing;

use async_trait::async_trait;

use crate::models::{Asset, CollectionLimit, ScraperDescriptor};
use crate::utils::error::{CollectionError, InitError};

pub use catalog::CatalogFactory;
pub use listing::{ListingScraper, ListingSpec};

/// Collection capability of one site
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Site label stamped on collected assets
    fn site(&self) -> &str;

    /// Collect up to `limit` assets (`None` = everything available)
    async fn scrape(&self, limit: CollectionLimit) -> Result<Vec<Asset>, CollectionError>;

    /// Collect, then classify and rank the assets by relevance
    async fn analyze_and_scrape(
        &self,
        limit: CollectionLimit,
    ) -> Result<Vec<Asset>, CollectionError> {
        let mut assets = self.scrape(limit).await?;
        analysis::rank(&mut assets);
        Ok(assets)
    }
}

/// Resolves a descriptor's scraper identity to a live instance
pub trait ScraperFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns an [`InitError`] when the identity is unknown or construction fails
    fn build(&self, descriptor: &ScraperDescriptor) -> Result<Box<dyn Scraper>, InitError>;
}
