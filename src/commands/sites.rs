//! `haul sites`: print the registry

use anyhow::Result;

use haul::config::Config;
use haul::registry::Registry;
use haul::scraper::CatalogFactory;

pub fn sites(config: &Config) -> Result<()> {
    let registry = Registry::from_entries(&config.sites)?;
    let factory = CatalogFactory::from_config(config);

    println!("Configured Sites");
    println!("================");
    println!(
        "{:<4} {:<16} {:<16} {:<11} {:<8} {:<8} {}",
        "#", "NAME", "SCRAPER", "CATEGORY", "LIMIT", "STATUS", "LISTING PAGES"
    );

    for (i, descriptor) in registry.list_descriptors().iter().enumerate() {
        let limit = descriptor
            .collection_limit
            .map_or_else(|| String::from("none"), |n| n.to_string());
        let pages = factory
            .listing(&descriptor.scraper)
            .map_or_else(|| String::from("-"), |spec| spec.page_urls.len().to_string());

        println!(
            "{:<4} {:<16} {:<16} {:<11} {:<8} {:<8} {}",
            i + 1,
            descriptor.name,
            descriptor.scraper,
            descriptor.category.as_str(),
            limit,
            descriptor.status.as_str(),
            pages
        );
    }

    Ok(())
}
