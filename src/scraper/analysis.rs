//! Keyword classification and relevance ranking of collected assets
//!
//! Analytical scrapers run this pass after collection: each asset gets a
//! category from its title and a relevance score, then the list is ordered
//! by relevance (stable for equal scores).

use crate::models::{Asset, AssetCategory};

/// Keyword table, checked in order; the first match wins
const CATEGORY_KEYWORDS: &[(AssetCategory, &[&str])] = &[
    (AssetCategory::Ui, &["ui", "interface", "button", "menu", "hud", "icon"]),
    (
        AssetCategory::Character,
        &["character", "player", "hero", "sprite", "enemy", "monster"],
    ),
    (AssetCategory::Tileset, &["tile", "tileset", "platform", "platformer"]),
    (
        AssetCategory::Environment,
        &["background", "environment", "landscape", "forest", "dungeon"],
    ),
    (AssetCategory::Weapon, &["weapon", "sword", "gun", "armor", "shield"]),
    (AssetCategory::Vehicle, &["vehicle", "car", "ship", "plane", "tank"]),
];

/// Title words that usually mark a bundle of many assets
const BUNDLE_KEYWORDS: &[&str] = &["pack", "bundle", "set", "collection", "kit"];

fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Whole-word match, also accepting the `-s`/`-es` plural
fn is_keyword(word: &str, keyword: &str) -> bool {
    match word.strip_prefix(keyword) {
        Some(rest) => matches!(rest, "" | "s" | "es"),
        None => false,
    }
}

/// Classify an asset from its title and optional description
pub fn classify(title: &str, description: &str) -> AssetCategory {
    let text = format!("{title} {description}").to_lowercase();
    let tokens: Vec<&str> = words(&text).collect();

    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| {
            tokens
                .iter()
                .any(|word| keywords.iter().any(|k| is_keyword(word, k)))
        })
        .map(|(category, _)| *category)
        .unwrap_or(AssetCategory::Other)
}

/// Relevance score of a single asset
pub fn relevance(asset: &Asset) -> f64 {
    let title = asset.title.to_lowercase();
    let mut score = 1.0;

    if asset.category != AssetCategory::Other {
        score += 2.0;
    }

    score += BUNDLE_KEYWORDS
        .iter()
        .filter(|k| words(&title).any(|w| is_keyword(w, k)))
        .count() as f64
        * 1.5;

    if asset.is_free {
        score += 1.0;
    }

    if asset.license_info.is_some() {
        score += 0.5;
    }

    score
}

/// Classify uncategorized assets, score every asset and sort by relevance
pub fn rank(assets: &mut [Asset]) {
    for asset in assets.iter_mut() {
        if asset.category == AssetCategory::Other {
            asset.category = classify(&asset.title, "");
        }
        asset.relevance = Some(relevance(asset));
    }

    assets.sort_by(|a, b| {
        b.relevance
            .unwrap_or_default()
            .total_cmp(&a.relevance.unwrap_or_default())
    });
}
