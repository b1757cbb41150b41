//! Site registry
//!
//! The registry is the ordered set of [`ScraperDescriptor`]s a run works
//! through. Order is priority ascending, ties broken by declaration order, and
//! never changes after construction.

use std::collections::HashSet;

use crate::config::SiteEntry;
use crate::error::{Error, Result};
use crate::models::{ScraperCategory, ScraperDescriptor};

/// Ordered, immutable collection of site descriptors
#[derive(Debug, Clone, PartialEq)]
pub struct Registry {
    descriptors: Vec<ScraperDescriptor>,
}

impl Registry {
    /// Build a registry from descriptors in declaration order
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` on empty or duplicate site names
    pub fn new(mut descriptors: Vec<ScraperDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for descriptor in &descriptors {
            if descriptor.name.trim().is_empty() {
                return Err(Error::config("site name must not be empty"));
            }
            if !seen.insert(descriptor.name.clone()) {
                return Err(Error::config(format!(
                    "duplicate site name: {}",
                    descriptor.name
                )));
            }
        }

        // sort_by_key is stable: equal priorities keep declaration order
        descriptors.sort_by_key(|d| d.priority);

        Ok(Self { descriptors })
    }

    /// The built-in site table
    pub fn builtin() -> Self {
        let descriptors = vec![
            ScraperDescriptor::new("kenney", "kenney", 1),
            ScraperDescriptor::new("opengameart", "opengameart", 2),
            ScraperDescriptor::new("craftpix", "craftpix", 3)
                .with_category(ScraperCategory::Analytical),
            ScraperDescriptor::new("gameicons", "gameicons", 4),
        ];

        Self { descriptors }
    }

    /// Build from `[[sites]]` config entries, or the built-in table when empty
    pub fn from_entries(entries: &[SiteEntry]) -> Result<Self> {
        if entries.is_empty() {
            return Ok(Self::builtin());
        }

        Self::new(entries.iter().map(ScraperDescriptor::from).collect())
    }

    /// Descriptors in run order
    pub fn list_descriptors(&self) -> &[ScraperDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, name: &str) -> Option<&ScraperDescriptor> {
        self.descriptors.iter().find(|d| d.name == name)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Restrict the registry to the named sites, keeping registry order
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a name is not in the registry
    pub fn retain_only(&self, names: &[String]) -> Result<Self> {
        if names.is_empty() {
            return Ok(self.clone());
        }

        if let Some(unknown) = names.iter().find(|n| self.get(n).is_none()) {
            return Err(Error::config(format!(
                "unknown site '{unknown}'. Known: {}",
                self.descriptors
                    .iter()
                    .map(|d| d.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let descriptors = self
            .descriptors
            .iter()
            .filter(|d| names.contains(&d.name))
            .cloned()
            .collect();

        Ok(Self { descriptors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DescriptorStatus;

    fn names(registry: &Registry) -> Vec<&str> {
        registry
            .list_descriptors()
            .iter()
            .map(|d| d.name.as_str())
            .collect()
    }

    #[test]
    fn test_builtin_order() {
        let registry = Registry::builtin();
        assert_eq!(
            names(&registry),
            vec!["kenney", "opengameart", "craftpix", "gameicons"]
        );
        assert_eq!(
            registry.get("craftpix").unwrap().category,
            ScraperCategory::Analytical
        );
        assert!(registry
            .list_descriptors()
            .iter()
            .all(|d| d.collection_limit.is_none()));
    }

    #[test]
    fn test_priority_then_declaration_order() {
        let registry = Registry::new(vec![
            ScraperDescriptor::new("c", "x", 2),
            ScraperDescriptor::new("a", "x", 1),
            ScraperDescriptor::new("d", "x", 2),
            ScraperDescriptor::new("b", "x", 1),
        ])
        .unwrap();

        assert_eq!(names(&registry), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_order_stable_across_calls() {
        let registry = Registry::builtin();
        let first: Vec<_> = registry.list_descriptors().to_vec();
        for _ in 0..10 {
            assert_eq!(registry.list_descriptors(), first.as_slice());
        }
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Registry::new(vec![
            ScraperDescriptor::new("a", "x", 1),
            ScraperDescriptor::new("a", "y", 2),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_entries() {
        let entries = vec![
            SiteEntry {
                name: "second".into(),
                scraper: Some("kenney".into()),
                limit: Some(10),
                priority: 5,
                category: ScraperCategory::Standard,
                enabled: true,
            },
            SiteEntry {
                name: "first".into(),
                scraper: None,
                limit: None,
                priority: 1,
                category: ScraperCategory::Analytical,
                enabled: false,
            },
        ];

        let registry = Registry::from_entries(&entries).unwrap();
        assert_eq!(names(&registry), vec!["first", "second"]);
        assert_eq!(
            registry.get("first").unwrap().status,
            DescriptorStatus::Failed
        );
        assert_eq!(registry.get("second").unwrap().scraper, "kenney");

        assert_eq!(Registry::from_entries(&[]).unwrap(), Registry::builtin());
    }

    #[test]
    fn test_retain_only() {
        let registry = Registry::builtin();
        let only = registry
            .retain_only(&["gameicons".to_string(), "kenney".to_string()])
            .unwrap();
        assert_eq!(names(&only), vec!["kenney", "gameicons"]);

        assert!(registry.retain_only(&["nope".to_string()]).is_err());
        assert_eq!(registry.retain_only(&[]).unwrap(), registry);
    }
}
