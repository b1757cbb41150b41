//! Scraper initialization
//!
//! Turns every registry descriptor into a [`ScraperHandle`]. A descriptor that
//! cannot be constructed yields a handle carrying the error text instead of an
//! instance; initialization never aborts the run.

use crate::harvest::events::{HarvestEvent, ProgressSink};
use crate::models::ScraperDescriptor;
use crate::registry::Registry;
use crate::scraper::{Scraper, ScraperFactory};

/// A descriptor paired with its live scraper, or with the reason it has none
pub struct ScraperHandle {
    pub descriptor: ScraperDescriptor,
    pub instance: Option<Box<dyn Scraper>>,
    pub initialization_error: Option<String>,
}

impl std::fmt::Debug for ScraperHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScraperHandle")
            .field("descriptor", &self.descriptor)
            .field("ready", &self.is_ready())
            .field("initialization_error", &self.initialization_error)
            .finish()
    }
}

impl ScraperHandle {
    pub fn ready(descriptor: ScraperDescriptor, instance: Box<dyn Scraper>) -> Self {
        Self {
            descriptor,
            instance: Some(instance),
            initialization_error: None,
        }
    }

    pub fn failed(descriptor: ScraperDescriptor, error: impl Into<String>) -> Self {
        Self {
            descriptor,
            instance: None,
            initialization_error: Some(error.into()),
        }
    }

    /// Ready iff an instance exists
    pub fn is_ready(&self) -> bool {
        self.instance.is_some()
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }
}

/// Resolves descriptors to scraper instances through a [`ScraperFactory`]
pub struct Initializer<'a> {
    factory: &'a dyn ScraperFactory,
    sink: &'a dyn ProgressSink,
}

impl<'a> Initializer<'a> {
    pub fn new(factory: &'a dyn ScraperFactory, sink: &'a dyn ProgressSink) -> Self {
        Self { factory, sink }
    }

    /// Construct the scraper for one descriptor
    pub fn initialize(&self, descriptor: &ScraperDescriptor) -> ScraperHandle {
        match self.factory.build(descriptor) {
            Ok(instance) => {
                self.sink.notify(&HarvestEvent::ScraperReady {
                    site: &descriptor.name,
                    category: descriptor.category,
                });
                ScraperHandle::ready(descriptor.clone(), instance)
            }
            Err(e) => {
                let error = e.to_string();
                self.sink.notify(&HarvestEvent::ScraperFailed {
                    site: &descriptor.name,
                    error: &error,
                });
                ScraperHandle::failed(descriptor.clone(), error)
            }
        }
    }

    /// One handle per registry entry, in registry order
    pub fn initialize_all(&self, registry: &Registry) -> Vec<ScraperHandle> {
        let descriptors = registry.list_descriptors();
        self.sink.notify(&HarvestEvent::InitStarted {
            total: descriptors.len(),
        });

        descriptors.iter().map(|d| self.initialize(d)).collect()
    }
}
