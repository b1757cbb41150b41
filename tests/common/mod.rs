//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use haul::config::Config;
use haul::harvest::{HarvestEvent, ProgressSink};
use haul::models::{Asset, CollectionLimit, ScraperDescriptor};
use haul::scraper::{Scraper, ScraperFactory};
use haul::utils::error::{CollectionError, InitError};

/// Create `n` assets for a site
pub fn assets(site: &str, n: usize) -> Vec<Asset> {
    (0..n)
        .map(|i| Asset::new(format!("{site} pack {i}"), format!("https://{site}.test/{i}"), site))
        .collect()
}

/// Config with no pauses, writing into `dir`
pub fn quiet_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.harvest.output_dir = dir.to_path_buf();
    config.harvest.inter_site_delay_secs = 0;
    config
}

/// What a scripted scraper does when invoked
#[derive(Debug, Clone)]
pub struct Script {
    /// Simulated collection time
    pub takes: Duration,
    /// `Ok(n)` yields `n` items, `Err(msg)` fails with `msg`
    pub outcome: Result<usize, String>,
}

impl Script {
    pub fn items(n: usize, takes: Duration) -> Self {
        Self {
            takes,
            outcome: Ok(n),
        }
    }

    pub fn fails(message: &str, takes: Duration) -> Self {
        Self {
            takes,
            outcome: Err(message.to_string()),
        }
    }
}

/// Calls observed by scripted scrapers, shared across a test
#[derive(Debug, Default)]
pub struct CallLog {
    pub calls: Mutex<Vec<(String, &'static str, CollectionLimit)>>,
}

impl CallLog {
    pub fn entries(&self) -> Vec<(String, &'static str, CollectionLimit)> {
        self.calls.lock().unwrap().clone()
    }
}

pub struct ScriptedScraper {
    site: String,
    script: Script,
    log: Arc<CallLog>,
}

impl ScriptedScraper {
    async fn perform(&self, limit: CollectionLimit) -> Result<Vec<Asset>, CollectionError> {
        tokio::time::sleep(self.script.takes).await;
        match &self.script.outcome {
            Ok(n) => {
                let n = limit.map_or(*n, |max| (*n).min(max));
                Ok(assets(&self.site, n))
            }
            Err(message) => Err(CollectionError::failed(message.clone())),
        }
    }
}

#[async_trait]
impl Scraper for ScriptedScraper {
    fn site(&self) -> &str {
        &self.site
    }

    async fn scrape(&self, limit: CollectionLimit) -> Result<Vec<Asset>, CollectionError> {
        self.log
            .calls
            .lock()
            .unwrap()
            .push((self.site.clone(), "scrape", limit));
        self.perform(limit).await
    }

    async fn analyze_and_scrape(
        &self,
        limit: CollectionLimit,
    ) -> Result<Vec<Asset>, CollectionError> {
        self.log
            .calls
            .lock()
            .unwrap()
            .push((self.site.clone(), "analyze_and_scrape", limit));
        self.perform(limit).await
    }
}

/// Factory handing out scripted scrapers by scraper identity
#[derive(Default)]
pub struct ScriptedFactory {
    scripts: HashMap<String, Script>,
    pub log: Arc<CallLog>,
    pub builds: AtomicUsize,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, scraper: &str, script: Script) -> Self {
        self.scripts.insert(scraper.to_string(), script);
        self
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl ScraperFactory for ScriptedFactory {
    fn build(&self, descriptor: &ScraperDescriptor) -> Result<Box<dyn Scraper>, InitError> {
        self.builds.fetch_add(1, Ordering::SeqCst);

        let script = self
            .scripts
            .get(&descriptor.scraper)
            .cloned()
            .ok_or_else(|| InitError::UnknownScraper(descriptor.scraper.clone()))?;

        Ok(Box::new(ScriptedScraper {
            site: descriptor.name.clone(),
            script,
            log: Arc::clone(&self.log),
        }))
    }
}

/// Sink recording a label per event, optionally signalling shutdown after
/// a number of finished sites
#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<String>>,
    stop_after: Option<(usize, watch::Sender<bool>)>,
    finished: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stopping_after(sites: usize, stop: watch::Sender<bool>) -> Self {
        Self {
            stop_after: Some((sites, stop)),
            ..Self::default()
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn notify(&self, event: &HarvestEvent<'_>) {
        let label = match event {
            HarvestEvent::InitStarted { total } => format!("init:{total}"),
            HarvestEvent::ScraperReady { site, .. } => format!("ready:{site}"),
            HarvestEvent::ScraperFailed { site, .. } => format!("init-failed:{site}"),
            HarvestEvent::SiteStarted { site, .. } => format!("start:{site}"),
            HarvestEvent::SiteFinished { result, .. } => {
                let done = self.finished.fetch_add(1, Ordering::SeqCst) + 1;
                if let Some((limit, stop)) = &self.stop_after {
                    if done >= *limit {
                        let _ = stop.send(true);
                    }
                }
                format!("finish:{}", result.site_name)
            }
            HarvestEvent::SnapshotSaved { .. } => String::from("snapshot"),
            HarvestEvent::SnapshotFailed { site, .. } => format!("snapshot-failed:{site}"),
            HarvestEvent::Waiting { delay } => format!("wait:{}", delay.as_secs()),
            HarvestEvent::Interrupted { completed } => format!("interrupted:{completed}"),
        };
        self.events.lock().unwrap().push(label);
    }
}

/// Read a JSON artifact
pub fn read_json(path: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}

/// JSON files in `dir` whose name contains `marker`, sorted by name
pub fn artifacts(dir: &Path, marker: &str) -> Vec<std::path::PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.contains(marker) && n.ends_with(".json"))
        })
        .collect();
    paths.sort();
    paths
}
