//! `haul run`: the full harvest

use anyhow::{Context, Result};
use std::io;
use std::path::PathBuf;
use tokio::sync::watch;

use haul::config::Config;
use haul::harvest::{
    confirm, exit_status, FanOut, HarvestEvent, ProgressSink, Session, TracingSink,
};
use haul::registry::Registry;
use haul::scraper::CatalogFactory;
use haul::utils::format_count;

/// Options of the `run` subcommand
#[derive(Debug, Default)]
pub struct RunArgs {
    pub yes: bool,
    pub output: Option<PathBuf>,
    pub delay: Option<u64>,
    pub site_timeout: Option<u64>,
    pub only: Vec<String>,
}

/// Console narrative of a run
struct ConsoleSink;

impl ProgressSink for ConsoleSink {
    fn notify(&self, event: &HarvestEvent<'_>) {
        match *event {
            HarvestEvent::InitStarted { total } => {
                println!("Initializing {total} scrapers");
            }
            HarvestEvent::ScraperReady { site, category } => {
                println!("  [ok] {site}: {category} scraper ready");
            }
            HarvestEvent::ScraperFailed { site, error } => {
                println!("  [failed] {site}: {error}");
            }
            HarvestEvent::SiteStarted { site, index, total } => {
                println!("\nSite {index}/{total}: {}", site.to_uppercase());
            }
            HarvestEvent::SiteFinished {
                result,
                running_total,
            } => {
                match &result.error_message {
                    None => println!(
                        "  {}: {} items in {:.1} minutes ({:.1} items/minute)",
                        result.site_name,
                        format_count(result.item_count),
                        result.duration_minutes(),
                        result.items_per_minute
                    ),
                    Some(error) => println!("  {}: error - {error}", result.site_name),
                }
                println!("Running total: {} items", format_count(running_total));
            }
            HarvestEvent::SnapshotSaved { path } => {
                println!("  Snapshot saved: {}", path.display());
            }
            HarvestEvent::SnapshotFailed { site, error } => {
                eprintln!("  Snapshot after {site} failed: {error}");
            }
            HarvestEvent::Waiting { delay } => {
                println!("  Pausing {}s before the next site", delay.as_secs());
            }
            HarvestEvent::Interrupted { completed } => {
                println!("\nHarvest interrupted after {completed} site(s)");
            }
        }
    }
}

fn apply_overrides(mut config: Config, args: &RunArgs) -> Config {
    if let Some(output) = &args.output {
        config.harvest.output_dir = output.clone();
    }
    if let Some(delay) = args.delay {
        config.harvest.inter_site_delay_secs = delay;
    }
    if let Some(timeout) = args.site_timeout {
        config.harvest.site_timeout_secs = timeout;
    }
    config
}

/// Per-site limits for the header, or "none" when every site is unbounded
fn limit_summary(registry: &Registry) -> String {
    let limited: Vec<String> = registry
        .list_descriptors()
        .iter()
        .filter_map(|d| d.collection_limit.map(|n| format!("{} {}", d.name, format_count(n))))
        .collect();

    match limited.len() {
        0 => String::from("none (everything available)"),
        n if n == registry.len() => limited.join(", "),
        _ => format!("{}, others unbounded", limited.join(", ")),
    }
}

/// Execute a harvest and return the process exit status
pub async fn run(config: Config, args: RunArgs) -> Result<u8> {
    let config = apply_overrides(config, &args);
    let registry = Registry::from_entries(&config.sites)?.retain_only(&args.only)?;
    let factory = CatalogFactory::from_config(&config);

    println!("Haul Asset Harvest");
    println!("==================");
    println!("Sites: {}", registry.len());
    println!("Collection limit: {}", limit_summary(&registry));
    println!("Output directory: {}", config.harvest.output_dir.display());
    println!();

    let console = ConsoleSink;
    let sinks: Vec<&dyn ProgressSink> = vec![&console, &TracingSink];
    let sink = FanOut::new(sinks);
    let session = Session::new(&config, &registry, &factory, &sink);

    if !args.yes
        && !confirm(io::stdin().lock(), io::stdout(), &session.confirmation_question())
            .context("Failed to read confirmation")?
    {
        println!("Harvest cancelled");
        return Ok(exit_status::OK);
    }

    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nInterrupt received, finishing current results");
            let _ = stop.send(true);
        }
    });

    let report = session.execute(shutdown).await;

    println!();
    print!("{}", report.render());
    println!();

    if report.progress.snapshot_failures > 0 {
        println!(
            "Snapshots: {} saved, {} failed",
            report.progress.snapshots.len(),
            report.progress.snapshot_failures
        );
    }
    if let Some(path) = &report.metrics_file {
        println!("Metrics saved: {}", path.display());
    }
    match &report.final_artifact {
        Ok(path) => println!("Final results saved: {}", path.display()),
        Err(e) => eprintln!("Failed to save final results: {e}"),
    }

    Ok(report.exit_status())
}
