//! Property tests for results, throughput and summary aggregation

mod common;

use chrono::Utc;
use proptest::prelude::*;
use std::time::Duration;

use haul::models::{items_per_minute, RunResults, ScraperDescriptor, SiteResult};
use haul::registry::Registry;
use haul::report::{OutcomeTier, Reporter, RunWindow};

/// One site outcome: `Some(items)` succeeded, `None` failed
fn arb_outcomes() -> impl Strategy<Value = Vec<(Option<usize>, u64)>> {
    prop::collection::vec((prop::option::of(0usize..40), 0u64..600_000), 0..8)
}

fn build_results(outcomes: &[(Option<usize>, u64)]) -> RunResults {
    let mut results = RunResults::new();
    for (i, (items, millis)) in outcomes.iter().enumerate() {
        let name = format!("site{i}");
        let elapsed = Duration::from_millis(*millis);
        let result = match items {
            Some(n) => SiteResult::success(&name, common::assets(&name, *n), elapsed, Utc::now()),
            None => SiteResult::failure(&name, "collection failed", elapsed, Utc::now()),
        };
        results.insert(result);
    }
    results
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_rate_matches_count_over_minutes(count in 0usize..100_000, millis in 1u64..10_000_000) {
        let secs = millis as f64 / 1000.0;
        let rate = items_per_minute(count, secs);

        prop_assert!(rate >= 0.0);
        prop_assert!((rate * secs / 60.0 - count as f64).abs() < 1e-6 * (count as f64 + 1.0));
    }

    #[test]
    fn prop_zero_duration_has_zero_rate(count in 0usize..100_000) {
        prop_assert_eq!(items_per_minute(count, 0.0), 0.0);
    }

    #[test]
    fn prop_success_count_equals_items(n in 0usize..200, millis in 0u64..100_000) {
        let result = SiteResult::success("s", common::assets("s", n), Duration::from_millis(millis), Utc::now());

        prop_assert_eq!(result.item_count, result.items.len());
        prop_assert_eq!(result.item_count, n);
        if millis == 0 {
            prop_assert_eq!(result.items_per_minute, 0.0);
        }
    }

    #[test]
    fn prop_summary_totals(outcomes in arb_outcomes()) {
        let results = build_results(&outcomes);
        let total_ms = outcomes.iter().map(|(_, ms)| *ms).sum::<u64>();

        let start = Utc::now();
        let window = RunWindow {
            start,
            end: start,
            elapsed: Duration::from_millis(total_ms),
        };
        let summary = Reporter::finalize(&results, &window, false);

        let expected_items: usize = outcomes.iter().filter_map(|(n, _)| *n).sum();
        let expected_ok = outcomes.iter().filter(|(n, _)| n.is_some()).count();

        prop_assert_eq!(summary.total_items, expected_items);
        prop_assert_eq!(summary.total_items, results.iter().map(|r| r.item_count).sum::<usize>());
        prop_assert_eq!(summary.successful_site_count, expected_ok);
        prop_assert_eq!(summary.total_site_count, outcomes.len());
        prop_assert!(summary.average_rate_per_minute.is_finite());

        for result in &results {
            prop_assert!(summary.total_duration_minutes + 1e-9 >= result.duration_minutes());
            if !result.is_success() {
                prop_assert_eq!(result.item_count, 0);
                prop_assert!(!result.error_message.as_deref().unwrap_or_default().is_empty());
            }
        }
    }

    #[test]
    fn prop_results_keep_insertion_order(outcomes in arb_outcomes()) {
        let results = build_results(&outcomes);
        let json = serde_json::to_string(&results).unwrap();
        let restored: RunResults = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(restored.names(), results.names());
    }

    #[test]
    fn prop_ranking_is_sorted_and_complete(outcomes in arb_outcomes()) {
        let results = build_results(&outcomes);
        let ranked = Reporter::ranked(&results);

        prop_assert_eq!(ranked.len(), results.len());
        prop_assert!(ranked.windows(2).all(|w| w[0].item_count >= w[1].item_count));
    }

    #[test]
    fn prop_tier_thresholds(total in 0usize..5_000) {
        let tier = OutcomeTier::classify(total);
        let expected = if total >= 1000 {
            OutcomeTier::FullSuccess
        } else if total >= 500 {
            OutcomeTier::PartialSuccess
        } else {
            OutcomeTier::NeedsImprovement
        };
        prop_assert_eq!(tier, expected);
    }

    #[test]
    fn prop_registry_order_is_stable(priorities in prop::collection::vec(-5i32..5, 1..12)) {
        let descriptors: Vec<_> = priorities
            .iter()
            .enumerate()
            .map(|(i, p)| ScraperDescriptor::new(format!("site{i}"), "x", *p))
            .collect();
        let registry = Registry::new(descriptors).unwrap();

        let first: Vec<_> = registry.list_descriptors().iter().map(|d| d.name.clone()).collect();
        let second: Vec<_> = registry.list_descriptors().iter().map(|d| d.name.clone()).collect();
        prop_assert_eq!(&first, &second);

        let listed = registry.list_descriptors();
        for pair in listed.windows(2) {
            prop_assert!(pair[0].priority <= pair[1].priority);
            if pair[0].priority == pair[1].priority {
                let index = |name: &str| name.trim_start_matches("site").parse::<usize>().unwrap();
                prop_assert!(index(&pair[0].name) < index(&pair[1].name));
            }
        }
    }
}
