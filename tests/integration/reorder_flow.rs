//! End-to-end reorder flow against the mock catalog.

use std::time::Duration;

use curator::engine::{JobPoller, Reorderer, RunOptions};
use curator::ranking::DemotionRules;
use curator::types::{Collection, CuratorError, InventoryLevel, Product, SortOrder, Variant};

use crate::mock_catalog::{MockCatalog, NEVER_DONE};

// -- Fixtures ---------------------------------------------------------------

fn collection(handle: &str, sort_order: SortOrder, is_smart: bool) -> Collection {
    Collection {
        id: format!("gid://shopify/Collection/{handle}"),
        title: handle.to_string(),
        handle: handle.to_string(),
        sort_order,
        is_smart,
    }
}

/// A product with one variant per quantity given.
fn product(id: &str, title: &str, quantities: &[i64]) -> Product {
    Product {
        id: format!("gid://shopify/Product/{id}"),
        title: title.to_string(),
        product_type: String::new(),
        tags: Vec::new(),
        variants: quantities
            .iter()
            .enumerate()
            .map(|(i, q)| Variant {
                id: format!("gid://shopify/ProductVariant/{id}-{i}"),
                inventory_levels: vec![InventoryLevel {
                    location_id: Some("gid://shopify/Location/1".to_string()),
                    available: *q,
                }],
            })
            .collect(),
    }
}

fn pid(id: &str) -> String {
    format!("gid://shopify/Product/{id}")
}

fn engine(catalog: &MockCatalog, options: RunOptions) -> Reorderer {
    engine_with_rules(catalog, options, DemotionRules::default())
}

fn engine_with_rules(
    catalog: &MockCatalog,
    options: RunOptions,
    rules: DemotionRules,
) -> Reorderer {
    Reorderer::new(Box::new(catalog.clone()), options, rules, Vec::new())
        .with_poller(JobPoller::new(3, Duration::from_millis(1)))
}

fn wet() -> RunOptions {
    RunOptions {
        dry_run: false,
        ..RunOptions::default()
    }
}

/// One collection, current order [B, A, C]: B partially covered, A fully
/// covered, C out of stock. Target order is [A, B, C].
fn seed_basic(catalog: &MockCatalog, sort_order: SortOrder) -> Collection {
    let col = collection("summer", sort_order, false);
    catalog.add_collection(
        col.clone(),
        vec![vec![
            product("b", "Bravo", &[3, 0]),
            product("a", "Alpha", &[5, 5]),
            product("c", "Charlie", &[0]),
        ]],
    );
    col
}

// -- Dry run ----------------------------------------------------------------

#[tokio::test]
async fn test_dry_run_submits_nothing() {
    let catalog = MockCatalog::new();
    seed_basic(&catalog, SortOrder::BestSelling);

    let summary = engine(&catalog, RunOptions::default()).run().await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.moves_planned, 2);
    assert_eq!(summary.moves_submitted, 0);
    assert!(catalog.submissions().is_empty());
    assert!(catalog.manual_sort_calls().is_empty());
}

// -- Wet run ----------------------------------------------------------------

#[tokio::test]
async fn test_wet_run_submits_minimal_moves_and_flips_sort_mode() {
    let catalog = MockCatalog::new();
    let col = seed_basic(&catalog, SortOrder::BestSelling);

    let summary = engine(&catalog, wet()).run().await.unwrap();

    // Rule-sorted collection must be flipped to manual first.
    assert_eq!(catalog.manual_sort_calls(), vec![col.id.clone()]);

    // [B, A, C] → [A, B, C]: A and B move, C stays put.
    let moves = catalog.submitted_moves(&col.id);
    assert_eq!(moves.len(), 2);
    assert_eq!(moves[0].id, pid("a"));
    assert_eq!(moves[0].new_position, 0);
    assert_eq!(moves[1].id, pid("b"));
    assert_eq!(moves[1].new_position, 1);

    assert_eq!(summary.moves_submitted, 2);
    assert_eq!(summary.jobs_confirmed, 1);
    assert_eq!(summary.jobs_unconfirmed, 0);
}

#[tokio::test]
async fn test_manual_collection_is_not_flipped() {
    let catalog = MockCatalog::new();
    seed_basic(&catalog, SortOrder::Manual);

    engine(&catalog, wet()).run().await.unwrap();

    assert!(catalog.manual_sort_calls().is_empty());
    assert_eq!(catalog.submissions().len(), 1);
}

#[tokio::test]
async fn test_already_ordered_collection_skips_submission() {
    let catalog = MockCatalog::new();
    let col = collection("tidy", SortOrder::Manual, false);
    // Already best-first: full coverage with more stock, then partial.
    catalog.add_collection(
        col.clone(),
        vec![vec![
            product("a", "Alpha", &[9, 9]),
            product("b", "Bravo", &[2, 0]),
        ]],
    );

    let summary = engine(&catalog, wet()).run().await.unwrap();

    assert!(catalog.submissions().is_empty());
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.moves_planned, 0);
}

#[tokio::test]
async fn test_synchronous_reorder_without_job() {
    let catalog = MockCatalog::new();
    seed_basic(&catalog, SortOrder::Manual);
    catalog.disable_jobs();

    let summary = engine(&catalog, wet()).run().await.unwrap();

    assert_eq!(summary.moves_submitted, 2);
    assert_eq!(summary.jobs_confirmed, 0);
    assert_eq!(summary.jobs_unconfirmed, 0);
}

// -- Pagination and concurrent deletion -------------------------------------

#[tokio::test]
async fn test_multi_page_listing_is_fully_fetched() {
    let catalog = MockCatalog::new();
    let col = collection("paged", SortOrder::Manual, false);
    // Current order [low, high] split across pages; target is [high, low].
    catalog.add_collection(
        col.clone(),
        vec![
            vec![product("low", "Low", &[1])],
            vec![product("high", "High", &[50])],
        ],
    );

    let summary = engine(&catalog, wet()).run().await.unwrap();

    assert_eq!(summary.moves_planned, 2);
    let moves = catalog.submitted_moves(&col.id);
    assert_eq!(moves[0].id, pid("high"));
    assert_eq!(moves[0].new_position, 0);
}

#[tokio::test]
async fn test_collection_vanishing_mid_pagination_yields_partial_run() {
    let catalog = MockCatalog::new();
    let col = collection("ghost", SortOrder::Manual, false);
    catalog.add_collection(
        col.clone(),
        vec![
            vec![
                product("x", "Xray", &[0]),
                product("y", "Yankee", &[4]),
            ],
            vec![product("z", "Zulu", &[9])],
        ],
    );
    catalog.vanish_after(&col.id, 1);

    let summary = engine(&catalog, wet()).run().await.unwrap();

    // Only page one was seen; the run continues on what it has.
    assert_eq!(summary.processed, 1);
    let moves = catalog.submitted_moves(&col.id);
    assert!(moves.iter().all(|m| m.id != pid("z")));
    assert_eq!(moves.len(), 2);
}

// -- Demotion ---------------------------------------------------------------

#[tokio::test]
async fn test_demoted_product_trails_despite_stock() {
    let catalog = MockCatalog::new();
    let col = collection("mixed", SortOrder::Manual, false);
    let mut outlet = product("f", "Outlet Bundle", &[100, 100]);
    outlet.tags = vec!["outlet".to_string()];
    catalog.add_collection(
        col.clone(),
        vec![vec![outlet, product("g", "Golf", &[1, 0])]],
    );

    let rules = DemotionRules::new(&[], &["outlet".to_string()], &[]);
    engine_with_rules(&catalog, wet(), rules).run().await.unwrap();

    // F outranks G on every stock key but must land last.
    let moves = catalog.submitted_moves(&col.id);
    assert_eq!(moves.len(), 2);
    assert_eq!(moves[0].id, pid("g"));
    assert_eq!(moves[0].new_position, 0);
    assert_eq!(moves[1].id, pid("f"));
    assert_eq!(moves[1].new_position, 1);
}

// -- Batching ---------------------------------------------------------------

#[tokio::test]
async fn test_large_plans_are_chunked() {
    let catalog = MockCatalog::new();
    let col = collection("big", SortOrder::Manual, false);
    // 250 products whose stock increases down the listing, so the target
    // order is the exact reverse and every product moves.
    let products: Vec<Product> = (0..250)
        .map(|i| product(&format!("p{i:03}"), &format!("Product {i:03}"), &[i + 1]))
        .collect();
    catalog.add_collection(col.clone(), vec![products]);

    let summary = engine(&catalog, wet()).run().await.unwrap();

    let submissions = catalog.submissions();
    assert_eq!(submissions.len(), 2);
    assert_eq!(submissions[0].1.len(), 200);
    assert_eq!(submissions[1].1.len(), 50);
    assert_eq!(summary.moves_submitted, 250);
    // One job per batch, each polled to completion.
    assert_eq!(summary.jobs_confirmed, 2);
}

// -- Job timeouts -----------------------------------------------------------

#[tokio::test]
async fn test_stuck_job_is_nonfatal() {
    let catalog = MockCatalog::new();
    seed_basic(&catalog, SortOrder::Manual);
    catalog.set_polls_until_done(NEVER_DONE);

    let summary = engine(&catalog, wet()).run().await.unwrap();

    assert_eq!(summary.jobs_confirmed, 0);
    assert_eq!(summary.jobs_unconfirmed, 1);
    assert_eq!(summary.moves_submitted, 2);
}

// -- Error isolation --------------------------------------------------------

#[tokio::test]
async fn test_abort_on_error_stops_the_run() {
    let catalog = MockCatalog::new();
    let broken = collection("broken", SortOrder::Manual, false);
    catalog.add_collection(broken.clone(), vec![vec![product("a", "Alpha", &[1])]]);
    catalog.fail_products(&broken.id);
    seed_basic(&catalog, SortOrder::Manual);

    let result = engine(&catalog, wet()).run().await;

    assert!(matches!(result, Err(CuratorError::Transport(_))));
    // The second collection was never reached.
    assert!(catalog.submissions().is_empty());
}

#[tokio::test]
async fn test_abort_on_error_false_isolates_the_failure() {
    let catalog = MockCatalog::new();
    let broken = collection("broken", SortOrder::Manual, false);
    catalog.add_collection(broken.clone(), vec![vec![product("a", "Alpha", &[1])]]);
    catalog.fail_products(&broken.id);
    let healthy = seed_basic(&catalog, SortOrder::Manual);

    let options = RunOptions {
        abort_on_error: false,
        ..wet()
    };
    let summary = engine(&catalog, options).run().await.unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.processed, 1);
    assert!(!catalog.submitted_moves(&healthy.id).is_empty());
}

#[tokio::test]
async fn test_rejected_mutation_aborts_by_default() {
    let catalog = MockCatalog::new();
    let col = seed_basic(&catalog, SortOrder::Manual);
    catalog.fail_reorder(&col.id);

    let result = engine(&catalog, wet()).run().await;

    assert!(matches!(
        result,
        Err(CuratorError::RemoteOperation { .. })
    ));
}

// -- Collection filtering ---------------------------------------------------

#[tokio::test]
async fn test_excluded_collections_are_skipped() {
    let catalog = MockCatalog::new();
    seed_basic(&catalog, SortOrder::BestSelling);
    let excluded = collection("gift-cards", SortOrder::Manual, false);
    catalog.add_collection(excluded.clone(), vec![vec![product("gc", "Gift Card", &[0])]]);

    let options = RunOptions {
        exclude_handles: vec!["gift-cards".to_string()],
        ..wet()
    };
    let summary = engine(&catalog, options).run().await.unwrap();

    assert_eq!(summary.collections_seen, 2);
    assert_eq!(summary.selected, 1);
    assert!(catalog.submitted_moves(&excluded.id).is_empty());
}

#[tokio::test]
async fn test_smart_only_selection() {
    let catalog = MockCatalog::new();
    let manual = collection("hand-picked", SortOrder::Manual, false);
    catalog.add_collection(manual, vec![vec![product("m", "Manual", &[1])]]);
    let smart = collection("auto", SortOrder::BestSelling, true);
    catalog.add_collection(smart.clone(), vec![vec![product("s", "Smart", &[1])]]);

    let options = RunOptions {
        include_manual: false,
        ..wet()
    };
    let summary = engine(&catalog, options).run().await.unwrap();

    assert_eq!(summary.selected, 1);
    assert_eq!(catalog.manual_sort_calls(), vec![smart.id]);
}
