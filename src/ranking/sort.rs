//! Target-order computation.
//!
//! A fixed composite key, highest priority first:
//!
//! 1. demoted ascending — demoted products always trail
//! 2. coverage score descending
//! 3. total inventory descending
//! 4. variants with stock descending
//! 5. title ascending, caseless and accent-stripped
//!
//! The sort is stable, so products with fully identical keys (including
//! title) keep their relative input order — an accepted non-uniqueness.

use std::cmp::Ordering;

use super::score::{normalize, ScoredProduct};

/// Compare two scored products by the composite ranking key.
fn rank_cmp(a: &ScoredProduct, b: &ScoredProduct) -> Ordering {
    a.demoted
        .cmp(&b.demoted)
        .then_with(|| b.coverage_score.cmp(&a.coverage_score))
        .then_with(|| b.total_inventory.cmp(&a.total_inventory))
        .then_with(|| b.variants_with_stock.cmp(&a.variants_with_stock))
        .then_with(|| normalize(&a.title).cmp(&normalize(&b.title)))
}

/// Order products best-first. Stable and idempotent.
pub fn sort_by_rank(mut scored: Vec<ScoredProduct>) -> Vec<ScoredProduct> {
    scored.sort_by(rank_cmp);
    scored
}
