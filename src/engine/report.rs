//! Run accounting.
//!
//! Per-collection results roll up into a run summary logged at shutdown.
//! The preview is the operator's sanity check before trusting a wet run:
//! the top of the target order with the inputs that put each product
//! there.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::ranking::ScoredProduct;

/// Rows shown when previewing a collection's target order.
const PREVIEW_ROWS: usize = 10;

/// Result of processing a single collection.
#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub collection_id: String,
    pub handle: String,
    pub products: usize,
    pub moves_planned: usize,
    pub moves_submitted: usize,
    pub jobs_confirmed: usize,
    pub jobs_unconfirmed: usize,
    pub dry_run: bool,
}

impl CollectionReport {
    pub fn new(collection_id: &str, handle: &str, dry_run: bool) -> Self {
        Self {
            collection_id: collection_id.to_string(),
            handle: handle.to_string(),
            products: 0,
            moves_planned: 0,
            moves_submitted: 0,
            jobs_confirmed: 0,
            jobs_unconfirmed: 0,
            dry_run,
        }
    }
}

/// Aggregated counters for one run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub collections_seen: usize,
    pub selected: usize,
    pub processed: usize,
    pub failed: usize,
    pub moves_planned: usize,
    pub moves_submitted: usize,
    pub jobs_confirmed: usize,
    pub jobs_unconfirmed: usize,
    pub started_at: DateTime<Utc>,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSummary {
    pub fn new() -> Self {
        Self {
            collections_seen: 0,
            selected: 0,
            processed: 0,
            failed: 0,
            moves_planned: 0,
            moves_submitted: 0,
            jobs_confirmed: 0,
            jobs_unconfirmed: 0,
            started_at: Utc::now(),
        }
    }

    /// Fold a finished collection into the run totals.
    pub fn absorb(&mut self, report: &CollectionReport) {
        self.processed += 1;
        self.moves_planned += report.moves_planned;
        self.moves_submitted += report.moves_submitted;
        self.jobs_confirmed += report.jobs_confirmed;
        self.jobs_unconfirmed += report.jobs_unconfirmed;
    }

    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}

/// Log the head of a collection's target order.
pub fn log_preview(handle: &str, ranked: &[ScoredProduct]) {
    for (i, p) in ranked.iter().take(PREVIEW_ROWS).enumerate() {
        info!(
            collection = handle,
            rank = i + 1,
            title = %p.title,
            coverage = p.coverage_score,
            total_inventory = p.total_inventory,
            with_stock = format!("{}/{}", p.variants_with_stock, p.total_variants),
            demoted = p.demoted,
            "Preview"
        );
    }
}
