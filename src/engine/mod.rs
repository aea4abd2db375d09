//! The reorder engine.
//!
//! Drives the whole run, one collection at a time: page products in the
//! collection's current order, score and rank them, diff the two orders
//! into a minimal move plan, and submit the plan in batches — awaiting
//! each batch's backend job before the next. Strictly sequential: there
//! is exactly one in-flight remote call at any moment, so the shared rate
//! budget is never raced.

pub mod planner;
pub mod poller;
pub mod report;

pub use planner::{plan_moves, MOVE_BATCH_SIZE};
pub use poller::{JobPoller, JobStatus};
pub use report::{CollectionReport, RunSummary};

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::api::{paginate, CatalogApi};
use crate::ranking::{score_product, sort_by_rank, DemotionRules, ScoredProduct};
use crate::types::{Collection, CuratorError, SortOrder};

/// Pause between collections on wet runs.
const INTER_COLLECTION_PAUSE_MS: u64 = 300;

/// Which collections to touch and how.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Compute and log plans but submit no mutation.
    pub dry_run: bool,
    pub include_smart: bool,
    pub include_manual: bool,
    /// Only collections whose handle starts with this prefix.
    pub handle_prefix: String,
    pub exclude_handles: Vec<String>,
    /// Matched against the full id or its bare numeric tail.
    pub exclude_collection_ids: Vec<String>,
    /// Abort the run on the first failing collection (true) or log and
    /// continue with the next (false).
    pub abort_on_error: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            include_smart: true,
            include_manual: true,
            handle_prefix: String::new(),
            exclude_handles: Vec::new(),
            exclude_collection_ids: Vec::new(),
            abort_on_error: true,
        }
    }
}

/// Sequential collection reorderer.
pub struct Reorderer {
    api: Box<dyn CatalogApi>,
    options: RunOptions,
    rules: DemotionRules,
    location_ids: Vec<String>,
    poller: JobPoller,
}

impl Reorderer {
    pub fn new(
        api: Box<dyn CatalogApi>,
        options: RunOptions,
        rules: DemotionRules,
        location_ids: Vec<String>,
    ) -> Self {
        Self {
            api,
            options,
            rules,
            location_ids,
            poller: JobPoller::default(),
        }
    }

    /// Replace the default job poller (tests use a fast one).
    pub fn with_poller(mut self, poller: JobPoller) -> Self {
        self.poller = poller;
        self
    }

    /// Process every selected collection. Returns the run totals, or the
    /// first unrecovered error when `abort_on_error` is set.
    pub async fn run(&self) -> Result<RunSummary, CuratorError> {
        let mut summary = RunSummary::new();
        let api = self.api.as_ref();

        info!("Reading collections…");
        let collections = paginate::fetch_all(|cursor| api.collections_page(cursor)).await?;
        summary.collections_seen = collections.len();

        let selected: Vec<Collection> = collections
            .into_iter()
            .filter(|c| self.selects(c))
            .collect();
        summary.selected = selected.len();
        info!(
            total = summary.collections_seen,
            selected = summary.selected,
            dry_run = self.options.dry_run,
            "Collections to process"
        );

        for collection in &selected {
            info!(collection = %collection, "Processing collection");
            match self.process_collection(collection).await {
                Ok(report) => {
                    summary.absorb(&report);
                    if !self.options.dry_run {
                        tokio::time::sleep(Duration::from_millis(INTER_COLLECTION_PAUSE_MS)).await;
                    }
                }
                Err(e) if !self.options.abort_on_error => {
                    error!(
                        collection = %collection.handle,
                        error = %e,
                        "Collection failed, continuing with the next"
                    );
                    summary.failed += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(summary)
    }

    /// Collection filter: inclusion flags, handle prefix, exclusion lists.
    fn selects(&self, collection: &Collection) -> bool {
        let o = &self.options;
        if !o.handle_prefix.is_empty() && !collection.handle.starts_with(&o.handle_prefix) {
            return false;
        }
        if !o.include_smart && collection.is_smart {
            return false;
        }
        if !o.include_manual && !collection.is_smart {
            return false;
        }
        if o.exclude_handles.iter().any(|h| h == &collection.handle) {
            return false;
        }
        if o
            .exclude_collection_ids
            .iter()
            .any(|x| x == &collection.id || x == collection.numeric_id())
        {
            return false;
        }
        true
    }

    async fn process_collection(
        &self,
        collection: &Collection,
    ) -> Result<CollectionReport, CuratorError> {
        let api = self.api.as_ref();

        let products =
            paginate::fetch_all_partial(|cursor| api.products_page(&collection.id, cursor))
                .await?;

        let current: Vec<String> = products.iter().map(|p| p.id.clone()).collect();
        let scored: Vec<ScoredProduct> = products
            .iter()
            .map(|p| score_product(p, &self.rules, &self.location_ids))
            .collect();
        let ranked = sort_by_rank(scored);
        report::log_preview(&collection.handle, &ranked);

        let target: Vec<String> = ranked.iter().map(|p| p.id.clone()).collect();
        let moves = plan_moves(&current, &target);

        let mut report =
            CollectionReport::new(&collection.id, &collection.handle, self.options.dry_run);
        report.products = products.len();
        report.moves_planned = moves.len();

        if self.options.dry_run {
            info!(
                handle = %collection.handle,
                products = report.products,
                moves = report.moves_planned,
                "Dry run — no mutations submitted"
            );
            return Ok(report);
        }

        if collection.sort_order != SortOrder::Manual {
            info!(
                handle = %collection.handle,
                from = ?collection.sort_order,
                "Switching to manual ordering"
            );
            api.set_manual_sort(&collection.id).await?;
        }

        if moves.is_empty() {
            info!(handle = %collection.handle, "Already in target order");
            return Ok(report);
        }

        for batch in moves.chunks(MOVE_BATCH_SIZE) {
            debug!(handle = %collection.handle, batch = batch.len(), "Submitting move batch");
            let job = api.submit_reorder(&collection.id, batch).await?;
            report.moves_submitted += batch.len();

            if let Some(job) = job {
                match self.poller.await_completion(api, &job).await? {
                    JobStatus::Done { polls } => {
                        debug!(job_id = %job.id, polls, "Batch confirmed");
                        report.jobs_confirmed += 1;
                    }
                    JobStatus::TimedOut { attempts } => {
                        warn!(
                            job_id = %job.id,
                            attempts,
                            "Reorder accepted, completion unconfirmed"
                        );
                        report.jobs_unconfirmed += 1;
                    }
                }
            }
        }

        info!(
            handle = %collection.handle,
            moves = report.moves_submitted,
            "Reordered"
        );
        Ok(report)
    }
}
