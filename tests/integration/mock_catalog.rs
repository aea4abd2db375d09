//! Mock catalog for integration testing.
//!
//! A deterministic in-memory `CatalogApi`: collections and pre-paged
//! product listings are fully controllable from test code, mutations are
//! recorded instead of applied, and failure modes (vanishing collections,
//! rejected mutations, slow jobs) can be switched on per collection.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use curator::api::{CatalogApi, Page};
use curator::types::{Collection, CuratorError, JobHandle, Move, Product};

/// Poll count meaning "the job never finishes".
pub const NEVER_DONE: u32 = u32::MAX;

#[derive(Default)]
struct State {
    collections: Vec<Collection>,
    /// Pre-paged product listings per collection id.
    product_pages: HashMap<String, Vec<Vec<Product>>>,
    /// Collection id → pages served before the collection "disappears".
    vanish_after: HashMap<String, usize>,
    /// Collections whose product listing errors out.
    fail_products: Vec<String>,
    /// Collections whose reorder submission is rejected.
    fail_reorder: Vec<String>,
    /// Recorded `set_manual_sort` calls.
    manual_sort_calls: Vec<String>,
    /// Recorded reorder submissions: (collection id, batch).
    submissions: Vec<(String, Vec<Move>)>,
    /// Status checks needed before a job reports done.
    polls_until_done: u32,
    /// Poll counts per job id.
    job_polls: HashMap<String, u32>,
    /// When false, submissions return no job handle.
    emit_jobs: bool,
    job_counter: u32,
}

/// In-memory catalog. Clones share state, so tests can keep a handle for
/// inspection after moving one into the engine.
#[derive(Clone)]
pub struct MockCatalog {
    inner: Arc<Mutex<State>>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                polls_until_done: 1,
                emit_jobs: true,
                ..State::default()
            })),
        }
    }

    /// Register a collection with its product listing, pre-split into
    /// pages.
    pub fn add_collection(&self, collection: Collection, product_pages: Vec<Vec<Product>>) {
        let mut s = self.inner.lock().unwrap();
        s.product_pages
            .insert(collection.id.clone(), product_pages);
        s.collections.push(collection);
    }

    /// Make the collection disappear after serving `pages` product pages.
    pub fn vanish_after(&self, collection_id: &str, pages: usize) {
        self.inner
            .lock()
            .unwrap()
            .vanish_after
            .insert(collection_id.to_string(), pages);
    }

    /// Make the collection's product listing fail.
    pub fn fail_products(&self, collection_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_products
            .push(collection_id.to_string());
    }

    /// Make reorder submissions for the collection fail with a user error.
    pub fn fail_reorder(&self, collection_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_reorder
            .push(collection_id.to_string());
    }

    /// Status checks a job needs before reporting done (`NEVER_DONE` to
    /// simulate a stuck job).
    pub fn set_polls_until_done(&self, polls: u32) {
        self.inner.lock().unwrap().polls_until_done = polls;
    }

    /// Submissions complete synchronously with no job handle.
    pub fn disable_jobs(&self) {
        self.inner.lock().unwrap().emit_jobs = false;
    }

    pub fn manual_sort_calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().manual_sort_calls.clone()
    }

    pub fn submissions(&self) -> Vec<(String, Vec<Move>)> {
        self.inner.lock().unwrap().submissions.clone()
    }

    /// All submitted moves for one collection, flattened across batches.
    pub fn submitted_moves(&self, collection_id: &str) -> Vec<Move> {
        self.submissions()
            .into_iter()
            .filter(|(id, _)| id == collection_id)
            .flat_map(|(_, batch)| batch)
            .collect()
    }
}

#[async_trait]
impl CatalogApi for MockCatalog {
    async fn collections_page(
        &self,
        _cursor: Option<String>,
    ) -> Result<Page<Collection>, CuratorError> {
        Ok(Page::last(self.inner.lock().unwrap().collections.clone()))
    }

    async fn products_page(
        &self,
        collection_id: &str,
        cursor: Option<String>,
    ) -> Result<Option<Page<Product>>, CuratorError> {
        let s = self.inner.lock().unwrap();

        if s.fail_products.iter().any(|id| id == collection_id) {
            return Err(CuratorError::Transport(format!(
                "CollectionProducts HTTP 502: bad gateway for {collection_id}"
            )));
        }

        let page_index: usize = cursor.map(|c| c.parse().unwrap()).unwrap_or(0);
        if let Some(&limit) = s.vanish_after.get(collection_id) {
            if page_index >= limit {
                return Ok(None);
            }
        }

        let pages = match s.product_pages.get(collection_id) {
            Some(pages) => pages,
            None => return Ok(None),
        };
        let nodes = pages.get(page_index).cloned().unwrap_or_default();
        let has_next_page = page_index + 1 < pages.len();
        Ok(Some(Page {
            nodes,
            has_next_page,
            end_cursor: has_next_page.then(|| (page_index + 1).to_string()),
        }))
    }

    async fn set_manual_sort(&self, collection_id: &str) -> Result<(), CuratorError> {
        self.inner
            .lock()
            .unwrap()
            .manual_sort_calls
            .push(collection_id.to_string());
        Ok(())
    }

    async fn submit_reorder(
        &self,
        collection_id: &str,
        moves: &[Move],
    ) -> Result<Option<JobHandle>, CuratorError> {
        let mut s = self.inner.lock().unwrap();

        if s.fail_reorder.iter().any(|id| id == collection_id) {
            return Err(CuratorError::RemoteOperation {
                operation: "collectionReorderProducts".to_string(),
                message: "moves: position out of range".to_string(),
            });
        }

        s.submissions
            .push((collection_id.to_string(), moves.to_vec()));

        if !s.emit_jobs {
            return Ok(None);
        }
        s.job_counter += 1;
        Ok(Some(JobHandle {
            id: format!("gid://shopify/Job/{}", s.job_counter),
        }))
    }

    async fn job_done(&self, job_id: &str) -> Result<bool, CuratorError> {
        let mut s = self.inner.lock().unwrap();
        let threshold = s.polls_until_done;
        let polls = s.job_polls.entry(job_id.to_string()).or_insert(0);
        if threshold == NEVER_DONE {
            return Ok(false);
        }
        *polls += 1;
        Ok(*polls >= threshold)
    }
}
