//! Remote catalog access.
//!
//! Defines the `CatalogApi` trait — the seam between the reorder engine
//! and the platform — plus the cursor-pagination primitives. The only
//! production implementation is the Shopify Admin GraphQL client; tests
//! run the engine against in-memory implementations of the same trait.

pub mod client;
pub mod paginate;
pub mod shopify;

use async_trait::async_trait;

use crate::types::{Collection, CuratorError, JobHandle, Move, Product};

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub nodes: Vec<T>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A final page holding everything (convenient for tests and small
    /// listings).
    pub fn last(nodes: Vec<T>) -> Self {
        Self {
            nodes,
            has_next_page: false,
            end_cursor: None,
        }
    }
}

/// Abstraction over the remote catalog platform.
///
/// Exactly the five operations the reorderer needs; everything else about
/// the platform's schema is out of scope. Implementors own rate limiting —
/// callers treat every method as a single logical operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// One page of the store's collections.
    async fn collections_page(
        &self,
        cursor: Option<String>,
    ) -> Result<Page<Collection>, CuratorError>;

    /// One page of a collection's products, in the collection's current
    /// order. `None` when the collection no longer exists (deleted while
    /// the run was in flight).
    async fn products_page(
        &self,
        collection_id: &str,
        cursor: Option<String>,
    ) -> Result<Option<Page<Product>>, CuratorError>;

    /// Switch the collection to manual ordering. Required before any
    /// reorder submission when the collection is rule-sorted.
    async fn set_manual_sort(&self, collection_id: &str) -> Result<(), CuratorError>;

    /// Submit a batch of position moves. Returns the handle of the
    /// asynchronous job the platform started, if any.
    async fn submit_reorder(
        &self,
        collection_id: &str,
        moves: &[Move],
    ) -> Result<Option<JobHandle>, CuratorError>;

    /// Whether the given asynchronous job has finished.
    async fn job_done(&self, job_id: &str) -> Result<bool, CuratorError>;
}
