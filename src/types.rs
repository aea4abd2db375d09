//! Shared types for the CURATOR agent.
//!
//! The domain model used across all modules: collections and products as
//! snapshotted from the remote catalog, the ephemeral move/job values used
//! during plan submission, and the error taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// A catalog collection, snapshotted once per run.
///
/// `is_smart` distinguishes rule-derived collections (membership computed
/// by the platform) from manually curated ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub title: String,
    pub handle: String,
    pub sort_order: SortOrder,
    pub is_smart: bool,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) | {}",
            if self.is_smart { "SMART" } else { "MANUAL" },
            self.title,
            self.handle,
            self.id,
        )
    }
}

impl Collection {
    /// The numeric tail of a `gid://` style id, used for exclusion matching.
    pub fn numeric_id(&self) -> &str {
        self.id.rsplit('/').next().unwrap_or(&self.id)
    }
}

/// Collection sort mode as reported by the platform.
///
/// Only `Manual` matters to the reorderer — any other mode must be flipped
/// to `Manual` before moves can be submitted. `Other` absorbs modes the
/// platform may add later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortOrder {
    Manual,
    BestSelling,
    AlphaAsc,
    AlphaDesc,
    PriceAsc,
    PriceDesc,
    Created,
    CreatedDesc,
    #[serde(other)]
    Other,
}

// ---------------------------------------------------------------------------
// Product / Variant
// ---------------------------------------------------------------------------

/// A product within a collection. Immutable snapshot per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub product_type: String,
    pub tags: Vec<String>,
    pub variants: Vec<Variant>,
}

/// A product variant with its per-location stock entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    pub id: String,
    pub inventory_levels: Vec<InventoryLevel>,
}

/// Available quantity at one stock location.
///
/// `location_id` is absent when the platform omits the location node;
/// such entries are excluded whenever a location allow-list is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLevel {
    pub location_id: Option<String>,
    pub available: i64,
}

// ---------------------------------------------------------------------------
// Move / Job
// ---------------------------------------------------------------------------

/// An instruction to place one product at one zero-based position within
/// a collection's listing. Exists only during plan submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub id: String,
    pub new_position: usize,
}

/// Handle to an asynchronous backend reorder job, returned by a reorder
/// submission and polled until done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for CURATOR.
///
/// Only throttling is retried (inside the client, up to its ceiling);
/// every other variant is terminal for the in-flight operation.
#[derive(Debug, thiserror::Error)]
pub enum CuratorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Response schema error: {0}")]
    Schema(String),

    #[error("Rate limited: throttled past {attempts} attempts")]
    ThrottleExhausted { attempts: u32 },

    #[error("Remote operation failed ({operation}): {message}")]
    RemoteOperation { operation: String, message: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
