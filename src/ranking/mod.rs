//! Product ranking.
//!
//! Pure scoring and ordering logic — no I/O. `score` turns a product
//! snapshot into its stock-coverage score tuple; `sort` produces the
//! target order the engine diffs against the current listing.

pub mod score;
pub mod sort;

pub use score::{normalize, score_product, DemotionRules, ScoredProduct};
pub use sort::sort_by_rank;
