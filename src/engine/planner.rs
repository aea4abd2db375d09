//! Minimal-diff move planning.
//!
//! The reorder mutation charges per move, so the plan carries only the
//! products whose index actually changes. Ids present in the target but
//! not in the current listing (membership changed under us, e.g. a smart
//! collection re-evaluated its rules) are skipped — they are not
//! actionable positions.

use std::collections::HashMap;

use crate::types::Move;

/// Moves submitted per mutation, to respect remote payload limits.
pub const MOVE_BATCH_SIZE: usize = 200;

/// Compute the minimal move set transforming `current` into `target`.
///
/// Output follows `target` order. Positions are dense zero-based indexes
/// into the target order.
pub fn plan_moves(current: &[String], target: &[String]) -> Vec<Move> {
    let current_index: HashMap<&str, usize> = current
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    target
        .iter()
        .enumerate()
        .filter_map(|(position, id)| match current_index.get(id.as_str()) {
            Some(&index) if index != position => Some(Move {
                id: id.clone(),
                new_position: position,
            }),
            _ => None,
        })
        .collect()
}
