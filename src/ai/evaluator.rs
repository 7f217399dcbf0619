//! Static evaluation contract

use crate::ai::RulesEngine;
use crate::core::PlayerId;

/// Score of a confirmed win for the perspective player
pub const WIN: i32 = 100_000_000;
/// Score of a confirmed loss for the perspective player
pub const LOSE: i32 = -100_000_000;

/// Scores a state from one player's point of view
///
/// Implementations return [`WIN`] or [`LOSE`] exactly for terminal states
/// and keep every other score strictly between them (see [`clamp_heuristic`]).
pub trait StateEvaluator<G: RulesEngine>: Send + 'static {
    fn evaluate(&self, perspective: PlayerId, state: &G) -> i32;
}

/// Keep a heuristic score off the sentinels
pub fn clamp_heuristic(score: i64) -> i32 {
    score.clamp(LOSE as i64 + 1, WIN as i64 - 1) as i32
}

pub fn is_sentinel(score: i32) -> bool {
    score == WIN || score == LOSE
}
