//! Random controller for testing and baseline gameplay
//!
//! Makes random choices from the available options. Serves as the baseline
//! opponent for the search AI.

use crate::core::{CardId, PlayerId};
use crate::game::controller::{GameStateView, PlayerController};
use crate::game::GameAction;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

/// A controller that makes random choices
pub struct RandomController {
    player_id: PlayerId,
    rng: ChaCha12Rng,
}

impl RandomController {
    pub fn new(player_id: PlayerId) -> Self {
        RandomController {
            player_id,
            rng: ChaCha12Rng::from_entropy(),
        }
    }

    /// Create a random controller with a seeded RNG (for deterministic testing)
    pub fn with_seed(player_id: PlayerId, seed: u64) -> Self {
        RandomController {
            player_id,
            rng: ChaCha12Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerController for RandomController {
    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    fn name(&self) -> &str {
        "random"
    }

    fn choose_action(&mut self, _view: &GameStateView, available: &[GameAction]) -> Option<GameAction> {
        available.choose(&mut self.rng).cloned()
    }

    fn choose_attackers(&mut self, _view: &GameStateView, candidates: &[CardId]) -> Vec<CardId> {
        candidates
            .iter()
            .copied()
            .filter(|_| self.rng.gen_bool(0.5))
            .collect()
    }

    fn choose_blockers(
        &mut self,
        _view: &GameStateView,
        attackers: &[CardId],
        blockers: &[CardId],
    ) -> Vec<(CardId, CardId)> {
        if attackers.is_empty() {
            return Vec::new();
        }
        let mut blocks = Vec::new();
        for &blocker in blockers {
            if self.rng.gen_bool(0.5) {
                let attacker = attackers[self.rng.gen_range(0..attackers.len())];
                blocks.push((blocker, attacker));
            }
        }
        blocks
    }

    fn choose_search_target(&mut self, _view: &GameStateView, candidates: &[CardId]) -> Option<CardId> {
        candidates.choose(&mut self.rng).copied()
    }

    fn choose_discard(&mut self, _view: &GameStateView, hand: &[CardId], count: usize) -> Vec<CardId> {
        hand.choose_multiple(&mut self.rng, count).copied().collect()
    }
}
