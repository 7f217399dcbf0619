//! Game state evaluation for the search
//!
//! Holistic board evaluation from one player's perspective: life, cards in
//! hand and every permanent on the battlefield. Positive favors the
//! perspective player.

use crate::ai::combat::CombatEvaluator;
use crate::ai::evaluator::{clamp_heuristic, StateEvaluator, LOSE, WIN};
use crate::core::{Card, CardId, PlayerId};
use crate::game::GameState;

/// Game state evaluator for the reference rules engine
#[derive(Debug, Clone, Default)]
pub struct GameStateEvaluator {
    /// Creature and equipment values come from the combat evaluator
    creature_eval: CombatEvaluator,
}

impl GameStateEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate the current game state from `player`'s perspective
    ///
    /// Returns [`WIN`] or [`LOSE`] once the game is over, a clamped
    /// heuristic otherwise.
    pub fn evaluate_game_state(&self, game: &GameState, player: PlayerId) -> i32 {
        if game.is_game_over() {
            return if game.get_winner() == Some(player) {
                WIN
            } else {
                LOSE
            };
        }
        clamp_heuristic(self.evaluate_game_state_impl(game, player))
    }

    fn evaluate_game_state_impl(&self, game: &GameState, player: PlayerId) -> i64 {
        let mut score: i64 = 0;

        // +5 per own card in hand, -4 per opponent card
        for id in game.player_ids() {
            let hand = game.get_player_zones(id).map(|z| z.hand.len()).unwrap_or(0) as i64;
            score += if id == player { 5 * hand } else { -4 * hand };
        }

        // Life totals, 2 points per life either way
        for p in &game.players {
            let life = p.life as i64;
            score += if p.id == player { 2 * life } else { -2 * life };
        }

        for id in game.battlefield.iter() {
            let Ok(card) = game.card(id) else { continue };
            let value = self.evaluate_card(game, id, card) as i64;
            if card.controller == player {
                score += value;
            } else {
                score -= value;
            }
        }

        score
    }

    /// Value of one permanent on the battlefield
    fn evaluate_card(&self, game: &GameState, id: CardId, card: &Card) -> i32 {
        if card.is_creature() {
            self.creature_eval.score(id, game)
        } else if card.is_land() {
            Self::evaluate_land(card)
        } else if card.equipment.is_some() {
            self.creature_eval.score(id, game)
        } else {
            50 + 30 * card.mana_cost.cmc() as i32
        }
    }

    /// Lands: base 3, 100 per mana produced, 3 per color, 1 while untapped
    pub fn evaluate_land(card: &Card) -> i32 {
        let mut value = 3;
        let mut colors = Vec::new();
        let mut max_produced = 0;
        for ability in card.abilities.iter().filter(|a| a.is_mana_ability()) {
            for effect in &ability.effects {
                if let crate::core::Effect::AddMana { color, amount } = effect {
                    max_produced = max_produced.max(*amount as i32);
                    if !colors.contains(color) {
                        colors.push(*color);
                    }
                }
            }
        }
        value += 100 * max_produced;
        value += colors.len() as i32 * 3;
        if !card.tapped {
            value += 1;
        }
        value
    }
}

impl StateEvaluator<GameState> for GameStateEvaluator {
    fn evaluate(&self, perspective: PlayerId, state: &GameState) -> i32 {
        self.evaluate_game_state(state, perspective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::evaluator::is_sentinel;

    #[test]
    fn test_symmetric_start_scores_zero() {
        let game = GameState::new_two_player("AI", "Opponent", 20);
        let eval = GameStateEvaluator::new();
        assert_eq!(eval.evaluate(PlayerId::new(0), &game), 0);
    }

    #[test]
    fn test_life_and_hand_are_counted() {
        let mut game = GameState::new_two_player("AI", "Opponent", 20);
        let me = PlayerId::new(0);
        let opp = PlayerId::new(1);
        game.get_player_mut(opp).unwrap().lose_life(3);
        game.add_card_to_hand(me, "Forest").unwrap();
        game.add_card_to_hand(opp, "Forest").unwrap();

        let eval = GameStateEvaluator::new();
        // +6 for the life gap, +5 - 4 for the hands
        assert_eq!(eval.evaluate(me, &game), 7);
        assert_eq!(eval.evaluate(opp, &game), -6 + 5 - 4);
    }

    #[test]
    fn test_land_evaluation() {
        let mut game = GameState::new_two_player("AI", "Opponent", 20);
        let forest = game.add_card_to_battlefield(PlayerId::new(0), "Forest").unwrap();
        let card = game.card_mut(forest).unwrap();
        assert_eq!(GameStateEvaluator::evaluate_land(card), 107);
        card.tap();
        assert_eq!(GameStateEvaluator::evaluate_land(card), 106);
    }

    #[test]
    fn test_creatures_swing_the_score() {
        let mut game = GameState::new_two_player("AI", "Opponent", 20);
        let me = PlayerId::new(0);
        game.add_card_to_battlefield(me, "Hill Giant").unwrap();
        let eval = GameStateEvaluator::new();
        let score = eval.evaluate(me, &game);
        assert!(score > 0);
        assert_eq!(eval.evaluate(PlayerId::new(1), &game), -score);
    }

    #[test]
    fn test_sentinels_only_when_over() {
        let mut game = GameState::new_two_player("AI", "Opponent", 20);
        let me = PlayerId::new(0);
        let opp = PlayerId::new(1);
        let eval = GameStateEvaluator::new();
        assert!(!is_sentinel(eval.evaluate(me, &game)));

        game.get_player_mut(opp).unwrap().lose_life(20);
        assert!(!is_sentinel(eval.evaluate(me, &game)));
        game.check_state_based_actions().unwrap();
        assert_eq!(eval.evaluate(me, &game), WIN);
        assert_eq!(eval.evaluate(opp, &game), LOSE);
    }
}
