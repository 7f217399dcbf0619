//! Player controller trait and game state view
//!
//! This module defines the interface between the match loop and the players
//! (the search AI, the random baseline). The loop calls the controller when
//! a decision is needed, and the controller inspects a read-only view of the
//! game to make its choice.

use crate::core::{CardId, PlayerId};
use crate::game::{GameAction, GameState, Step};
use crate::zones::Zone;

/// Read-only view of game state for controllers
pub struct GameStateView<'a> {
    game: &'a GameState,
    player_id: PlayerId,
}

impl<'a> GameStateView<'a> {
    /// Create a new view of the game state from a player's perspective
    pub fn new(game: &'a GameState, player_id: PlayerId) -> Self {
        GameStateView { game, player_id }
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// The full state, for controllers that simulate on private copies
    pub fn game(&self) -> &'a GameState {
        self.game
    }

    pub fn opponent(&self) -> PlayerId {
        self.game.opponent_of(self.player_id)
    }

    /// Cards in this player's hand
    pub fn hand(&self) -> &'a [CardId] {
        self.game
            .get_player_zones(self.player_id)
            .map(|zones| zones.hand.cards.as_slice())
            .unwrap_or(&[])
    }

    pub fn battlefield(&self) -> &'a [CardId] {
        &self.game.battlefield.cards
    }

    /// Check if a card is in one of this player's zones or a shared zone
    pub fn is_card_in_zone(&self, card_id: CardId, zone: Zone) -> bool {
        let zones = self.game.get_player_zones(self.player_id);
        match zone {
            Zone::Hand => zones.is_ok_and(|z| z.hand.contains(card_id)),
            Zone::Library => zones.is_ok_and(|z| z.library.contains(card_id)),
            Zone::Graveyard => zones.is_ok_and(|z| z.graveyard.contains(card_id)),
            Zone::Battlefield => self.game.battlefield.contains(card_id),
            Zone::Stack => self.game.stack.iter().any(|item| item.source == card_id),
        }
    }

    pub fn card_name(&self, card_id: CardId) -> Option<&'a str> {
        self.game.card(card_id).ok().map(|c| c.name.as_str())
    }

    pub fn is_tapped(&self, card_id: CardId) -> bool {
        self.game.card(card_id).is_ok_and(|c| c.tapped)
    }

    /// This player's life total
    pub fn life(&self) -> i32 {
        self.game.get_player(self.player_id).map(|p| p.life).unwrap_or(0)
    }

    pub fn opponent_life(&self) -> i32 {
        self.game
            .get_player(self.opponent())
            .map(|p| p.life)
            .unwrap_or(0)
    }

    pub fn current_step(&self) -> Step {
        self.game.current_step()
    }

    pub fn turn_number(&self) -> u32 {
        self.game.turn.turn_number
    }
}

/// Player controller trait
///
/// The match loop calls these methods whenever the player has a decision
/// to make. Every answer is validated by the loop; illegal choices are
/// ignored.
pub trait PlayerController {
    /// Get the player ID this controller is responsible for
    fn player_id(&self) -> PlayerId;

    /// Short label for logs
    fn name(&self) -> &str;

    /// Choose one of `available` (which always contains a pass), or `None`
    /// to pass priority
    fn choose_action(&mut self, view: &GameStateView, available: &[GameAction]) -> Option<GameAction>;

    /// Attackers among the creatures able to attack
    fn choose_attackers(&mut self, view: &GameStateView, candidates: &[CardId]) -> Vec<CardId>;

    /// Blocks as (blocker, attacker) pairs
    fn choose_blockers(
        &mut self,
        view: &GameStateView,
        attackers: &[CardId],
        blockers: &[CardId],
    ) -> Vec<(CardId, CardId)>;

    /// Card to fetch with a library search this player controls
    fn choose_search_target(&mut self, view: &GameStateView, candidates: &[CardId]) -> Option<CardId>;

    /// `count` cards to discard from `hand` at cleanup
    fn choose_discard(&mut self, view: &GameStateView, hand: &[CardId], count: usize) -> Vec<CardId>;

    /// Called when the game ends (for cleanup/logging)
    fn on_game_end(&mut self, _view: &GameStateView, _won: bool) {}
}
