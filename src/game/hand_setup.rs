//! Deck loading and opening hands
//!
//! Fills each library from a card list, shuffles it with the game's RNG and
//! draws the opening hand.

use crate::core::PlayerId;
use crate::game::{GameState, StarterDeck};
use crate::{MtgError, Result};

pub const OPENING_HAND_SIZE: usize = 7;

/// Put every card of `cards` into `player`'s library
pub fn load_deck(game: &mut GameState, player: PlayerId, cards: &[&str]) -> Result<()> {
    if cards.len() < OPENING_HAND_SIZE {
        return Err(MtgError::InvalidAction(format!(
            "deck needs at least {OPENING_HAND_SIZE} cards, got {}",
            cards.len()
        )));
    }
    for name in cards {
        game.add_card_to_library(player, name)?;
    }
    Ok(())
}

/// Shuffle all libraries, then draw opening hands in player order
pub fn setup_opening_hands(game: &mut GameState, player_ids: &[PlayerId]) -> Result<()> {
    for &player_id in player_ids {
        game.shuffle_library(player_id)?;
    }
    for &player_id in player_ids {
        for _ in 0..OPENING_HAND_SIZE {
            game.draw_card(player_id)?;
        }
    }
    Ok(())
}

/// A fresh two-player game with both starter decks dealt
pub fn new_starter_match(
    names: (&str, &str),
    decks: (StarterDeck, StarterDeck),
    seed: u64,
) -> Result<GameState> {
    let mut game = GameState::new_two_player(names.0, names.1, seed);
    let players = [PlayerId::new(0), PlayerId::new(1)];
    load_deck(&mut game, players[0], &decks.0.card_list())?;
    load_deck(&mut game, players[1], &decks.1.card_list())?;
    setup_opening_hands(&mut game, &players)?;
    Ok(game)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starter_match_deals_seven() {
        let game = new_starter_match(
            ("Alice", "Bob"),
            (StarterDeck::Stompy, StarterDeck::WhiteWeenie),
            42,
        )
        .unwrap();
        for id in game.player_ids() {
            let zones = game.get_player_zones(id).unwrap();
            assert_eq!(zones.hand.len(), OPENING_HAND_SIZE);
            assert_eq!(zones.library.len(), 40 - OPENING_HAND_SIZE);
        }
    }

    #[test]
    fn test_same_seed_same_hands() {
        let decks = (StarterDeck::Stompy, StarterDeck::Stompy);
        let a = new_starter_match(("A", "B"), decks, 7).unwrap();
        let b = new_starter_match(("A", "B"), decks, 7).unwrap();
        let hand_names = |g: &GameState| -> Vec<String> {
            g.get_player_zones(PlayerId::new(0))
                .unwrap()
                .hand
                .iter()
                .map(|c| g.card(c).unwrap().name.clone())
                .collect()
        };
        assert_eq!(hand_names(&a), hand_names(&b));
    }

    #[test]
    fn test_short_deck_rejected() {
        let mut game = GameState::new_two_player("A", "B", 1);
        assert!(load_deck(&mut game, PlayerId::new(0), &["Forest"; 3]).is_err());
    }
}
