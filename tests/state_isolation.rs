//! Cloned game states share nothing mutable with the original

use mtg_forge_ai::ai::RulesEngine;
use mtg_forge_ai::game::{new_starter_match, GameState, StarterDeck, Step};
use proptest::prelude::*;

fn main_phase_match(seed: u64) -> GameState {
    let mut game = new_starter_match(
        ("Alice", "Bob"),
        (StarterDeck::Stompy, StarterDeck::WhiteWeenie),
        seed,
    )
    .unwrap();
    game.turn.current_step = Step::Main1;
    game
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_playing_on_clone_leaves_original(seed in 0u64..1000, picks in prop::collection::vec(0usize..16, 1..24)) {
        let game = main_phase_match(seed);
        let before = RulesEngine::fingerprint(&game);
        let hand_before = game.get_player_zones(game.turn.active_player).unwrap().hand.cards.clone();

        let mut sim = game.clone();
        for pick in picks {
            if RulesEngine::is_over(&sim) {
                break;
            }
            let player = RulesEngine::priority_player(&sim);
            let actions = RulesEngine::legal_actions(&sim, player);
            let action = &actions[pick % actions.len()];
            if RulesEngine::apply(&mut sim, player, action) {
                RulesEngine::check_state(&mut sim);
            }
        }

        prop_assert_eq!(RulesEngine::fingerprint(&game), before);
        prop_assert_eq!(
            &game.get_player_zones(game.turn.active_player).unwrap().hand.cards,
            &hand_before
        );
    }

    #[test]
    fn prop_fingerprint_is_stable_across_clones(seed in 0u64..1000) {
        let game = main_phase_match(seed);
        let copy = game.clone();
        prop_assert_eq!(RulesEngine::fingerprint(&game), RulesEngine::fingerprint(&copy));
    }
}
