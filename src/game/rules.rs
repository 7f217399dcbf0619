//! The reference rules engine as seen by the search

use crate::ai::{PendingSearch, RulesEngine};
use crate::core::{CardId, PlayerId};
use crate::game::{compute_state_hash, CombatState, GameAction, GameState};

impl RulesEngine for GameState {
    type Action = GameAction;
    type Combat = CombatState;

    fn legal_actions(&self, player: PlayerId) -> Vec<GameAction> {
        self.legal_actions_for(player)
    }

    fn apply(&mut self, player: PlayerId, action: &GameAction) -> bool {
        self.apply_action(player, action).is_ok()
    }

    fn is_over(&self) -> bool {
        self.is_game_over()
    }

    fn all_passed(&self) -> bool {
        self.all_players_passed()
    }

    fn stack_is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    fn priority_player(&self) -> PlayerId {
        self.turn.priority_player
    }

    fn active_player(&self) -> PlayerId {
        self.turn.active_player
    }

    fn next_player(&self, player: PlayerId) -> PlayerId {
        self.next_player_after(player)
    }

    fn pass_priority(&mut self, player: PlayerId) {
        GameState::pass_priority(self, player);
    }

    fn pending_search(&self) -> Option<PendingSearch> {
        self.pending_library_search()
            .map(|(controller, candidates)| PendingSearch {
                controller,
                candidates,
            })
    }

    fn choose_search_target(&mut self, card: CardId) -> bool {
        self.set_search_choice(card)
    }

    fn resolve_top(&mut self) {
        // A failed resolution leaves the object off the stack; the search
        // only needs the step to keep moving
        let _ = self.resolve_top_of_stack();
    }

    fn check_state(&mut self) {
        let _ = self.check_state_based_actions();
    }

    fn fingerprint(&self) -> u64 {
        compute_state_hash(self)
    }

    fn combat_snapshot(&self) -> Option<CombatState> {
        (!self.combat.is_empty()).then(|| self.combat.clone())
    }

    fn action_source_name(&self, action: &GameAction) -> Option<String> {
        let card = match action {
            GameAction::PlayLand { card }
            | GameAction::CastSpell { card, .. }
            | GameAction::ActivateAbility { card, .. }
            | GameAction::TapForMana { card, .. } => *card,
            GameAction::PassPriority => return None,
        };
        self.card(card).ok().map(|c| c.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::SimAction;
    use crate::core::TargetRef;
    use crate::game::Step;

    #[test]
    fn test_step_finishes_after_both_pass() {
        let mut game = GameState::new_two_player("Alice", "Bob", 5);
        game.turn.current_step = Step::Main1;
        let alice = game.priority_player();
        let bob = game.next_player(alice);

        assert!(game.apply(alice, &GameAction::pass()));
        assert_eq!(game.priority_player(), bob);
        assert!(!game.step_finished());
        assert!(game.apply(bob, &GameAction::pass()));
        assert!(game.step_finished());
    }

    #[test]
    fn test_clone_then_apply_leaves_original_untouched() {
        let mut game = GameState::new_two_player("Alice", "Bob", 5);
        game.turn.turn_number = 2;
        game.turn.current_step = Step::Main1;
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        game.add_card_to_battlefield(alice, "Mountain").unwrap();
        let bolt = game.add_card_to_hand(alice, "Lightning Bolt").unwrap();
        let before = game.fingerprint();

        let mut sim = game.clone();
        assert!(sim.apply(
            alice,
            &GameAction::CastSpell {
                card: bolt,
                target: Some(TargetRef::Player(bob)),
            }
        ));
        sim.resolve_top();

        assert_eq!(sim.get_player(bob).unwrap().life, 17);
        assert_eq!(game.get_player(bob).unwrap().life, 20);
        assert_eq!(game.fingerprint(), before);
        assert_ne!(sim.fingerprint(), before);
    }

    #[test]
    fn test_source_names() {
        let mut game = GameState::new_two_player("Alice", "Bob", 5);
        let forest = game.add_card_to_hand(PlayerId::new(0), "Forest").unwrap();
        assert_eq!(
            game.action_source_name(&GameAction::PlayLand { card: forest }),
            Some("Forest".to_string())
        );
        assert_eq!(game.action_source_name(&GameAction::PassPriority), None);
    }
}
