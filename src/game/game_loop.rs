//! Game loop implementation
//!
//! Manages turn progression and priority, and asks the controllers for
//! every decision.

use crate::core::{CardId, PlayerId};
use crate::game::controller::{GameStateView, PlayerController};
use crate::game::phase::Step;
use crate::game::{GameAction, GameLogger, GameState, VerbosityLevel};
use crate::log_at;
use crate::{MtgError, Result};

/// Maximum hand size checked at cleanup
pub const MAX_HAND_SIZE: usize = 7;

/// Guard against controllers that never pass
const MAX_ACTIONS_PER_STEP: usize = 1000;

/// Result of running a game to completion
#[derive(Debug, Clone)]
pub struct GameResult {
    /// Winner of the game (None if draw or game didn't complete)
    pub winner: Option<PlayerId>,
    /// Total number of turns played
    pub turns_played: u32,
    /// Reason the game ended
    pub end_reason: GameEndReason,
}

/// Reason the game ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEndReason {
    /// A player won by reducing opponent's life to 0 or less
    PlayerDeath(PlayerId),
    /// A player won by decking their opponent
    Decking(PlayerId),
    /// Game reached maximum turn limit
    TurnLimit,
    /// Both players lost at once
    Draw,
}

/// Game loop manager
///
/// Handles turn progression, priority, and win condition checking
pub struct GameLoop<'a> {
    pub game: &'a mut GameState,
    /// Maximum turns before forcing a draw
    max_turns: u32,
    turns_elapsed: u32,
    logger: GameLogger,
}

impl<'a> GameLoop<'a> {
    pub fn new(game: &'a mut GameState) -> Self {
        GameLoop {
            game,
            max_turns: 100,
            turns_elapsed: 0,
            logger: GameLogger::new(),
        }
    }

    /// Set maximum turns before forcing a draw
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Share a logger with the controllers
    pub fn with_logger(mut self, logger: GameLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn logger(&self) -> &GameLogger {
        &self.logger
    }

    /// Run the game loop with the given player controllers
    ///
    /// Returns when the game reaches a win condition or turn limit
    pub fn run_game(
        &mut self,
        controller1: &mut dyn PlayerController,
        controller2: &mut dyn PlayerController,
    ) -> Result<GameResult> {
        self.check_controllers(controller1, controller2)?;
        loop {
            if let Some(result) = self.run_turn_once(controller1, controller2)? {
                self.notify_game_end(controller1, controller2, result.winner);
                log_at!(
                    self.logger,
                    VerbosityLevel::Minimal,
                    "game_event",
                    "Game over after {} turns: {:?}",
                    result.turns_played,
                    result.end_reason
                );
                return Ok(result);
            }
        }
    }

    fn check_controllers(
        &self,
        controller1: &dyn PlayerController,
        controller2: &dyn PlayerController,
    ) -> Result<()> {
        let ids: Vec<PlayerId> = self.game.player_ids().collect();
        let given = [controller1.player_id(), controller2.player_id()];
        if ids.len() != 2 || given[0] == given[1] || !given.iter().all(|id| ids.contains(id)) {
            return Err(MtgError::InvalidAction(
                "controllers must cover both players".to_string(),
            ));
        }
        Ok(())
    }

    fn notify_game_end(
        &mut self,
        controller1: &mut dyn PlayerController,
        controller2: &mut dyn PlayerController,
        winner: Option<PlayerId>,
    ) {
        self.notify_one(controller1, winner);
        self.notify_one(controller2, winner);
    }

    fn notify_one(&self, controller: &mut dyn PlayerController, winner: Option<PlayerId>) {
        let id = controller.player_id();
        let view = GameStateView::new(self.game, id);
        controller.on_game_end(&view, winner == Some(id));
    }

    /// Run a single turn and check for game-ending conditions
    ///
    /// Returns `Ok(Some(result))` when the game should end, `Ok(None)` to
    /// keep going.
    pub fn run_turn_once(
        &mut self,
        controller1: &mut dyn PlayerController,
        controller2: &mut dyn PlayerController,
    ) -> Result<Option<GameResult>> {
        if let Some(result) = self.check_win_condition() {
            return Ok(Some(result));
        }
        if self.turns_elapsed >= self.max_turns {
            return Ok(Some(GameResult {
                winner: None,
                turns_played: self.turns_elapsed,
                end_reason: GameEndReason::TurnLimit,
            }));
        }

        self.run_turn(controller1, controller2)?;
        self.turns_elapsed += 1;

        Ok(self.check_win_condition())
    }

    fn run_turn(
        &mut self,
        controller1: &mut dyn PlayerController,
        controller2: &mut dyn PlayerController,
    ) -> Result<()> {
        let active = self.game.turn.active_player;
        log_at!(
            self.logger,
            VerbosityLevel::Normal,
            "game_event",
            "Turn {} - {}'s turn ({} vs {} life)",
            self.game.turn.turn_number,
            self.player_name(active),
            self.life(active),
            self.life(self.game.opponent_of(active))
        );

        loop {
            self.execute_step(controller1, controller2)?;
            if self.game.is_game_over() {
                return Ok(());
            }
            self.game.advance_step();
            if self.game.turn.current_step == Step::Untap {
                return Ok(());
            }
        }
    }

    /// Execute the current step, including its priority round
    pub fn execute_step(
        &mut self,
        controller1: &mut dyn PlayerController,
        controller2: &mut dyn PlayerController,
    ) -> Result<()> {
        let step = self.game.turn.current_step;
        log_at!(self.logger, VerbosityLevel::Verbose, "game_event", "--- {} ---", step);

        match step {
            Step::Untap => {
                let active = self.game.turn.active_player;
                return self.game.untap_all(active);
            }
            Step::Draw => self.draw_step()?,
            Step::DeclareAttackers => self.declare_attackers_step(controller1, controller2)?,
            Step::DeclareBlockers => self.declare_blockers_step(controller1, controller2)?,
            Step::CombatDamage => self.combat_damage_step()?,
            Step::Cleanup => return self.cleanup_step(controller1, controller2),
            _ => {}
        }

        if step.has_priority() && !self.game.is_game_over() {
            self.priority_round(controller1, controller2)?;
        }
        Ok(())
    }

    /// The starting player skips the first draw
    fn draw_step(&mut self) -> Result<()> {
        if self.game.turn.turn_number == 1 {
            return Ok(());
        }
        let active = self.game.turn.active_player;
        match self.game.draw_card(active)? {
            Some(card) => log_at!(
                self.logger,
                VerbosityLevel::Verbose,
                "game_event",
                "{} draws {}",
                self.player_name(active),
                self.card_name(card)
            ),
            None => log_at!(
                self.logger,
                VerbosityLevel::Normal,
                "game_event",
                "{} cannot draw from an empty library",
                self.player_name(active)
            ),
        }
        self.game.check_state_based_actions()
    }

    fn declare_attackers_step(
        &mut self,
        controller1: &mut dyn PlayerController,
        controller2: &mut dyn PlayerController,
    ) -> Result<()> {
        let active = self.game.turn.active_player;
        let candidates = self.game.attack_candidates();
        if candidates.is_empty() {
            return Ok(());
        }
        let controller = Self::controller_for(active, controller1, controller2);
        let view = GameStateView::new(self.game, active);
        let chosen = controller.choose_attackers(&view, &candidates);
        let declared = self.game.declare_attackers(&chosen)?;
        if declared > 0 {
            let names: Vec<String> = self
                .game
                .combat
                .attackers
                .keys()
                .map(|&c| self.card_name(c))
                .collect();
            log_at!(
                self.logger,
                VerbosityLevel::Normal,
                "combat",
                "{} attacks with {}",
                self.player_name(active),
                names.join(", ")
            );
        }
        Ok(())
    }

    fn declare_blockers_step(
        &mut self,
        controller1: &mut dyn PlayerController,
        controller2: &mut dyn PlayerController,
    ) -> Result<()> {
        if self.game.combat.is_empty() {
            return Ok(());
        }
        let defender = self.game.opponent_of(self.game.turn.active_player);
        let blockers = self.game.block_candidates(defender);
        if blockers.is_empty() {
            return Ok(());
        }
        let attackers: Vec<CardId> = self.game.combat.attackers.keys().copied().collect();
        let controller = Self::controller_for(defender, controller1, controller2);
        let view = GameStateView::new(self.game, defender);
        let blocks = controller.choose_blockers(&view, &attackers, &blockers);
        let declared = self.game.declare_blockers(&blocks);
        for &(blocker, attacker) in &blocks {
            if self.game.combat.blockers_of(attacker).contains(&blocker) {
                log_at!(
                    self.logger,
                    VerbosityLevel::Normal,
                    "combat",
                    "{} blocks {}",
                    self.card_name(blocker),
                    self.card_name(attacker)
                );
            }
        }
        if declared < blocks.len() {
            log_at!(
                self.logger,
                VerbosityLevel::Verbose,
                "combat",
                "{} illegal blocks ignored",
                blocks.len() - declared
            );
        }
        Ok(())
    }

    fn combat_damage_step(&mut self) -> Result<()> {
        if self.game.combat.is_empty() {
            return Ok(());
        }
        self.game.resolve_combat_damage()?;
        self.game.check_state_based_actions()
    }

    /// Discard down to hand size, then end-of-turn effects wear off
    fn cleanup_step(
        &mut self,
        controller1: &mut dyn PlayerController,
        controller2: &mut dyn PlayerController,
    ) -> Result<()> {
        let active = self.game.turn.active_player;
        for player in [active, self.game.opponent_of(active)] {
            let hand: Vec<CardId> = self.game.get_player_zones(player)?.hand.cards.clone();
            if hand.len() <= MAX_HAND_SIZE {
                continue;
            }
            let count = hand.len() - MAX_HAND_SIZE;
            let controller = Self::controller_for(player, controller1, controller2);
            let view = GameStateView::new(self.game, player);
            let mut chosen = controller.choose_discard(&view, &hand, count);
            chosen.retain(|c| hand.contains(c));
            chosen.dedup();
            if chosen.len() != count {
                return Err(MtgError::InvalidAction(format!(
                    "must discard exactly {count} cards, got {}",
                    chosen.len()
                )));
            }
            for card in chosen {
                log_at!(
                    self.logger,
                    VerbosityLevel::Verbose,
                    "game_event",
                    "{} discards {}",
                    self.player_name(player),
                    self.card_name(card)
                );
                self.game.put_into_graveyard(card)?;
            }
        }
        self.game.cleanup_temporary_effects();
        Ok(())
    }

    /// Priority passes back and forth until both players pass in a row
    /// with an empty stack. Both passing with a non-empty stack resolves
    /// the top object and restarts the round.
    fn priority_round(
        &mut self,
        controller1: &mut dyn PlayerController,
        controller2: &mut dyn PlayerController,
    ) -> Result<()> {
        self.game.begin_priority_round();
        let mut action_count = 0;

        loop {
            if self.game.is_game_over() {
                return Ok(());
            }
            if self.game.all_players_passed() {
                if self.game.stack.is_empty() {
                    return Ok(());
                }
                self.resolve_top(controller1, controller2)?;
                continue;
            }

            action_count += 1;
            if action_count > MAX_ACTIONS_PER_STEP {
                return Err(MtgError::InvalidAction(format!(
                    "priority round exceeded {MAX_ACTIONS_PER_STEP} actions"
                )));
            }

            let player = self.game.turn.priority_player;
            let available = self.game.legal_actions_for(player);
            // Only invoke the controller when there is an actual choice
            let choice = if available.len() <= 1 {
                None
            } else {
                let controller = Self::controller_for(player, controller1, controller2);
                let view = GameStateView::new(self.game, player);
                controller.choose_action(&view, &available)
            };

            match choice {
                Some(action) if action != GameAction::PassPriority => {
                    if !available.contains(&action) {
                        log_at!(
                            self.logger,
                            VerbosityLevel::Normal,
                            "game_event",
                            "{} chose an unavailable action ({}), passing",
                            self.player_name(player),
                            action
                        );
                        self.game.pass_priority(player);
                        continue;
                    }
                    let description = self.game.describe_action(&action);
                    match self.game.apply_action(player, &action) {
                        Ok(()) => log_at!(
                            self.logger,
                            VerbosityLevel::Normal,
                            "game_event",
                            "{} {}",
                            self.player_name(player),
                            description
                        ),
                        Err(e) => {
                            log_at!(
                                self.logger,
                                VerbosityLevel::Normal,
                                "game_event",
                                "{} failed to {}: {}",
                                self.player_name(player),
                                description,
                                e
                            );
                            self.game.pass_priority(player);
                        }
                    }
                    self.game.check_state_based_actions()?;
                }
                _ => self.game.pass_priority(player),
            }
        }
    }

    /// Resolve the top of the stack, letting the searching player pick
    /// the card first
    fn resolve_top(
        &mut self,
        controller1: &mut dyn PlayerController,
        controller2: &mut dyn PlayerController,
    ) -> Result<()> {
        if let Some((searcher, candidates)) = self.game.pending_library_search() {
            let controller = Self::controller_for(searcher, controller1, controller2);
            let view = GameStateView::new(self.game, searcher);
            let choice = controller
                .choose_search_target(&view, &candidates)
                .filter(|c| candidates.contains(c))
                .or_else(|| candidates.first().copied());
            if let Some(card) = choice {
                log_at!(
                    self.logger,
                    VerbosityLevel::Verbose,
                    "game_event",
                    "{} searches for {}",
                    self.player_name(searcher),
                    self.card_name(card)
                );
                self.game.set_search_choice(card);
            }
        }
        self.game.resolve_top_of_stack()
    }

    fn controller_for<'c>(
        player: PlayerId,
        controller1: &'c mut dyn PlayerController,
        controller2: &'c mut dyn PlayerController,
    ) -> &'c mut dyn PlayerController {
        if controller1.player_id() == player {
            controller1
        } else {
            controller2
        }
    }

    fn check_win_condition(&self) -> Option<GameResult> {
        if !self.game.is_game_over() {
            return None;
        }
        let winner = self.game.get_winner();
        let end_reason = match winner {
            Some(w) => {
                let loser = self.game.opponent_of(w);
                let decked = self
                    .game
                    .get_player(loser)
                    .is_ok_and(|p| p.drew_from_empty && p.life > 0);
                if decked {
                    GameEndReason::Decking(w)
                } else {
                    GameEndReason::PlayerDeath(w)
                }
            }
            None => GameEndReason::Draw,
        };
        Some(GameResult {
            winner,
            turns_played: self.turns_elapsed,
            end_reason,
        })
    }

    fn player_name(&self, player: PlayerId) -> String {
        self.game
            .get_player(player)
            .map(|p| p.name.clone())
            .unwrap_or_else(|_| format!("Player {player}"))
    }

    fn life(&self, player: PlayerId) -> i32 {
        self.game.get_player(player).map(|p| p.life).unwrap_or(0)
    }

    fn card_name(&self, card: CardId) -> String {
        self.game
            .card(card)
            .map(|c| c.name.clone())
            .unwrap_or_else(|_| format!("#{card}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::hand_setup::new_starter_match;
    use crate::game::{RandomController, StarterDeck};

    /// Always passes, never attacks or blocks
    struct Passive(PlayerId);

    impl PlayerController for Passive {
        fn player_id(&self) -> PlayerId {
            self.0
        }
        fn name(&self) -> &str {
            "passive"
        }
        fn choose_action(&mut self, _: &GameStateView, _: &[GameAction]) -> Option<GameAction> {
            None
        }
        fn choose_attackers(&mut self, _: &GameStateView, _: &[CardId]) -> Vec<CardId> {
            Vec::new()
        }
        fn choose_blockers(&mut self, _: &GameStateView, _: &[CardId], _: &[CardId]) -> Vec<(CardId, CardId)> {
            Vec::new()
        }
        fn choose_search_target(&mut self, _: &GameStateView, _: &[CardId]) -> Option<CardId> {
            None
        }
        fn choose_discard(&mut self, _: &GameStateView, hand: &[CardId], count: usize) -> Vec<CardId> {
            hand[..count].to_vec()
        }
    }

    #[test]
    fn test_passive_game_ends_by_decking() {
        let mut game = new_starter_match(
            ("Alice", "Bob"),
            (StarterDeck::Stompy, StarterDeck::Stompy),
            3,
        )
        .unwrap();
        let mut p1 = Passive(PlayerId::new(0));
        let mut p2 = Passive(PlayerId::new(1));
        let result = GameLoop::new(&mut game)
            .with_logger(GameLogger::capturing(VerbosityLevel::Silent))
            .run_game(&mut p1, &mut p2)
            .unwrap();
        // 33 cards left each; the second player draws first and runs out first
        assert_eq!(result.end_reason, GameEndReason::Decking(PlayerId::new(0)));
        assert_eq!(result.winner, Some(PlayerId::new(0)));
        assert_eq!(game.turn.turn_number, 68);
        assert!(game.get_player_zones(PlayerId::new(0)).unwrap().hand.len() <= MAX_HAND_SIZE);
    }

    #[test]
    fn test_turn_limit() {
        let mut game = new_starter_match(
            ("Alice", "Bob"),
            (StarterDeck::Stompy, StarterDeck::WhiteWeenie),
            5,
        )
        .unwrap();
        let mut p1 = Passive(PlayerId::new(0));
        let mut p2 = Passive(PlayerId::new(1));
        let result = GameLoop::new(&mut game)
            .with_max_turns(4)
            .with_logger(GameLogger::capturing(VerbosityLevel::Silent))
            .run_game(&mut p1, &mut p2)
            .unwrap();
        assert_eq!(result.end_reason, GameEndReason::TurnLimit);
        assert_eq!(result.turns_played, 4);
        assert_eq!(game.turn.turn_number, 5);
    }

    #[test]
    fn test_random_games_complete() {
        for seed in 0..3 {
            let mut game = new_starter_match(
                ("Alice", "Bob"),
                (StarterDeck::Stompy, StarterDeck::WhiteWeenie),
                seed,
            )
            .unwrap();
            let mut p1 = RandomController::with_seed(PlayerId::new(0), seed);
            let mut p2 = RandomController::with_seed(PlayerId::new(1), seed + 100);
            let result = GameLoop::new(&mut game)
                .with_logger(GameLogger::capturing(VerbosityLevel::Silent))
                .run_game(&mut p1, &mut p2)
                .unwrap();
            assert!(result.turns_played > 0);
        }
    }

    /// Passes like [`Passive`] and remembers how its game ended
    struct Recording {
        inner: Passive,
        won: Option<bool>,
    }

    impl PlayerController for Recording {
        fn player_id(&self) -> PlayerId {
            self.inner.player_id()
        }
        fn name(&self) -> &str {
            "recording"
        }
        fn choose_action(&mut self, view: &GameStateView, available: &[GameAction]) -> Option<GameAction> {
            self.inner.choose_action(view, available)
        }
        fn choose_attackers(&mut self, view: &GameStateView, candidates: &[CardId]) -> Vec<CardId> {
            self.inner.choose_attackers(view, candidates)
        }
        fn choose_blockers(&mut self, view: &GameStateView, attackers: &[CardId], blockers: &[CardId]) -> Vec<(CardId, CardId)> {
            self.inner.choose_blockers(view, attackers, blockers)
        }
        fn choose_search_target(&mut self, view: &GameStateView, candidates: &[CardId]) -> Option<CardId> {
            self.inner.choose_search_target(view, candidates)
        }
        fn choose_discard(&mut self, view: &GameStateView, hand: &[CardId], count: usize) -> Vec<CardId> {
            self.inner.choose_discard(view, hand, count)
        }
        fn on_game_end(&mut self, _view: &GameStateView, won: bool) {
            self.won = Some(won);
        }
    }

    #[test]
    fn test_both_controllers_hear_game_end() {
        let mut game = GameState::new_two_player("Alice", "Bob", 4);
        let bob = game.get_player_mut(PlayerId::new(1)).unwrap();
        bob.life = 0;
        bob.has_lost = true;
        let mut p1 = Recording { inner: Passive(PlayerId::new(0)), won: None };
        let mut p2 = Recording { inner: Passive(PlayerId::new(1)), won: None };
        let result = GameLoop::new(&mut game)
            .with_logger(GameLogger::capturing(VerbosityLevel::Silent))
            .run_game(&mut p1, &mut p2)
            .unwrap();
        assert_eq!(result.end_reason, GameEndReason::PlayerDeath(PlayerId::new(0)));
        assert_eq!(p1.won, Some(true));
        assert_eq!(p2.won, Some(false));
    }

    #[test]
    fn test_same_controller_twice_rejected() {
        let mut game = GameState::new_two_player("Alice", "Bob", 1);
        let mut p1 = Passive(PlayerId::new(0));
        let mut p2 = Passive(PlayerId::new(0));
        assert!(GameLoop::new(&mut game).run_game(&mut p1, &mut p2).is_err());
    }
}
