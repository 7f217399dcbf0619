//! Search-based player controller
//!
//! At each priority decision the controller either continues the line it
//! planned last time (when the live game is where the plan expected it to
//! be) or runs a fresh timed search from the live state. Actions are taken
//! one at a time; after anything that uses the stack the controller passes
//! so the object can resolve.

use crate::ai::combat::CombatEvaluator;
use crate::ai::config::AiConfig;
use crate::ai::context::{CancelToken, SearchContext};
use crate::ai::node::{NodeId, SimulationTree};
use crate::ai::optimizers::ActionOptimizer;
use crate::ai::runner::{SearchJob, SearchRunner};
use crate::ai::search::SearchDriver;
use crate::ai::suggested::SuggestedActions;
use crate::ai::{RulesEngine, SimAction};
use crate::core::{CardId, PlayerId};
use crate::game::controller::{GameStateView, PlayerController};
use crate::game::{GameAction, GameLogger, GameState, GameStateEvaluator, VerbosityLevel};
use crate::log_at;
use crate::Result;
use std::collections::VecDeque;

type Driver = SearchDriver<GameState, GameStateEvaluator>;

pub struct AiController {
    player_id: PlayerId,
    config: AiConfig,
    runner: SearchRunner,
    /// Kept between searches so seeded tie-breaks continue their sequence
    driver: Option<Driver>,
    combat_eval: CombatEvaluator,
    suggestions: SuggestedActions,
    /// Tree of the last search; its root is where the plan starts
    tree: Option<SimulationTree<GameState>>,
    /// Node whose actions are being taken
    committed: Option<NodeId>,
    pending: VecDeque<GameAction>,
    /// Set after a stack-using action until the next decision
    pass_after_stack: bool,
    logger: GameLogger,
    searches: usize,
    reused: usize,
}

impl AiController {
    pub fn new(player_id: PlayerId, config: AiConfig, logger: GameLogger) -> Result<Self> {
        config.validate()?;
        let suggestions = match &config.suggestions_file {
            Some(path) => SuggestedActions::load(path)?,
            None => SuggestedActions::new(),
        };
        Ok(AiController {
            player_id,
            runner: SearchRunner::new(logger.clone())?,
            driver: None,
            combat_eval: CombatEvaluator::new(logger.clone()),
            suggestions,
            tree: None,
            committed: None,
            pending: VecDeque::new(),
            pass_after_stack: false,
            logger,
            searches: 0,
            reused: 0,
            config,
        })
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    /// Add a `cast:<name>` or `play:<name>` directive; false when malformed
    pub fn add_suggestion(&mut self, directive: &str) -> bool {
        self.suggestions.add(directive)
    }

    pub fn suggestions(&self) -> &SuggestedActions {
        &self.suggestions
    }

    /// Fresh searches run so far
    pub fn search_count(&self) -> usize {
        self.searches
    }

    /// Decisions served from a previously planned line
    pub fn reuse_count(&self) -> usize {
        self.reused
    }

    fn clear_plan(&mut self) {
        self.tree = None;
        self.committed = None;
        self.pending.clear();
    }

    fn take_driver(&mut self) -> Driver {
        match self.driver.take() {
            Some(driver) => driver,
            None => SearchDriver::new(
                GameStateEvaluator::new(),
                ActionOptimizer::standard(),
                self.player_id,
                self.config.search_settings(),
                self.logger.clone(),
            ),
        }
    }

    /// Run a timed search from `game` and adopt the line it commits to
    fn search(&mut self, game: &GameState) {
        let settings = self.config.search_settings();
        let tree = SimulationTree::new(game.clone(), self.player_id, settings.max_depth);
        let ctx = SearchContext::new(self.config.max_nodes, CancelToken::new());
        let job = SearchJob {
            driver: self.take_driver(),
            tree,
            ctx,
        };

        let outcome = self
            .runner
            .run(job, self.config.think_budget(), self.config.allow_interrupt);
        self.searches += 1;
        log_at!(
            self.logger,
            VerbosityLevel::Verbose,
            "search",
            "search #{} for player {}: score {} in {:?}{}",
            self.searches,
            self.player_id,
            outcome.score,
            outcome.elapsed,
            if outcome.timed_out { " (timed out)" } else { "" }
        );

        self.clear_plan();
        let Some(job) = outcome.job else {
            return;
        };
        let root = job.tree.root();
        if let Some(best) = job.tree.best_child(root) {
            let node = job.tree.node(best);
            self.pending = node.actions.iter().cloned().collect();
            self.committed = Some(best);
            log_at!(
                self.logger,
                VerbosityLevel::Verbose,
                "search",
                "planned line: {}",
                job.driver.describe_line(&job.tree, root)
            );
        }
        self.tree = Some(job.tree);
        self.driver = Some(job.driver);
    }

    /// Continue the planned line when the live state matches the state
    /// the next planned decision was searched from
    pub fn get_next_action(&mut self, game: &GameState) -> bool {
        if !self.suggestions.is_empty() {
            return false;
        }
        let (Some(tree), Some(committed)) = (self.tree.as_mut(), self.committed) else {
            return false;
        };

        let mut test = committed;
        let Some(mut next) = tree.best_child(committed) else {
            return false;
        };
        loop {
            let node = tree.node(next);
            let ours = node.acting_player == self.player_id && !node.actions.is_empty();
            if ours {
                break;
            }
            match tree.best_child(next) {
                Some(child) => {
                    test = next;
                    next = child;
                }
                None => return false,
            }
        }

        let expected = tree.node(test).fingerprint;
        if expected == 0 || expected != game.fingerprint() {
            log_at!(
                self.logger,
                VerbosityLevel::Trace,
                "search",
                "planned line diverged at {}",
                next
            );
            return false;
        }

        tree.reroot(test);
        let node = tree.node(next);
        self.pending = node.actions.iter().cloned().collect();
        self.committed = Some(next);
        self.reused += 1;
        log_at!(
            self.logger,
            VerbosityLevel::Verbose,
            "search",
            "continuing previous action chain at {}",
            next
        );
        true
    }

    /// Search targets predicted along the committed line
    fn planned_search_targets(&self) -> Vec<CardId> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        let root = tree.root();
        std::iter::once(root)
            .chain(tree.spine(root))
            .flat_map(|id| tree.node(id).search_targets.iter().copied())
            .collect()
    }

    fn commit(&mut self, action: GameAction) -> Option<GameAction> {
        if action.is_pass() {
            return None;
        }
        self.pass_after_stack = action.uses_stack();
        self.logger
            .controller_choice(&format!("ai-{}", self.player_id), &action.to_string());
        Some(action)
    }
}

impl PlayerController for AiController {
    fn player_id(&self) -> PlayerId {
        self.player_id
    }

    fn name(&self) -> &str {
        "ai"
    }

    fn choose_action(&mut self, view: &GameStateView, available: &[GameAction]) -> Option<GameAction> {
        let game = view.game();
        if std::mem::take(&mut self.pass_after_stack) && !game.stack.is_empty() {
            return None;
        }

        if !self.suggestions.is_empty() {
            if let Some(action) = self.suggestions.take_matching(game, available) {
                log_at!(
                    self.logger,
                    VerbosityLevel::Normal,
                    "search",
                    "following suggestion: {}",
                    game.describe_action(&action)
                );
                self.clear_plan();
                return self.commit(action);
            }
        }

        if self.pending.is_empty() && !self.get_next_action(game) {
            self.search(game);
        }
        if let Some(stale) = self
            .pending
            .front()
            .filter(|a| !available.contains(a))
            .map(|a| a.to_string())
        {
            log_at!(
                self.logger,
                VerbosityLevel::Verbose,
                "search",
                "planned action {} is not available, searching again",
                stale
            );
            self.search(game);
        }

        match self.pending.pop_front() {
            Some(action) if available.contains(&action) => self.commit(action),
            _ => None,
        }
    }

    fn choose_attackers(&mut self, view: &GameStateView, candidates: &[CardId]) -> Vec<CardId> {
        self.combat_eval
            .declare_attackers(view.game(), self.player_id, candidates)
    }

    fn choose_blockers(
        &mut self,
        view: &GameStateView,
        attackers: &[CardId],
        blockers: &[CardId],
    ) -> Vec<(CardId, CardId)> {
        self.combat_eval
            .declare_blockers(view.game(), attackers, blockers)
    }

    fn choose_search_target(&mut self, view: &GameStateView, candidates: &[CardId]) -> Option<CardId> {
        let planned = self.planned_search_targets();
        planned
            .into_iter()
            .find(|c| candidates.contains(c))
            .or_else(|| {
                // Without a plan, fetch the card worth most to us
                let game = view.game();
                candidates
                    .iter()
                    .copied()
                    .max_by_key(|&c| (self.combat_eval.score(c, game), std::cmp::Reverse(c)))
            })
    }

    fn choose_discard(&mut self, view: &GameStateView, hand: &[CardId], count: usize) -> Vec<CardId> {
        let game = view.game();
        let mut ranked: Vec<CardId> = hand.to_vec();
        ranked.sort_by_key(|&c| (self.combat_eval.score(c, game), c));
        ranked.truncate(count);
        ranked
    }

    fn on_game_end(&mut self, _view: &GameStateView, won: bool) {
        log_at!(
            self.logger,
            VerbosityLevel::Verbose,
            "search",
            "player {} {}: {} searches, {} reused decisions",
            self.player_id,
            if won { "won" } else { "lost" },
            self.searches,
            self.reused
        );
        self.clear_plan();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Step;

    fn quick_config() -> AiConfig {
        AiConfig {
            max_nodes: 300,
            max_think_ms: Some(2000),
            seed: Some(11),
            ..AiConfig::default()
        }
    }

    fn main_phase_game() -> GameState {
        let mut game = GameState::new_two_player("Alice", "Bob", 1);
        game.turn.turn_number = 3;
        game.turn.current_step = Step::Main1;
        game
    }

    #[test]
    fn test_bolt_goes_face_for_lethal() {
        let mut game = main_phase_game();
        let alice = PlayerId::new(0);
        let bob = PlayerId::new(1);
        game.add_card_to_battlefield(alice, "Mountain").unwrap();
        game.add_card_to_hand(alice, "Lightning Bolt").unwrap();
        game.get_player_mut(bob).unwrap().life = 3;

        let logger = GameLogger::capturing(VerbosityLevel::Silent);
        let mut ai = AiController::new(alice, quick_config(), logger).unwrap();
        let available = game.legal_actions_for(alice);
        let view = GameStateView::new(&game, alice);
        let chosen = ai.choose_action(&view, &available);
        assert!(matches!(
            chosen,
            Some(GameAction::CastSpell {
                target: Some(crate::core::TargetRef::Player(p)),
                ..
            }) if p == bob
        ));
        assert_eq!(ai.search_count(), 1);
    }

    #[test]
    fn test_passes_after_stack_action() {
        let mut game = main_phase_game();
        let alice = PlayerId::new(0);
        game.add_card_to_battlefield(alice, "Forest").unwrap();
        game.add_card_to_battlefield(alice, "Forest").unwrap();
        game.add_card_to_hand(alice, "Grizzly Bears").unwrap();

        let logger = GameLogger::capturing(VerbosityLevel::Silent);
        let mut ai = AiController::new(alice, quick_config(), logger).unwrap();
        assert!(ai.add_suggestion("cast:Grizzly Bears"));
        let available = game.legal_actions_for(alice);
        let action = {
            let view = GameStateView::new(&game, alice);
            ai.choose_action(&view, &available)
        };
        let Some(action) = action else {
            panic!("expected the bears to be cast");
        };
        assert!(action.uses_stack());
        game.apply_action(alice, &action).unwrap();

        let available = game.legal_actions_for(alice);
        let view = GameStateView::new(&game, alice);
        assert_eq!(ai.choose_action(&view, &available), None);
        assert_eq!(ai.search_count(), 0);
    }

    #[test]
    fn test_suggestion_taken_without_search() {
        let mut game = main_phase_game();
        let alice = PlayerId::new(0);
        let forest = game.add_card_to_hand(alice, "Forest").unwrap();
        game.add_card_to_hand(alice, "Mountain").unwrap();

        let logger = GameLogger::capturing(VerbosityLevel::Silent);
        let mut ai = AiController::new(alice, quick_config(), logger).unwrap();
        assert!(ai.add_suggestion("play:Forest"));
        let available = game.legal_actions_for(alice);
        let view = GameStateView::new(&game, alice);
        assert_eq!(
            ai.choose_action(&view, &available),
            Some(GameAction::PlayLand { card: forest })
        );
        assert_eq!(ai.search_count(), 0);
        assert!(ai.suggestions().is_empty());
    }

    #[test]
    fn test_discards_least_valuable() {
        let mut game = main_phase_game();
        let alice = PlayerId::new(0);
        let forest = game.add_card_to_hand(alice, "Forest").unwrap();
        game.add_card_to_hand(alice, "Colossal Dreadmaw").unwrap();
        game.add_card_to_hand(alice, "Serra Angel").unwrap();

        let logger = GameLogger::capturing(VerbosityLevel::Silent);
        let mut ai = AiController::new(alice, quick_config(), logger).unwrap();
        let hand = game.get_player_zones(alice).unwrap().hand.cards.clone();
        let view = GameStateView::new(&game, alice);
        assert_eq!(ai.choose_discard(&view, &hand, 1), vec![forest]);
    }

    /// A one-line plan: play the Forest, then cast the bears. Returns the
    /// controller holding it and the state right after the land drop.
    fn land_then_bears() -> (AiController, GameState, GameAction, NodeId) {
        let mut game = main_phase_game();
        let alice = PlayerId::new(0);
        game.add_card_to_battlefield(alice, "Forest").unwrap();
        let forest = game.add_card_to_hand(alice, "Forest").unwrap();
        let bears = game.add_card_to_hand(alice, "Grizzly Bears").unwrap();

        let play = GameAction::PlayLand { card: forest };
        let cast = GameAction::CastSpell {
            card: bears,
            target: None,
        };
        let mut after_land = game.clone();
        after_land.apply_action(alice, &play).unwrap();

        let mut tree = SimulationTree::new(game, alice, 4);
        let root = tree.root();
        let played = tree.add_child(root, after_land.clone(), alice, vec![play], 4);
        tree.node_mut(played).fingerprint = after_land.fingerprint();
        let casting = tree.add_child(played, after_land.clone(), alice, vec![cast.clone()], 3);

        let logger = GameLogger::capturing(VerbosityLevel::Silent);
        let mut ai = AiController::new(alice, quick_config(), logger).unwrap();
        ai.tree = Some(tree);
        ai.committed = Some(played);
        (ai, after_land, cast, casting)
    }

    #[test]
    fn test_continues_planned_line_without_searching() {
        let (mut ai, game, cast, casting) = land_then_bears();
        let alice = PlayerId::new(0);
        let available = game.legal_actions_for(alice);
        assert!(available.contains(&cast));

        let view = GameStateView::new(&game, alice);
        assert_eq!(ai.choose_action(&view, &available), Some(cast));
        assert_eq!(ai.reuse_count(), 1);
        assert_eq!(ai.search_count(), 0);
        assert_eq!(ai.committed, Some(casting));
        assert!(ai.tree.as_ref().is_some_and(|t| t.node(t.root()).parent.is_none()));
    }

    #[test]
    fn test_diverged_state_drops_planned_line() {
        let (mut ai, mut game, _, _) = land_then_bears();
        game.get_player_mut(PlayerId::new(1)).unwrap().life = 7;
        assert!(!ai.get_next_action(&game));
        assert_eq!(ai.reuse_count(), 0);
    }

    #[test]
    fn test_pending_suggestion_blocks_plan_reuse() {
        let (mut ai, game, _, _) = land_then_bears();
        assert!(ai.add_suggestion("cast:Lightning Bolt"));
        assert!(!ai.get_next_action(&game));
        assert_eq!(ai.reuse_count(), 0);
    }

    #[test]
    fn test_library_search_follows_planned_choice() {
        let mut game = main_phase_game();
        let (alice, bob) = (PlayerId::new(0), PlayerId::new(1));
        game.add_card_to_battlefield(alice, "Forest").unwrap();
        game.add_card_to_battlefield(alice, "Forest").unwrap();
        game.add_card_to_library(alice, "Forest").unwrap();
        game.add_card_to_library(alice, "Mountain").unwrap();
        let scrying = game.add_card_to_hand(alice, "Sylvan Scrying").unwrap();
        game.apply_action(
            alice,
            &GameAction::CastSpell {
                card: scrying,
                target: None,
            },
        )
        .unwrap();
        game.pass_priority(alice);
        game.pass_priority(bob);

        let logger = GameLogger::capturing(VerbosityLevel::Silent);
        let mut ai = AiController::new(alice, quick_config(), logger).unwrap();
        let available = game.legal_actions_for(alice);
        let view = GameStateView::new(&game, alice);
        ai.choose_action(&view, &available);
        assert_eq!(ai.search_count(), 1);

        let planned = ai.planned_search_targets();
        assert_eq!(planned.len(), 1);
        let (_, candidates) = game.pending_library_search().unwrap();
        assert_eq!(ai.choose_search_target(&view, &candidates), Some(planned[0]));
    }
}
