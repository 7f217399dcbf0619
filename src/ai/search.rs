//! Depth- and node-bounded minimax search with alpha-beta pruning
//!
//! The driver grows a [`SimulationTree`] by simulating priority windows:
//! every legal action of the player holding priority is applied to a
//! private clone of the node's state, and the resulting child is scored
//! recursively. Scores are always from the root player's perspective: the
//! side holding priority maximizes when it is that player, minimizes
//! otherwise. After a node is scored its children are cut down to the best
//! one, so the chosen line can be read back by following first children.

use crate::ai::context::SearchContext;
use crate::ai::evaluator::{StateEvaluator, LOSE, WIN};
use crate::ai::node::{NodeId, SimulationTree};
use crate::ai::optimizers::ActionOptimizer;
use crate::ai::{RulesEngine, SimAction};
use crate::core::PlayerId;
use crate::game::{GameLogger, VerbosityLevel};
use crate::log_at;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;

/// Per-node diagnostics, compiled out without the verbose-logging feature
macro_rules! trace_search {
    ($self:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            log_at!($self.logger, VerbosityLevel::Trace, "search", $($arg)*);
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$self;
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSettings {
    /// Depth of the root; also how the root is recognized
    pub max_depth: i32,
    /// Subtracted from a pass at the root
    pub passivity_penalty: i32,
    /// Seed for the root tie-break; entropy when absent
    pub seed: Option<u64>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        SearchSettings {
            max_depth: 4,
            passivity_penalty: 5,
            seed: None,
        }
    }
}

pub struct SearchDriver<G: RulesEngine, E: StateEvaluator<G>> {
    evaluator: E,
    optimizer: ActionOptimizer<G>,
    perspective: PlayerId,
    settings: SearchSettings,
    rng: ChaCha12Rng,
    logger: GameLogger,
    /// Evaluation of the root state, taken when a search starts
    root_score: i32,
}

impl<G: RulesEngine, E: StateEvaluator<G>> SearchDriver<G, E> {
    pub fn new(
        evaluator: E,
        optimizer: ActionOptimizer<G>,
        perspective: PlayerId,
        settings: SearchSettings,
        logger: GameLogger,
    ) -> Self {
        let rng = match settings.seed {
            Some(seed) => ChaCha12Rng::seed_from_u64(seed),
            None => ChaCha12Rng::from_entropy(),
        };
        SearchDriver {
            evaluator,
            optimizer,
            perspective,
            settings,
            rng,
            logger,
            root_score: 0,
        }
    }

    pub fn perspective(&self) -> PlayerId {
        self.perspective
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Score the tree's root to `max_depth`, leaving the best line as the
    /// root's first-child chain
    pub fn search(&mut self, tree: &mut SimulationTree<G>, ctx: &mut SearchContext) -> i32 {
        let root = tree.root();
        let Some(state) = tree.state(root) else {
            self.logger
                .log(VerbosityLevel::Verbose, "search", "root has no state, nothing to search");
            return 0;
        };
        self.root_score = self.evaluator.evaluate(self.perspective, state);
        let score = self.expand_and_score(
            tree,
            ctx,
            root,
            self.settings.max_depth,
            i32::MIN,
            i32::MAX,
        );
        log_at!(
            self.logger,
            VerbosityLevel::Verbose,
            "search",
            "search done: score {} (start {}), {} nodes, {} repeats pruned, {} cutoffs",
            score,
            self.root_score,
            ctx.stats.nodes,
            ctx.stats.repeats_pruned,
            ctx.stats.cutoffs
        );
        score
    }

    fn evaluate_node(&self, tree: &SimulationTree<G>, id: NodeId) -> i32 {
        match tree.state(id) {
            Some(state) => self.evaluator.evaluate(self.perspective, state),
            None => tree.node(id).score.unwrap_or(0),
        }
    }

    fn add_child(
        &self,
        tree: &mut SimulationTree<G>,
        ctx: &mut SearchContext,
        parent: NodeId,
        state: G,
        acting_player: PlayerId,
        actions: Vec<G::Action>,
        depth: i32,
    ) -> NodeId {
        let combat = state.combat_snapshot();
        let child = tree.add_child(parent, state, acting_player, actions, depth);
        tree.node_mut(child).combat = combat;
        ctx.count_node();
        child
    }

    /// Score `id`: evaluate at a cutoff, otherwise resolve or expand
    pub fn expand_and_score(
        &mut self,
        tree: &mut SimulationTree<G>,
        ctx: &mut SearchContext,
        id: NodeId,
        depth: i32,
        alpha: i32,
        beta: i32,
    ) -> i32 {
        if ctx.is_cancelled() {
            trace_search!(self, "cancelled at {id}, evaluating in place");
            return self.evaluate_node(tree, id);
        }
        let Some(state) = tree.state(id) else {
            return tree.node(id).score.unwrap_or(0);
        };

        let val = if depth <= 0 || ctx.over_budget() || state.is_over() {
            ctx.stats.cutoffs += 1;
            let val = self.evaluator.evaluate(self.perspective, state);
            trace_search!(self, "end state {id} at depth {depth} <{val}>");
            val
        } else if !tree.node(id).children.is_empty() {
            self.minimax(tree, ctx, id, depth - 1, alpha, beta)
        } else {
            let mut step_finished = false;
            if state.all_passed() {
                if state.stack_is_empty() {
                    step_finished = true;
                } else {
                    self.resolve(tree, ctx, id, depth);
                }
            }

            let Some(state) = tree.state(id) else {
                return 0;
            };
            if state.is_over() {
                self.evaluator.evaluate(self.perspective, state)
            } else if step_finished {
                let val = self.evaluator.evaluate(self.perspective, state);
                // Only a step on the controlled player's own turn is abandoned
                if state.active_player() == self.perspective && val < self.root_score {
                    trace_search!(self, "step ends below the starting score <{val}>, abandoning");
                }
                val
            } else if !tree.node(id).children.is_empty() {
                self.minimax(tree, ctx, id, depth - 1, alpha, beta)
            } else {
                self.simulate_priority(tree, ctx, id, depth, alpha, beta)
            }
        };

        tree.node_mut(id).score = Some(val);
        val
    }

    /// Alpha-beta over existing children, keeping only the best one
    pub fn minimax(
        &mut self,
        tree: &mut SimulationTree<G>,
        ctx: &mut SearchContext,
        id: NodeId,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
    ) -> i32 {
        let maximizing = match tree.state(id) {
            Some(state) => state.priority_player() == self.perspective,
            None => tree.node(id).acting_player == self.perspective,
        };
        let children = tree.node(id).children.clone();
        let mut best = None;

        for child in children {
            if alpha >= beta || ctx.over_budget() {
                break;
            }
            let child_combat = tree.node(child).combat.clone();
            let val = self.expand_and_score(tree, ctx, child, depth - 1, alpha, beta);
            let improved = if maximizing { val > alpha } else { val < beta };
            if improved {
                if maximizing {
                    alpha = val;
                } else {
                    beta = val;
                }
                best = Some(child);
                let node = tree.node_mut(id);
                if node.combat.is_none() {
                    node.combat = child_combat;
                }
            }
            tree.release_state(child);
            if (maximizing && val == WIN) || (!maximizing && val == LOSE) {
                break;
            }
        }

        tree.retain_only(id, best);
        if maximizing {
            alpha
        } else {
            beta
        }
    }

    /// All players passed with something on the stack: resolve the top
    /// object, or fan out one child per card when it is the controlled
    /// player's library search with no card chosen yet
    fn resolve(&mut self, tree: &mut SimulationTree<G>, ctx: &mut SearchContext, id: NodeId, depth: i32) {
        let Some(state) = tree.state(id) else { return };
        if let Some(search) = state.pending_search() {
            if search.controller == self.perspective {
                let base = state.clone();
                let mut fanned_out = false;
                for card in search.candidates {
                    let mut sim = base.clone();
                    if !sim.choose_search_target(card) {
                        continue;
                    }
                    let child = self.add_child(tree, ctx, id, sim, search.controller, Vec::new(), depth);
                    tree.node_mut(child).search_targets.push(card);
                    fanned_out = true;
                    trace_search!(self, "search choice {card} as {child}");
                }
                if fanned_out {
                    return;
                }
            }
        }
        if let Some(state) = tree.state_mut(id) {
            state.resolve_top();
        }
    }

    /// Pass for whoever holds priority and each next player until the
    /// controlled player would get it back
    fn pass_round(&self, sim: &mut G) {
        let start = sim.priority_player();
        let mut next = start;
        loop {
            sim.pass_priority(next);
            next = sim.next_player(next);
            if next == self.perspective || next == start {
                break;
            }
        }
    }

    /// Expand every legal action of the player holding priority
    pub fn simulate_priority(
        &mut self,
        tree: &mut SimulationTree<G>,
        ctx: &mut SearchContext,
        id: NodeId,
        depth: i32,
        mut alpha: i32,
        mut beta: i32,
    ) -> i32 {
        if ctx.is_cancelled() {
            return self.evaluate_node(tree, id);
        }
        let Some(base) = tree.state(id).cloned() else {
            return tree.node(id).score.unwrap_or(0);
        };
        tree.node_mut(id).fingerprint = base.fingerprint();

        let current = base.priority_player();
        let mut actions = base.legal_actions(current);
        self.optimizer.optimize(&base, current, &mut actions);

        let at_root = depth == self.settings.max_depth;
        let maximizing = current == self.perspective;
        if at_root {
            log_at!(
                self.logger,
                VerbosityLevel::Verbose,
                "search",
                "candidate actions ({}): {}",
                actions.len(),
                actions
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        let mut best: Option<NodeId> = None;
        for (counter, action) in actions.into_iter().enumerate() {
            if ctx.is_cancelled() {
                trace_search!(self, "priority [{depth}] interrupted");
                break;
            }
            let mut sim = base.clone();
            if !sim.apply(current, &action) {
                ctx.stats.failed_actions += 1;
                continue;
            }
            sim.check_state();
            if self.is_repeated_action(tree, id, &sim, &action, current) {
                ctx.stats.repeats_pruned += 1;
                trace_search!(self, "priority [{depth}] repeated action {action}, skipped");
                continue;
            }
            if !sim.is_over() && action.uses_stack() {
                self.pass_round(&mut sim);
            }

            let is_pass = action.is_pass();
            let child = self.add_child(tree, ctx, id, sim, current, vec![action], depth);
            let mut val = if is_pass {
                // Passing changes nothing worth simulating further
                self.evaluate_node(tree, child)
            } else {
                self.expand_and_score(tree, ctx, child, depth - 1, alpha, beta)
            };
            trace_search!(self, "priority [{depth}] #{} {child} <{val}>", counter + 1);

            if maximizing {
                if at_root && is_pass {
                    val -= self.settings.passivity_penalty;
                }
                // Equal root candidates are picked at random now and then
                if val > alpha || (at_root && val == alpha && self.rng.gen_bool(0.5)) {
                    alpha = val;
                    best = Some(child);
                    self.adopt_best(tree, child, val);
                    if at_root {
                        tree.retain_only(id, Some(child));
                        tree.node_mut(id).score = Some(val);
                        log_at!(
                            self.logger,
                            VerbosityLevel::Verbose,
                            "search",
                            "best so far <{}> {}",
                            val,
                            self.describe_line(tree, child)
                        );
                    }
                }
                tree.release_state(child);
                if val == WIN {
                    break;
                }
            } else {
                if val < beta {
                    beta = val;
                    best = Some(child);
                    self.adopt_best(tree, child, val);
                }
                tree.release_state(child);
                if val == LOSE {
                    break;
                }
            }
            if alpha >= beta || ctx.over_budget() {
                break;
            }
        }

        if at_root {
            log_at!(
                self.logger,
                VerbosityLevel::Verbose,
                "search",
                "priority at max depth done, {} nodes",
                ctx.node_count()
            );
        }
        tree.retain_only(id, best);
        if let Some(best) = best {
            tree.node_mut(id).score = tree.node(best).score;
        }
        if maximizing {
            alpha
        } else {
            beta
        }
    }

    /// Record the score of a new best child and lift the combat planned
    /// right below it
    fn adopt_best(&self, tree: &mut SimulationTree<G>, child: NodeId, val: i32) {
        let below = tree
            .best_child(child)
            .and_then(|grandchild| tree.node(grandchild).combat.clone());
        let node = tree.node_mut(child);
        node.score = Some(val);
        if below.is_some() {
            node.combat = below;
        }
    }

    /// Same actor, same single action, and no better than when it was
    /// taken the first time. Passing, spells and mana actions may repeat.
    pub fn is_repeated_action(
        &self,
        tree: &SimulationTree<G>,
        id: NodeId,
        sim: &G,
        action: &G::Action,
        actor: PlayerId,
    ) -> bool {
        if action.is_pass() || action.is_spell() || action.is_mana() {
            return false;
        }
        let new_val = self.evaluator.evaluate(actor, sim);
        let key = action.key();
        for ancestor in tree.ancestors(id) {
            let node = tree.node(ancestor);
            if node.acting_player != actor || node.parent.is_none() {
                continue;
            }
            let Some(previous) = node.single_action() else {
                continue;
            };
            if previous.key() != key {
                continue;
            }
            if let Some(state) = node.state() {
                if self.evaluator.evaluate(actor, state) >= new_val {
                    return true;
                }
            }
        }
        false
    }

    /// Actions along the committed line below `from`, for logging
    pub fn describe_line(&self, tree: &SimulationTree<G>, from: NodeId) -> String {
        let mut parts: Vec<String> = tree.node(from).actions.iter().map(|a| a.to_string()).collect();
        for id in tree.spine(from) {
            let node = tree.node(id);
            if !node.actions.is_empty() {
                let actions: Vec<String> = node.actions.iter().map(|a| a.to_string()).collect();
                parts.push(format!("[{}] {}", node.depth, actions.join(", ")));
            }
        }
        parts.join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CardId;
    use crate::game::{GameAction, GameState, GameStateEvaluator, Step};

    /// Sylvan Scrying on the stack with both players passed
    fn scrying_resolving() -> (GameState, Vec<CardId>) {
        let mut game = GameState::new_two_player("Alice", "Bob", 1);
        game.turn.turn_number = 3;
        game.turn.current_step = Step::Main1;
        let (alice, bob) = (PlayerId::new(0), PlayerId::new(1));
        game.add_card_to_battlefield(alice, "Forest").unwrap();
        game.add_card_to_battlefield(alice, "Forest").unwrap();
        game.add_card_to_library(alice, "Forest").unwrap();
        game.add_card_to_library(alice, "Forest").unwrap();
        game.add_card_to_library(alice, "Mountain").unwrap();
        let scrying = game.add_card_to_hand(alice, "Sylvan Scrying").unwrap();
        game.apply_action(alice, &GameAction::CastSpell { card: scrying, target: None })
            .unwrap();
        game.pass_priority(alice);
        game.pass_priority(bob);
        let (_, candidates) = game.pending_library_search().unwrap();
        (game, candidates)
    }

    fn driver_for(player: PlayerId, max_depth: i32) -> SearchDriver<GameState, GameStateEvaluator> {
        SearchDriver::new(
            GameStateEvaluator::new(),
            ActionOptimizer::standard(),
            player,
            SearchSettings {
                max_depth,
                passivity_penalty: 5,
                seed: Some(3),
            },
            GameLogger::with_verbosity(VerbosityLevel::Silent),
        )
    }

    #[test]
    fn test_own_library_search_fans_out_per_candidate() {
        let (game, candidates) = scrying_resolving();
        assert_eq!(candidates.len(), 2);
        let alice = PlayerId::new(0);

        let mut tree = SimulationTree::new(game, alice, 2);
        let mut ctx = SearchContext::unbounded();
        driver_for(alice, 2).search(&mut tree, &mut ctx);

        assert_eq!(ctx.node_count(), candidates.len());
        let root = tree.root();
        assert_eq!(tree.node(root).children.len(), 1);
        let chosen = tree.best_child(root).unwrap();
        let node = tree.node(chosen);
        assert_eq!(node.acting_player, alice);
        assert!(node.actions.is_empty());
        assert_eq!(node.search_targets.len(), 1);
        assert!(candidates.contains(&node.search_targets[0]));
    }

    #[test]
    fn test_opponent_library_search_resolves_in_place() {
        let (game, _) = scrying_resolving();
        let bob = PlayerId::new(1);

        let mut tree = SimulationTree::new(game, bob, 2);
        let mut ctx = SearchContext::unbounded();
        driver_for(bob, 2).search(&mut tree, &mut ctx);

        let root = tree.root();
        assert!(tree.state(root).is_some_and(|s| s.stack.is_empty()));
        for id in tree.spine(root) {
            assert!(tree.node(id).search_targets.is_empty());
        }
    }
}
