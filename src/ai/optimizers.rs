//! Candidate action pruning and ordering before the search explores them
//!
//! Each [`TreeOptimizer`] may drop candidates that are never worth
//! simulating and may mark candidates to try early. [`ActionOptimizer`]
//! runs them in a fixed sequence and then applies a deterministic total
//! order: pass last, lands before spells before everything else, preferred
//! candidates first within their group, ties by [`ActionKey`].

use crate::ai::combat::CombatEvaluator;
use crate::ai::{RulesEngine, SimAction};
use crate::core::{ActivatedAbility, CardId, Effect, PlayerId, TargetRef};
use crate::game::{GameAction, GameState};
use std::cmp::Reverse;

pub trait TreeOptimizer<G: RulesEngine>: Send + 'static {
    fn name(&self) -> &'static str;

    /// Remove candidates that are never worth exploring. Must keep the pass.
    fn filter(&self, _state: &G, _player: PlayerId, _actions: &mut Vec<G::Action>) {}

    /// Higher values are explored earlier within the same action group
    fn preference(&self, _state: &G, _action: &G::Action) -> u8 {
        0
    }
}

/// Fixed optimizer sequence followed by the final sort
pub struct ActionOptimizer<G: RulesEngine> {
    optimizers: Vec<Box<dyn TreeOptimizer<G>>>,
}

impl<G: RulesEngine> Default for ActionOptimizer<G> {
    fn default() -> Self {
        ActionOptimizer {
            optimizers: Vec::new(),
        }
    }
}

impl<G: RulesEngine> ActionOptimizer<G> {
    /// Sort only
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, optimizer: impl TreeOptimizer<G>) -> Self {
        self.optimizers.push(Box::new(optimizer));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.optimizers.iter().map(|o| o.name()).collect()
    }

    pub fn optimize(&self, state: &G, player: PlayerId, actions: &mut Vec<G::Action>) {
        for optimizer in &self.optimizers {
            optimizer.filter(state, player, actions);
        }
        if !actions.iter().any(|a| a.is_pass()) {
            actions.push(G::Action::pass());
        }
        actions.sort_by_cached_key(|action| {
            let preference = self
                .optimizers
                .iter()
                .map(|o| o.preference(state, action))
                .max()
                .unwrap_or(0);
            (action.kind().order_rank(), Reverse(preference), action.key())
        });
    }
}

impl ActionOptimizer<GameState> {
    /// The full pipeline for the reference rules engine
    pub fn standard() -> Self {
        ActionOptimizer::new()
            .with(LevelUpOptimizer)
            .with(EquipOptimizer)
            .with(DiscardOptimizer::default())
            .with(OutcomeOptimizer)
    }
}

fn activated(state: &GameState, action: &GameAction) -> Option<(CardId, ActivatedAbility)> {
    match action {
        GameAction::ActivateAbility { card, ability, .. } => state
            .card(*card)
            .ok()
            .and_then(|c| c.abilities.get(*ability as usize).cloned())
            .map(|a| (*card, a)),
        _ => None,
    }
}

/// Level up what can still level, never what is maxed out
pub struct LevelUpOptimizer;

impl TreeOptimizer<GameState> for LevelUpOptimizer {
    fn name(&self) -> &'static str {
        "level-up"
    }

    fn filter(&self, state: &GameState, _player: PlayerId, actions: &mut Vec<GameAction>) {
        actions.retain(|action| match activated(state, action) {
            Some((card, ability)) if ability.is_level_up() => {
                state.card(card).is_ok_and(|c| !c.at_max_level())
            }
            _ => true,
        });
    }

    fn preference(&self, state: &GameState, action: &GameAction) -> u8 {
        match activated(state, action) {
            Some((_, ability)) if ability.is_level_up() => 2,
            _ => 0,
        }
    }
}

/// Equip early, but never onto the creature already carrying the equipment
pub struct EquipOptimizer;

impl TreeOptimizer<GameState> for EquipOptimizer {
    fn name(&self) -> &'static str {
        "equip"
    }

    fn filter(&self, state: &GameState, _player: PlayerId, actions: &mut Vec<GameAction>) {
        actions.retain(|action| {
            let GameAction::ActivateAbility { card, target, .. } = action else {
                return true;
            };
            let Some((_, ability)) = activated(state, action) else {
                return true;
            };
            if !ability.is_equip() {
                return true;
            }
            let host = state.card(*card).ok().and_then(|c| c.attached_to);
            !matches!((host, target), (Some(h), Some(TargetRef::Card(t))) if h == *t)
        });
    }

    fn preference(&self, state: &GameState, action: &GameAction) -> u8 {
        match activated(state, action) {
            Some((_, ability)) if ability.is_equip() => 1,
            _ => 0,
        }
    }
}

/// Among activations that differ only in the discarded card, keep those
/// discarding the least valuable card
#[derive(Default)]
pub struct DiscardOptimizer {
    values: CombatEvaluator,
}

impl TreeOptimizer<GameState> for DiscardOptimizer {
    fn name(&self) -> &'static str {
        "discard"
    }

    fn filter(&self, state: &GameState, _player: PlayerId, actions: &mut Vec<GameAction>) {
        type Variant = (CardId, u8, Option<TargetRef>);
        let mut cheapest: Vec<(Variant, i32)> = Vec::new();
        for action in actions.iter() {
            if let GameAction::ActivateAbility {
                card,
                ability,
                target,
                discard: Some(discard),
            } = action
            {
                let value = self.values.score(*discard, state);
                let variant = (*card, *ability, *target);
                match cheapest.iter_mut().find(|(v, _)| *v == variant) {
                    Some((_, best)) => *best = (*best).min(value),
                    None => cheapest.push((variant, value)),
                }
            }
        }
        if cheapest.is_empty() {
            return;
        }
        actions.retain(|action| match action {
            GameAction::ActivateAbility {
                card,
                ability,
                target,
                discard: Some(discard),
            } => {
                let variant = (*card, *ability, *target);
                let value = self.values.score(*discard, state);
                cheapest
                    .iter()
                    .any(|(v, best)| *v == variant && value <= *best)
            }
            _ => true,
        });
    }
}

/// Drop actions that hurt their own controller: damage aimed at oneself or
/// one's own permanents, pumps aimed at an opponent's creature
pub struct OutcomeOptimizer;

impl OutcomeOptimizer {
    fn effects_and_target(
        state: &GameState,
        action: &GameAction,
    ) -> Option<(Vec<Effect>, TargetRef)> {
        match action {
            GameAction::CastSpell {
                card,
                target: Some(target),
            } => state
                .card(*card)
                .ok()
                .map(|c| (c.spell_effects.to_vec(), *target)),
            GameAction::ActivateAbility {
                target: Some(target),
                ..
            } => activated(state, action).map(|(_, a)| (a.effects.to_vec(), *target)),
            _ => None,
        }
    }

    fn is_self_harming(state: &GameState, player: PlayerId, action: &GameAction) -> bool {
        let Some((effects, target)) = Self::effects_and_target(state, action) else {
            return false;
        };
        let target_is_ours = match target {
            TargetRef::Player(p) => p == player,
            TargetRef::Card(c) => state.card(c).is_ok_and(|card| card.controller == player),
        };
        effects
            .iter()
            .any(|e| (e.is_harmful() && target_is_ours) || (e.is_beneficial() && !target_is_ours))
    }
}

impl TreeOptimizer<GameState> for OutcomeOptimizer {
    fn name(&self) -> &'static str {
        "outcome"
    }

    fn filter(&self, state: &GameState, player: PlayerId, actions: &mut Vec<GameAction>) {
        actions.retain(|action| !Self::is_self_harming(state, player, action));
    }
}
