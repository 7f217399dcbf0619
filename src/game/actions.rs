//! Player actions: enumeration and application

use crate::ai::{ActionKey, ActionKind, SimAction};
use crate::core::{ActivatedAbility, CardId, PlayerId, TargetRef, TargetSpec};
use crate::game::mana_payment::compute_tap_order;
use crate::game::state::StackItem;
use crate::game::GameState;
use crate::core::ManaCost;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something a player can do while holding priority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    PlayLand {
        card: CardId,
    },
    CastSpell {
        card: CardId,
        target: Option<TargetRef>,
    },
    /// Non-mana activated ability; `discard` pays a discard cost
    ActivateAbility {
        card: CardId,
        ability: u8,
        target: Option<TargetRef>,
        discard: Option<CardId>,
    },
    TapForMana {
        card: CardId,
        ability: u8,
    },
    PassPriority,
}

fn target_key(target: Option<TargetRef>) -> Option<u32> {
    target.map(|t| match t {
        TargetRef::Player(p) => p.as_u32() << 1,
        TargetRef::Card(c) => (c.as_u32() << 1) | 1,
    })
}

impl SimAction for GameAction {
    fn kind(&self) -> ActionKind {
        match self {
            GameAction::PlayLand { .. } => ActionKind::Play,
            GameAction::CastSpell { .. } => ActionKind::Cast,
            GameAction::ActivateAbility { .. } => ActionKind::Activate,
            GameAction::TapForMana { .. } => ActionKind::Mana,
            GameAction::PassPriority => ActionKind::Pass,
        }
    }

    fn key(&self) -> ActionKey {
        let key = ActionKey::new(self.kind());
        match self {
            GameAction::PlayLand { card } => key.with(card.as_u32()),
            GameAction::CastSpell { card, target } => {
                key.with(card.as_u32()).with_opt(target_key(*target))
            }
            GameAction::ActivateAbility {
                card,
                ability,
                target,
                discard,
            } => key
                .with(card.as_u32())
                .with(*ability as u32)
                .with_opt(target_key(*target))
                .with_opt(discard.map(|d| d.as_u32())),
            GameAction::TapForMana { card, ability } => {
                key.with(card.as_u32()).with(*ability as u32)
            }
            GameAction::PassPriority => key,
        }
    }

    fn uses_stack(&self) -> bool {
        matches!(
            self,
            GameAction::CastSpell { .. } | GameAction::ActivateAbility { .. }
        )
    }

    fn pass() -> Self {
        GameAction::PassPriority
    }
}

impl fmt::Display for GameAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameAction::PlayLand { card } => write!(f, "play #{card}"),
            GameAction::CastSpell { card, target } => {
                write!(f, "cast #{card}")?;
                if let Some(t) = target {
                    write!(f, " targeting {t}")?;
                }
                Ok(())
            }
            GameAction::ActivateAbility {
                card,
                ability,
                target,
                discard,
            } => {
                write!(f, "activate #{card}:{ability}")?;
                if let Some(d) = discard {
                    write!(f, " discarding #{d}")?;
                }
                if let Some(t) = target {
                    write!(f, " targeting {t}")?;
                }
                Ok(())
            }
            GameAction::TapForMana { card, .. } => write!(f, "tap #{card} for mana"),
            GameAction::PassPriority => write!(f, "pass"),
        }
    }
}

impl GameState {
    /// Active player's main phase with an empty stack
    pub fn has_sorcery_timing(&self, player: PlayerId) -> bool {
        self.active_player() == player && self.current_step().is_main() && self.stack.is_empty()
    }

    /// Targets matching `spec`; `[None]` for untargeted effects
    pub fn targets_for(&self, spec: TargetSpec) -> Vec<Option<TargetRef>> {
        let players = self.player_ids().map(|p| Some(TargetRef::Player(p)));
        let creatures = self
            .battlefield
            .iter()
            .filter(|&c| self.card(c).is_ok_and(|card| card.is_creature()))
            .map(|c| Some(TargetRef::Card(c)));
        match spec {
            TargetSpec::None => vec![None],
            TargetSpec::Any => players.chain(creatures).collect(),
            TargetSpec::Creature => creatures.collect(),
            TargetSpec::Player => players.collect(),
        }
    }

    fn ability_targets(&self, ability: &ActivatedAbility, controller: PlayerId) -> Vec<Option<TargetRef>> {
        let mut targets = self.targets_for(ability.target);
        if ability.is_equip() {
            // Equip only onto your own creatures
            targets.retain(|t| match t {
                Some(TargetRef::Card(c)) => self.card(*c).is_ok_and(|card| card.controller == controller),
                _ => false,
            });
        }
        targets
    }

    pub fn is_legal_target(&self, spec: TargetSpec, target: Option<TargetRef>) -> bool {
        match (spec, target) {
            (TargetSpec::None, None) => true,
            (TargetSpec::None, Some(_)) | (_, None) => false,
            (spec, Some(t)) => self.targets_for(spec).contains(&Some(t)),
        }
    }

    /// Can `player` pay `cost` from their pool plus untapped sources,
    /// leaving `exclude` untapped
    pub fn can_afford(&self, player: PlayerId, cost: &ManaCost, exclude: Option<CardId>) -> bool {
        let Ok(p) = self.get_player(player) else {
            return false;
        };
        if p.mana_pool.can_pay(cost) {
            return true;
        }
        let sources: Vec<_> = self
            .mana_sources(player)
            .into_iter()
            .filter(|s| Some(s.card_id) != exclude)
            .collect();
        compute_tap_order(cost, &p.mana_pool, &sources).is_some()
    }

    fn pay_mana(&mut self, player: PlayerId, cost: &ManaCost, exclude: Option<CardId>) -> Result<()> {
        let sources: Vec<_> = self
            .mana_sources(player)
            .into_iter()
            .filter(|s| Some(s.card_id) != exclude)
            .collect();
        let pool = self.get_player(player)?.mana_pool;
        let taps = compute_tap_order(cost, &pool, &sources)
            .ok_or_else(|| MtgError::InvalidAction(format!("cannot pay {cost}")))?;
        for source in taps {
            self.card_mut(source.card_id)?.tap();
            self.get_player_mut(player)?
                .mana_pool
                .add(source.color, source.amount);
        }
        if !self.get_player_mut(player)?.mana_pool.pay(cost) {
            return Err(MtgError::InvalidAction(format!("cannot pay {cost}")));
        }
        Ok(())
    }

    /// Every action `player` could take now, pass last
    pub fn legal_actions_for(&self, player: PlayerId) -> Vec<GameAction> {
        let mut actions = Vec::new();
        if self.is_game_over() || self.turn.priority_player != player {
            actions.push(GameAction::PassPriority);
            return actions;
        }
        let sorcery_timing = self.has_sorcery_timing(player);
        let turn = self.turn.turn_number;
        let can_play_land = self.get_player(player).is_ok_and(|p| p.can_play_land());
        let hand: Vec<CardId> = self
            .get_player_zones(player)
            .map(|z| z.hand.cards.clone())
            .unwrap_or_default();

        for &card_id in &hand {
            let Ok(card) = self.card(card_id) else { continue };
            if card.is_land() {
                if sorcery_timing && can_play_land {
                    actions.push(GameAction::PlayLand { card: card_id });
                }
                continue;
            }
            if !(card.is_instant() || sorcery_timing) || !self.can_afford(player, &card.mana_cost, None) {
                continue;
            }
            for target in self.targets_for(card.spell_target) {
                actions.push(GameAction::CastSpell {
                    card: card_id,
                    target,
                });
            }
        }

        for permanent in self.permanents_of(player) {
            for (idx, ability) in permanent.abilities.iter().enumerate() {
                if ability.is_mana_ability() {
                    continue;
                }
                if ability.sorcery_speed && !sorcery_timing {
                    continue;
                }
                if ability.cost.tap && (permanent.tapped || permanent.is_summoning_sick(turn)) {
                    continue;
                }
                let exclude = ability.cost.tap.then_some(permanent.id);
                if !self.can_afford(player, &ability.cost.mana, exclude) {
                    continue;
                }
                let discards: Vec<Option<CardId>> = if ability.cost.discard {
                    hand.iter().map(|&c| Some(c)).collect()
                } else {
                    vec![None]
                };
                for target in self.ability_targets(ability, player) {
                    for &discard in &discards {
                        actions.push(GameAction::ActivateAbility {
                            card: permanent.id,
                            ability: idx as u8,
                            target,
                            discard,
                        });
                    }
                }
            }
        }

        // Tapping one source of a color is as good as tapping another
        let mut seen = Vec::new();
        for source in self.mana_sources(player) {
            if !seen.contains(&source.color) {
                seen.push(source.color);
                actions.push(GameAction::TapForMana {
                    card: source.card_id,
                    ability: source.ability,
                });
            }
        }

        actions.push(GameAction::PassPriority);
        actions
    }

    /// Apply an action for `player`. Anything but a pass requires priority
    /// and resets the passed flags.
    pub fn apply_action(&mut self, player: PlayerId, action: &GameAction) -> Result<()> {
        if let GameAction::PassPriority = action {
            self.pass_priority(player);
            return Ok(());
        }
        if self.turn.priority_player != player || self.is_game_over() {
            return Err(MtgError::InvalidAction(format!(
                "player {player} does not hold priority"
            )));
        }
        match *action {
            GameAction::PlayLand { card } => self.play_land(player, card)?,
            GameAction::CastSpell { card, target } => self.cast_spell(player, card, target)?,
            GameAction::ActivateAbility {
                card,
                ability,
                target,
                discard,
            } => self.activate_ability(player, card, ability, target, discard)?,
            GameAction::TapForMana { card, ability } => self.tap_for_mana(player, card, ability)?,
            GameAction::PassPriority => {}
        }
        self.reset_passes();
        Ok(())
    }

    pub fn play_land(&mut self, player: PlayerId, card_id: CardId) -> Result<()> {
        if !self.has_sorcery_timing(player) || !self.get_player(player)?.can_play_land() {
            return Err(MtgError::InvalidAction("cannot play a land now".to_string()));
        }
        if !self.card(card_id)?.is_land() || !self.is_in_hand(player, card_id) {
            return Err(MtgError::InvalidAction("not a land in hand".to_string()));
        }
        self.put_onto_battlefield(card_id, player)?;
        self.get_player_mut(player)?.play_land();
        Ok(())
    }

    pub fn cast_spell(&mut self, player: PlayerId, card_id: CardId, target: Option<TargetRef>) -> Result<()> {
        let card = self.card(card_id)?;
        if card.is_land() || !self.is_in_hand(player, card_id) {
            return Err(MtgError::InvalidAction("not a spell in hand".to_string()));
        }
        if !card.is_instant() && !self.has_sorcery_timing(player) {
            return Err(MtgError::InvalidAction("sorcery timing required".to_string()));
        }
        if !self.is_legal_target(card.spell_target, target) {
            return Err(MtgError::InvalidAction("illegal target".to_string()));
        }
        let cost = card.mana_cost;
        let effects = card.spell_effects.clone();
        self.pay_mana(player, &cost, None)?;
        self.get_player_zones_mut(player)?.hand.remove(card_id);
        self.stack.push(StackItem {
            source: card_id,
            controller: player,
            is_spell: true,
            effects,
            target,
            search_choice: None,
        });
        Ok(())
    }

    pub fn activate_ability(
        &mut self,
        player: PlayerId,
        card_id: CardId,
        index: u8,
        target: Option<TargetRef>,
        discard: Option<CardId>,
    ) -> Result<()> {
        let turn = self.turn.turn_number;
        let sorcery_timing = self.has_sorcery_timing(player);
        let card = self.card(card_id)?;
        if card.controller != player || !self.is_on_battlefield(card_id) {
            return Err(MtgError::InvalidAction("not your permanent".to_string()));
        }
        let ability = card
            .abilities
            .get(index as usize)
            .filter(|a| !a.is_mana_ability())
            .ok_or_else(|| MtgError::InvalidAction(format!("no ability {index} on #{card_id}")))?
            .clone();
        if ability.sorcery_speed && !sorcery_timing {
            return Err(MtgError::InvalidAction("sorcery timing required".to_string()));
        }
        if ability.cost.tap && (card.tapped || card.is_summoning_sick(turn)) {
            return Err(MtgError::InvalidAction("cannot tap".to_string()));
        }
        match (ability.cost.discard, discard) {
            (true, Some(d)) if self.is_in_hand(player, d) => {}
            (false, None) => {}
            _ => return Err(MtgError::InvalidAction("bad discard".to_string())),
        }
        if !self.ability_targets(&ability, player).contains(&target) {
            return Err(MtgError::InvalidAction("illegal target".to_string()));
        }

        let exclude = ability.cost.tap.then_some(card_id);
        self.pay_mana(player, &ability.cost.mana, exclude)?;
        if ability.cost.tap {
            self.card_mut(card_id)?.tap();
        }
        if let Some(d) = discard {
            self.put_into_graveyard(d)?;
        }
        self.stack.push(StackItem {
            source: card_id,
            controller: player,
            is_spell: false,
            effects: ability.effects.clone(),
            target,
            search_choice: None,
        });
        Ok(())
    }

    pub fn tap_for_mana(&mut self, player: PlayerId, card_id: CardId, index: u8) -> Result<()> {
        let source = self
            .mana_sources(player)
            .into_iter()
            .find(|s| s.card_id == card_id && s.ability == index)
            .ok_or_else(|| MtgError::InvalidAction(format!("#{card_id} cannot produce mana")))?;
        self.card_mut(card_id)?.tap();
        self.get_player_mut(player)?
            .mana_pool
            .add(source.color, source.amount);
        Ok(())
    }

    /// Human-readable action text with card names
    pub fn describe_action(&self, action: &GameAction) -> String {
        let name = |id: CardId| {
            self.card(id)
                .map(|c| c.name.clone())
                .unwrap_or_else(|_| format!("#{id}"))
        };
        let target_text = |t: &Option<TargetRef>| match t {
            Some(TargetRef::Card(c)) => format!(" targeting {}", name(*c)),
            Some(TargetRef::Player(p)) => {
                let who = self
                    .get_player(*p)
                    .map(|pl| pl.name.clone())
                    .unwrap_or_else(|_| format!("player {p}"));
                format!(" targeting {who}")
            }
            None => String::new(),
        };
        match action {
            GameAction::PlayLand { card } => format!("play {}", name(*card)),
            GameAction::CastSpell { card, target } => {
                format!("cast {}{}", name(*card), target_text(target))
            }
            GameAction::ActivateAbility {
                card,
                target,
                discard,
                ..
            } => {
                let discard_text = discard
                    .map(|d| format!(" discarding {}", name(d)))
                    .unwrap_or_default();
                format!("activate {}{}{}", name(*card), discard_text, target_text(target))
            }
            GameAction::TapForMana { card, .. } => format!("tap {} for mana", name(*card)),
            GameAction::PassPriority => "pass".to_string(),
        }
    }
}
