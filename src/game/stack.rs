//! Stack resolution

use crate::core::{CardId, Effect, PlayerId, SearchFilter, TargetRef};
use crate::game::state::StackItem;
use crate::game::GameState;
use crate::Result;

impl GameState {
    /// Library cards a search effect of `controller` may find. Cards with
    /// the same name are interchangeable, so only the first of each name
    /// is offered.
    pub fn search_candidates(&self, controller: PlayerId, filter: SearchFilter) -> Vec<CardId> {
        let Ok(zones) = self.get_player_zones(controller) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = Vec::new();
        let mut found = Vec::new();
        for id in zones.library.iter() {
            let Ok(card) = self.card(id) else { continue };
            let matches = match filter {
                SearchFilter::BasicLand => card.is_land(),
                SearchFilter::Creature => card.is_creature(),
            };
            if matches && !names.contains(&card.name.as_str()) {
                names.push(card.name.as_str());
                found.push(id);
            }
        }
        found
    }

    /// The search on top of the stack that still needs a card, with its
    /// candidates
    pub fn pending_library_search(&self) -> Option<(PlayerId, Vec<CardId>)> {
        let top = self.stack.last()?;
        if top.search_choice.is_some() {
            return None;
        }
        let filter = top.search_filter()?;
        let candidates = self.search_candidates(top.controller, filter);
        (!candidates.is_empty()).then_some((top.controller, candidates))
    }

    /// Fix the searched card of the top stack object
    pub fn set_search_choice(&mut self, card: CardId) -> bool {
        let Some((_, candidates)) = self.pending_library_search() else {
            return false;
        };
        if !candidates.contains(&card) {
            return false;
        }
        match self.stack.last_mut() {
            Some(top) => {
                top.search_choice = Some(card);
                true
            }
            None => false,
        }
    }

    fn target_still_legal(&self, item: &StackItem) -> bool {
        match item.target {
            None => true,
            Some(TargetRef::Player(p)) => self.get_player(p).is_ok_and(|pl| !pl.has_lost),
            Some(TargetRef::Card(c)) => {
                self.is_on_battlefield(c) && self.card(c).is_ok_and(|card| card.is_creature())
            }
        }
    }

    /// Resolve the top object of the stack, then check state and give
    /// priority back to the active player
    pub fn resolve_top_of_stack(&mut self) -> Result<()> {
        let Some(item) = self.stack.pop() else {
            return Ok(());
        };

        if self.target_still_legal(&item) {
            for effect in &item.effects {
                self.resolve_effect(&item, effect)?;
            }
            if item.is_spell {
                if self.card(item.source)?.is_permanent_card() {
                    self.put_onto_battlefield(item.source, item.controller)?;
                } else {
                    self.put_into_graveyard(item.source)?;
                }
            }
        } else if item.is_spell {
            // Fizzled
            self.put_into_graveyard(item.source)?;
        }

        self.check_state_based_actions()?;
        self.begin_priority_round();
        Ok(())
    }

    fn resolve_effect(&mut self, item: &StackItem, effect: &Effect) -> Result<()> {
        match *effect {
            Effect::DealDamage { amount } => {
                if let Some(target) = item.target {
                    self.deal_damage(item.source, target, amount)?;
                }
            }
            Effect::GainLife { amount } => self.get_player_mut(item.controller)?.gain_life(amount),
            Effect::DrawCards { count } => {
                for _ in 0..count {
                    self.draw_card(item.controller)?;
                }
            }
            Effect::PumpTarget { power, toughness } => {
                if let Some(TargetRef::Card(c)) = item.target {
                    let card = self.card_mut(c)?;
                    card.power_bonus += power;
                    card.toughness_bonus += toughness;
                }
            }
            Effect::PumpSelf { power, toughness } => {
                if self.is_on_battlefield(item.source) {
                    let card = self.card_mut(item.source)?;
                    card.power_bonus += power;
                    card.toughness_bonus += toughness;
                }
            }
            Effect::SearchLibrary { filter } => {
                let choice = item
                    .search_choice
                    .or_else(|| self.search_candidates(item.controller, filter).first().copied());
                let zones = self.get_player_zones_mut(item.controller)?;
                if let Some(card) = choice {
                    if zones.library.remove(card) {
                        zones.hand.add(card);
                    }
                }
                self.shuffle_library(item.controller)?;
            }
            Effect::AddMana { color, amount } => {
                self.get_player_mut(item.controller)?
                    .mana_pool
                    .add(color, amount);
            }
            Effect::LevelUp => {
                if self.is_on_battlefield(item.source) {
                    self.card_mut(item.source)?.level += 1;
                }
            }
            Effect::Attach => {
                if let Some(TargetRef::Card(c)) = item.target {
                    let host_ok = self.card(c).is_ok_and(|h| h.controller == item.controller);
                    if host_ok && self.is_on_battlefield(item.source) {
                        self.card_mut(item.source)?.attached_to = Some(c);
                    }
                }
            }
        }
        Ok(())
    }
}
