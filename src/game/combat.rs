//! Combat: declarations and damage
//!
//! Declarations are validated here; which creatures to declare is up to
//! the controllers.

use crate::core::{CardId, Keyword, PlayerId, TargetRef};
use crate::game::GameState;
use crate::Result;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Attackers and blocks of the current combat
///
/// BTreeMaps keep iteration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatState {
    /// Attacker -> defending player
    pub attackers: BTreeMap<CardId, PlayerId>,
    /// Attacker -> its blockers, in damage assignment order
    pub blocks: BTreeMap<CardId, SmallVec<[CardId; 2]>>,
}

impl CombatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare_attacker(&mut self, attacker: CardId, defender: PlayerId) {
        self.attackers.insert(attacker, defender);
    }

    pub fn declare_blocker(&mut self, blocker: CardId, attacker: CardId) {
        self.blocks.entry(attacker).or_default().push(blocker);
    }

    pub fn is_attacking(&self, card: CardId) -> bool {
        self.attackers.contains_key(&card)
    }

    pub fn is_blocking(&self, card: CardId) -> bool {
        self.blocks.values().any(|b| b.contains(&card))
    }

    pub fn is_blocked(&self, attacker: CardId) -> bool {
        self.blocks.contains_key(&attacker)
    }

    pub fn blockers_of(&self, attacker: CardId) -> &[CardId] {
        self.blocks.get(&attacker).map(|b| b.as_slice()).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.attackers.is_empty()
    }

    /// Forget a creature that left the battlefield. A blocked attacker
    /// stays blocked even if all its blockers are gone.
    pub fn remove_creature(&mut self, card: CardId) {
        self.attackers.remove(&card);
        for blockers in self.blocks.values_mut() {
            blockers.retain(|b| *b != card);
        }
    }

    pub fn clear(&mut self) {
        self.attackers.clear();
        self.blocks.clear();
    }
}

impl GameState {
    /// Untapped creature of the active player that has been around since
    /// the start of the turn
    pub fn can_attack(&self, card: CardId) -> bool {
        let turn = self.turn.turn_number;
        self.card(card).is_ok_and(|c| {
            c.is_creature()
                && c.controller == self.turn.active_player
                && !c.tapped
                && !c.has_keyword(Keyword::Defender)
                && !c.is_summoning_sick(turn)
                && self.is_on_battlefield(card)
        })
    }

    /// Flying attackers can only be blocked by flying or reach
    pub fn can_block(&self, blocker: CardId, attacker: CardId) -> bool {
        let (Ok(b), Ok(a)) = (self.card(blocker), self.card(attacker)) else {
            return false;
        };
        if !b.is_creature() || b.tapped || !self.is_on_battlefield(blocker) {
            return false;
        }
        if !self.combat.is_attacking(attacker) || b.controller == a.controller {
            return false;
        }
        !a.has_keyword(Keyword::Flying)
            || b.has_keyword(Keyword::Flying)
            || b.has_keyword(Keyword::Reach)
    }

    /// Creatures that may attack this turn
    pub fn attack_candidates(&self) -> Vec<CardId> {
        self.creatures_of(self.turn.active_player)
            .into_iter()
            .filter(|&c| self.can_attack(c))
            .collect()
    }

    /// Untapped creatures of `defender`
    pub fn block_candidates(&self, defender: PlayerId) -> Vec<CardId> {
        self.creatures_of(defender)
            .into_iter()
            .filter(|&c| self.card(c).is_ok_and(|card| !card.tapped))
            .collect()
    }

    /// Declare attackers against the active player's opponent. Illegal
    /// entries are skipped. A lone attacker gets exalted bonuses.
    pub fn declare_attackers(&mut self, attackers: &[CardId]) -> Result<usize> {
        let active = self.turn.active_player;
        let defender = self.opponent_of(active);
        let mut declared = 0;
        for &attacker in attackers {
            if self.combat.is_attacking(attacker) || !self.can_attack(attacker) {
                continue;
            }
            let card = self.card_mut(attacker)?;
            if !card.has_keyword(Keyword::Vigilance) {
                card.tap();
            }
            self.combat.declare_attacker(attacker, defender);
            declared += 1;
        }

        if declared == 1 {
            let exalted = self
                .permanents_of(active)
                .filter(|c| c.has_keyword(Keyword::Exalted))
                .count() as i32;
            if let Some(&lone) = self.combat.attackers.keys().next() {
                let card = self.card_mut(lone)?;
                card.power_bonus += exalted;
                card.toughness_bonus += exalted;
            }
        }
        Ok(declared)
    }

    /// Declare blocks as (blocker, attacker) pairs; a creature blocks at
    /// most once and illegal pairs are skipped
    pub fn declare_blockers(&mut self, blocks: &[(CardId, CardId)]) -> usize {
        let mut declared = 0;
        for &(blocker, attacker) in blocks {
            if self.combat.is_blocking(blocker) || !self.can_block(blocker, attacker) {
                continue;
            }
            self.combat.declare_blocker(blocker, attacker);
            declared += 1;
        }
        declared
    }

    /// Deal combat damage, with a separate first-strike step when any
    /// combatant has first strike or double strike
    pub fn resolve_combat_damage(&mut self) -> Result<()> {
        let combatants: Vec<CardId> = self
            .combat
            .attackers
            .keys()
            .copied()
            .chain(self.combat.blocks.values().flatten().copied())
            .collect();
        let strikes_first = |state: &GameState, c: CardId| {
            state.has_keyword(c, Keyword::FirstStrike) || state.has_keyword(c, Keyword::DoubleStrike)
        };

        if combatants.iter().any(|&c| strikes_first(self, c)) {
            self.combat_damage_step(|state, c| strikes_first(state, c))?;
            self.check_state_based_actions()?;
            self.combat_damage_step(|state, c| {
                !state.has_keyword(c, Keyword::FirstStrike)
                    || state.has_keyword(c, Keyword::DoubleStrike)
            })?;
        } else {
            self.combat_damage_step(|_, _| true)?;
        }
        self.check_state_based_actions()
    }

    fn combat_damage_step(&mut self, deals_damage: impl Fn(&GameState, CardId) -> bool) -> Result<()> {
        // Damage is computed up front and dealt simultaneously
        let mut assignments: Vec<(CardId, TargetRef, i32)> = Vec::new();

        for (&attacker, &defender) in &self.combat.attackers {
            if !self.is_on_battlefield(attacker) || !deals_damage(self, attacker) {
                continue;
            }
            let mut remaining = self.power(attacker);
            if remaining <= 0 {
                continue;
            }
            if !self.combat.is_blocked(attacker) {
                assignments.push((attacker, TargetRef::Player(defender), remaining));
                continue;
            }
            let deathtouch = self.has_keyword(attacker, Keyword::Deathtouch);
            for &blocker in self.combat.blockers_of(attacker) {
                if remaining == 0 {
                    break;
                }
                let Ok(b) = self.card(blocker) else { continue };
                let lethal = if deathtouch {
                    1
                } else {
                    (self.toughness(blocker) - b.damage).max(0)
                };
                let dealt = remaining.min(lethal.max(1));
                assignments.push((attacker, TargetRef::Card(blocker), dealt));
                remaining -= dealt;
            }
            let blockers_left = !self.combat.blockers_of(attacker).is_empty();
            if remaining > 0 && self.has_keyword(attacker, Keyword::Trample) {
                assignments.push((attacker, TargetRef::Player(defender), remaining));
            } else if remaining > 0 && blockers_left {
                // Excess goes to the first blocker
                let first = self.combat.blockers_of(attacker)[0];
                assignments.push((attacker, TargetRef::Card(first), remaining));
            }
        }

        for (&attacker, blockers) in &self.combat.blocks {
            for &blocker in blockers {
                if !deals_damage(self, blocker) || !self.is_on_battlefield(attacker) {
                    continue;
                }
                let power = self.power(blocker);
                if power > 0 {
                    assignments.push((blocker, TargetRef::Card(attacker), power));
                }
            }
        }

        for (source, target, amount) in assignments {
            self.deal_damage(source, target, amount)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Step;

    fn combat_game() -> (GameState, PlayerId, PlayerId) {
        let mut game = GameState::new_two_player("Alice", "Bob", 3);
        game.turn.turn_number = 3;
        game.turn.current_step = Step::DeclareAttackers;
        (game, PlayerId::new(0), PlayerId::new(1))
    }

    #[test]
    fn test_unblocked_attacker_hits_player() {
        let (mut game, alice, bob) = combat_game();
        let giant = game.add_card_to_battlefield(alice, "Hill Giant").unwrap();
        assert_eq!(game.declare_attackers(&[giant]).unwrap(), 1);
        assert!(game.card(giant).unwrap().tapped);

        game.resolve_combat_damage().unwrap();
        assert_eq!(game.get_player(bob).unwrap().life, 17);
    }

    #[test]
    fn test_first_strike_kills_before_damage_back() {
        let (mut game, alice, bob) = combat_game();
        let knight = game.add_card_to_battlefield(alice, "Knight of Meadowgrain").unwrap();
        let bears = game.add_card_to_battlefield(bob, "Grizzly Bears").unwrap();
        game.declare_attackers(&[knight]).unwrap();
        assert_eq!(game.declare_blockers(&[(bears, knight)]), 1);

        game.resolve_combat_damage().unwrap();
        assert!(game.is_on_battlefield(knight));
        assert!(!game.is_on_battlefield(bears));
        // Lifelink
        assert_eq!(game.get_player(alice).unwrap().life, 22);
    }

    #[test]
    fn test_flying_needs_flying_or_reach() {
        let (mut game, alice, bob) = combat_game();
        let hawk = game.add_card_to_battlefield(alice, "Suntail Hawk").unwrap();
        let bears = game.add_card_to_battlefield(bob, "Grizzly Bears").unwrap();
        let spider = game.add_card_to_battlefield(bob, "Giant Spider").unwrap();
        game.declare_attackers(&[hawk]).unwrap();

        assert!(!game.can_block(bears, hawk));
        assert!(game.can_block(spider, hawk));
    }

    #[test]
    fn test_trample_and_deathtouch() {
        let (mut game, alice, bob) = combat_game();
        let wurm = game.add_card_to_battlefield(alice, "Colossal Dreadmaw").unwrap();
        let rats = game.add_card_to_battlefield(bob, "Typhoid Rats").unwrap();
        game.declare_attackers(&[wurm]).unwrap();
        game.declare_blockers(&[(rats, wurm)]);

        game.resolve_combat_damage().unwrap();
        assert_eq!(game.get_player(bob).unwrap().life, 15);
        assert!(!game.is_on_battlefield(rats));
        assert!(!game.is_on_battlefield(wurm));
    }

    #[test]
    fn test_exalted_pumps_lone_attacker() {
        let (mut game, alice, bob) = combat_game();
        let squire = game.add_card_to_battlefield(alice, "Akrasan Squire").unwrap();
        game.add_card_to_battlefield(alice, "Akrasan Squire").unwrap();
        game.declare_attackers(&[squire]).unwrap();
        assert_eq!(game.power(squire), 3);

        game.resolve_combat_damage().unwrap();
        assert_eq!(game.get_player(bob).unwrap().life, 17);
    }
}
