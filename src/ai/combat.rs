//! Combat evaluator and non-search combat policies
//!
//! Searching over attack and block assignments is far too expensive, so
//! declarations come from these static heuristics instead.

use crate::core::{CardId, Keyword, PlayerId};
use crate::game::{GameLogger, GameState, VerbosityLevel};
use crate::log_at;

/// Who survives a one-on-one fight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelOutcome {
    pub attacker_dies: bool,
    pub blocker_dies: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CombatEvaluator {
    logger: GameLogger,
}

impl CombatEvaluator {
    pub fn new(logger: GameLogger) -> Self {
        CombatEvaluator { logger }
    }

    /// Value of a card for combat and discard decisions
    pub fn score(&self, card: CardId, state: &GameState) -> i32 {
        let Ok(c) = state.card(card) else { return 0 };
        if c.is_creature() {
            return self.creature_value(card, state);
        }
        if c.is_land() {
            return 50;
        }
        if let Some(bonus) = c.equipment {
            return 40 + (bonus.power as i32) * 15 + (bonus.toughness as i32) * 10;
        }
        30 + c.mana_cost.cmc() as i32 * 5
    }

    fn creature_value(&self, card: CardId, state: &GameState) -> i32 {
        let Ok(c) = state.card(card) else { return 0 };
        let power = state.power(card);
        let toughness = state.toughness(card);
        let mut value = 100 + power * 15 + toughness * 10 + c.mana_cost.cmc() as i32 * 5;

        if c.has_keyword(Keyword::Flying) {
            value += power * 10;
        }
        if power > 0 {
            if c.has_keyword(Keyword::DoubleStrike) {
                value += 10 + power * 15;
            } else if c.has_keyword(Keyword::FirstStrike) {
                value += 10 + power * 5;
            }
            if c.has_keyword(Keyword::Deathtouch) {
                value += 25;
            }
            if c.has_keyword(Keyword::Lifelink) {
                value += power * 10;
            }
            if power > 1 && c.has_keyword(Keyword::Trample) {
                value += (power - 1) * 5;
            }
            if c.has_keyword(Keyword::Vigilance) {
                value += power * 5 + toughness * 5;
            }
        }
        if c.has_keyword(Keyword::Reach) && !c.has_keyword(Keyword::Flying) {
            value += 5;
        }
        if c.has_keyword(Keyword::Indestructible) {
            value += 70;
        }
        if c.has_keyword(Keyword::Exalted) {
            value += 15;
        }
        if c.has_keyword(Keyword::Defender) {
            value -= power * 9 + 40;
        }
        if let Some(leveler) = &c.leveler {
            value += (leveler.max_level.saturating_sub(c.level)) as i32;
        }
        if c.tapped {
            value -= 1;
        }
        value
    }

    /// Blocking is possible at all (ignores whether combat is declared)
    pub fn could_block(&self, state: &GameState, blocker: CardId, attacker: CardId) -> bool {
        let Ok(b) = state.card(blocker) else { return false };
        if !b.is_creature() || b.tapped {
            return false;
        }
        !state.has_keyword(attacker, Keyword::Flying)
            || b.has_keyword(Keyword::Flying)
            || b.has_keyword(Keyword::Reach)
    }

    /// Simulate a single attacker against a single blocker, with first
    /// strike, double strike, deathtouch and indestructible
    pub fn duel(&self, state: &GameState, attacker: CardId, blocker: CardId) -> DuelOutcome {
        struct Fighter {
            power: i32,
            toughness: i32,
            first: bool,
            double: bool,
            deathtouch: bool,
            indestructible: bool,
            damage: i32,
            hit_by_deathtouch: bool,
        }
        let fighter = |id: CardId| Fighter {
            power: state.power(id).max(0),
            toughness: state.toughness(id),
            first: state.has_keyword(id, Keyword::FirstStrike)
                || state.has_keyword(id, Keyword::DoubleStrike),
            double: state.has_keyword(id, Keyword::DoubleStrike),
            deathtouch: state.has_keyword(id, Keyword::Deathtouch),
            indestructible: state.has_keyword(id, Keyword::Indestructible),
            damage: 0,
            hit_by_deathtouch: false,
        };
        fn hit(from: &Fighter, to: &mut Fighter) {
            if from.power > 0 {
                to.damage += from.power;
                to.hit_by_deathtouch |= from.deathtouch;
            }
        }
        fn dead(f: &Fighter) -> bool {
            !f.indestructible
                && (f.toughness <= 0 || f.damage >= f.toughness || (f.hit_by_deathtouch && f.damage > 0))
        }

        let mut a = fighter(attacker);
        let mut b = fighter(blocker);

        if a.first {
            hit(&a, &mut b);
        }
        if b.first {
            hit(&b, &mut a);
        }
        let a_dead_early = dead(&a);
        let b_dead_early = dead(&b);
        if !a_dead_early && (!a.first || a.double) {
            hit(&a, &mut b);
        }
        if !b_dead_early && (!b.first || b.double) {
            hit(&b, &mut a);
        }
        DuelOutcome {
            attacker_dies: dead(&a),
            blocker_dies: dead(&b),
        }
    }

    /// Attackers whose combined damage kills the defender this turn, or an
    /// empty list. Creatures nothing can block count first; otherwise the
    /// defender is assumed to make the legal blocks that stop the most
    /// damage, one blocker per attacker.
    pub fn lethal_attackers(
        &self,
        state: &GameState,
        attackers: &[CardId],
        blockers: &[CardId],
        defender_life: i32,
    ) -> Vec<CardId> {
        let attackers: Vec<CardId> = attackers
            .iter()
            .copied()
            .filter(|&a| state.power(a) > 0)
            .collect();
        let (evasive, mut blockable): (Vec<CardId>, Vec<CardId>) = attackers
            .iter()
            .partition(|&&a| !blockers.iter().any(|&b| self.could_block(state, b, a)));

        let evasive_damage: i32 = evasive.iter().map(|&a| state.power(a)).sum();
        if !evasive.is_empty() && evasive_damage >= defender_life {
            return evasive;
        }

        blockable.sort_by_key(|&a| std::cmp::Reverse(state.power(a)));
        let blocked = self.best_blocks(state, &blockable, blockers);
        let through: i32 = blockable
            .iter()
            .zip(&blocked)
            .filter(|(_, &is_blocked)| !is_blocked)
            .map(|(&a, _)| state.power(a))
            .sum();
        if !attackers.is_empty() && evasive_damage + through >= defender_life {
            return attackers;
        }
        Vec::new()
    }

    /// Which of `attackers` (strongest first) the defender can stop at once
    ///
    /// Attackers claim blockers in order, stealing one from a weaker
    /// attacker when that one can be re-blocked elsewhere. Taking them
    /// strongest first makes the stopped damage as large as possible.
    fn best_blocks(&self, state: &GameState, attackers: &[CardId], blockers: &[CardId]) -> Vec<bool> {
        let can_block: Vec<Vec<usize>> = attackers
            .iter()
            .map(|&a| {
                (0..blockers.len())
                    .filter(|&b| self.could_block(state, blockers[b], a))
                    .collect()
            })
            .collect();
        let mut blocker_of: Vec<Option<usize>> = vec![None; blockers.len()];
        let mut blocked = vec![false; attackers.len()];
        for attacker in 0..attackers.len() {
            let mut seen = vec![false; blockers.len()];
            blocked[attacker] = claim_blocker(attacker, &can_block, &mut blocker_of, &mut seen);
        }
        blocked
    }

    /// Would some available blocker kill this attacker at a profit?
    pub fn is_safe_attack(&self, state: &GameState, attacker: CardId, blockers: &[CardId]) -> bool {
        if state.power(attacker) <= 0 {
            return false;
        }
        if state.has_keyword(attacker, Keyword::Deathtouch)
            || state.has_keyword(attacker, Keyword::Indestructible)
        {
            return true;
        }
        let attacker_value = self.score(attacker, state);
        for &blocker in blockers {
            if !self.could_block(state, blocker, attacker) {
                continue;
            }
            let outcome = self.duel(state, attacker, blocker);
            if !outcome.attacker_dies {
                continue;
            }
            if !outcome.blocker_dies {
                return false;
            }
            // A trade is only bad when it costs us more than them, or the
            // blocker brings tricks the duel does not see
            let blocker_tricky = [
                Keyword::FirstStrike,
                Keyword::DoubleStrike,
                Keyword::Exalted,
                Keyword::Deathtouch,
                Keyword::Indestructible,
            ]
            .into_iter()
            .any(|k| state.has_keyword(blocker, k));
            if attacker_value > self.score(blocker, state) || blocker_tricky {
                return false;
            }
        }
        true
    }

    /// Attack declaration policy for `player` against their opponent
    pub fn declare_attackers(&self, state: &GameState, player: PlayerId, candidates: &[CardId]) -> Vec<CardId> {
        if candidates.is_empty() {
            return Vec::new();
        }
        let defender = state.opponent_of(player);
        let defender_life = state.get_player(defender).map(|p| p.life).unwrap_or(0);
        let blockers = state.block_candidates(defender);

        let killers = self.lethal_attackers(state, candidates, &blockers, defender_life);
        if !killers.is_empty() {
            log_at!(
                self.logger,
                VerbosityLevel::Verbose,
                "combat",
                "lethal attack with {} creature(s) into {} life",
                killers.len(),
                defender_life
            );
            return killers;
        }

        candidates
            .iter()
            .copied()
            .filter(|&a| self.is_safe_attack(state, a, &blockers))
            .collect()
    }

    /// Block declaration policy: (blocker, attacker) pairs
    pub fn declare_blockers(&self, state: &GameState, attackers: &[CardId], blockers: &[CardId]) -> Vec<(CardId, CardId)> {
        let blockers: Vec<CardId> = blockers
            .iter()
            .copied()
            .filter(|&b| attackers.iter().any(|&a| self.could_block(state, b, a)))
            .collect();
        if blockers.is_empty() {
            return Vec::new();
        }
        let mut attackers: Vec<CardId> = attackers
            .iter()
            .copied()
            .filter(|&a| blockers.iter().any(|&b| self.could_block(state, b, a)))
            .collect();
        attackers.sort_by_key(|&a| std::cmp::Reverse(state.power(a)));

        let mut available = blockers;
        let mut blocks = Vec::new();
        for attacker in attackers {
            let attacker_value = self.score(attacker, state);
            let mut best: Option<(CardId, u8)> = None;
            for &blocker in &available {
                if !self.could_block(state, blocker, attacker) {
                    continue;
                }
                let outcome = self.duel(state, attacker, blocker);
                let rank = match (outcome.blocker_dies, outcome.attacker_dies) {
                    (false, true) => 3,
                    (false, false) => 2,
                    (true, true) if self.score(blocker, state) < attacker_value => 1,
                    _ => 0,
                };
                if rank > 0 && best.map_or(true, |(_, r)| rank > r) {
                    best = Some((blocker, rank));
                }
            }
            if let Some((blocker, _)) = best {
                available.retain(|&b| b != blocker);
                blocks.push((blocker, attacker));
            }
        }
        blocks
    }
}

/// Augmenting-path step of the blocker matching
fn claim_blocker(
    attacker: usize,
    can_block: &[Vec<usize>],
    blocker_of: &mut [Option<usize>],
    seen: &mut [bool],
) -> bool {
    for &blocker in &can_block[attacker] {
        if seen[blocker] {
            continue;
        }
        seen[blocker] = true;
        let free = match blocker_of[blocker] {
            None => true,
            Some(other) => claim_blocker(other, can_block, blocker_of, seen),
        };
        if free {
            blocker_of[blocker] = Some(attacker);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Step;

    fn setup() -> (GameState, PlayerId, PlayerId, CombatEvaluator) {
        let mut game = GameState::new_two_player("Alice", "Bob", 2);
        game.turn.turn_number = 4;
        game.turn.current_step = Step::DeclareAttackers;
        (game, PlayerId::new(0), PlayerId::new(1), CombatEvaluator::default())
    }

    #[test]
    fn test_bigger_creatures_score_higher() {
        let (mut game, alice, _, eval) = setup();
        let bears = game.add_card_to_battlefield(alice, "Grizzly Bears").unwrap();
        let angel = game.add_card_to_battlefield(alice, "Serra Angel").unwrap();
        let wall = game.add_card_to_battlefield(alice, "Wall of Wood").unwrap();
        assert!(eval.score(angel, &game) > eval.score(bears, &game));
        assert!(eval.score(bears, &game) > eval.score(wall, &game));
    }

    #[test]
    fn test_duel_first_strike_and_deathtouch() {
        let (mut game, alice, bob, eval) = setup();
        let knight = game.add_card_to_battlefield(alice, "Knight of Meadowgrain").unwrap();
        let bears = game.add_card_to_battlefield(bob, "Grizzly Bears").unwrap();
        let rats = game.add_card_to_battlefield(bob, "Typhoid Rats").unwrap();
        let myr = game.add_card_to_battlefield(bob, "Darksteel Myr").unwrap();

        let vs_bears = eval.duel(&game, knight, bears);
        assert!(!vs_bears.attacker_dies && vs_bears.blocker_dies);

        // First strike kills the rats before deathtouch applies
        let vs_rats = eval.duel(&game, knight, rats);
        assert!(!vs_rats.attacker_dies && vs_rats.blocker_dies);

        let vs_myr = eval.duel(&game, knight, myr);
        assert!(!vs_myr.attacker_dies && !vs_myr.blocker_dies);
    }

    #[test]
    fn test_attack_into_bigger_blocker_is_unsafe() {
        let (mut game, alice, bob, eval) = setup();
        let bears = game.add_card_to_battlefield(alice, "Grizzly Bears").unwrap();
        let hawk = game.add_card_to_battlefield(alice, "Suntail Hawk").unwrap();
        let spider = game.add_card_to_battlefield(bob, "Giant Spider").unwrap();

        assert!(!eval.is_safe_attack(&game, bears, &[spider]));
        // Reach blocks the hawk and kills it
        assert!(!eval.is_safe_attack(&game, hawk, &[spider]));
        assert!(eval.is_safe_attack(&game, bears, &[]));
    }

    #[test]
    fn test_flyer_is_safe_against_ground_blockers() {
        let (mut game, alice, bob, eval) = setup();
        let angel = game.add_card_to_battlefield(alice, "Serra Angel").unwrap();
        let giant = game.add_card_to_battlefield(bob, "Hill Giant").unwrap();
        let attackers = eval.declare_attackers(&game, alice, &[angel]);
        assert_eq!(attackers, vec![angel]);
        assert!(!eval.could_block(&game, giant, angel));
    }

    #[test]
    fn test_zero_power_never_attacks() {
        let (mut game, alice, _, eval) = setup();
        let wall = game.add_card_to_battlefield(alice, "Darksteel Myr").unwrap();
        assert!(eval.declare_attackers(&game, alice, &[wall]).is_empty());
    }

    #[test]
    fn test_lethal_overrides_safety() {
        let (mut game, alice, bob, eval) = setup();
        let bears = game.add_card_to_battlefield(alice, "Grizzly Bears").unwrap();
        let giant = game.add_card_to_battlefield(alice, "Hill Giant").unwrap();
        let wall = game.add_card_to_battlefield(bob, "Wall of Wood").unwrap();
        game.get_player_mut(bob).unwrap().life = 2;

        // The wall blocks the giant, the bears get through for exactly 2
        let attackers = eval.declare_attackers(&game, alice, &[bears, giant]);
        assert_eq!(attackers.len(), 2);
        let _ = wall;
    }

    #[test]
    fn test_lethal_counts_only_legal_blocks() {
        let (mut game, alice, bob, eval) = setup();
        let angel = game.add_card_to_battlefield(alice, "Serra Angel").unwrap();
        let hawk = game.add_card_to_battlefield(alice, "Suntail Hawk").unwrap();
        let bears = game.add_card_to_battlefield(alice, "Grizzly Bears").unwrap();
        game.add_card_to_battlefield(bob, "Giant Spider").unwrap();
        game.add_card_to_battlefield(bob, "Hill Giant").unwrap();
        game.add_card_to_battlefield(bob, "Wall of Wood").unwrap();
        game.get_player_mut(bob).unwrap().life = 1;

        // Only the spider can stop a flyer, so one of them always connects
        let attackers = eval.declare_attackers(&game, alice, &[angel, hawk, bears]);
        assert!(attackers.contains(&angel));
        assert!(attackers.contains(&hawk));
        assert_eq!(attackers.len(), 3);
    }

    #[test]
    fn test_blocker_reassigned_to_stop_more_damage() {
        let (mut game, alice, bob, eval) = setup();
        let giant = game.add_card_to_battlefield(alice, "Hill Giant").unwrap();
        let hawk = game.add_card_to_battlefield(alice, "Suntail Hawk").unwrap();
        let spider = game.add_card_to_battlefield(bob, "Giant Spider").unwrap();
        let wall = game.add_card_to_battlefield(bob, "Wall of Wood").unwrap();

        // The giant takes the spider first, then gives it up to the hawk
        let blocked = eval.best_blocks(&game, &[giant, hawk], &[spider, wall]);
        assert_eq!(blocked, vec![true, true]);
        assert!(eval
            .lethal_attackers(&game, &[giant, hawk], &[spider, wall], 1)
            .is_empty());
    }

    #[test]
    fn test_blocks_prefer_survivors() {
        let (mut game, alice, bob, eval) = setup();
        let bears = game.add_card_to_battlefield(alice, "Grizzly Bears").unwrap();
        let giant = game.add_card_to_battlefield(alice, "Hill Giant").unwrap();
        let spider = game.add_card_to_battlefield(bob, "Giant Spider").unwrap();
        let hawk = game.add_card_to_battlefield(bob, "Suntail Hawk").unwrap();

        let blocks = eval.declare_blockers(&game, &[bears, giant], &[spider, hawk]);
        // Spider survives the giant; the hawk would just die to the bears
        assert_eq!(blocks, vec![(spider, giant)]);
    }
}
