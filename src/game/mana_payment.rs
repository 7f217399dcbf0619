//! Automatic mana payment from untapped sources
//!
//! Casting and activation tap lands on their own, so the action set does
//! not need a separate tap action for every land in every order.

use crate::core::{CardId, Color, Effect, ManaCost, ManaPool, PlayerId};
use crate::game::GameState;

/// An untapped permanent that can produce one kind of mana
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManaSource {
    pub card_id: CardId,
    pub ability: u8,
    pub color: Color,
    pub amount: u8,
}

impl GameState {
    /// Mana sources `player` can tap right now, in battlefield order
    pub fn mana_sources(&self, player: PlayerId) -> Vec<ManaSource> {
        let turn = self.turn.turn_number;
        let mut sources = Vec::new();
        for card in self.permanents_of(player) {
            if card.tapped || card.is_summoning_sick(turn) {
                continue;
            }
            for (idx, ability) in card.abilities.iter().enumerate() {
                if !ability.is_mana_ability() || !ability.cost.tap || !ability.cost.mana.is_free() {
                    continue;
                }
                if let Some(Effect::AddMana { color, amount }) = ability.effects.first() {
                    sources.push(ManaSource {
                        card_id: card.id,
                        ability: idx as u8,
                        color: *color,
                        amount: *amount,
                    });
                }
            }
        }
        sources
    }
}

/// Pick sources to tap so that `pool` plus the tapped mana pays `cost`.
///
/// Colored requirements not covered by the pool are matched first, generic
/// takes whatever is left in source order. Returns `None` when the cost
/// cannot be paid.
pub fn compute_tap_order(cost: &ManaCost, pool: &ManaPool, sources: &[ManaSource]) -> Option<Vec<ManaSource>> {
    let mut available = *pool;
    let mut chosen: Vec<ManaSource> = Vec::new();
    let mut used = vec![false; sources.len()];

    for color in Color::ALL {
        while available.amount(color) < cost.colored_amount(color) {
            let idx = sources
                .iter()
                .enumerate()
                .position(|(i, s)| !used[i] && s.color == color)?;
            used[idx] = true;
            available.add(color, sources[idx].amount);
            chosen.push(sources[idx]);
        }
    }

    let mut idx = 0;
    while !available.can_pay(cost) {
        while idx < sources.len() && used[idx] {
            idx += 1;
        }
        let source = sources.get(idx)?;
        used[idx] = true;
        available.add(source.color, source.amount);
        chosen.push(*source);
    }
    Some(chosen)
}
