//! Card zones

use crate::core::{CardId, PlayerId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Zone {
    Library,
    Hand,
    Battlefield,
    Graveyard,
    Stack,
}

/// An ordered list of cards. For libraries the last element is the top.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardZone {
    pub cards: Vec<CardId>,
}

impl CardZone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, card_id: CardId) {
        self.cards.push(card_id);
    }

    /// Order-preserving removal; iteration order feeds action enumeration
    pub fn remove(&mut self, card_id: CardId) -> bool {
        match self.cards.iter().position(|&id| id == card_id) {
            Some(pos) => {
                self.cards.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, card_id: CardId) -> bool {
        self.cards.contains(&card_id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn draw_top(&mut self) -> Option<CardId> {
        self.cards.pop()
    }

    pub fn iter(&self) -> impl Iterator<Item = CardId> + '_ {
        self.cards.iter().copied()
    }

    pub fn shuffle(&mut self, rng: &mut impl rand::Rng) {
        use rand::seq::SliceRandom;
        self.cards.shuffle(rng);
    }
}

/// Zones owned by one player (the battlefield and stack are shared)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerZones {
    pub owner: PlayerId,
    pub library: CardZone,
    pub hand: CardZone,
    pub graveyard: CardZone,
}

impl PlayerZones {
    pub fn new(owner: PlayerId) -> Self {
        PlayerZones {
            owner,
            library: CardZone::new(),
            hand: CardZone::new(),
            graveyard: CardZone::new(),
        }
    }

    pub fn zone_mut(&mut self, zone: Zone) -> Option<&mut CardZone> {
        match zone {
            Zone::Library => Some(&mut self.library),
            Zone::Hand => Some(&mut self.hand),
            Zone::Graveyard => Some(&mut self.graveyard),
            Zone::Battlefield | Zone::Stack => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_keeps_order() {
        let mut zone = CardZone::new();
        for id in 1..=4 {
            zone.add(CardId::new(id));
        }
        assert!(zone.remove(CardId::new(2)));
        assert!(!zone.remove(CardId::new(2)));
        let ids: Vec<u32> = zone.iter().map(|c| c.as_u32()).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn test_library_draws_from_top() {
        let mut library = CardZone::new();
        library.add(CardId::new(10));
        library.add(CardId::new(11));
        assert_eq!(library.draw_top(), Some(CardId::new(11)));
        assert_eq!(library.draw_top(), Some(CardId::new(10)));
        assert_eq!(library.draw_top(), None);
    }
}
