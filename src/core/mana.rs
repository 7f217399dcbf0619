//! Mana costs and mana pools

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mana colors (colorless included so pools can be indexed uniformly)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    White,
    Blue,
    Black,
    Red,
    Green,
    Colorless,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::White,
        Color::Blue,
        Color::Black,
        Color::Red,
        Color::Green,
        Color::Colorless,
    ];

    fn index(self) -> usize {
        self as usize
    }

    fn symbol(self) -> char {
        match self {
            Color::White => 'W',
            Color::Blue => 'U',
            Color::Black => 'B',
            Color::Red => 'R',
            Color::Green => 'G',
            Color::Colorless => 'C',
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A mana cost such as "1G" (one generic, one green)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaCost {
    pub generic: u8,
    /// Colored requirements indexed by `Color`
    pub colored: [u8; 6],
}

impl ManaCost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a mana cost string like "2RR" or "1G"
    ///
    /// Unknown symbols are ignored; the generic part is the decimal prefix.
    pub fn from_string(s: &str) -> Self {
        let mut cost = ManaCost::new();
        let mut generic: u32 = 0;
        for c in s.chars() {
            if let Some(d) = c.to_digit(10) {
                generic = generic * 10 + d;
                continue;
            }
            if let Some(color) = Color::ALL.iter().find(|col| col.symbol() == c) {
                cost.colored[color.index()] += 1;
            }
        }
        cost.generic = generic.min(u8::MAX as u32) as u8;
        cost
    }

    pub fn colored_amount(&self, color: Color) -> u8 {
        self.colored[color.index()]
    }

    /// Converted mana cost
    pub fn cmc(&self) -> u8 {
        self.generic + self.colored.iter().sum::<u8>()
    }

    pub fn is_free(&self) -> bool {
        self.cmc() == 0
    }
}

impl fmt::Display for ManaCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generic > 0 || self.is_free() {
            write!(f, "{}", self.generic)?;
        }
        for color in Color::ALL {
            for _ in 0..self.colored_amount(color) {
                write!(f, "{}", color.symbol())?;
            }
        }
        Ok(())
    }
}

/// Floating mana of one player, emptied between steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ManaPool {
    amounts: [u8; 6],
}

impl ManaPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, color: Color, amount: u8) {
        let slot = &mut self.amounts[color.index()];
        *slot = slot.saturating_add(amount);
    }

    pub fn amount(&self, color: Color) -> u8 {
        self.amounts[color.index()]
    }

    pub fn total(&self) -> u8 {
        self.amounts.iter().sum()
    }

    pub fn clear(&mut self) {
        self.amounts = [0; 6];
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn can_pay(&self, cost: &ManaCost) -> bool {
        let colored_ok = Color::ALL
            .iter()
            .all(|&c| self.amount(c) >= cost.colored_amount(c));
        colored_ok && self.total() >= cost.cmc()
    }

    /// Deduct a cost from the pool, returning false (and leaving the pool
    /// untouched) when it cannot be paid.
    ///
    /// Colored requirements are paid first; generic is paid from colorless
    /// mana, then from colors in `Color::ALL` order.
    pub fn pay(&mut self, cost: &ManaCost) -> bool {
        if !self.can_pay(cost) {
            return false;
        }
        for color in Color::ALL {
            self.amounts[color.index()] -= cost.colored_amount(color);
        }
        let mut generic = cost.generic;
        let order = [
            Color::Colorless,
            Color::White,
            Color::Blue,
            Color::Black,
            Color::Red,
            Color::Green,
        ];
        for color in order {
            if generic == 0 {
                break;
            }
            let slot = &mut self.amounts[color.index()];
            let used = (*slot).min(generic);
            *slot -= used;
            generic -= used;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let cost = ManaCost::from_string("2RR");
        assert_eq!(cost.generic, 2);
        assert_eq!(cost.colored_amount(Color::Red), 2);
        assert_eq!(cost.cmc(), 4);
        assert_eq!(cost.to_string(), "2RR");
        assert_eq!(ManaCost::from_string("").to_string(), "0");
        assert_eq!(ManaCost::from_string("10G").generic, 10);
    }

    #[test]
    fn test_pay_uses_colored_then_generic() {
        let mut pool = ManaPool::new();
        pool.add(Color::Green, 2);
        pool.add(Color::Red, 1);

        assert!(pool.pay(&ManaCost::from_string("1G")));
        assert_eq!(pool.total(), 1);

        // Not enough green left, pool unchanged
        assert!(!pool.pay(&ManaCost::from_string("GG")));
        assert_eq!(pool.total(), 1);
    }
}
