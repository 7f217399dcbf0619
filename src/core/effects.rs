//! Effects, keywords, targets and activated abilities

use crate::core::{CardId, Color, ManaCost, PlayerId};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Evergreen keywords that matter to combat and evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Keyword {
    Flying,
    Reach,
    FirstStrike,
    DoubleStrike,
    Deathtouch,
    Indestructible,
    Exalted,
    Defender,
    Lifelink,
    Trample,
    Vigilance,
    Haste,
}

/// What kind of object a spell or ability may target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetSpec {
    #[default]
    None,
    /// Any creature or player
    Any,
    Creature,
    Player,
}

/// A chosen target
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    Player(PlayerId),
    Card(CardId),
}

impl TargetRef {
    /// Numeric encoding used in canonical action keys
    pub fn key_part(&self) -> u32 {
        match self {
            TargetRef::Player(p) => p.as_u32(),
            TargetRef::Card(c) => c.as_u32(),
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetRef::Player(p) => write!(f, "player {p}"),
            TargetRef::Card(c) => write!(f, "card {c}"),
        }
    }
}

/// Card filter for library searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchFilter {
    BasicLand,
    Creature,
}

/// One step of a spell or ability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Damage to the chosen target
    DealDamage { amount: i32 },
    /// Controller gains life
    GainLife { amount: i32 },
    /// Controller draws cards
    DrawCards { count: u8 },
    /// Chosen creature gets +N/+N until end of turn
    PumpTarget { power: i32, toughness: i32 },
    /// Source creature gets +N/+N until end of turn
    PumpSelf { power: i32, toughness: i32 },
    /// Controller searches their library for a card and puts it into hand.
    /// The card is chosen on resolution.
    SearchLibrary { filter: SearchFilter },
    AddMana { color: Color, amount: u8 },
    /// Put a level counter on the source
    LevelUp,
    /// Attach the source equipment to the chosen creature
    Attach,
}

impl Effect {
    /// Effects that hurt whatever they are aimed at
    pub fn is_harmful(&self) -> bool {
        matches!(self, Effect::DealDamage { .. })
    }

    /// Effects that help whatever they are aimed at
    pub fn is_beneficial(&self) -> bool {
        matches!(self, Effect::PumpTarget { .. } | Effect::Attach)
    }
}

/// Cost of an activated ability
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AbilityCost {
    pub tap: bool,
    pub mana: ManaCost,
    /// Discard a card of the controller's choice
    pub discard: bool,
}

/// An activated ability printed on a permanent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivatedAbility {
    pub cost: AbilityCost,
    pub effects: SmallVec<[Effect; 2]>,
    pub target: TargetSpec,
    /// Only when the controller could cast a sorcery
    pub sorcery_speed: bool,
}

impl ActivatedAbility {
    pub fn new(cost: AbilityCost, effects: impl IntoIterator<Item = Effect>) -> Self {
        ActivatedAbility {
            cost,
            effects: effects.into_iter().collect(),
            target: TargetSpec::None,
            sorcery_speed: false,
        }
    }

    pub fn with_target(mut self, target: TargetSpec) -> Self {
        self.target = target;
        self
    }

    pub fn at_sorcery_speed(mut self) -> Self {
        self.sorcery_speed = true;
        self
    }

    /// Mana abilities resolve immediately and never use the stack
    pub fn is_mana_ability(&self) -> bool {
        !self.effects.is_empty()
            && self.target == TargetSpec::None
            && self
                .effects
                .iter()
                .all(|e| matches!(e, Effect::AddMana { .. }))
    }

    pub fn is_level_up(&self) -> bool {
        self.effects.iter().any(|e| matches!(e, Effect::LevelUp))
    }

    pub fn is_equip(&self) -> bool {
        self.effects.iter().any(|e| matches!(e, Effect::Attach))
    }
}
