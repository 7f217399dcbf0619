//! Card instances

use crate::core::{ActivatedAbility, CardId, Effect, GameEntity, Keyword, ManaCost, PlayerId, TargetSpec};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardType {
    Creature,
    Instant,
    Sorcery,
    Artifact,
    Land,
}

/// Stats granted once a leveler reaches `min_level`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelBand {
    pub min_level: u8,
    pub power: i8,
    pub toughness: i8,
    pub keywords: SmallVec<[Keyword; 2]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leveler {
    pub max_level: u8,
    /// Sorted by ascending `min_level`
    pub bands: SmallVec<[LevelBand; 2]>,
}

/// Bonus an equipment gives to the creature it is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentBonus {
    pub power: i8,
    pub toughness: i8,
}

/// A card during gameplay
///
/// Stats here exclude equipment, which depends on other permanents; use
/// `GameState::power`/`toughness` for the full values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub mana_cost: ManaCost,
    pub types: SmallVec<[CardType; 2]>,
    pub power: Option<i8>,
    pub toughness: Option<i8>,
    pub keywords: SmallVec<[Keyword; 4]>,
    pub owner: PlayerId,
    pub controller: PlayerId,
    pub tapped: bool,

    /// Damage marked this turn
    pub damage: i32,
    /// Some of the marked damage came from a deathtouch source
    pub deathtouch_damage: bool,
    /// Until-end-of-turn modifiers
    pub power_bonus: i32,
    pub toughness_bonus: i32,
    /// Turn the permanent came under its controller's control
    pub entered_turn: Option<u32>,

    /// Instant/sorcery text
    pub spell_effects: SmallVec<[Effect; 2]>,
    pub spell_target: TargetSpec,
    pub abilities: SmallVec<[ActivatedAbility; 2]>,

    pub level: u8,
    pub leveler: Option<Leveler>,
    pub equipment: Option<EquipmentBonus>,
    pub attached_to: Option<CardId>,
}

impl Card {
    pub fn new(id: CardId, name: impl Into<String>, owner: PlayerId) -> Self {
        Card {
            id,
            name: name.into(),
            mana_cost: ManaCost::new(),
            types: SmallVec::new(),
            power: None,
            toughness: None,
            keywords: SmallVec::new(),
            owner,
            controller: owner,
            tapped: false,
            damage: 0,
            deathtouch_damage: false,
            power_bonus: 0,
            toughness_bonus: 0,
            entered_turn: None,
            spell_effects: SmallVec::new(),
            spell_target: TargetSpec::None,
            abilities: SmallVec::new(),
            level: 0,
            leveler: None,
            equipment: None,
            attached_to: None,
        }
    }

    pub fn is_type(&self, card_type: CardType) -> bool {
        self.types.contains(&card_type)
    }

    pub fn is_creature(&self) -> bool {
        self.is_type(CardType::Creature)
    }

    pub fn is_land(&self) -> bool {
        self.is_type(CardType::Land)
    }

    pub fn is_instant(&self) -> bool {
        self.is_type(CardType::Instant)
    }

    /// Instants and sorceries go to the graveyard after resolving
    pub fn is_permanent_card(&self) -> bool {
        !(self.is_instant() || self.is_type(CardType::Sorcery))
    }

    fn active_band(&self) -> Option<&LevelBand> {
        self.leveler
            .as_ref()?
            .bands
            .iter()
            .rev()
            .find(|band| self.level >= band.min_level)
    }

    /// Power without equipment
    pub fn current_power(&self) -> i32 {
        let base = match self.active_band() {
            Some(band) => band.power,
            None => self.power.unwrap_or(0),
        };
        base as i32 + self.power_bonus
    }

    /// Toughness without equipment
    pub fn current_toughness(&self) -> i32 {
        let base = match self.active_band() {
            Some(band) => band.toughness,
            None => self.toughness.unwrap_or(0),
        };
        base as i32 + self.toughness_bonus
    }

    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(&keyword)
            || self
                .active_band()
                .is_some_and(|band| band.keywords.contains(&keyword))
    }

    pub fn at_max_level(&self) -> bool {
        self.leveler
            .as_ref()
            .is_some_and(|l| self.level >= l.max_level)
    }

    /// Can't attack or use tap abilities yet
    pub fn is_summoning_sick(&self, turn: u32) -> bool {
        self.is_creature()
            && !self.has_keyword(Keyword::Haste)
            && self.entered_turn.is_some_and(|t| t >= turn)
    }

    pub fn tap(&mut self) {
        self.tapped = true;
    }

    pub fn untap(&mut self) {
        self.tapped = false;
    }

    /// Clear damage and until-end-of-turn effects
    pub fn end_turn_cleanup(&mut self) {
        self.damage = 0;
        self.deathtouch_damage = false;
        self.power_bonus = 0;
        self.toughness_bonus = 0;
    }
}

impl GameEntity for Card {
    fn id(&self) -> CardId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }
}
