//! Core game types and entities

pub mod card;
pub mod effects;
pub mod entity;
pub mod mana;
pub mod player;

pub use card::{Card, CardType, EquipmentBonus, LevelBand, Leveler};
pub use effects::{AbilityCost, ActivatedAbility, Effect, Keyword, SearchFilter, TargetRef, TargetSpec};
pub use entity::{CardId, EntityId, EntityStore, GameEntity, PlayerId};
pub use mana::{Color, ManaCost, ManaPool};
pub use player::Player;
