//! Built-in card catalog and starter decks

use crate::core::{
    AbilityCost, ActivatedAbility, Card, CardId, CardType, Color, Effect, EquipmentBonus, Keyword,
    LevelBand, Leveler, ManaCost, PlayerId, SearchFilter, TargetSpec,
};
use crate::{MtgError, Result};
use smallvec::smallvec;

/// Every card name `create_card` understands
pub const CARD_NAMES: &[&str] = &[
    "Forest",
    "Mountain",
    "Plains",
    "Swamp",
    "Lightning Bolt",
    "Giant Growth",
    "Healing Salve",
    "Sylvan Scrying",
    "Grizzly Bears",
    "Hill Giant",
    "Giant Spider",
    "Colossal Dreadmaw",
    "Wild Mongrel",
    "Prodigal Pyromancer",
    "Raging Goblin",
    "Wall of Wood",
    "Typhoid Rats",
    "Darksteel Myr",
    "Suntail Hawk",
    "Serra Angel",
    "Akrasan Squire",
    "Knight of Meadowgrain",
    "Fencing Ace",
    "Student of Warfare",
    "Bonesplitter",
];

fn basic_land(card: &mut Card, color: Color) {
    card.types.push(CardType::Land);
    card.abilities.push(ActivatedAbility::new(
        AbilityCost {
            tap: true,
            ..Default::default()
        },
        [Effect::AddMana { color, amount: 1 }],
    ));
}

fn creature(card: &mut Card, cost: &str, power: i8, toughness: i8, keywords: &[Keyword]) {
    card.types.push(CardType::Creature);
    card.mana_cost = ManaCost::from_string(cost);
    card.power = Some(power);
    card.toughness = Some(toughness);
    card.keywords.extend_from_slice(keywords);
}

fn spell(card: &mut Card, card_type: CardType, cost: &str, target: TargetSpec, effect: Effect) {
    card.types.push(card_type);
    card.mana_cost = ManaCost::from_string(cost);
    card.spell_target = target;
    card.spell_effects.push(effect);
}

/// Build a fresh instance of a catalog card
pub fn create_card(id: CardId, name: &str, owner: PlayerId) -> Result<Card> {
    use Keyword::*;

    let mut card = Card::new(id, name, owner);
    match name {
        "Forest" => basic_land(&mut card, Color::Green),
        "Mountain" => basic_land(&mut card, Color::Red),
        "Plains" => basic_land(&mut card, Color::White),
        "Swamp" => basic_land(&mut card, Color::Black),

        "Lightning Bolt" => spell(
            &mut card,
            CardType::Instant,
            "R",
            TargetSpec::Any,
            Effect::DealDamage { amount: 3 },
        ),
        "Giant Growth" => spell(
            &mut card,
            CardType::Instant,
            "G",
            TargetSpec::Creature,
            Effect::PumpTarget {
                power: 3,
                toughness: 3,
            },
        ),
        "Healing Salve" => spell(
            &mut card,
            CardType::Instant,
            "W",
            TargetSpec::None,
            Effect::GainLife { amount: 3 },
        ),
        "Sylvan Scrying" => spell(
            &mut card,
            CardType::Sorcery,
            "1G",
            TargetSpec::None,
            Effect::SearchLibrary {
                filter: SearchFilter::BasicLand,
            },
        ),

        "Grizzly Bears" => creature(&mut card, "1G", 2, 2, &[]),
        "Hill Giant" => creature(&mut card, "3R", 3, 3, &[]),
        "Giant Spider" => creature(&mut card, "3G", 2, 4, &[Reach]),
        "Colossal Dreadmaw" => creature(&mut card, "4GG", 6, 6, &[Trample]),
        "Raging Goblin" => creature(&mut card, "R", 1, 1, &[Haste]),
        "Wall of Wood" => creature(&mut card, "G", 0, 3, &[Defender]),
        "Typhoid Rats" => creature(&mut card, "B", 1, 1, &[Deathtouch]),
        "Darksteel Myr" => {
            creature(&mut card, "3", 0, 1, &[Indestructible]);
            card.types.push(CardType::Artifact);
        }
        "Suntail Hawk" => creature(&mut card, "W", 1, 1, &[Flying]),
        "Serra Angel" => creature(&mut card, "3WW", 4, 4, &[Flying, Vigilance]),
        "Akrasan Squire" => creature(&mut card, "W", 1, 1, &[Exalted]),
        "Knight of Meadowgrain" => creature(&mut card, "WW", 2, 2, &[FirstStrike, Lifelink]),
        "Fencing Ace" => creature(&mut card, "1W", 1, 1, &[DoubleStrike]),

        "Wild Mongrel" => {
            creature(&mut card, "1G", 2, 2, &[]);
            card.abilities.push(ActivatedAbility::new(
                AbilityCost {
                    discard: true,
                    ..Default::default()
                },
                [Effect::PumpSelf {
                    power: 1,
                    toughness: 1,
                }],
            ));
        }
        "Prodigal Pyromancer" => {
            creature(&mut card, "2R", 1, 1, &[]);
            card.abilities.push(
                ActivatedAbility::new(
                    AbilityCost {
                        tap: true,
                        ..Default::default()
                    },
                    [Effect::DealDamage { amount: 1 }],
                )
                .with_target(TargetSpec::Any),
            );
        }
        "Student of Warfare" => {
            creature(&mut card, "W", 1, 1, &[]);
            card.leveler = Some(Leveler {
                max_level: 7,
                bands: smallvec![
                    LevelBand {
                        min_level: 2,
                        power: 3,
                        toughness: 3,
                        keywords: smallvec![FirstStrike],
                    },
                    LevelBand {
                        min_level: 7,
                        power: 4,
                        toughness: 4,
                        keywords: smallvec![DoubleStrike],
                    },
                ],
            });
            card.abilities.push(
                ActivatedAbility::new(
                    AbilityCost {
                        mana: ManaCost::from_string("W"),
                        ..Default::default()
                    },
                    [Effect::LevelUp],
                )
                .at_sorcery_speed(),
            );
        }
        "Bonesplitter" => {
            card.types.push(CardType::Artifact);
            card.mana_cost = ManaCost::from_string("1");
            card.equipment = Some(EquipmentBonus {
                power: 2,
                toughness: 0,
            });
            card.abilities.push(
                ActivatedAbility::new(
                    AbilityCost {
                        mana: ManaCost::from_string("1"),
                        ..Default::default()
                    },
                    [Effect::Attach],
                )
                .with_target(TargetSpec::Creature)
                .at_sorcery_speed(),
            );
        }
        _ => return Err(MtgError::InvalidAction(format!("unknown card: {name}"))),
    }
    Ok(card)
}

/// Built-in forty-card decks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarterDeck {
    /// Green-red creatures and burn
    Stompy,
    /// White fliers, first strikers and equipment
    WhiteWeenie,
}

impl StarterDeck {
    pub fn card_list(self) -> Vec<&'static str> {
        let counts: &[(&'static str, usize)] = match self {
            StarterDeck::Stompy => &[
                ("Forest", 9),
                ("Mountain", 8),
                ("Grizzly Bears", 4),
                ("Wild Mongrel", 3),
                ("Hill Giant", 3),
                ("Giant Spider", 2),
                ("Colossal Dreadmaw", 2),
                ("Lightning Bolt", 4),
                ("Giant Growth", 2),
                ("Sylvan Scrying", 2),
                ("Prodigal Pyromancer", 1),
            ],
            StarterDeck::WhiteWeenie => &[
                ("Plains", 16),
                ("Student of Warfare", 4),
                ("Akrasan Squire", 4),
                ("Suntail Hawk", 4),
                ("Fencing Ace", 3),
                ("Serra Angel", 3),
                ("Bonesplitter", 2),
                ("Healing Salve", 2),
                ("Knight of Meadowgrain", 2),
            ],
        };
        counts
            .iter()
            .flat_map(|&(name, n)| std::iter::repeat(name).take(n))
            .collect()
    }
}
