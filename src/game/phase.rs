//! Turn steps

use crate::core::PlayerId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Untap,
    Upkeep,
    Draw,
    Main1,
    BeginCombat,
    DeclareAttackers,
    DeclareBlockers,
    CombatDamage,
    EndCombat,
    Main2,
    End,
    Cleanup,
}

impl Step {
    /// Next step in turn order, `None` after cleanup
    pub fn next(&self) -> Option<Step> {
        match self {
            Step::Untap => Some(Step::Upkeep),
            Step::Upkeep => Some(Step::Draw),
            Step::Draw => Some(Step::Main1),
            Step::Main1 => Some(Step::BeginCombat),
            Step::BeginCombat => Some(Step::DeclareAttackers),
            Step::DeclareAttackers => Some(Step::DeclareBlockers),
            Step::DeclareBlockers => Some(Step::CombatDamage),
            Step::CombatDamage => Some(Step::EndCombat),
            Step::EndCombat => Some(Step::Main2),
            Step::Main2 => Some(Step::End),
            Step::End => Some(Step::Cleanup),
            Step::Cleanup => None,
        }
    }

    pub fn is_main(&self) -> bool {
        matches!(self, Step::Main1 | Step::Main2)
    }

    /// Players receive priority in every step but untap and cleanup
    pub fn has_priority(&self) -> bool {
        !matches!(self, Step::Untap | Step::Cleanup)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::Untap => "untap",
            Step::Upkeep => "upkeep",
            Step::Draw => "draw",
            Step::Main1 => "main 1",
            Step::BeginCombat => "beginning of combat",
            Step::DeclareAttackers => "declare attackers",
            Step::DeclareBlockers => "declare blockers",
            Step::CombatDamage => "combat damage",
            Step::EndCombat => "end of combat",
            Step::Main2 => "main 2",
            Step::End => "end",
            Step::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Turn bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnStructure {
    /// Starts at 1
    pub turn_number: u32,
    pub current_step: Step,
    pub active_player: PlayerId,
    pub priority_player: PlayerId,
}

impl TurnStructure {
    pub fn new(starting_player: PlayerId) -> Self {
        TurnStructure {
            turn_number: 1,
            current_step: Step::Untap,
            active_player: starting_player,
            priority_player: starting_player,
        }
    }

    /// Advance within the turn; returns false at the end of the turn
    pub fn advance_step(&mut self) -> bool {
        match self.current_step.next() {
            Some(step) => {
                self.current_step = step;
                true
            }
            None => false,
        }
    }

    pub fn next_turn(&mut self, next_active: PlayerId) {
        self.turn_number += 1;
        self.current_step = Step::Untap;
        self.active_player = next_active;
        self.priority_player = next_active;
    }
}
