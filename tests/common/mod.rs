//! Fixture rules engine for search tests
//!
//! Two players take one or two tokens in turns; whoever takes the last one
//! wins. An endless variant never runs out and gives every move a fresh
//! key, so nothing is pruned as a repetition and the tree is unbounded.
//! Under sudden death, passing while tokens remain forfeits the game.

#![allow(dead_code)]

use mtg_forge_ai::ai::{
    ActionKey, ActionKind, PendingSearch, RulesEngine, SimAction, StateEvaluator, LOSE, WIN,
};
use mtg_forge_ai::core::{CardId, PlayerId};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

pub fn alice() -> PlayerId {
    PlayerId::new(0)
}

pub fn bob() -> PlayerId {
    PlayerId::new(1)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Move {
    Take(u32),
    /// Changes nothing but the move counter; keeps priority
    Fidget,
    /// Mana-style counterpart of `Fidget`
    Tap,
    Pass,
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Take(n) => write!(f, "take {n}"),
            Move::Fidget => f.write_str("fidget"),
            Move::Tap => f.write_str("tap"),
            Move::Pass => f.write_str("pass"),
        }
    }
}

impl SimAction for Move {
    fn kind(&self) -> ActionKind {
        match self {
            Move::Take(_) | Move::Fidget => ActionKind::Activate,
            Move::Tap => ActionKind::Mana,
            Move::Pass => ActionKind::Pass,
        }
    }

    fn key(&self) -> ActionKey {
        match self {
            Move::Take(n) => ActionKey::new(ActionKind::Activate).with(0).with(*n),
            Move::Fidget => ActionKey::new(ActionKind::Activate).with(1),
            Move::Tap => ActionKey::new(ActionKind::Mana),
            Move::Pass => ActionKey::new(ActionKind::Pass),
        }
    }

    fn uses_stack(&self) -> bool {
        false
    }

    fn pass() -> Self {
        Move::Pass
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TakeAway {
    pub tokens: u32,
    pub endless: bool,
    pub allow_fidget: bool,
    pub allow_tap: bool,
    pub sudden_death: bool,
    pub moves: u32,
    pub priority: PlayerId,
    pub passed: [bool; 2],
    pub winner: Option<PlayerId>,
}

fn idx(player: PlayerId) -> usize {
    player.as_u32() as usize
}

fn other(player: PlayerId) -> PlayerId {
    if player == alice() {
        bob()
    } else {
        alice()
    }
}

impl TakeAway {
    pub fn new(tokens: u32) -> Self {
        TakeAway {
            tokens,
            endless: false,
            allow_fidget: false,
            allow_tap: false,
            sudden_death: false,
            moves: 0,
            priority: alice(),
            passed: [false; 2],
            winner: None,
        }
    }

    pub fn endless() -> Self {
        TakeAway {
            endless: true,
            ..Self::new(0)
        }
    }

    pub fn with_fidget(mut self) -> Self {
        self.allow_fidget = true;
        self
    }

    pub fn with_tap(mut self) -> Self {
        self.allow_tap = true;
        self
    }

    pub fn with_sudden_death(mut self) -> Self {
        self.sudden_death = true;
        self
    }
}

impl RulesEngine for TakeAway {
    type Action = Move;
    type Combat = ();

    fn legal_actions(&self, player: PlayerId) -> Vec<Move> {
        let mut actions = Vec::new();
        if self.winner.is_none() && player == self.priority {
            if self.endless {
                actions.push(Move::Take(self.moves * 2 + 1));
                actions.push(Move::Take(self.moves * 2 + 2));
            } else {
                for n in 1..=self.tokens.min(2) {
                    actions.push(Move::Take(n));
                }
            }
            if self.allow_fidget {
                actions.push(Move::Fidget);
            }
            if self.allow_tap {
                actions.push(Move::Tap);
            }
        }
        actions.push(Move::Pass);
        actions
    }

    fn apply(&mut self, player: PlayerId, action: &Move) -> bool {
        if *action == Move::Pass {
            self.pass_priority(player);
            return true;
        }
        if self.winner.is_some() || player != self.priority {
            return false;
        }
        match *action {
            Move::Take(n) => {
                if self.endless {
                    self.moves += 1;
                } else {
                    if n == 0 || n > 2 || n > self.tokens {
                        return false;
                    }
                    self.tokens -= n;
                    self.moves += 1;
                    if self.tokens == 0 {
                        self.winner = Some(player);
                    }
                }
                self.priority = other(player);
            }
            Move::Fidget => {
                if !self.allow_fidget {
                    return false;
                }
                self.moves += 1;
            }
            Move::Tap => {
                if !self.allow_tap {
                    return false;
                }
                self.moves += 1;
            }
            Move::Pass => {}
        }
        self.passed = [false; 2];
        true
    }

    fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    fn all_passed(&self) -> bool {
        self.passed.iter().all(|p| *p)
    }

    fn stack_is_empty(&self) -> bool {
        true
    }

    fn priority_player(&self) -> PlayerId {
        self.priority
    }

    fn active_player(&self) -> PlayerId {
        alice()
    }

    fn next_player(&self, player: PlayerId) -> PlayerId {
        other(player)
    }

    fn pass_priority(&mut self, player: PlayerId) {
        if self.sudden_death && !self.endless && self.tokens > 0 && self.winner.is_none() {
            self.winner = Some(other(player));
        }
        self.passed[idx(player)] = true;
        self.priority = other(player);
    }

    fn pending_search(&self) -> Option<PendingSearch> {
        None
    }

    fn choose_search_target(&mut self, _card: CardId) -> bool {
        false
    }

    fn resolve_top(&mut self) {}

    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    fn combat_snapshot(&self) -> Option<()> {
        None
    }

    fn action_source_name(&self, _action: &Move) -> Option<String> {
        None
    }
}

/// Win, loss, or nothing in between
#[derive(Debug, Clone, Copy, Default)]
pub struct WinnerOnly;

impl StateEvaluator<TakeAway> for WinnerOnly {
    fn evaluate(&self, perspective: PlayerId, state: &TakeAway) -> i32 {
        match state.winner {
            Some(w) if w == perspective => WIN,
            Some(_) => LOSE,
            None => 0,
        }
    }
}

/// Seven points per move made, so a cutoff score is easy to recognize
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveCount;

impl StateEvaluator<TakeAway> for MoveCount {
    fn evaluate(&self, perspective: PlayerId, state: &TakeAway) -> i32 {
        match state.winner {
            Some(w) if w == perspective => WIN,
            Some(_) => LOSE,
            None => {
                let score = 7 * state.moves as i32 + 3;
                if perspective == alice() {
                    score
                } else {
                    -score
                }
            }
        }
    }
}

/// Fails on first use, to exercise worker failure handling
#[derive(Debug, Clone, Copy, Default)]
pub struct Exploding;

impl StateEvaluator<TakeAway> for Exploding {
    fn evaluate(&self, _perspective: PlayerId, _state: &TakeAway) -> i32 {
        panic!("evaluator exploded");
    }
}
