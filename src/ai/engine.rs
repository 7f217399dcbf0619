//! Boundary between the search core and a rules engine
//!
//! The search only ever talks to the game through [`RulesEngine`]. Every
//! branch works on its own `clone()` of the state, so implementations must
//! make `Clone` a deep copy that shares no mutable data with the original.

use crate::core::{CardId, PlayerId};
use smallvec::SmallVec;
use std::fmt;

/// Coarse action classification used for ordering and repetition checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionKind {
    /// Playing a land
    Play,
    /// Casting a spell
    Cast,
    /// Activating a non-mana ability
    Activate,
    /// Activating a mana ability
    Mana,
    /// Passing priority
    Pass,
}

impl ActionKind {
    /// Play sorts before cast, cast before everything else, pass last
    pub fn order_rank(self) -> u8 {
        match self {
            ActionKind::Play => 0,
            ActionKind::Cast => 1,
            ActionKind::Activate | ActionKind::Mana => 2,
            ActionKind::Pass => 3,
        }
    }
}

/// Canonical identity of an action
///
/// Built from entity ids and ability indices only, so the same action has
/// the same key in every clone of a state. Keys are totally ordered.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionKey {
    kind: ActionKind,
    parts: SmallVec<[u32; 4]>,
}

impl ActionKey {
    pub fn new(kind: ActionKind) -> Self {
        ActionKey {
            kind,
            parts: SmallVec::new(),
        }
    }

    pub fn with(mut self, part: u32) -> Self {
        self.parts.push(part);
        self
    }

    /// Optional parts are encoded with a presence marker so that
    /// `None` and `Some(0)` never collide
    pub fn with_opt(self, part: Option<u32>) -> Self {
        match part {
            Some(p) => self.with(1).with(p),
            None => self.with(0),
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }
}

/// An action the search can apply to a cloned state
pub trait SimAction: Clone + PartialEq + fmt::Debug + fmt::Display + Send + 'static {
    fn kind(&self) -> ActionKind;

    fn key(&self) -> ActionKey;

    /// Puts an object on the stack that needs the other players to pass
    fn uses_stack(&self) -> bool;

    /// The pass-priority action
    fn pass() -> Self;

    fn is_pass(&self) -> bool {
        self.kind() == ActionKind::Pass
    }

    fn is_spell(&self) -> bool {
        self.kind() == ActionKind::Cast
    }

    fn is_mana(&self) -> bool {
        self.kind() == ActionKind::Mana
    }
}

/// A search effect on top of the stack whose card is not chosen yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSearch {
    pub controller: PlayerId,
    pub candidates: Vec<CardId>,
}

/// The rules engine as seen by the search
pub trait RulesEngine: Clone + Send + 'static {
    type Action: SimAction;
    /// Combat assignment snapshot carried on search nodes
    type Combat: Clone + fmt::Debug + Send + 'static;

    /// Full legal action set for `player`; always contains a pass
    fn legal_actions(&self, player: PlayerId) -> Vec<Self::Action>;

    /// Mutate the state by applying `action`. Returns false when the action
    /// was not legal; the state may then be partially modified and should
    /// be discarded.
    fn apply(&mut self, player: PlayerId, action: &Self::Action) -> bool;

    fn is_over(&self) -> bool;

    fn all_passed(&self) -> bool;

    fn stack_is_empty(&self) -> bool;

    /// All players passed with nothing left to resolve
    fn step_finished(&self) -> bool {
        self.all_passed() && self.stack_is_empty()
    }

    fn priority_player(&self) -> PlayerId;

    fn active_player(&self) -> PlayerId;

    /// Player after `player` in turn order
    fn next_player(&self, player: PlayerId) -> PlayerId;

    fn pass_priority(&mut self, player: PlayerId);

    fn pending_search(&self) -> Option<PendingSearch>;

    /// Fix the card chosen by the pending search on top of the stack
    fn choose_search_target(&mut self, card: CardId) -> bool;

    fn resolve_top(&mut self);

    /// Apply state-based actions after an action was applied
    fn check_state(&mut self) {}

    /// Hash of everything that matters to play
    fn fingerprint(&self) -> u64;

    fn combat_snapshot(&self) -> Option<Self::Combat>;

    /// Name of the card an action comes from, if any
    fn action_source_name(&self, action: &Self::Action) -> Option<String>;
}
