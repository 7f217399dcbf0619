//! Scripted action hints
//!
//! A directive file holds one hint per line, `cast:<card name>` or
//! `play:<card name>`. While hints remain, a decision with a matching legal
//! action takes it directly instead of searching.

use crate::ai::{ActionKind, RulesEngine, SimAction};
use crate::Result;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionKind {
    Cast,
    Play,
}

impl SuggestionKind {
    fn matches(self, kind: ActionKind) -> bool {
        matches!(
            (self, kind),
            (SuggestionKind::Cast, ActionKind::Cast) | (SuggestionKind::Play, ActionKind::Play)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub card_name: String,
}

impl Suggestion {
    /// `None` for anything that is not a well-formed directive
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (kind, name) = if let Some(name) = line.strip_prefix("cast:") {
            (SuggestionKind::Cast, name)
        } else if let Some(name) = line.strip_prefix("play:") {
            (SuggestionKind::Play, name)
        } else {
            return None;
        };
        let name = name.trim();
        (!name.is_empty()).then(|| Suggestion {
            kind,
            card_name: name.to_string(),
        })
    }
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            SuggestionKind::Cast => "cast",
            SuggestionKind::Play => "play",
        };
        write!(f, "{prefix}:{}", self.card_name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuggestedActions {
    hints: Vec<Suggestion>,
}

impl SuggestedActions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        SuggestedActions {
            hints: text.lines().filter_map(Suggestion::parse).collect(),
        }
    }

    /// Read a directive file; a missing file means no hints
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_text(&text))
    }

    /// Add one directive; returns false when it is malformed
    pub fn add(&mut self, directive: &str) -> bool {
        match Suggestion::parse(directive) {
            Some(hint) => {
                self.hints.push(hint);
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hints.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Suggestion> {
        self.hints.iter()
    }

    /// The first legal action matching a hint, in hint order. The hint is
    /// consumed.
    pub fn take_matching<G: RulesEngine>(&mut self, state: &G, actions: &[G::Action]) -> Option<G::Action> {
        for (idx, hint) in self.hints.iter().enumerate() {
            let found = actions.iter().find(|action| {
                hint.kind.matches(action.kind())
                    && state.action_source_name(action).as_deref() == Some(hint.card_name.as_str())
            });
            if let Some(action) = found {
                let action = action.clone();
                self.hints.remove(idx);
                return Some(action);
            }
        }
        None
    }
}
