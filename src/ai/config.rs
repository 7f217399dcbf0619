//! AI configuration

use crate::ai::search::SearchSettings;
use crate::{MtgError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tunables of the search opponent, loaded from JSON
///
/// Missing fields take their defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Drives search depth and think time
    pub skill: u32,
    /// Soft ceiling on nodes created per search
    pub max_nodes: usize,
    /// Let the deadline cancel a running search
    pub allow_interrupt: bool,
    /// Subtracted from passing at the root
    pub passivity_penalty: i32,
    /// Seed for tie-breaks; random when absent
    pub seed: Option<u64>,
    /// Overrides the skill-based think time
    pub max_think_ms: Option<u64>,
    /// Overrides the skill-based depth
    pub max_depth: Option<i32>,
    /// Directive file with `cast:<name>` / `play:<name>` lines
    pub suggestions_file: Option<PathBuf>,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            skill: 4,
            max_nodes: 5000,
            allow_interrupt: true,
            passivity_penalty: 5,
            seed: None,
            max_think_ms: None,
            max_depth: None,
            suggestions_file: None,
        }
    }
}

impl AiConfig {
    pub fn with_skill(skill: u32) -> Self {
        AiConfig {
            skill,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: AiConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.skill == 0 {
            return Err(MtgError::InvalidConfig("skill must be positive".into()));
        }
        if self.max_think_ms == Some(0) {
            return Err(MtgError::InvalidConfig("max_think_ms must be positive".into()));
        }
        if self.max_nodes == 0 {
            return Err(MtgError::InvalidConfig("max_nodes must be positive".into()));
        }
        if matches!(self.max_depth, Some(d) if d <= 0) {
            return Err(MtgError::InvalidConfig("max_depth must be positive".into()));
        }
        if self.passivity_penalty < 0 {
            return Err(MtgError::InvalidConfig(
                "passivity_penalty must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Skill, but never shallower than 4
    pub fn max_depth(&self) -> i32 {
        self.max_depth
            .unwrap_or_else(|| i32::try_from(self.skill).unwrap_or(i32::MAX).max(4))
    }

    /// Three seconds per skill level unless overridden
    pub fn think_budget(&self) -> Duration {
        match self.max_think_ms {
            Some(ms) => Duration::from_millis(ms),
            None => Duration::from_secs(u64::from(self.skill) * 3),
        }
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            max_depth: self.max_depth(),
            passivity_penalty: self.passivity_penalty,
            seed: self.seed,
        }
    }
}
