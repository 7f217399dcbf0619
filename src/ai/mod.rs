//! Game-playing AI: state evaluation, combat policy and minimax search
//!
//! The search is generic over [`RulesEngine`]; the reference engine in
//! [`crate::game`] implements it for [`crate::game::GameState`].

pub mod combat;
pub mod config;
pub mod context;
pub mod controller;
pub mod engine;
pub mod evaluator;
pub mod node;
pub mod optimizers;
pub mod runner;
pub mod search;
pub mod suggested;

pub use combat::{CombatEvaluator, DuelOutcome};
pub use config::AiConfig;
pub use context::{CancelToken, SearchContext, SearchStats};
pub use controller::AiController;
pub use engine::{ActionKey, ActionKind, PendingSearch, RulesEngine, SimAction};
pub use evaluator::{StateEvaluator, LOSE, WIN};
pub use node::{NodeId, SimulationNode, SimulationTree};
pub use optimizers::{ActionOptimizer, TreeOptimizer};
pub use runner::{SearchJob, SearchOutcome, SearchRunner};
pub use search::{SearchDriver, SearchSettings};
pub use suggested::{SuggestedActions, Suggestion};
