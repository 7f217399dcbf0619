//! Reference rules engine: game state, turn structure and the match loop

pub mod actions;
pub mod catalog;
pub mod combat;
pub mod controller;
pub mod game_loop;
pub mod game_state_evaluator;
pub mod hand_setup;
pub mod logger;
pub mod mana_payment;
pub mod phase;
pub mod random_controller;
pub mod rules;
pub mod stack;
pub mod state;
pub mod state_hash;

pub use actions::GameAction;
pub use catalog::StarterDeck;
pub use combat::CombatState;
pub use controller::{GameStateView, PlayerController};
pub use game_loop::{GameEndReason, GameLoop, GameResult};
pub use game_state_evaluator::GameStateEvaluator;
pub use hand_setup::new_starter_match;
pub use logger::{GameLogger, LogEntry, OutputMode, VerbosityLevel};
pub use phase::{Step, TurnStructure};
pub use random_controller::RandomController;
pub use state::GameState;
pub use state_hash::compute_state_hash;
