//! MTG Forge AI - minimax decision core for a two-player card game
//!
//! The [`ai`] module holds the search (evaluation, action ordering, the
//! simulation tree and the time-bounded runner); [`game`] is a compact
//! rules engine the search plays on.

pub mod ai;
pub mod core;
pub mod error;
pub mod game;
pub mod zones;

pub use error::{MtgError, Result};
