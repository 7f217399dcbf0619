//! Deterministic state fingerprints
//!
//! The AI compares the fingerprint of the live game with the one recorded
//! on a searched node to decide whether a planned line is still valid.

use crate::game::GameState;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Fields that do not affect play
///
/// - rng: shuffles are hidden information, not board state
/// - next_id: id allocator of the card store
/// - name: display names of players and cards
const EXCLUDED_FIELDS: &[&str] = &["rng", "next_id", "name"];

/// Hash of the canonical JSON form of the state with metadata stripped.
/// Equal play-relevant states hash equally.
pub fn compute_state_hash(game: &GameState) -> u64 {
    let json_value = match serde_json::to_value(game) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("Warning: Failed to serialize game state for hashing: {e}");
            return 0;
        }
    };

    // serde_json's default map is sorted, so the string form is canonical
    let canonical = strip_metadata(json_value).to_string();

    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    hasher.finish()
}

fn strip_metadata(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .filter(|(k, _)| !EXCLUDED_FIELDS.contains(&k.as_str()))
                .map(|(k, v)| (k, strip_metadata(v)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(strip_metadata).collect())
        }
        other => other,
    }
}
