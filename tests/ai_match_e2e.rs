//! Full matches with the search AI in one seat

use mtg_forge_ai::ai::{AiConfig, AiController};
use mtg_forge_ai::core::PlayerId;
use mtg_forge_ai::game::{
    new_starter_match, GameEndReason, GameLogger, GameLoop, RandomController, StarterDeck,
    VerbosityLevel,
};

fn quick_config(seed: u64) -> AiConfig {
    AiConfig {
        max_nodes: 300,
        max_think_ms: Some(1500),
        seed: Some(seed),
        ..AiConfig::default()
    }
}

#[test]
fn test_ai_plays_full_match_against_random() {
    let mut game = new_starter_match(
        ("Search", "Random"),
        (StarterDeck::Stompy, StarterDeck::WhiteWeenie),
        21,
    )
    .unwrap();
    let logger = GameLogger::capturing(VerbosityLevel::Silent);
    let mut ai = AiController::new(PlayerId::new(0), quick_config(21), logger.clone()).unwrap();
    let mut random = RandomController::with_seed(PlayerId::new(1), 22);

    let result = GameLoop::new(&mut game)
        .with_max_turns(12)
        .with_logger(logger)
        .run_game(&mut ai, &mut random)
        .unwrap();

    assert!(result.turns_played > 0 && result.turns_played <= 12);
    if result.end_reason == GameEndReason::TurnLimit {
        assert_eq!(result.winner, None);
    }
    assert!(ai.search_count() > 0, "the AI never searched");
}

#[test]
fn test_ai_mirror_match_completes() {
    let mut game = new_starter_match(
        ("North", "South"),
        (StarterDeck::WhiteWeenie, StarterDeck::Stompy),
        5,
    )
    .unwrap();
    let logger = GameLogger::capturing(VerbosityLevel::Silent);
    let mut north = AiController::new(PlayerId::new(0), quick_config(1), logger.clone()).unwrap();
    let mut south = AiController::new(PlayerId::new(1), quick_config(2), logger.clone()).unwrap();

    let result = GameLoop::new(&mut game)
        .with_max_turns(6)
        .with_logger(logger)
        .run_game(&mut north, &mut south)
        .unwrap();

    assert!(result.turns_played <= 6);
    assert!(north.search_count() + south.search_count() > 0);
}

fn match_transcript(seed: u64) -> Vec<String> {
    let mut game = new_starter_match(
        ("Search", "Random"),
        (StarterDeck::Stompy, StarterDeck::Stompy),
        seed,
    )
    .unwrap();
    let logger = GameLogger::capturing(VerbosityLevel::Normal);
    // Node budget only, so the outcome does not depend on machine speed
    let config = AiConfig {
        allow_interrupt: false,
        ..quick_config(seed)
    };
    let mut ai = AiController::new(PlayerId::new(0), config, logger.clone()).unwrap();
    let mut random = RandomController::with_seed(PlayerId::new(1), seed);

    GameLoop::new(&mut game)
        .with_max_turns(6)
        .with_logger(logger.clone())
        .run_game(&mut ai, &mut random)
        .unwrap();
    logger.logs().into_iter().map(|entry| entry.message).collect()
}

#[test]
fn test_same_seed_same_match() {
    let first = match_transcript(9);
    let second = match_transcript(9);
    assert!(!first.is_empty());
    similar_asserts::assert_eq!(first, second);
}
