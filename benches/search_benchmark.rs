//! Search throughput benchmarks
//!
//! Runs a full search from a dealt starter match at several node budgets,
//! plus the static evaluator on its own. Build without the default
//! `verbose-logging` feature to leave per-node tracing out.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mtg_forge_ai::ai::{
    ActionOptimizer, SearchContext, SearchDriver, SearchSettings, SimulationTree, StateEvaluator,
};
use mtg_forge_ai::core::PlayerId;
use mtg_forge_ai::game::{
    new_starter_match, GameLogger, GameState, GameStateEvaluator, StarterDeck, Step,
    VerbosityLevel,
};

fn main_phase_match(seed: u64) -> GameState {
    let mut game = new_starter_match(
        ("Alice", "Bob"),
        (StarterDeck::Stompy, StarterDeck::WhiteWeenie),
        seed,
    )
    .expect("starter decks are valid");
    game.turn.current_step = Step::Main1;
    game
}

fn bench_search(c: &mut Criterion) {
    let game = main_phase_match(42);
    let alice = PlayerId::new(0);
    let mut group = c.benchmark_group("search");
    group.sample_size(20);

    for max_nodes in [100usize, 500, 2000] {
        group.bench_with_input(BenchmarkId::new("nodes", max_nodes), &max_nodes, |b, &max_nodes| {
            b.iter(|| {
                let settings = SearchSettings {
                    seed: Some(1),
                    ..SearchSettings::default()
                };
                let mut driver = SearchDriver::new(
                    GameStateEvaluator::new(),
                    ActionOptimizer::standard(),
                    alice,
                    settings,
                    GameLogger::with_verbosity(VerbosityLevel::Silent),
                );
                let mut tree = SimulationTree::new(game.clone(), alice, settings.max_depth);
                let mut ctx = SearchContext::new(max_nodes, Default::default());
                black_box(driver.search(&mut tree, &mut ctx))
            });
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let game = main_phase_match(42);
    let evaluator = GameStateEvaluator::new();
    c.bench_function("evaluate_state", |b| {
        b.iter(|| black_box(evaluator.evaluate(PlayerId::new(0), black_box(&game))))
    });
}

fn bench_clone(c: &mut Criterion) {
    let game = main_phase_match(42);
    c.bench_function("clone_state", |b| b.iter(|| black_box(game.clone())));
}

criterion_group!(benches, bench_search, bench_evaluate, bench_clone);
criterion_main!(benches);
