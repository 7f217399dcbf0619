//! Attack and block declarations made by the AI controller

use mtg_forge_ai::ai::{AiConfig, AiController, CombatEvaluator};
use mtg_forge_ai::core::PlayerId;
use mtg_forge_ai::game::{GameLogger, GameState, GameStateView, PlayerController, Step, VerbosityLevel};

fn board(defender_life: i32) -> (GameState, PlayerId, PlayerId) {
    let mut game = GameState::new_two_player("Alice", "Bob", 11);
    game.turn.turn_number = 5;
    game.turn.current_step = Step::DeclareAttackers;
    let (alice, bob) = (PlayerId::new(0), PlayerId::new(1));
    game.get_player_mut(bob).unwrap().life = defender_life;
    (game, alice, bob)
}

fn ai(player: PlayerId) -> AiController {
    AiController::new(
        player,
        AiConfig::default(),
        GameLogger::with_verbosity(VerbosityLevel::Silent),
    )
    .unwrap()
}

#[test]
fn test_swarm_attacks_when_one_blocker_cannot_stop_lethal() {
    let (mut game, alice, bob) = board(4);
    let bears: Vec<_> = (0..3)
        .map(|_| game.add_card_to_battlefield(alice, "Grizzly Bears").unwrap())
        .collect();
    game.add_card_to_battlefield(bob, "Hill Giant").unwrap();

    let candidates = game.attack_candidates();
    assert_eq!(candidates.len(), 3);
    let mut controller = ai(alice);
    let attackers = controller.choose_attackers(&GameStateView::new(&game, alice), &candidates);
    assert_eq!(attackers.len(), 3);
    for bear in &bears {
        assert!(attackers.contains(bear));
    }
}

#[test]
fn test_swarm_holds_back_when_not_lethal() {
    let (mut game, alice, bob) = board(5);
    for _ in 0..3 {
        game.add_card_to_battlefield(alice, "Grizzly Bears").unwrap();
    }
    game.add_card_to_battlefield(bob, "Hill Giant").unwrap();

    let candidates = game.attack_candidates();
    let mut controller = ai(alice);
    let attackers = controller.choose_attackers(&GameStateView::new(&game, alice), &candidates);
    assert!(attackers.is_empty());
}

#[test]
fn test_bigger_blocker_eats_attacker() {
    let (mut game, alice, bob) = board(20);
    let bears = game.add_card_to_battlefield(alice, "Grizzly Bears").unwrap();
    let giant = game.add_card_to_battlefield(bob, "Hill Giant").unwrap();

    let eval = CombatEvaluator::new(GameLogger::with_verbosity(VerbosityLevel::Silent));
    assert!(!eval.is_safe_attack(&game, bears, &[giant]));

    let mut defender = ai(bob);
    let blocks = defender.choose_blockers(&GameStateView::new(&game, bob), &[bears], &[giant]);
    assert_eq!(blocks, vec![(giant, bears)]);
}

#[test]
fn test_flyers_cannot_be_blocked_on_the_ground() {
    let (mut game, alice, bob) = board(20);
    let angel = game.add_card_to_battlefield(alice, "Serra Angel").unwrap();
    let giant = game.add_card_to_battlefield(bob, "Hill Giant").unwrap();

    let mut defender = ai(bob);
    let blocks = defender.choose_blockers(&GameStateView::new(&game, bob), &[angel], &[giant]);
    assert!(blocks.is_empty());
}
