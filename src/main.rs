//! MTG Forge AI - Main Binary
//!
//! Runs matches between the search AI and the random baseline on the
//! built-in starter decks.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use mtg_forge_ai::{
    ai::{AiConfig, AiController},
    core::PlayerId,
    game::{
        new_starter_match, GameLogger, GameLoop, PlayerController, RandomController, StarterDeck,
        VerbosityLevel,
    },
};
use std::path::PathBuf;

/// Controller type for each seat
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ControllerType {
    /// Minimax search AI
    Ai,
    /// Makes random choices
    Random,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeckChoice {
    /// Green-red creatures and burn
    Stompy,
    /// White fliers, first strikers and equipment
    WhiteWeenie,
}

impl From<DeckChoice> for StarterDeck {
    fn from(deck: DeckChoice) -> Self {
        match deck {
            DeckChoice::Stompy => StarterDeck::Stompy,
            DeckChoice::WhiteWeenie => StarterDeck::WhiteWeenie,
        }
    }
}

/// Verbosity level for game output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            "trace" | "4" => Ok(VerbosityArg(VerbosityLevel::Trace)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3, trace/4)"
            )),
        }
    }
}

#[derive(Parser)]
#[command(name = "mtg-ai")]
#[command(about = "MTG Forge AI - minimax opponent for a two-player card game", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one match on the built-in decks
    Match {
        /// Player 1 controller type
        #[arg(long, value_enum, default_value = "ai")]
        p1: ControllerType,

        /// Player 2 controller type
        #[arg(long, value_enum, default_value = "random")]
        p2: ControllerType,

        /// Player 1 deck
        #[arg(long, value_enum, default_value = "stompy")]
        p1_deck: DeckChoice,

        /// Player 2 deck
        #[arg(long, value_enum, default_value = "white-weenie")]
        p2_deck: DeckChoice,

        /// Set random seed for deterministic testing
        #[arg(long, default_value = "42")]
        seed: u64,

        /// AI configuration file (JSON); flags below override it
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// AI skill level (search depth and think time)
        #[arg(long)]
        skill: Option<u32>,

        /// Node budget per search
        #[arg(long)]
        max_nodes: Option<usize>,

        /// Think time per search in milliseconds
        #[arg(long)]
        think_ms: Option<u64>,

        /// Suggestion file for player 1 (`cast:<name>` / `play:<name>` lines)
        #[arg(long, value_name = "FILE")]
        p1_suggest: Option<PathBuf>,

        /// Suggestion file for player 2
        #[arg(long, value_name = "FILE")]
        p2_suggest: Option<PathBuf>,

        /// Turn limit before the match is called a draw
        #[arg(long, default_value = "100")]
        max_turns: u32,

        /// Verbosity level for game output (0=silent, 1=minimal, 2=normal, 3=verbose, 4=trace)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,
    },

    /// Print the effective AI configuration as JSON
    Config {
        /// Configuration file to validate and print instead of the defaults
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AiConfig> {
    match path {
        Some(path) => AiConfig::load(path)
            .with_context(|| format!("failed to load AI config from {}", path.display())),
        None => Ok(AiConfig::default()),
    }
}

fn make_controller(
    kind: ControllerType,
    player: PlayerId,
    config: &AiConfig,
    suggestions: Option<PathBuf>,
    seed: u64,
    logger: &GameLogger,
) -> anyhow::Result<Box<dyn PlayerController>> {
    Ok(match kind {
        ControllerType::Random => Box::new(RandomController::with_seed(player, seed)),
        ControllerType::Ai => {
            let mut config = config.clone();
            if suggestions.is_some() {
                config.suggestions_file = suggestions;
            }
            if config.seed.is_none() {
                config.seed = Some(seed);
            }
            Box::new(
                AiController::new(player, config, logger.clone())
                    .with_context(|| format!("failed to set up the AI for player {player}"))?,
            )
        }
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Match {
            p1,
            p2,
            p1_deck,
            p2_deck,
            seed,
            config,
            skill,
            max_nodes,
            think_ms,
            p1_suggest,
            p2_suggest,
            max_turns,
            verbosity,
        } => {
            let mut ai_config = load_config(config.as_ref())?;
            if let Some(skill) = skill {
                ai_config.skill = skill;
            }
            if let Some(max_nodes) = max_nodes {
                ai_config.max_nodes = max_nodes;
            }
            if let Some(ms) = think_ms {
                ai_config.max_think_ms = Some(ms);
            }
            ai_config.validate().context("invalid AI configuration")?;

            let logger = GameLogger::with_verbosity(verbosity.0);
            let mut game = new_starter_match(
                ("Player 1", "Player 2"),
                (p1_deck.into(), p2_deck.into()),
                seed,
            )?;
            let mut c1 = make_controller(p1, PlayerId::new(0), &ai_config, p1_suggest, seed, &logger)?;
            let mut c2 = make_controller(
                p2,
                PlayerId::new(1),
                &ai_config,
                p2_suggest,
                seed.wrapping_add(1),
                &logger,
            )?;

            let result = GameLoop::new(&mut game)
                .with_max_turns(max_turns)
                .with_logger(logger)
                .run_game(c1.as_mut(), c2.as_mut())?;

            match result.winner {
                Some(winner) => println!(
                    "Player {} wins after {} turns ({:?})",
                    winner.as_u32() + 1,
                    result.turns_played,
                    result.end_reason
                ),
                None => println!("No winner after {} turns ({:?})", result.turns_played, result.end_reason),
            }
        }
        Commands::Config { config } => {
            let ai_config = load_config(config.as_ref())?;
            println!("{}", serde_json::to_string_pretty(&ai_config)?);
        }
    }

    Ok(())
}
