//! Shared game and search logger
//!
//! `GameLogger` is a cheap handle: clones write to the same buffer, so the
//! match loop and the search worker thread log into one place.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

/// Verbosity levels for game output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// No output during the game
    Silent = 0,
    /// Only the game outcome
    Minimal = 1,
    /// Turns, steps and key actions (default)
    #[default]
    Normal = 2,
    /// All actions and search summaries
    Verbose = 3,
    /// Per-node search diagnostics
    Trace = 4,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to the in-memory buffer
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    pub message: String,
    /// e.g. "search", "combat", "controller_choice", "game_event"
    pub category: Option<String>,
}

#[derive(Debug, Default)]
struct LoggerState {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
    log_buffer: Vec<LogEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct GameLogger {
    state: Arc<Mutex<LoggerState>>,
}

impl GameLogger {
    /// Logger with default verbosity (Normal)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        let logger = Self::default();
        logger.lock().verbosity = verbosity;
        logger
    }

    /// Logger that only captures to memory (handy in tests)
    pub fn capturing(verbosity: VerbosityLevel) -> Self {
        let logger = Self::with_verbosity(verbosity);
        logger.set_output_mode(OutputMode::Memory);
        logger
    }

    fn lock(&self) -> MutexGuard<'_, LoggerState> {
        // A panic while logging must not silence every later message
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_output_mode(&self, mode: OutputMode) {
        self.lock().output_mode = mode;
    }

    pub fn output_mode(&self) -> OutputMode {
        self.lock().output_mode
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.lock().verbosity
    }

    pub fn set_verbosity(&self, verbosity: VerbosityLevel) {
        self.lock().verbosity = verbosity;
    }

    /// Would a message at `level` go anywhere? Callers check this before
    /// formatting expensive messages.
    pub fn enabled(&self, level: VerbosityLevel) -> bool {
        level != VerbosityLevel::Silent && level <= self.lock().verbosity
    }

    fn emit(&self, level: VerbosityLevel, category: Option<&str>, message: &str) {
        let mut state = self.lock();
        if level == VerbosityLevel::Silent || level > state.verbosity {
            return;
        }
        let should_capture = matches!(state.output_mode, OutputMode::Memory | OutputMode::Both);
        let should_output = matches!(state.output_mode, OutputMode::Stdout | OutputMode::Both);

        if should_capture {
            state.log_buffer.push(LogEntry {
                level,
                message: message.to_string(),
                category: category.map(str::to_string),
            });
        }
        if should_output {
            if level == VerbosityLevel::Minimal {
                println!("{message}");
            } else {
                println!("  {message}");
            }
        }
    }

    pub fn minimal(&self, message: &str) {
        self.emit(VerbosityLevel::Minimal, None, message);
    }

    pub fn normal(&self, message: &str) {
        self.emit(VerbosityLevel::Normal, None, message);
    }

    pub fn verbose(&self, message: &str) {
        self.emit(VerbosityLevel::Verbose, None, message);
    }

    pub fn trace(&self, message: &str) {
        self.emit(VerbosityLevel::Trace, None, message);
    }

    /// Log with an explicit category
    pub fn log(&self, level: VerbosityLevel, category: &str, message: &str) {
        self.emit(level, Some(category), message);
    }

    /// Log a controller decision at Normal level
    pub fn controller_choice(&self, controller_name: &str, message: &str) {
        let line = format!("{controller_name} chose {message}");
        self.emit(VerbosityLevel::Normal, Some("controller_choice"), &line);
    }

    /// Snapshot of captured entries
    pub fn logs(&self) -> Vec<LogEntry> {
        self.lock().log_buffer.clone()
    }

    pub fn clear_logs(&self) {
        self.lock().log_buffer.clear();
    }

    /// Print buffered entries, then clear
    pub fn flush_buffer(&self) {
        let mut state = self.lock();
        for entry in state.log_buffer.drain(..) {
            println!("{}", entry.message);
        }
    }
}

/// Log a lazily formatted message when the level is enabled
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $category:expr, $($arg:tt)*) => {
        if $logger.enabled($level) {
            $logger.log($level, $category, &format!($($arg)*));
        }
    };
}
