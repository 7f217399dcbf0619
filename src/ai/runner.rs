//! Wall-clock bounded search on a dedicated worker
//!
//! One search runs at a time on the runtime's blocking thread while the
//! calling thread waits with a deadline. On expiry the search is asked to
//! stop through its cancel token; the worker then returns quickly with a
//! partially pruned tree, which is recovered when it arrives within a short
//! grace period.

use crate::ai::context::SearchContext;
use crate::ai::evaluator::StateEvaluator;
use crate::ai::node::SimulationTree;
use crate::ai::search::SearchDriver;
use crate::ai::RulesEngine;
use crate::game::{GameLogger, VerbosityLevel};
use crate::log_at;
use crate::Result;
use std::time::{Duration, Instant};
use tokio::runtime::{Builder, Runtime};

/// Effective budget when cancellation is disabled
pub const NO_INTERRUPT_BUDGET: Duration = Duration::from_secs(3600);

/// Deep recursion needs more than the default worker stack
const WORKER_STACK_SIZE: usize = 32 * 1024 * 1024;

/// Everything one search needs, moved onto the worker and back
pub struct SearchJob<G: RulesEngine, E: StateEvaluator<G>> {
    pub driver: SearchDriver<G, E>,
    pub tree: SimulationTree<G>,
    pub ctx: SearchContext,
}

pub struct SearchOutcome<G: RulesEngine, E: StateEvaluator<G>> {
    /// Best score, or 0 after a timeout or a worker failure
    pub score: i32,
    /// The job, unless the worker failed or never came back
    pub job: Option<SearchJob<G, E>>,
    pub timed_out: bool,
    pub elapsed: Duration,
}

pub struct SearchRunner {
    runtime: Runtime,
    logger: GameLogger,
    grace: Duration,
}

impl SearchRunner {
    pub fn new(logger: GameLogger) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(1)
            .thread_name("search-worker")
            .thread_stack_size(WORKER_STACK_SIZE)
            .enable_time()
            .build()?;
        Ok(SearchRunner {
            runtime,
            logger,
            grace: Duration::from_millis(500),
        })
    }

    /// How long to wait for a cancelled search to hand its tree back
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Run `job` to completion or until `budget` runs out. Never fails:
    /// timeouts and worker faults yield a score of 0.
    pub fn run<G, E>(&self, job: SearchJob<G, E>, budget: Duration, allow_interrupt: bool) -> SearchOutcome<G, E>
    where
        G: RulesEngine,
        E: StateEvaluator<G>,
    {
        let start = Instant::now();
        let cancel = job.ctx.cancel_token().clone();
        let budget = if allow_interrupt { budget } else { NO_INTERRUPT_BUDGET };
        log_at!(self.logger, VerbosityLevel::Verbose, "search", "think budget {:?}", budget);

        let mut handle = self.runtime.spawn_blocking(move || {
            let mut job = job;
            let score = job.driver.search(&mut job.tree, &mut job.ctx);
            (score, job)
        });

        let waited = self
            .runtime
            .block_on(async { tokio::time::timeout(budget, &mut handle).await });

        match waited {
            Ok(Ok((score, job))) => SearchOutcome {
                score,
                job: Some(job),
                timed_out: false,
                elapsed: start.elapsed(),
            },
            Ok(Err(e)) => {
                self.logger.log(
                    VerbosityLevel::Minimal,
                    "search",
                    &format!("search worker failed: {}", crate::MtgError::from(e)),
                );
                SearchOutcome {
                    score: 0,
                    job: None,
                    timed_out: false,
                    elapsed: start.elapsed(),
                }
            }
            Err(_) => {
                self.logger
                    .log(VerbosityLevel::Verbose, "search", "search timed out");
                if allow_interrupt {
                    cancel.cancel();
                }
                let recovered = self
                    .runtime
                    .block_on(async { tokio::time::timeout(self.grace, handle).await });
                let job = match recovered {
                    Ok(Ok((_, job))) => Some(job),
                    _ => None,
                };
                SearchOutcome {
                    score: 0,
                    job,
                    timed_out: true,
                    elapsed: start.elapsed(),
                }
            }
        }
    }
}
