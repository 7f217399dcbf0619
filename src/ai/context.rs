//! Per-search budget and cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between the runner and the worker
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Counters reported after a search
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: usize,
    pub repeats_pruned: usize,
    pub failed_actions: usize,
    pub cutoffs: usize,
}

/// Budget state threaded through one search pass
#[derive(Debug, Clone)]
pub struct SearchContext {
    max_nodes: usize,
    cancel: CancelToken,
    pub stats: SearchStats,
}

impl SearchContext {
    pub fn new(max_nodes: usize, cancel: CancelToken) -> Self {
        SearchContext {
            max_nodes,
            cancel,
            stats: SearchStats::default(),
        }
    }

    /// No node ceiling and no cancellation
    pub fn unbounded() -> Self {
        Self::new(usize::MAX, CancelToken::new())
    }

    pub fn count_node(&mut self) {
        self.stats.nodes += 1;
    }

    pub fn node_count(&self) -> usize {
        self.stats.nodes
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    /// The node ceiling is a soft budget: it trips once exceeded
    pub fn over_budget(&self) -> bool {
        self.stats.nodes > self.max_nodes
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_trips_after_ceiling() {
        let mut ctx = SearchContext::new(2, CancelToken::new());
        ctx.count_node();
        ctx.count_node();
        assert!(!ctx.over_budget());
        ctx.count_node();
        assert!(ctx.over_budget());
    }

    #[test]
    fn test_cancel_is_shared() {
        let token = CancelToken::new();
        let ctx = SearchContext::new(10, token.clone());
        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
    }
}
