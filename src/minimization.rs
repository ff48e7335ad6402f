use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

pub(crate) mod partition_refinement;
pub use partition_refinement::minimize_dfa;

/// Kameda–Weiner minimisation of non-deterministic automata.
pub mod kameda_weiner;
pub use kameda_weiner::{kameda_weiner, KamedaWeinerOutcome};

mod nfa;
pub use nfa::{minimize_nfa, CandidateReport, Method, MinimizationReport, SkipReason, Stage};

/// Bounds the time that optional stages of a minimisation may take. A budget is checked
/// between stages and between cover sizes, never in the middle of a stage.
#[derive(Debug, Clone, Default)]
pub struct Budget {
    deadline: Option<Instant>,
    cancelled: Option<Arc<AtomicBool>>,
}

impl Budget {
    /// A budget that is never exhausted.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Sets a deadline `timeout` from now.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Attaches a cancellation flag. Once the flag is set, the budget counts as exhausted.
    pub fn with_cancellation(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancelled = Some(flag);
        self
    }

    /// Returns `true` if the deadline has passed or cancellation was requested.
    pub fn is_exhausted(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
            || self
                .cancelled
                .as_ref()
                .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Tunables of [`minimize_nfa`] and [`kameda_weiner`].
#[derive(Debug, Clone)]
pub struct MinimizationConfig {
    /// Kameda–Weiner is only attempted on automata whose [`crate::Automaton::complexity`]
    /// does not exceed this value.
    pub complexity_threshold: usize,
    /// The largest cover size that is searched. `None` means the number of states of the
    /// determinized automaton.
    pub max_cover_size: Option<usize>,
    /// How many covers of the smallest size are turned into candidate automata.
    pub max_covers: usize,
    /// Time limit and cancellation for the optional stages.
    pub budget: Budget,
}

impl Default for MinimizationConfig {
    fn default() -> Self {
        Self {
            complexity_threshold: 64,
            max_cover_size: None,
            max_covers: 8,
            budget: Budget::unlimited(),
        }
    }
}

impl MinimizationConfig {
    /// Replaces the complexity threshold.
    pub fn with_complexity_threshold(mut self, threshold: usize) -> Self {
        self.complexity_threshold = threshold;
        self
    }

    /// Replaces the budget.
    pub fn with_budget(mut self, budget: Budget) -> Self {
        self.budget = budget;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_exhaustion() {
        assert!(!Budget::unlimited().is_exhausted());
        assert!(Budget::unlimited()
            .with_timeout(Duration::ZERO)
            .is_exhausted());

        let flag = Arc::new(AtomicBool::new(false));
        let budget = Budget::unlimited().with_cancellation(Arc::clone(&flag));
        assert!(!budget.is_exhausted());
        flag.store(true, Ordering::Relaxed);
        assert!(budget.is_exhausted());
    }
}
