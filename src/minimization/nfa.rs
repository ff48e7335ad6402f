use std::fmt;

use itertools::Itertools;
use tracing::{debug, info, trace, warn};

use crate::{
    automaton::Automaton, determinization::determinize, equivalence::are_equivalent,
};

use super::{kameda_weiner, partition_refinement::refine, MinimizationConfig};

/// The procedure that produced an automaton in [`minimize_nfa`]. The order of the
/// variants is the priority in which equally small candidates are preferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    /// Subset construction followed by partition refinement.
    DeterminizeMinimize,
    /// The input after trimming and epsilon removal.
    Preprocessed,
    /// Kameda–Weiner applied to the minimal DFA.
    KamedaWeinerDfa,
    /// Kameda–Weiner applied to the preprocessed input.
    KamedaWeinerNfa,
    /// The unchanged input, used when no candidate could be verified.
    Original,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Method::DeterminizeMinimize => "determinize+minimize",
                Method::Preprocessed => "preprocessed",
                Method::KamedaWeinerDfa => "kameda-weiner(dfa)",
                Method::KamedaWeinerNfa => "kameda-weiner(nfa)",
                Method::Original => "original",
            }
        )
    }
}

/// Why an optional stage did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The automaton was too large for the exponential search.
    ComplexityThreshold {
        /// Complexity of the automaton the stage would have run on.
        complexity: usize,
        /// The configured threshold.
        threshold: usize,
    },
    /// Time ran out or cancellation was requested.
    BudgetExhausted,
    /// The search ran but no cover yields an automaton smaller than its input.
    NoSmallerCover,
}

/// A step of the [`minimize_nfa`] pipeline, recorded in the order of execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Unreachable and dead states were removed.
    Trimmed,
    /// Epsilon transitions were eliminated and the result was trimmed again.
    EpsilonRemoved,
    /// A candidate was produced and checked against the input.
    Candidate(Method),
    /// No candidate was produced.
    Skipped(Method, SkipReason),
    /// The final automaton was chosen.
    Selected(Method),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Trimmed => write!(f, "trim"),
            Stage::EpsilonRemoved => write!(f, "remove-epsilon"),
            Stage::Candidate(method) => write!(f, "candidate {method}"),
            Stage::Skipped(method, SkipReason::BudgetExhausted) => {
                write!(f, "skipped {method}: budget exhausted")
            }
            Stage::Skipped(method, SkipReason::NoSmallerCover) => {
                write!(f, "skipped {method}: no smaller cover")
            }
            Stage::Skipped(
                method,
                SkipReason::ComplexityThreshold {
                    complexity,
                    threshold,
                },
            ) => write!(
                f,
                "skipped {method}: complexity {complexity} exceeds {threshold}"
            ),
            Stage::Selected(method) => write!(f, "selected {method}"),
        }
    }
}

/// Outcome of checking a single candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateReport {
    /// How the candidate was obtained.
    pub method: Method,
    /// Number of states of the candidate.
    pub states: usize,
    /// Whether the candidate accepts the language of the input.
    pub verified: bool,
    /// Free form diagnostics.
    pub detail: String,
}

/// The result of [`minimize_nfa`].
#[derive(Debug, Clone)]
pub struct MinimizationReport {
    /// The smallest verified automaton.
    pub automaton: Automaton,
    /// Number of states of the input.
    pub original_states: usize,
    /// Number of states of [`MinimizationReport::automaton`].
    pub final_states: usize,
    /// How many states were saved.
    pub reduction: usize,
    /// The saving relative to the input, in percent.
    pub reduction_percent: f64,
    /// The procedure that produced the result.
    pub method: Method,
    /// The executed stages in order.
    pub stages: Vec<Stage>,
    /// Every candidate that was produced, whether it verified or not.
    pub candidates: Vec<CandidateReport>,
}

impl fmt::Display for MinimizationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} -> {} states ({:.1}% reduction) using {}",
            self.original_states, self.final_states, self.reduction_percent, self.method
        )?;
        writeln!(f, "stages: {}", self.stages.iter().join(", "))?;
        for candidate in &self.candidates {
            writeln!(
                f,
                "  {}: {} states, {}{}",
                candidate.method,
                candidate.states,
                if candidate.verified {
                    "verified"
                } else {
                    "rejected"
                },
                if candidate.detail.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", candidate.detail)
                }
            )?;
        }
        Ok(())
    }
}

struct Pipeline<'a> {
    original: &'a Automaton,
    config: &'a MinimizationConfig,
    stages: Vec<Stage>,
    candidates: Vec<(CandidateReport, Automaton)>,
}

impl Pipeline<'_> {
    fn offer(&mut self, method: Method, candidate: Automaton, detail: String) {
        self.stages.push(Stage::Candidate(method));
        let verified = are_equivalent(&candidate, self.original);
        if verified {
            trace!("candidate {method} with {} states verified", candidate.size());
        } else {
            warn!(
                "candidate {method} with {} states does not accept the language of the input",
                candidate.size()
            );
        }
        self.candidates.push((
            CandidateReport {
                method,
                states: candidate.size(),
                verified,
                detail,
            },
            candidate,
        ));
    }

    /// Decides whether the optional stage `method` may run on `fsa`, recording a skip
    /// otherwise.
    fn admits(&mut self, method: Method, fsa: Option<&Automaton>) -> bool {
        let reason = if self.config.budget.is_exhausted() {
            Some(SkipReason::BudgetExhausted)
        } else {
            fsa.map(Automaton::complexity)
                .filter(|&complexity| complexity > self.config.complexity_threshold)
                .map(|complexity| SkipReason::ComplexityThreshold {
                    complexity,
                    threshold: self.config.complexity_threshold,
                })
        };
        if let Some(reason) = reason {
            debug!("{}", Stage::Skipped(method, reason));
            self.stages.push(Stage::Skipped(method, reason));
            return false;
        }
        true
    }

    fn try_kameda_weiner(&mut self, method: Method, fsa: &Automaton) {
        if !self.admits(method, Some(fsa)) {
            return;
        }
        let outcome = kameda_weiner(fsa, self.config);
        let detail = outcome.describe();
        match outcome.automaton {
            Some(candidate) => self.offer(method, candidate, detail),
            None => {
                trace!("{method} found nothing: {detail}");
                let reason = if outcome.exhausted {
                    SkipReason::BudgetExhausted
                } else {
                    SkipReason::NoSmallerCover
                };
                self.stages.push(Stage::Skipped(method, reason));
            }
        }
    }

    fn finish(mut self) -> MinimizationReport {
        let best = self
            .candidates
            .iter()
            .filter(|(report, _)| report.verified)
            .min_by_key(|(report, _)| (report.states, report.method))
            .map(|(report, fsa)| (report.method, fsa.clone()));
        let (method, automaton) = best.unwrap_or_else(|| {
            warn!("no candidate could be verified, falling back to the input");
            (Method::Original, self.original.clone())
        });
        self.stages.push(Stage::Selected(method));

        let original_states = self.original.size();
        let final_states = automaton.size();
        let reduction = original_states.saturating_sub(final_states);
        let reduction_percent = if original_states == 0 {
            0.0
        } else {
            reduction as f64 * 100.0 / original_states as f64
        };
        info!("minimized {original_states} to {final_states} states using {method}");
        MinimizationReport {
            automaton,
            original_states,
            final_states,
            reduction,
            reduction_percent,
            method,
            stages: self.stages,
            candidates: self.candidates.into_iter().map(|(report, _)| report).collect(),
        }
    }
}

/// Minimizes an arbitrary automaton, trying several procedures and keeping the smallest
/// result that provably accepts the same language.
///
/// The input is trimmed, freed of epsilon transitions and trimmed again. Candidates are
/// then the preprocessed automaton itself, Kameda–Weiner on it, the minimal DFA and
/// Kameda–Weiner on the minimal DFA. The Kameda–Weiner stages only run if the automaton
/// they start from does not exceed [`MinimizationConfig::complexity_threshold`], and all
/// stages after the first candidate are skipped once the budget is exhausted. Every
/// candidate is checked for equivalence with the input, and the smallest verified one
/// wins, where ties are broken by the order of [`Method`]. Should no candidate verify,
/// the input is returned unchanged.
///
/// # Example
/// ```
/// use fsa_algebra::prelude::*;
///
/// let nfa = regex_to_fsa("(a|b)*abb").unwrap();
/// let report = minimize_nfa(&nfa, &MinimizationConfig::default());
/// assert!(report.final_states <= report.original_states);
/// assert!(are_equivalent(&nfa, &report.automaton));
/// ```
pub fn minimize_nfa(fsa: &Automaton, config: &MinimizationConfig) -> MinimizationReport {
    let mut pipeline = Pipeline {
        original: fsa,
        config,
        stages: Vec::new(),
        candidates: Vec::new(),
    };

    let trimmed = fsa.trim();
    pipeline.stages.push(Stage::Trimmed);
    let preprocessed = trimmed.remove_epsilon().trim();
    pipeline.stages.push(Stage::EpsilonRemoved);
    debug!(
        "preprocessing reduced {} to {}",
        fsa.summary(),
        preprocessed.summary()
    );

    pipeline.offer(
        Method::Preprocessed,
        preprocessed.clone(),
        "trimmed and epsilon free".to_string(),
    );

    pipeline.try_kameda_weiner(Method::KamedaWeinerNfa, &preprocessed);

    if pipeline.admits(Method::DeterminizeMinimize, None) {
        let dfa = determinize(&preprocessed);
        let minimal = refine(&dfa);
        let detail = format!("{} states after subset construction", dfa.size());
        pipeline.offer(Method::DeterminizeMinimize, minimal.clone(), detail);
        pipeline.try_kameda_weiner(Method::KamedaWeinerDfa, &minimal);
    }

    pipeline.finish()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{minimization::Budget, prelude::*};

    fn third_from_end() -> Automaton {
        Automaton::builder()
            .with_transitions([
                ("0", "a", "0"),
                ("0", "b", "0"),
                ("0", "a", "1"),
                ("1", "a", "2"),
                ("1", "b", "2"),
                ("2", "a", "3"),
                ("2", "b", "3"),
            ])
            .with_initial("0")
            .with_accepting(["3"])
            .build()
            .unwrap()
    }

    #[test_log::test]
    fn nfa_smaller_than_its_minimal_dfa() {
        let nfa = third_from_end();
        let report = minimize_nfa(&nfa, &MinimizationConfig::default());
        let minimal_dfa = minimize_dfa(&determinize(&nfa)).unwrap();
        assert_eq!(minimal_dfa.size(), 8);
        assert!(report.final_states <= minimal_dfa.size());
        assert!(report.final_states <= report.original_states);
        assert_eq!(report.final_states, 4);
        assert!(are_equivalent(&nfa, &report.automaton));
        assert_eq!(report.method, Method::Preprocessed);
        let skipped = Stage::Skipped(Method::KamedaWeinerNfa, SkipReason::NoSmallerCover);
        assert!(report.stages.contains(&skipped));
        assert!(report
            .candidates
            .iter()
            .all(|c| c.method != Method::KamedaWeinerNfa));
        assert!(report.to_string().contains("no smaller cover"));
    }

    #[test_log::test]
    fn redundant_nfa_shrinks() {
        // a*b, spelled out with duplicated branches and an epsilon detour
        let nfa = Automaton::builder()
            .with_transitions([
                ("s", "a", "p"),
                ("s", "a", "q"),
                ("s", "b", "f"),
                ("p", "a", "p"),
                ("q", "a", "q"),
                ("p", "b", "f"),
                ("q", "", "r"),
                ("r", "b", "g"),
                ("dead", "a", "dead"),
                ("s", "b", "dead"),
            ])
            .with_initial("s")
            .with_accepting(["f", "g"])
            .build()
            .unwrap();
        let report = minimize_nfa(&nfa, &MinimizationConfig::default());
        assert_eq!(report.final_states, 2);
        assert_eq!(report.reduction, nfa.size() - 2);
        assert!(report.reduction_percent > 50.0);
        assert!(are_equivalent(&nfa, &report.automaton));
        assert_eq!(report.stages.first(), Some(&Stage::Trimmed));
        assert!(matches!(report.stages.last(), Some(Stage::Selected(_))));
        assert!(report.candidates.iter().any(|c| c.verified));
        assert!(report.to_string().contains("reduction"));
    }

    #[test_log::test]
    fn ties_prefer_the_minimal_dfa() {
        // a*b with two copies of the `a` loop
        let nfa = Automaton::builder()
            .with_transitions([
                ("s", "a", "p"),
                ("s", "a", "q"),
                ("s", "b", "f"),
                ("p", "a", "p"),
                ("q", "a", "q"),
                ("p", "b", "f"),
                ("q", "b", "g"),
            ])
            .with_initial("s")
            .with_accepting(["f", "g"])
            .build()
            .unwrap();
        let report = minimize_nfa(&nfa, &MinimizationConfig::default());
        let states_of = |method| {
            report
                .candidates
                .iter()
                .find(|c| c.method == method && c.verified)
                .map(|c| c.states)
        };
        assert_eq!(states_of(Method::KamedaWeinerNfa), Some(2));
        assert_eq!(states_of(Method::DeterminizeMinimize), Some(2));
        assert_eq!(report.final_states, 2);
        assert_eq!(report.method, Method::DeterminizeMinimize);
    }

    #[test]
    fn threshold_gates_kameda_weiner() {
        let config = MinimizationConfig::default().with_complexity_threshold(0);
        let report = minimize_nfa(&third_from_end(), &config);
        assert!(report.stages.iter().any(|stage| matches!(
            stage,
            Stage::Skipped(
                Method::KamedaWeinerNfa,
                SkipReason::ComplexityThreshold { .. }
            )
        )));
        assert!(report
            .candidates
            .iter()
            .all(|c| c.method != Method::KamedaWeinerNfa));
    }

    #[test]
    fn exhausted_budget_keeps_safety_net() {
        let config = MinimizationConfig::default()
            .with_budget(Budget::unlimited().with_timeout(Duration::ZERO));
        let nfa = third_from_end();
        let report = minimize_nfa(&nfa, &config);
        assert_eq!(report.method, Method::Preprocessed);
        assert_eq!(report.candidates.len(), 1);
        let skipped = Stage::Skipped(Method::DeterminizeMinimize, SkipReason::BudgetExhausted);
        assert!(report.stages.contains(&skipped));
    }

    #[test]
    fn degenerate_inputs() {
        let report = minimize_nfa(&Automaton::empty(), &MinimizationConfig::default());
        assert_eq!(report.final_states, 0);
        assert_eq!(report.reduction_percent, 0.0);

        let unproductive = Automaton::builder()
            .with_transitions([("0", "a", "1")])
            .with_initial("0")
            .build()
            .unwrap();
        let report = minimize_nfa(&unproductive, &MinimizationConfig::default());
        assert_eq!(report.final_states, 0);
        assert!(report.automaton.is_empty_language());
    }

    #[cfg(feature = "random")]
    #[test]
    fn random_automata_never_grow() {
        fastrand::seed(7);
        for _ in 0..20 {
            let nfa = crate::random::generate_random_nfa(2, 5, 0.3);
            let report = minimize_nfa(&nfa, &MinimizationConfig::default());
            assert!(report.final_states <= report.original_states);
            assert!(are_equivalent(&nfa, &report.automaton));
        }
    }
}
