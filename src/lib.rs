//! Library for the algebra of finite automata on finite words.
//!
//! An [`Automaton`] is a finite collection of named states over a finite alphabet of
//! symbols, together with a designated initial state, a set of accepting states and a
//! transition relation whose edges are labelled either with a symbol or with epsilon.
//! Automata are plain values: every operation takes its inputs by reference and returns a
//! new automaton, so nothing is ever shared or mutated behind the caller's back.
//!
//! The crate provides
//! - structural cleanup (removal of unreachable and unproductive states, epsilon removal)
//!   as methods of [`Automaton`],
//! - subset construction, completion and complementation in [`determinization`],
//! - minimisation of DFAs by partition refinement and of NFAs by a pipeline that also runs
//!   the Kameda–Weiner method, see [`minimization`],
//! - language equivalence through canonical minimal DFAs in [`equivalence`],
//! - conversions between automata and regular expressions, with a simplifier whose every
//!   output is verified, in [`regex`].
//!
//! Automata are assembled and validated through [`Automaton::builder`]:
//! ```
//! use fsa_algebra::prelude::*;
//!
//! let nfa = Automaton::builder()
//!     .with_transitions([("0", "a", "0"), ("0", "b", "0"), ("0", "a", "1"), ("1", "b", "2")])
//!     .with_initial("0")
//!     .with_accepting(["2"])
//!     .build()
//!     .unwrap();
//! let dfa = minimize_dfa(&determinize(&nfa)).unwrap();
//! assert_eq!(dfa.size(), 3);
//! assert!(are_equivalent(&dfa, &regex_to_fsa("(a|b)*ab").unwrap()));
//! ```
#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use fsa_algebra::prelude::*;` should be enough to use the package.
pub mod prelude {
    #[cfg(feature = "serde")]
    pub use super::automaton::RawAutomaton;
    pub use super::{
        automaton::{
            Automaton, AutomatonBuilder, ClosureCache, Label, RunEvent, State, Symbol,
            EMPTY_LANGUAGE, EPSILON,
        },
        determinization::{
            complement, complete, determinize, determinize_with_subsets, Determinized,
        },
        equivalence::{are_equivalent, canonical_dfa, isomorphism},
        error::{AutomatonError, RegexSyntaxError},
        math,
        minimization::{
            kameda_weiner, minimize_dfa, minimize_nfa, Budget, CandidateReport,
            KamedaWeinerOutcome, Method, MinimizationConfig, MinimizationReport, SkipReason,
            Stage,
        },
        regex::{
            fsa_to_regex, regex_equivalent, regex_to_fsa, simplify_regex, RegexConfig,
            RegexConversion, SimplificationStrategy, SimplifyConfig, Verification,
        },
    };
}

/// This module contains some definitions of mathematical objects which are used throughout
/// the crate and do not really fit to the top level.
pub mod math;

/// Errors that the engine reports to its callers.
pub mod error;
pub use error::{AutomatonError, RegexSyntaxError};

/// The automaton data model together with cleanup, epsilon handling and simulation.
pub mod automaton;
pub use automaton::Automaton;

/// Subset construction, completion and complementation.
pub mod determinization;

/// Contains implementations of the different minimization algorithms.
pub mod minimization;

/// Language equivalence of automata.
pub mod equivalence;

pub mod regex;

/// Implements the generation of random automata and words.
#[cfg(feature = "random")]
pub mod random;

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    /// The automaton from the introductory example of most textbooks: words over `a`, `b`
    /// that end in `abb`.
    pub fn ends_in_abb() -> Automaton {
        Automaton::builder()
            .with_transitions([
                ("0", "a", "0"),
                ("0", "b", "0"),
                ("0", "a", "1"),
                ("1", "b", "2"),
                ("2", "b", "3"),
            ])
            .with_initial("0")
            .with_accepting(["3"])
            .build()
            .unwrap()
    }

    #[test_log::test]
    fn components_fit_together() {
        let nfa = ends_in_abb();
        let dfa = determinize(&nfa);
        let minimal = minimize_dfa(&dfa).unwrap();
        assert_eq!(minimal.size(), 4);
        assert!(are_equivalent(&nfa, &minimal));

        let report = minimize_nfa(&nfa, &MinimizationConfig::default());
        assert!(report.final_states <= minimal.size());
        assert!(are_equivalent(&nfa, &report.automaton));

        let conversion = fsa_to_regex(&nfa, &RegexConfig::new());
        assert_eq!(conversion.verification, Verification::Verified);
        assert!(regex_equivalent(&conversion.regex, "(a|b)*abb").unwrap());

        let complemented = complement(&minimal).unwrap();
        assert!(!are_equivalent(&minimal, &complemented));
        assert!(complemented.accepts_chars("abba"));
        assert!(!complemented.accepts_chars("babb"));
    }

    #[test]
    fn preconditions_are_reported() {
        let nfa = ends_in_abb();
        let error = minimize_dfa(&nfa).unwrap_err();
        assert!(matches!(error, AutomatonError::NotDeterministic { .. }));
        assert!(error.is_client_error());
        assert!(complete(&nfa).is_err());
        assert!(regex_to_fsa("a|*").is_err());
    }
}
