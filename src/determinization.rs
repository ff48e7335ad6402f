use std::collections::VecDeque;

use itertools::Itertools;
use tracing::trace;

use crate::{
    automaton::{Automaton, ClosureCache, Label, State, EMPTY_LANGUAGE},
    error::AutomatonError,
    math::{Map, OrderedSet, Set},
};

/// Subsets with more members than this are named by a prefix, a count and a hash.
const MAX_LISTED_MEMBERS: usize = 10;
/// Number of members that are spelled out in the name of a large subset.
const LISTED_PREFIX: usize = 3;

/// The result of the subset construction together with the set of states of the input
/// that each state of the produced DFA stands for.
#[derive(Debug, Clone)]
pub struct Determinized {
    /// The deterministic automaton.
    pub automaton: Automaton,
    /// The underlying subsets, aligned with the order of `automaton.states()`. The first
    /// entry is the subset of the initial state.
    pub subsets: Vec<OrderedSet<State>>,
}

/// Produces the name of the DFA state that stands for `subset`. Names are derived from
/// the sorted members, so the same subset always receives the same name.
pub fn subset_name(subset: &OrderedSet<State>) -> State {
    if subset.len() <= MAX_LISTED_MEMBERS {
        return format!("{{{}}}", subset.iter().join(","));
    }
    let hash = fxhash::hash64(&subset.iter().collect_vec());
    format!(
        "{{{},…+{}#{:016x}}}",
        subset.iter().take(LISTED_PREFIX).join(","),
        subset.len() - LISTED_PREFIX,
        hash
    )
}

/// Converts `fsa` into a deterministic automaton accepting the same language, see
/// [`determinize_with_subsets`].
pub fn determinize(fsa: &Automaton) -> Automaton {
    determinize_with_subsets(fsa).automaton
}

/// Applies the subset construction to `fsa`.
///
/// The initial DFA state is the epsilon closure of the initial state, and the successor
/// of a subset on a symbol is the epsilon closure of the union of the symbol successors
/// of its members. Closures are memoized. Only reachable subsets are built and the empty
/// subset is never created, so the result may be incomplete, see [`complete`]. A DFA
/// state accepts iff its subset contains an accepting state.
pub fn determinize_with_subsets(fsa: &Automaton) -> Determinized {
    let mut table = SubsetTable {
        dfa: Automaton::for_alphabet(fsa.alphabet().iter().cloned()),
        ..Default::default()
    };
    let Some(initial) = fsa.initial() else {
        return table.finish();
    };

    let mut cache = ClosureCache::default();
    let start = cache.closure(fsa, OrderedSet::from([initial.clone()]));
    table.register(fsa, start);

    while let Some((source, subset)) = table.queue.pop_front() {
        for symbol in fsa.alphabet() {
            let moved = fsa.move_set(&subset, symbol);
            if moved.is_empty() {
                continue;
            }
            let target = table.register(fsa, cache.closure(fsa, moved));
            table
                .dfa
                .add_transition(source.clone(), Label::Symbol(symbol.clone()), target);
        }
    }

    trace!(
        "subset construction produced {} states from {} ({} closures memoized)",
        table.dfa.size(),
        fsa.size(),
        cache.len()
    );
    table.finish()
}

/// Bookkeeping of the subset construction: which subsets have been named and which still
/// need to be expanded.
#[derive(Default)]
struct SubsetTable {
    dfa: Automaton,
    names: Map<OrderedSet<State>, State>,
    taken: Set<State>,
    subsets: Vec<OrderedSet<State>>,
    queue: VecDeque<(State, OrderedSet<State>)>,
}

impl SubsetTable {
    /// Returns the name of the DFA state for `subset`, creating the state if necessary.
    fn register(&mut self, fsa: &Automaton, subset: OrderedSet<State>) -> State {
        if let Some(name) = self.names.get(&subset) {
            return name.clone();
        }
        let mut name = subset_name(&subset);
        while !self.taken.insert(name.clone()) {
            name.push('\'');
        }
        self.dfa.add_state(name.clone());
        if subset.iter().any(|q| fsa.is_accepting(q)) {
            self.dfa.add_accepting(name.clone());
        }
        self.names.insert(subset.clone(), name.clone());
        self.subsets.push(subset.clone());
        self.queue.push_back((name.clone(), subset));
        name
    }

    fn finish(self) -> Determinized {
        Determinized {
            automaton: self.dfa,
            subsets: self.subsets,
        }
    }
}

/// Adds a single shared dead state that absorbs every missing transition. Nothing is
/// added if `fsa` is already complete or has no states. Fails if `fsa` is not
/// deterministic.
pub fn complete(fsa: &Automaton) -> Result<Automaton, AutomatonError> {
    fsa.ensure_deterministic("completion")?;
    Ok(complete_dfa(fsa))
}

/// Completion for automata that are known to be deterministic.
pub(crate) fn complete_dfa(fsa: &Automaton) -> Automaton {
    if fsa.size() == 0 || fsa.is_complete() {
        return fsa.clone();
    }
    let mut out = fsa.clone();
    let dead = fsa.fresh_state(EMPTY_LANGUAGE);
    out.add_state(dead.clone());
    for q in out.states().iter().cloned().collect_vec() {
        for symbol in fsa.alphabet() {
            let label = Label::Symbol(symbol.clone());
            if out.targets(&q, &label).is_none() {
                out.add_transition(q.clone(), label, dead.clone());
            }
        }
    }
    out
}

/// Builds a DFA accepting exactly the words over the alphabet of `fsa` that `fsa` rejects.
/// The automaton is completed first. Fails if `fsa` is not deterministic.
pub fn complement(fsa: &Automaton) -> Result<Automaton, AutomatonError> {
    fsa.ensure_deterministic("complementation")?;
    if fsa.size() == 0 {
        let mut universal = Automaton::for_alphabet(fsa.alphabet().iter().cloned());
        let q = "Σ*".to_string();
        universal.add_accepting(q.clone());
        for symbol in fsa.alphabet() {
            universal.add_transition(q.clone(), Label::Symbol(symbol.clone()), q.clone());
        }
        return Ok(universal);
    }
    let completed = complete_dfa(fsa);
    let mut out = Automaton::for_alphabet(completed.alphabet().iter().cloned());
    if let Some(initial) = completed.initial() {
        out.set_initial(initial.clone());
    }
    for q in completed.states() {
        out.add_state(q.clone());
        if !completed.is_accepting(q) {
            out.add_accepting(q.clone());
        }
    }
    for (source, label, target) in completed.transitions() {
        out.add_transition(source.clone(), label.clone(), target.clone());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    fn ends_with_ab() -> Automaton {
        Automaton::builder()
            .with_transitions([
                ("S0", "a", "S0"),
                ("S0", "a", "S1"),
                ("S0", "b", "S0"),
                ("S1", "b", "S2"),
            ])
            .with_initial("S0")
            .with_accepting(["S2"])
            .build()
            .unwrap()
    }

    #[test_log::test]
    fn nfa_ending_in_ab() {
        let dfa = determinize(&ends_with_ab());
        assert!(dfa.is_deterministic());
        assert_eq!(dfa.size(), 3);
        for word in ["ab", "aab", "abab"] {
            assert!(dfa.accepts_chars(word), "should accept {word}");
        }
        for word in ["", "a", "ba"] {
            assert!(!dfa.accepts_chars(word), "should reject {word}");
        }
    }

    #[test]
    fn subsets_are_aligned_with_states() {
        let Determinized { automaton, subsets } = determinize_with_subsets(&ends_with_ab());
        assert_eq!(automaton.size(), subsets.len());
        assert_eq!(subsets[0], OrderedSet::from(["S0".to_string()]));
        assert_eq!(automaton.initial(), Some(&subset_name(&subsets[0])));
        for (q, subset) in automaton.states().iter().zip(&subsets) {
            assert_eq!(q, &subset_name(subset));
        }
    }

    #[test]
    fn epsilon_transitions_are_resolved() {
        let nfa = Automaton::builder()
            .with_transitions([("0", "", "1"), ("1", "a", "2"), ("2", "", "0")])
            .with_initial("0")
            .with_accepting(["2"])
            .build()
            .unwrap();
        let dfa = determinize(&nfa);
        assert!(dfa.is_deterministic());
        assert!(dfa.accepts_chars("a"));
        assert!(dfa.accepts_chars("aaa"));
        assert!(!dfa.accepts_chars(""));
    }

    #[test]
    fn large_subsets_get_bounded_names() {
        let small: OrderedSet<State> = (0..3).map(|i| format!("q{i}")).collect();
        assert_eq!(subset_name(&small), "{q0,q1,q2}");

        let large: OrderedSet<State> = (0..20).map(|i| format!("q{i:02}")).collect();
        let other: OrderedSet<State> = (0..21).map(|i| format!("q{i:02}")).collect();
        let name = subset_name(&large);
        assert!(name.starts_with("{q00,q01,q02,…+17#"));
        assert_ne!(name, subset_name(&other));
    }

    #[test]
    fn completion_is_lazy() {
        // the initial state of `ab` has no transition on `b`
        let partial = determinize(&regex_to_fsa("ab").unwrap());
        assert!(!partial.is_complete());
        let completed = complete(&partial).unwrap();
        assert!(completed.is_complete());
        assert_eq!(completed.size(), partial.size() + 1);
        assert!(are_equivalent(&partial, &completed));
        assert_eq!(complete(&completed).unwrap(), completed);

        // the loop on `S0` keeps every reachable subset complete
        let dfa = determinize(&ends_with_ab());
        assert!(dfa.is_complete());
        assert_eq!(complete(&dfa).unwrap(), dfa);

        assert!(matches!(
            complete(&ends_with_ab()),
            Err(AutomatonError::NotDeterministic { .. })
        ));
    }

    #[test]
    fn complement_flips_language() {
        let dfa = determinize(&ends_with_ab());
        let co = complement(&dfa).unwrap();
        for word in ["", "a", "ab", "ba", "aab", "abb"] {
            assert_ne!(dfa.accepts_chars(word), co.accepts_chars(word), "{word}");
        }
        let universal = complement(&Automaton::empty()).unwrap();
        assert!(universal.accepts(Vec::<&str>::new()));
    }
}
