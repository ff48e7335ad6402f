use std::collections::VecDeque;

use tracing::trace;

use crate::{
    automaton::{Automaton, Label, State, Symbol},
    determinization::{complete_dfa, determinize},
    math::{Bijection, IndexedSet},
    minimization::partition_refinement::refine,
};

/// Normalizes `fsa` to its minimal complete DFA over `alphabet`.
///
/// The automaton is trimmed, determinized unless it already is deterministic, minimized
/// and finally completed. Automata accepting the empty language end up without any
/// states, so that all of them have the same canonical form.
pub fn canonical_dfa(fsa: &Automaton, alphabet: &IndexedSet<Symbol>) -> Automaton {
    let mut trimmed = fsa.trim();
    trimmed.extend_alphabet(alphabet.iter().cloned());
    let dfa = if trimmed.is_deterministic() {
        trimmed
    } else {
        determinize(&trimmed)
    };
    complete_dfa(&refine(&dfa))
}

/// Decides whether `left` and `right` accept the same language.
///
/// Both automata are brought into canonical form over the union of their alphabets (see
/// [`canonical_dfa`]), which reduces language equivalence to isomorphism of the canonical
/// forms. That in turn is checked by a joint breadth first search from the initial states
/// that builds up a bijection between the states.
///
/// # Example
/// ```
/// use fsa_algebra::prelude::*;
///
/// let small = Automaton::builder()
///     .with_transitions([("q", "a", "q")])
///     .with_initial("q")
///     .with_accepting(["q"])
///     .build()
///     .unwrap();
/// let large = Automaton::builder()
///     .with_transitions([("0", "a", "1"), ("1", "a", "0"), ("2", "a", "2")])
///     .with_initial("0")
///     .with_accepting(["0", "1"])
///     .build()
///     .unwrap();
/// assert!(are_equivalent(&small, &large));
/// ```
pub fn are_equivalent(left: &Automaton, right: &Automaton) -> bool {
    let alphabet: IndexedSet<Symbol> = left
        .alphabet()
        .iter()
        .chain(right.alphabet().iter())
        .cloned()
        .collect();
    let left = canonical_dfa(left, &alphabet);
    let right = canonical_dfa(right, &alphabet);
    if left.size() != right.size() {
        trace!(
            "canonical forms differ in size, {} vs {}",
            left.size(),
            right.size()
        );
        return false;
    }
    isomorphism(&left, &right).is_some()
}

/// Searches an isomorphism between two deterministic automata over the same alphabet
/// that maps the initial states onto each other and respects acceptance. Since every
/// state of a canonical DFA is reachable, such an isomorphism is unique if it exists.
pub fn isomorphism(left: &Automaton, right: &Automaton) -> Option<Bijection<State, State>> {
    let mut bijection = Bijection::new();
    let (Some(p0), Some(q0)) = (left.initial(), right.initial()) else {
        return (left.size() == 0 && right.size() == 0).then_some(bijection);
    };
    bijection.insert(p0.clone(), q0.clone());
    let mut queue = VecDeque::from([(p0.clone(), q0.clone())]);

    while let Some((p, q)) = queue.pop_front() {
        if left.is_accepting(&p) != right.is_accepting(&q) {
            trace!("`{p}` and `{q}` disagree on acceptance");
            return None;
        }
        for symbol in left.alphabet().iter().chain(right.alphabet().iter()) {
            let label = Label::Symbol(symbol.clone());
            let (p_targets, q_targets) = (left.targets(&p, &label), right.targets(&q, &label));
            match (p_targets, q_targets) {
                (None, None) => continue,
                (Some(p_targets), Some(q_targets)) if p_targets.len() == q_targets.len() => {
                    for (p_next, q_next) in p_targets.iter().zip(q_targets.iter()) {
                        match (
                            bijection.get_by_left(p_next),
                            bijection.get_by_right(q_next),
                        ) {
                            (None, None) => {
                                bijection.insert(p_next.clone(), q_next.clone());
                                queue.push_back((p_next.clone(), q_next.clone()));
                            }
                            (Some(mapped), _) if mapped == q_next => {}
                            _ => {
                                trace!("`{p_next}` and `{q_next}` cannot be mapped consistently");
                                return None;
                            }
                        }
                    }
                }
                _ => {
                    trace!("`{p}` and `{q}` differ in their transitions on `{symbol}`");
                    return None;
                }
            }
        }
    }

    (bijection.len() == left.size() && bijection.len() == right.size()).then_some(bijection)
}
