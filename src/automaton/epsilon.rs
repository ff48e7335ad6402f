use crate::math::{Map, OrderedSet};

use super::{Automaton, Label, State};

/// Memoizes epsilon closures by the set of states they were computed for. Subset
/// construction asks for the closure of the same move set many times, so this avoids
/// repeating the traversal.
#[derive(Debug, Clone, Default)]
pub struct ClosureCache {
    closures: Map<OrderedSet<State>, OrderedSet<State>>,
}

impl ClosureCache {
    /// Returns the epsilon closure of `states` in `fsa`, computing it only on first request.
    pub fn closure(&mut self, fsa: &Automaton, states: OrderedSet<State>) -> OrderedSet<State> {
        if let Some(closure) = self.closures.get(&states) {
            return closure.clone();
        }
        let closure = fsa.epsilon_closure(states.iter().map(String::as_str));
        self.closures.insert(states, closure.clone());
        closure
    }

    /// The number of memoized closures.
    pub fn len(&self) -> usize {
        self.closures.len()
    }

    /// Returns `true` if nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.closures.is_empty()
    }
}

impl Automaton {
    /// Computes the set of states that are reachable from any of the given `states` by
    /// using only epsilon transitions. The given states are always part of their closure.
    pub fn epsilon_closure<'a, I>(&self, states: I) -> OrderedSet<State>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut closure: OrderedSet<State> = OrderedSet::default();
        let mut stack: Vec<State> = Vec::new();
        for q in states {
            if closure.insert(q.to_string()) {
                stack.push(q.to_string());
            }
        }
        while let Some(q) = stack.pop() {
            if let Some(targets) = self.targets(&q, &Label::Epsilon) {
                for p in targets {
                    if closure.insert(p.clone()) {
                        stack.push(p.clone());
                    }
                }
            }
        }
        closure
    }

    /// Computes the union of the `symbol` successors of all states in `states`, without
    /// taking epsilon transitions into account.
    pub fn move_set<'a, I>(&self, states: I, symbol: &str) -> OrderedSet<State>
    where
        I: IntoIterator<Item = &'a State>,
    {
        let label = Label::new(symbol);
        states
            .into_iter()
            .filter_map(|q| self.targets(q, &label))
            .flatten()
            .cloned()
            .collect()
    }

    /// Returns `true` if some transition is labelled with epsilon.
    pub fn has_epsilon_transitions(&self) -> bool {
        self.transitions
            .values()
            .any(|edges| edges.get(&Label::Epsilon).is_some_and(|t| !t.is_empty()))
    }

    /// Produces an equivalent automaton without epsilon transitions over the same states.
    ///
    /// A state `q` reaches `p` on symbol `a` in the result iff `p` lies in the epsilon
    /// closure of an `a` successor of some state in the closure of `q`. A state accepts
    /// iff its closure contains an accepting state.
    pub fn remove_epsilon(&self) -> Automaton {
        if !self.has_epsilon_transitions() {
            return self.clone();
        }
        let Some(initial) = self.initial() else {
            return self.clone();
        };

        let mut cache = ClosureCache::default();
        let mut out = Automaton::for_alphabet(self.alphabet.iter().cloned());
        out.set_initial(initial.clone());

        for q in &self.states {
            out.add_state(q.clone());
            let closure = cache.closure(self, OrderedSet::from([q.clone()]));
            if closure.iter().any(|p| self.is_accepting(p)) {
                out.add_accepting(q.clone());
            }
            for symbol in &self.alphabet {
                let moved = self.move_set(&closure, symbol);
                if moved.is_empty() {
                    continue;
                }
                for target in cache.closure(self, moved) {
                    out.add_transition(q.clone(), Label::Symbol(symbol.clone()), target);
                }
            }
        }
        out
    }
}
