use std::collections::VecDeque;

use tracing::trace;

use crate::math::Set;

use super::{Automaton, State};

impl Automaton {
    /// Computes the states that are reachable from the initial state through any
    /// transition, epsilon transitions included.
    pub fn reachable_states(&self) -> Set<State> {
        let mut seen = Set::default();
        let Some(initial) = self.initial() else {
            return seen;
        };
        let mut queue = VecDeque::from([initial]);
        seen.insert(initial.clone());
        while let Some(q) = queue.pop_front() {
            let Some(edges) = self.edges_from(q) else {
                continue;
            };
            for p in edges.values().flatten() {
                if seen.insert(p.clone()) {
                    queue.push_back(p);
                }
            }
        }
        seen
    }

    /// Computes the states from which some accepting state can be reached, by a backward
    /// breadth first search over the reverse-transition index.
    pub fn productive_states(&self) -> Set<State> {
        let predecessors = self.predecessors();
        let mut seen: Set<State> = self.accepting_states().iter().cloned().collect();
        let mut queue: VecDeque<&State> = self.accepting_states().iter().collect();
        while let Some(q) = queue.pop_front() {
            let Some(by_label) = predecessors.get(q) else {
                continue;
            };
            for p in by_label.values().flatten() {
                if seen.insert((*p).clone()) {
                    queue.push_back(*p);
                }
            }
        }
        seen
    }

    /// Removes all states that cannot be reached from the initial state together with
    /// their transitions. The alphabet is left untouched.
    pub fn remove_unreachable(&self) -> Automaton {
        let reachable = self.reachable_states();
        if reachable.len() == self.size() {
            return self.clone();
        }
        trace!(
            "removing {} unreachable states",
            self.size() - reachable.len()
        );
        self.restrict_to(&reachable)
    }

    /// Removes all states from which no accepting state can be reached. Afterwards the
    /// alphabet consists of exactly the symbols that label a remaining transition. If the
    /// initial state itself is dead, the language is empty and the automaton without
    /// states is returned.
    pub fn remove_dead(&self) -> Automaton {
        let productive = self.productive_states();
        if productive.len() < self.size() {
            trace!("removing {} dead states", self.size() - productive.len());
        }
        let mut out = self.restrict_to(&productive);
        out.prune_alphabet();
        out
    }

    /// The standard preprocessing step, removes unreachable and then dead states.
    pub fn trim(&self) -> Automaton {
        self.remove_unreachable().remove_dead()
    }
}
