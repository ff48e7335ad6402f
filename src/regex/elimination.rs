use std::fmt;

use itertools::Itertools;
use tracing::trace;

use crate::{
    automaton::{Automaton, Label, EMPTY_LANGUAGE, EPSILON},
    math::{OrderedMap, OrderedSet},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Binding {
    Union,
    Concat,
    Postfix,
    Atom,
}

/// The label of an edge of a generalized automaton: a regular expression that was
/// assembled from smaller labels. It is kept as text together with how tightly its
/// outermost operator binds, so that it never has to be parsed again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexLabel {
    text: String,
    binding: Binding,
}

impl RegexLabel {
    fn epsilon() -> Self {
        Self {
            text: EPSILON.to_string(),
            binding: Binding::Atom,
        }
    }

    fn symbol(symbol: &str) -> Self {
        let binding = if symbol.chars().count() == 1 {
            Binding::Atom
        } else {
            Binding::Concat
        };
        Self {
            text: symbol.to_string(),
            binding,
        }
    }

    fn from_label(label: &Label) -> Self {
        match label {
            Label::Epsilon => Self::epsilon(),
            Label::Symbol(symbol) => Self::symbol(symbol),
        }
    }

    fn is_epsilon(&self) -> bool {
        self.text == EPSILON
    }

    fn wrapped(&self, required: Binding) -> String {
        if self.binding < required {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }

    fn union(&self, other: &RegexLabel) -> RegexLabel {
        if self == other {
            return self.clone();
        }
        RegexLabel {
            text: format!("{}|{}", self.text, other.text),
            binding: Binding::Union,
        }
    }

    fn concat(&self, other: &RegexLabel) -> RegexLabel {
        if self.is_epsilon() {
            return other.clone();
        }
        if other.is_epsilon() {
            return self.clone();
        }
        RegexLabel {
            text: format!(
                "{}{}",
                self.wrapped(Binding::Concat),
                other.wrapped(Binding::Concat)
            ),
            binding: Binding::Concat,
        }
    }

    fn star(&self) -> RegexLabel {
        if self.is_epsilon() || (self.binding == Binding::Postfix && self.text.ends_with('*')) {
            return self.clone();
        }
        RegexLabel {
            text: format!("{}*", self.wrapped(Binding::Atom)),
            binding: Binding::Postfix,
        }
    }
}

impl fmt::Display for RegexLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A generalized automaton over numbered nodes, whose edges carry regular expressions.
/// The synthetic start and accept nodes are never eliminated.
struct Generalized {
    edges: OrderedMap<(usize, usize), RegexLabel>,
    remaining: OrderedSet<usize>,
    start: usize,
    accept: usize,
}

impl Generalized {
    fn new(fsa: &Automaton) -> Self {
        let n = fsa.size();
        let (start, accept) = (n, n + 1);
        let mut gnfa = Self {
            edges: OrderedMap::default(),
            remaining: (0..n).collect(),
            start,
            accept,
        };
        let index = |q: &str| fsa.states().get_index_of(q);
        for (source, label, target) in fsa.transitions() {
            if let (Some(p), Some(q)) = (index(source), index(target)) {
                gnfa.add(p, q, RegexLabel::from_label(label));
            }
        }
        if let Some(initial) = fsa.initial().and_then(|q| index(q)) {
            gnfa.add(start, initial, RegexLabel::epsilon());
        }
        for q in fsa.accepting_states().iter().filter_map(|q| index(q)) {
            gnfa.add(q, accept, RegexLabel::epsilon());
        }
        gnfa
    }

    fn add(&mut self, from: usize, to: usize, label: RegexLabel) {
        let merged = match self.edges.get(&(from, to)) {
            Some(existing) => existing.union(&label),
            None => label,
        };
        self.edges.insert((from, to), merged);
    }

    fn degree(&self, node: usize) -> usize {
        self.edges
            .keys()
            .filter(|(from, to)| (*from == node) != (*to == node))
            .count()
    }

    /// Removes `node`, rerouting every path through it onto a direct edge.
    fn eliminate(&mut self, node: usize) {
        let self_loop = self.edges.remove(&(node, node)).map(|l| l.star());
        let incoming = self
            .edges
            .iter()
            .filter(|((_, to), _)| *to == node)
            .map(|((from, _), label)| (*from, label.clone()))
            .collect_vec();
        let outgoing = self
            .edges
            .iter()
            .filter(|((from, _), _)| *from == node)
            .map(|((_, to), label)| (*to, label.clone()))
            .collect_vec();
        self.edges.retain(|(from, to), _| *from != node && *to != node);
        self.remaining.remove(&node);

        for (p, entering) in &incoming {
            for (q, leaving) in &outgoing {
                let through = match &self_loop {
                    Some(looped) => entering.concat(looped).concat(leaving),
                    None => entering.concat(leaving),
                };
                self.add(*p, *q, through);
            }
        }
    }

    fn run(mut self) -> Option<RegexLabel> {
        loop {
            let Some(node) = self
                .remaining
                .iter()
                .copied()
                .min_by_key(|&node| (self.degree(node), node))
            else {
                break;
            };
            trace!("eliminating node {node} of degree {}", self.degree(node));
            self.eliminate(node);
        }
        self.edges.remove(&(self.start, self.accept))
    }
}

/// Converts `fsa` into a regular expression by state elimination.
///
/// The automaton is embedded into a generalized automaton with a fresh start node that
/// leads to the initial state and a fresh accept node reached from every accepting
/// state, both by epsilon. States are then removed one at a time, always the one with the
/// fewest incoming and outgoing edges first. The label that finally connects start and
/// accept is the result, or `∅` if no such edge remains.
pub fn eliminate_states(fsa: &Automaton) -> String {
    let Some(initial) = fsa.initial() else {
        return EMPTY_LANGUAGE.to_string();
    };
    if fsa.size() == 1 {
        if !fsa.is_accepting(initial) {
            return EMPTY_LANGUAGE.to_string();
        }
        let loops = fsa
            .transitions()
            .filter(|(_, label, _)| !label.is_epsilon())
            .map(|(_, label, _)| RegexLabel::from_label(label))
            .reduce(|acc, label| acc.union(&label));
        return loops.map_or_else(|| EPSILON.to_string(), |label| label.star().to_string());
    }
    Generalized::new(fsa)
        .run()
        .map_or_else(|| EMPTY_LANGUAGE.to_string(), |label| label.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn single_state_base_cases() {
        let looping = Automaton::builder()
            .with_transitions([("q", "a", "q")])
            .with_initial("q")
            .with_accepting(["q"])
            .build()
            .unwrap();
        assert_eq!(eliminate_states(&looping), "a*");

        let two_loops = Automaton::builder()
            .with_transitions([("q", "a", "q"), ("q", "b", "q")])
            .with_initial("q")
            .with_accepting(["q"])
            .build()
            .unwrap();
        assert_eq!(eliminate_states(&two_loops), "(a|b)*");

        let accepting = Automaton::builder()
            .with_states(["q"])
            .with_initial("q")
            .with_accepting(["q"])
            .build()
            .unwrap();
        assert_eq!(eliminate_states(&accepting), "ε");

        let rejecting = Automaton::builder()
            .with_states(["q"])
            .with_initial("q")
            .build()
            .unwrap();
        assert_eq!(eliminate_states(&rejecting), "∅");
        assert_eq!(eliminate_states(&Automaton::empty()), "∅");
    }

    #[test_log::test]
    fn elimination_preserves_language() {
        let dfa = Automaton::builder()
            .with_transitions([
                ("x", "a", "y"),
                ("x", "b", "x"),
                ("y", "a", "y"),
                ("y", "b", "z"),
                ("z", "a", "y"),
                ("z", "b", "x"),
            ])
            .with_initial("x")
            .with_accepting(["z"])
            .build()
            .unwrap();
        let regex = eliminate_states(&dfa);
        let back = regex_to_fsa(&regex).unwrap();
        assert!(are_equivalent(&dfa, &back), "`{regex}` is wrong");
    }

    #[test]
    fn labels_are_parenthesized_where_needed() {
        let a = RegexLabel::symbol("a");
        let b = RegexLabel::symbol("b");
        let ab = a.concat(&b);
        assert_eq!(ab.star().to_string(), "(ab)*");
        assert_eq!(a.union(&b).concat(&a).to_string(), "(a|b)a");
        assert_eq!(a.star().star().to_string(), "a*");
        assert_eq!(RegexLabel::epsilon().concat(&a).to_string(), "a");
        assert_eq!(a.union(&a).to_string(), "a");
    }
}
