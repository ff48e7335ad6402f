use crate::{
    error::AutomatonError,
    math::{IndexedSet, OrderedMap},
};

use super::{Automaton, Label, State, Symbol};

/// Assembles an [`Automaton`] from its parts and validates it.
///
/// If no states are declared through [`AutomatonBuilder::with_states`], they are inferred
/// from the initial state, the transitions and the accepting states, in the order in
/// which they are mentioned. Similarly the alphabet is inferred from the transition
/// labels unless it is declared explicitly. Labels are given in their wire
/// representation, so the empty string stands for an epsilon transition.
///
/// # Example
/// ```
/// use fsa_algebra::prelude::*;
///
/// let dfa = Automaton::builder()
///     .with_transitions([
///         ("S0", "a", "S1"),
///         ("S0", "b", "S0"),
///         ("S1", "a", "S1"),
///         ("S1", "b", "S0"),
///     ])
///     .with_initial("S0")
///     .with_accepting(["S1"])
///     .build()
///     .unwrap();
/// assert_eq!(dfa.size(), 2);
/// assert!(dfa.is_deterministic());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutomatonBuilder {
    states: Option<Vec<State>>,
    alphabet: Option<Vec<Symbol>>,
    transitions: Vec<(State, Label, State)>,
    initial: Option<State>,
    accepting: Vec<State>,
}

impl AutomatonBuilder {
    /// Declares the states. Every state that is referenced elsewhere must be among them.
    pub fn with_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<State>,
    {
        self.states = Some(states.into_iter().map(Into::into).collect());
        self
    }

    /// Declares the alphabet. Every transition label other than epsilon must be in it.
    pub fn with_alphabet<I, S>(mut self, alphabet: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        self.alphabet = Some(alphabet.into_iter().map(Into::into).collect());
        self
    }

    /// Adds a single transition.
    pub fn with_transition(
        mut self,
        source: impl Into<State>,
        label: impl Into<Label>,
        target: impl Into<State>,
    ) -> Self {
        self.transitions
            .push((source.into(), label.into(), target.into()));
        self
    }

    /// Adds a collection of transitions given as `(source, label, target)` triples.
    pub fn with_transitions<I, S, L, T>(mut self, transitions: I) -> Self
    where
        I: IntoIterator<Item = (S, L, T)>,
        S: Into<State>,
        L: Into<Label>,
        T: Into<State>,
    {
        self.transitions.extend(
            transitions
                .into_iter()
                .map(|(s, l, t)| (s.into(), l.into(), t.into())),
        );
        self
    }

    /// Sets the initial state.
    pub fn with_initial(mut self, initial: impl Into<State>) -> Self {
        self.initial = Some(initial.into());
        self
    }

    /// Adds accepting states.
    pub fn with_accepting<I, S>(mut self, accepting: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<State>,
    {
        self.accepting.extend(accepting.into_iter().map(Into::into));
        self
    }

    /// Validates the collected parts and produces the automaton. No partial result is
    /// produced if any of the structural checks fails.
    pub fn build(self) -> Result<Automaton, AutomatonError> {
        let declared_states = self.states.is_some();
        let states: IndexedSet<State> = match self.states {
            Some(states) => states.into_iter().collect(),
            None => self
                .initial
                .iter()
                .cloned()
                .chain(
                    self.transitions
                        .iter()
                        .flat_map(|(s, _, t)| [s.clone(), t.clone()]),
                )
                .chain(self.accepting.iter().cloned())
                .collect(),
        };

        let initial = match self.initial {
            Some(initial) if states.contains(&initial) => Some(initial),
            Some(initial) => return Err(AutomatonError::UnknownInitialState(initial)),
            None if states.is_empty() => None,
            None => return Err(AutomatonError::MissingInitialState),
        };

        if let Some(q) = self.accepting.iter().find(|q| !states.contains(*q)) {
            return Err(AutomatonError::UnknownAcceptingState(q.clone()));
        }

        let alphabet: IndexedSet<Symbol> = match self.alphabet {
            Some(alphabet) => {
                if alphabet.iter().any(String::is_empty) {
                    return Err(AutomatonError::EpsilonInAlphabet);
                }
                let alphabet: IndexedSet<Symbol> = alphabet.into_iter().collect();
                if let Some(sym) = self
                    .transitions
                    .iter()
                    .filter_map(|(_, l, _)| l.as_symbol())
                    .find(|sym| !alphabet.contains(*sym))
                {
                    return Err(AutomatonError::SymbolNotInAlphabet(sym.to_string()));
                }
                alphabet
            }
            None => self
                .transitions
                .iter()
                .filter_map(|(_, l, _)| l.as_symbol().map(str::to_string))
                .collect(),
        };

        let mut transitions: OrderedMap<State, super::Edges> = OrderedMap::default();
        for (source, label, target) in self.transitions {
            if declared_states && !states.contains(&source) {
                return Err(AutomatonError::UnknownTransitionSource(source));
            }
            if declared_states && !states.contains(&target) {
                return Err(AutomatonError::UnknownTransitionTarget {
                    from: source,
                    symbol: label.to_string(),
                    target,
                });
            }
            transitions
                .entry(source)
                .or_default()
                .entry(label)
                .or_default()
                .insert(target);
        }

        Ok(Automaton {
            accepting: self.accepting.into_iter().collect(),
            states,
            alphabet,
            transitions,
            initial,
        })
    }
}
