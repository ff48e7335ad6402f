use std::fmt;

use itertools::Itertools;

use crate::math::{IndexedSet, OrderedMap, OrderedSet, Set};

mod builder;
pub use builder::AutomatonBuilder;

mod cleanup;

mod epsilon;
pub use epsilon::ClosureCache;

mod properties;

/// Runs of an automaton on finite words. Acceptance is decided by tracking the set of
/// states the automaton can be in, so epsilon cycles never lead to non-termination.
pub mod run;
pub use run::{RunEvent, Simulation};

mod display;

#[cfg(feature = "serde")]
mod wire;
#[cfg(feature = "serde")]
pub use wire::RawAutomaton;

/// States are identified by their (unique) name.
pub type State = String;
/// A symbol of the input alphabet.
pub type Symbol = String;

/// Printable representation of the empty word, used in traces and regular expressions.
pub const EPSILON: &str = "ε";
/// Printable representation of the empty language.
pub const EMPTY_LANGUAGE: &str = "∅";

/// The label of a transition, which is either a symbol of the alphabet or epsilon.
///
/// Keeping epsilon as its own variant means it can never accidentally become a member
/// of the alphabet. On the wire epsilon is encoded as the empty string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    /// The empty word, consumed without reading any input.
    Epsilon,
    /// A symbol of the alphabet.
    Symbol(Symbol),
}

impl Label {
    /// Creates a label from its wire representation, the empty string denotes epsilon.
    pub fn new(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        if symbol.is_empty() {
            Label::Epsilon
        } else {
            Label::Symbol(symbol)
        }
    }

    /// Returns `true` if `self` is [`Label::Epsilon`].
    pub fn is_epsilon(&self) -> bool {
        matches!(self, Label::Epsilon)
    }

    /// Returns the symbol if `self` is not epsilon.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Label::Epsilon => None,
            Label::Symbol(s) => Some(s.as_str()),
        }
    }

    /// Returns the key under which the label is stored on the wire.
    pub fn wire_key(&self) -> &str {
        self.as_symbol().unwrap_or("")
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::new(value)
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::new(value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Epsilon => write!(f, "{EPSILON}"),
            Label::Symbol(s) => write!(f, "{s}"),
        }
    }
}

/// The outgoing transitions of a single state, grouped by label.
pub type Edges = OrderedMap<Label, OrderedSet<State>>;

/// A finite state acceptor, which may be non-deterministic and may contain epsilon
/// transitions.
///
/// An `Automaton` can only be obtained through [`Automaton::builder`], deserialization or
/// one of the algorithms of this crate, all of which maintain the structural invariants:
/// every state that occurs in a transition or in the set of accepting states is a member
/// of the states, the initial state exists whenever there is at least one state and all
/// non-epsilon labels are members of the alphabet.
///
/// An automaton without states has no initial state and accepts the empty language.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawAutomaton", into = "RawAutomaton")
)]
pub struct Automaton {
    states: IndexedSet<State>,
    alphabet: IndexedSet<Symbol>,
    transitions: OrderedMap<State, Edges>,
    initial: Option<State>,
    accepting: IndexedSet<State>,
}

impl Default for Automaton {
    fn default() -> Self {
        Self::empty()
    }
}

impl Automaton {
    /// Returns the automaton without any states, which accepts the empty language.
    pub fn empty() -> Self {
        Self::for_alphabet(std::iter::empty::<Symbol>())
    }

    /// Returns a builder through which an automaton can be assembled and validated.
    pub fn builder() -> AutomatonBuilder {
        AutomatonBuilder::default()
    }

    /// Creates an automaton without states over the given alphabet.
    pub(crate) fn for_alphabet<I, S>(alphabet: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        Self {
            states: IndexedSet::default(),
            alphabet: alphabet.into_iter().map(Into::into).collect(),
            transitions: OrderedMap::default(),
            initial: None,
            accepting: IndexedSet::default(),
        }
    }

    /// Adds a state, returns `true` if it did not exist before. The first state that is
    /// added becomes the initial state.
    pub(crate) fn add_state(&mut self, state: impl Into<State>) -> bool {
        let state = state.into();
        if self.initial.is_none() {
            self.initial = Some(state.clone());
        }
        self.states.insert(state)
    }

    /// Makes `state` the initial state, adding it if necessary.
    pub(crate) fn set_initial(&mut self, state: impl Into<State>) {
        let state = state.into();
        self.states.insert(state.clone());
        self.initial = Some(state);
    }

    /// Marks `state` as accepting, adding it if necessary.
    pub(crate) fn add_accepting(&mut self, state: impl Into<State>) {
        let state = state.into();
        self.add_state(state.clone());
        self.accepting.insert(state);
    }

    /// Adds a symbol to the alphabet.
    pub(crate) fn add_symbol(&mut self, symbol: impl Into<Symbol>) -> bool {
        self.alphabet.insert(symbol.into())
    }

    /// Adds a transition, inserting the endpoints into the states and the symbol into the
    /// alphabet if they are not yet present. Returns `true` if the transition is new.
    pub(crate) fn add_transition(
        &mut self,
        source: impl Into<State>,
        label: Label,
        target: impl Into<State>,
    ) -> bool {
        let (source, target) = (source.into(), target.into());
        self.add_state(source.clone());
        self.add_state(target.clone());
        if let Label::Symbol(symbol) = &label {
            if !self.alphabet.contains(symbol) {
                self.alphabet.insert(symbol.clone());
            }
        }
        self.transitions
            .entry(source)
            .or_default()
            .entry(label)
            .or_default()
            .insert(target)
    }

    /// Returns a state name derived from `base` that does not clash with an existing state.
    pub(crate) fn fresh_state(&self, base: &str) -> State {
        let mut candidate = base.to_string();
        while self.states.contains(&candidate) {
            candidate.push('\'');
        }
        candidate
    }

    /// Builds the sub-automaton that consists only of the states in `keep`. If the initial
    /// state is not kept, the result is the empty automaton.
    pub(crate) fn restrict_to(&self, keep: &Set<State>) -> Automaton {
        let Some(initial) = self.initial.as_ref().filter(|q| keep.contains(*q)) else {
            return Automaton::for_alphabet(self.alphabet.iter().cloned());
        };
        let mut out = Automaton::for_alphabet(self.alphabet.iter().cloned());
        out.set_initial(initial.clone());
        for q in self.states.iter().filter(|q| keep.contains(*q)) {
            out.add_state(q.clone());
        }
        for q in self.accepting.iter().filter(|q| keep.contains(*q)) {
            out.accepting.insert(q.clone());
        }
        for (source, label, target) in self.transitions() {
            if keep.contains(source) && keep.contains(target) {
                out.add_transition(source.clone(), label.clone(), target.clone());
            }
        }
        out
    }

    /// Replaces the alphabet by exactly the symbols that label some transition.
    pub(crate) fn prune_alphabet(&mut self) {
        let used: OrderedSet<&str> = self
            .transitions
            .values()
            .flat_map(|edges| edges.keys())
            .filter_map(Label::as_symbol)
            .collect();
        self.alphabet.retain(|sym| used.contains(sym.as_str()));
    }

    /// Adds `symbols` to the alphabet.
    pub(crate) fn extend_alphabet<I, S>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<Symbol>,
    {
        for sym in symbols {
            self.add_symbol(sym);
        }
    }

    /// The states of the automaton, in insertion order.
    pub fn states(&self) -> &IndexedSet<State> {
        &self.states
    }

    /// The alphabet of the automaton, in insertion order.
    pub fn alphabet(&self) -> &IndexedSet<Symbol> {
        &self.alphabet
    }

    /// The initial state, which only is `None` if the automaton has no states.
    pub fn initial(&self) -> Option<&State> {
        self.initial.as_ref()
    }

    /// The accepting states.
    pub fn accepting_states(&self) -> &IndexedSet<State> {
        &self.accepting
    }

    /// Returns `true` if `state` is an accepting state.
    pub fn is_accepting(&self, state: &str) -> bool {
        self.accepting.contains(state)
    }

    /// Returns `true` if `state` is a state of the automaton.
    pub fn contains_state(&self, state: &str) -> bool {
        self.states.contains(state)
    }

    /// The number of states.
    pub fn size(&self) -> usize {
        self.states.len()
    }

    /// Returns the outgoing transitions of `state`, or `None` if it has none.
    pub fn edges_from(&self, state: &str) -> Option<&Edges> {
        self.transitions.get(state)
    }

    /// Returns the targets of `state` on `label`, or `None` if there are none.
    pub fn targets(&self, state: &str, label: &Label) -> Option<&OrderedSet<State>> {
        self.transitions
            .get(state)
            .and_then(|edges| edges.get(label))
            .filter(|targets| !targets.is_empty())
    }

    /// Returns the unique target of `state` on `symbol` if there is exactly one.
    pub fn successor(&self, state: &str, symbol: &str) -> Option<&State> {
        self.targets(state, &Label::new(symbol))
            .filter(|targets| targets.len() == 1)
            .and_then(|targets| targets.iter().next())
    }

    /// Iterates over all transitions as triples of source, label and target.
    pub fn transitions(&self) -> impl Iterator<Item = (&State, &Label, &State)> + '_ {
        self.transitions.iter().flat_map(|(source, edges)| {
            edges
                .iter()
                .flat_map(move |(label, targets)| targets.iter().map(move |t| (source, label, t)))
        })
    }

    /// The number of transitions, where a transition with several targets counts once per
    /// target.
    pub fn transition_count(&self) -> usize {
        self.transitions
            .values()
            .flat_map(|edges| edges.values())
            .map(OrderedSet::len)
            .sum()
    }

    /// The score that decides whether exponential minimisation procedures are attempted,
    /// which is the number of states plus the number of transitions.
    pub fn complexity(&self) -> usize {
        self.size() + self.transition_count()
    }

    /// Builds the reverse-transition index, mapping each target and label to the set of
    /// states which reach the target on that label.
    pub fn predecessors(&self) -> OrderedMap<&State, OrderedMap<&Label, OrderedSet<&State>>> {
        let mut out: OrderedMap<&State, OrderedMap<&Label, OrderedSet<&State>>> =
            OrderedMap::default();
        for (source, label, target) in self.transitions() {
            out.entry(target)
                .or_default()
                .entry(label)
                .or_default()
                .insert(source);
        }
        out
    }

    /// Builds the dual automaton, in which every transition is reversed. A fresh initial
    /// state is linked by epsilon transitions to every formerly accepting state and the
    /// former initial state becomes the only accepting state. Reachability in the dual
    /// thus corresponds to co-reachability in `self`.
    pub fn reversed(&self) -> Automaton {
        let Some(initial) = self.initial.as_ref() else {
            return Automaton::for_alphabet(self.alphabet.iter().cloned());
        };
        let mut dual = Automaton::for_alphabet(self.alphabet.iter().cloned());
        let start = self.fresh_state("rev");
        dual.set_initial(start.clone());
        for q in &self.states {
            dual.add_state(q.clone());
        }
        for (source, label, target) in self.transitions() {
            dual.add_transition(target.clone(), label.clone(), source.clone());
        }
        for q in &self.accepting {
            dual.add_transition(start.clone(), Label::Epsilon, q.clone());
        }
        dual.add_accepting(initial.clone());
        dual
    }

    /// Returns a short human readable summary like `3 states, 5 transitions`.
    pub fn summary(&self) -> String {
        format!(
            "{} states, {} transitions over {{{}}}",
            self.size(),
            self.transition_count(),
            self.alphabet.iter().join(", ")
        )
    }
}
