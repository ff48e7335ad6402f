use crate::math::OrderedSet;

use super::{Automaton, ClosureCache, State, Symbol, EPSILON};

/// An event that is emitted while an [`Automaton`] reads a word, see [`Automaton::simulate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    /// The automaton consumed `symbol` (or [`EPSILON`] for the initial closure).
    Step {
        /// Number of symbols read so far.
        position: usize,
        /// The symbol that was just read.
        symbol: Symbol,
        /// The states the automaton may be in now.
        states: OrderedSet<State>,
    },
    /// The whole word was read and one of the reached states is accepting.
    Accepted,
    /// The run got stuck after `position` symbols or ended in non-accepting states only.
    Rejected {
        /// Number of symbols that were read before the run ended.
        position: usize,
    },
}

/// Lazily produces the [`RunEvent`]s of reading a word, so that callers can relay progress
/// without waiting for the whole run.
#[derive(Debug, Clone)]
pub struct Simulation<'a> {
    fsa: &'a Automaton,
    word: Vec<Symbol>,
    position: usize,
    current: Option<OrderedSet<State>>,
    cache: ClosureCache,
    finished: bool,
}

impl<'a> Simulation<'a> {
    fn new(fsa: &'a Automaton, word: Vec<Symbol>) -> Self {
        Self {
            fsa,
            word,
            position: 0,
            current: None,
            cache: ClosureCache::default(),
            finished: false,
        }
    }

    fn finish(&mut self, event: RunEvent) -> Option<RunEvent> {
        self.finished = true;
        Some(event)
    }
}

impl Iterator for Simulation<'_> {
    type Item = RunEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let Some(current) = self.current.take() else {
            let Some(initial) = self.fsa.initial() else {
                return self.finish(RunEvent::Rejected { position: 0 });
            };
            let states = self
                .cache
                .closure(self.fsa, OrderedSet::from([initial.clone()]));
            self.current = Some(states.clone());
            return Some(RunEvent::Step {
                position: 0,
                symbol: EPSILON.to_string(),
                states,
            });
        };

        let Some(symbol) = self.word.get(self.position).cloned() else {
            let accepted = current.iter().any(|q| self.fsa.is_accepting(q));
            return self.finish(if accepted {
                RunEvent::Accepted
            } else {
                RunEvent::Rejected {
                    position: self.position,
                }
            });
        };

        let moved = self.fsa.move_set(&current, &symbol);
        if moved.is_empty() {
            return self.finish(RunEvent::Rejected {
                position: self.position,
            });
        }
        let states = self.cache.closure(self.fsa, moved);
        self.position += 1;
        self.current = Some(states.clone());
        Some(RunEvent::Step {
            position: self.position,
            symbol,
            states,
        })
    }
}

impl Automaton {
    /// Returns an iterator over the [`RunEvent`]s produced by reading `word`. The last
    /// event is always [`RunEvent::Accepted`] or [`RunEvent::Rejected`].
    pub fn simulate<I, S>(&self, word: I) -> Simulation<'_>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Simulation::new(
            self,
            word.into_iter().map(|s| s.as_ref().to_string()).collect(),
        )
    }

    /// Decides whether `word`, given as a sequence of symbols, is accepted.
    pub fn accepts<I, S>(&self, word: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        matches!(self.simulate(word).last(), Some(RunEvent::Accepted))
    }

    /// Decides whether the word whose symbols are the characters of `word` is accepted.
    pub fn accepts_chars(&self, word: &str) -> bool {
        self.accepts(word.chars().map(String::from))
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn simulation_events() {
        let nfa = Automaton::builder()
            .with_transitions([("0", "a", "0"), ("0", "a", "1"), ("1", "", "2")])
            .with_initial("0")
            .with_accepting(["2"])
            .build()
            .unwrap();

        let events: Vec<_> = nfa.simulate(["a", "a"]).collect();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[0],
            RunEvent::Step { position: 0, symbol, .. } if symbol == EPSILON
        ));
        assert!(matches!(
            &events[2],
            RunEvent::Step { position: 2, states, .. } if states.len() == 3
        ));
        assert_eq!(events[3], RunEvent::Accepted);

        assert_eq!(
            nfa.simulate(["b"]).last(),
            Some(RunEvent::Rejected { position: 0 })
        );
        assert!(!nfa.accepts_chars(""));
        assert!(nfa.accepts_chars("aaa"));
    }

    #[test]
    fn epsilon_cycles_terminate() {
        let nfa = Automaton::builder()
            .with_transitions([("0", "", "1"), ("1", "", "0")])
            .with_initial("0")
            .with_accepting(["1"])
            .build()
            .unwrap();
        assert!(nfa.accepts(Vec::<&str>::new()));
        assert!(!nfa.accepts(["a"]));
        assert!(!Automaton::empty().accepts(Vec::<String>::new()));
    }
}
