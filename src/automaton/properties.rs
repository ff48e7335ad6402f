use crate::error::AutomatonError;

use super::{Automaton, Label};

impl Automaton {
    /// Returns `true` if the automaton has no epsilon transitions and at most one target
    /// for every state and symbol.
    pub fn is_deterministic(&self) -> bool {
        self.nondeterminism_witness().is_none()
    }

    /// Describes why the automaton is not deterministic, or returns `None` if it is.
    pub fn nondeterminism_witness(&self) -> Option<String> {
        for (source, edges) in &self.transitions {
            for (label, targets) in edges {
                match label {
                    Label::Epsilon if !targets.is_empty() => {
                        return Some(format!("state `{source}` has an epsilon transition"))
                    }
                    Label::Symbol(sym) if targets.len() > 1 => {
                        return Some(format!(
                            "state `{source}` has {} targets on `{sym}`",
                            targets.len()
                        ))
                    }
                    _ => {}
                }
            }
        }
        None
    }

    /// Fails with [`AutomatonError::NotDeterministic`] if `self` is not deterministic.
    pub(crate) fn ensure_deterministic(
        &self,
        operation: &'static str,
    ) -> Result<(), AutomatonError> {
        match self.nondeterminism_witness() {
            None => Ok(()),
            Some(reason) => Err(AutomatonError::NotDeterministic { operation, reason }),
        }
    }

    /// Returns `true` if every state has at least one transition on every symbol of the
    /// alphabet.
    pub fn is_complete(&self) -> bool {
        self.states.iter().all(|q| {
            self.alphabet
                .iter()
                .all(|sym| self.targets(q, &Label::Symbol(sym.clone())).is_some())
        })
    }

    /// Returns `true` if every state can be reached from the initial state.
    pub fn is_connected(&self) -> bool {
        self.reachable_states().len() == self.size()
    }

    /// Returns `true` if the automaton accepts no word at all.
    pub fn is_empty_language(&self) -> bool {
        let reachable = self.reachable_states();
        !self.accepting.iter().any(|q| reachable.contains(q))
    }
}
