use tracing::trace;

use crate::{
    automaton::{Automaton, Label, State},
    error::RegexSyntaxError,
};

use super::{
    ast::{Node, Postfix},
    parser::parse,
};

/// A piece of the automaton under construction with a single entry and a single exit.
#[derive(Debug, Clone, Copy)]
struct Fragment {
    entry: usize,
    exit: usize,
}

#[derive(Default)]
struct Thompson {
    fsa: Automaton,
    next: usize,
}

impl Thompson {
    fn name(id: usize) -> State {
        format!("q{id}")
    }

    fn fresh(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        self.fsa.add_state(Self::name(id));
        id
    }

    fn link(&mut self, from: usize, label: Label, to: usize) {
        self.fsa
            .add_transition(Self::name(from), label, Self::name(to));
    }

    fn epsilon(&mut self, from: usize, to: usize) {
        self.link(from, Label::Epsilon, to);
    }

    fn build(&mut self, node: &Node) -> Fragment {
        match node {
            Node::Symbol(c) => {
                let (entry, exit) = (self.fresh(), self.fresh());
                self.link(entry, Label::Symbol(c.to_string()), exit);
                Fragment { entry, exit }
            }
            Node::Epsilon | Node::EmptyGroup => {
                let (entry, exit) = (self.fresh(), self.fresh());
                self.epsilon(entry, exit);
                Fragment { entry, exit }
            }
            Node::Empty => Fragment {
                entry: self.fresh(),
                exit: self.fresh(),
            },
            Node::Union(items) => {
                let (entry, exit) = (self.fresh(), self.fresh());
                for item in items {
                    let inner = self.build(item);
                    self.epsilon(entry, inner.entry);
                    self.epsilon(inner.exit, exit);
                }
                Fragment { entry, exit }
            }
            Node::Concat(items) => {
                let fragments = items.iter().map(|item| self.build(item)).collect::<Vec<_>>();
                let (Some(first), Some(last)) = (fragments.first(), fragments.last()) else {
                    return self.build(&Node::Epsilon);
                };
                let fragment = Fragment {
                    entry: first.entry,
                    exit: last.exit,
                };
                for pair in fragments.windows(2) {
                    self.epsilon(pair[0].exit, pair[1].entry);
                }
                fragment
            }
            Node::Star(inner) => {
                let inner = self.build(inner);
                self.wrap(inner, Postfix::Star)
            }
            Node::Plus(inner) => {
                let inner = self.build(inner);
                self.wrap(inner, Postfix::Plus)
            }
            Node::Optional(inner) => {
                let inner = self.build(inner);
                self.wrap(inner, Postfix::Optional)
            }
            Node::MultiOp(inner, operators) => {
                let inner = self.build(inner);
                operators
                    .iter()
                    .fold(inner, |fragment, op| self.wrap(fragment, *op))
            }
        }
    }

    /// Surrounds `inner` with a fresh entry and exit implementing `operator`.
    fn wrap(&mut self, inner: Fragment, operator: Postfix) -> Fragment {
        let (entry, exit) = (self.fresh(), self.fresh());
        self.epsilon(entry, inner.entry);
        self.epsilon(inner.exit, exit);
        if matches!(operator, Postfix::Star | Postfix::Optional) {
            self.epsilon(entry, exit);
        }
        if matches!(operator, Postfix::Star | Postfix::Plus) {
            self.epsilon(inner.exit, inner.entry);
        }
        Fragment { entry, exit }
    }
}

impl Node {
    /// Builds an epsilon automaton for the expression by Thompson's construction. States
    /// are named `q0`, `q1` and so on, every symbol that occurs becomes part of the
    /// alphabet.
    pub fn to_automaton(&self) -> Automaton {
        let mut thompson = Thompson::default();
        let Fragment { entry, exit } = thompson.build(self);
        let mut fsa = thompson.fsa;
        fsa.set_initial(Thompson::name(entry));
        fsa.add_accepting(Thompson::name(exit));
        trace!("Thompson construction for `{self}` yields {}", fsa.summary());
        fsa
    }
}

/// Parses `regex` and converts it into an automaton with epsilon transitions.
///
/// # Example
/// ```
/// use fsa_algebra::prelude::*;
///
/// let fsa = regex_to_fsa("(a|b)*abb").unwrap();
/// assert!(fsa.accepts_chars("babb"));
/// assert!(!fsa.accepts_chars("abba"));
/// assert!(regex_to_fsa("a|*").is_err());
/// ```
pub fn regex_to_fsa(regex: &str) -> Result<Automaton, RegexSyntaxError> {
    Ok(parse(regex)?.to_automaton())
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn check(regex: &str, accepted: &[&str], rejected: &[&str]) {
        let fsa = regex_to_fsa(regex).unwrap();
        for word in accepted {
            assert!(fsa.accepts_chars(word), "`{regex}` should accept `{word}`");
        }
        for word in rejected {
            assert!(!fsa.accepts_chars(word), "`{regex}` should reject `{word}`");
        }
    }

    #[test_log::test]
    fn thompson_languages() {
        check("a", &["a"], &["", "aa", "b"]);
        check("a|b", &["a", "b"], &["", "ab"]);
        check("a*", &["", "a", "aaa"], &["b"]);
        check("a+", &["a", "aa"], &[""]);
        check("a?b", &["b", "ab"], &["aab", "a"]);
        check("(ab)*|(ba)*", &["", "abab", "ba"], &["aba", "abba"]);
        check("ε", &[""], &["a"]);
        check("∅", &[], &["", "a"]);
        check("()a", &["a"], &["", "aa"]);
        check("a∅|b", &["b"], &["a"]);
    }

    #[test]
    fn stacked_operators_apply_in_sequence() {
        check("a?+", &["", "a", "aaa"], &["b"]);
        check("a++", &["a", "aa"], &[""]);
        check("(ab)??", &["", "ab"], &["abab"]);
    }

    #[test]
    fn structure() {
        let fsa = regex_to_fsa("ab").unwrap();
        assert_eq!(fsa.size(), 4);
        assert_eq!(fsa.initial().map(String::as_str), Some("q0"));
        assert!(fsa.is_accepting("q3"));
        assert!(fsa.has_epsilon_transitions());
        assert_eq!(fsa.alphabet().len(), 2);

        assert_eq!(regex_to_fsa("").unwrap().size(), 2);
        assert!(matches!(
            regex_to_fsa("(a"),
            Err(RegexSyntaxError::UnbalancedParenthesis { position: 0 })
        ));
    }
}
