use thiserror::Error;

use crate::automaton::{State, Symbol};

/// Abstracts the errors that can occur when constructing or transforming an [`crate::Automaton`].
///
/// Everything in here is caused by the input that was handed to the engine, so
/// every variant is a client error in the sense of [`AutomatonError::is_client_error`].
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[allow(missing_docs)]
pub enum AutomatonError {
    #[error("automaton is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("automaton has states but no starting state")]
    MissingInitialState,
    #[error("starting state `{0}` is not a member of the states")]
    UnknownInitialState(State),
    #[error("accepting state `{0}` is not a member of the states")]
    UnknownAcceptingState(State),
    #[error("transition source `{0}` is not a member of the states")]
    UnknownTransitionSource(State),
    #[error("transition `{from}` --{symbol}--> `{target}` leads to a state that is not a member of the states")]
    UnknownTransitionTarget {
        from: State,
        symbol: String,
        target: State,
    },
    #[error("transition symbol `{0}` is not a member of the alphabet")]
    SymbolNotInAlphabet(Symbol),
    #[error("the empty string (epsilon) may not be a member of the alphabet")]
    EpsilonInAlphabet,
    #[error("{operation} requires a deterministic automaton: {reason}")]
    NotDeterministic {
        operation: &'static str,
        reason: String,
    },
    #[error(transparent)]
    Regex(#[from] RegexSyntaxError),
}

impl AutomatonError {
    /// Returns `true` if the error was caused by malformed input rather than by a
    /// failure of the engine itself. An API layer maps these to 4xx responses.
    pub fn is_client_error(&self) -> bool {
        match self {
            AutomatonError::MissingField(_)
            | AutomatonError::MissingInitialState
            | AutomatonError::UnknownInitialState(_)
            | AutomatonError::UnknownAcceptingState(_)
            | AutomatonError::UnknownTransitionSource(_)
            | AutomatonError::UnknownTransitionTarget { .. }
            | AutomatonError::SymbolNotInAlphabet(_)
            | AutomatonError::EpsilonInAlphabet
            | AutomatonError::NotDeterministic { .. }
            | AutomatonError::Regex(_) => true,
        }
    }
}

/// Errors that are produced when parsing a regular expression. Every variant carries the
/// (zero based) character position at which the problem was detected.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Error)]
#[allow(missing_docs)]
pub enum RegexSyntaxError {
    #[error("operator `{operator}` at position {position} has no preceding operand")]
    MissingOperand { operator: char, position: usize },
    #[error("unbalanced parenthesis at position {position}")]
    UnbalancedParenthesis { position: usize },
    #[error("unexpected character `{character}` at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("unexpected end of input at position {position}")]
    UnexpectedEnd { position: usize },
    #[error("operator `{operator}` at position {position} may not follow `|`")]
    OperatorAfterUnion { operator: char, position: usize },
}

impl RegexSyntaxError {
    /// The position in the input at which the error was detected.
    pub fn position(&self) -> usize {
        match *self {
            RegexSyntaxError::MissingOperand { position, .. }
            | RegexSyntaxError::UnbalancedParenthesis { position }
            | RegexSyntaxError::UnexpectedCharacter { position, .. }
            | RegexSyntaxError::UnexpectedEnd { position }
            | RegexSyntaxError::OperatorAfterUnion { position, .. } => position,
        }
    }
}
