//! The syntax tree of regular expressions.
use std::fmt;

use itertools::Itertools;

use crate::automaton::{EMPTY_LANGUAGE, EPSILON};

/// A postfix operator of the regular expression syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Postfix {
    /// `*`, zero or more repetitions.
    Star,
    /// `+`, one or more repetitions.
    Plus,
    /// `?`, zero or one occurrence.
    Optional,
}

impl Postfix {
    /// Parses the operator character.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '*' => Some(Postfix::Star),
            '+' => Some(Postfix::Plus),
            '?' => Some(Postfix::Optional),
            _ => None,
        }
    }

    /// The operator character.
    pub fn as_char(&self) -> char {
        match self {
            Postfix::Star => '*',
            Postfix::Plus => '+',
            Postfix::Optional => '?',
        }
    }

    /// The single operator that has the same effect as applying `self` and then `other`.
    /// Equal operators collapse, every other combination amounts to a star.
    pub fn then(self, other: Postfix) -> Postfix {
        match (self, other) {
            (a, b) if a == b => a,
            _ => Postfix::Star,
        }
    }
}

/// A node of the syntax tree of a regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    /// A single literal character.
    Symbol(char),
    /// `ε`, the empty word.
    Epsilon,
    /// `∅`, the empty language.
    Empty,
    /// `()`, a group without content, which matches the empty word.
    EmptyGroup,
    /// Alternatives separated by `|`.
    Union(Vec<Node>),
    /// Juxtaposed expressions.
    Concat(Vec<Node>),
    /// `R*`.
    Star(Box<Node>),
    /// `R+`.
    Plus(Box<Node>),
    /// `R?`.
    Optional(Box<Node>),
    /// An operand followed by several stacked postfix operators, like `a*+`.
    MultiOp(Box<Node>, Vec<Postfix>),
}

/// Binding strength of the top level of a node, higher binds tighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Union,
    Concat,
    Postfix,
    Atom,
}

impl Node {
    /// Wraps `self` into the node for `operator`.
    pub fn apply(self, operator: Postfix) -> Node {
        let inner = Box::new(self);
        match operator {
            Postfix::Star => Node::Star(inner),
            Postfix::Plus => Node::Plus(inner),
            Postfix::Optional => Node::Optional(inner),
        }
    }

    /// Builds a union, flattening nested unions and avoiding unions of a single node.
    pub fn union(nodes: impl IntoIterator<Item = Node>) -> Node {
        let mut items = Vec::new();
        for node in nodes {
            match node {
                Node::Union(inner) => items.extend(inner),
                other => items.push(other),
            }
        }
        match items.len() {
            0 => Node::Empty,
            1 => items.remove(0),
            _ => Node::Union(items),
        }
    }

    /// Builds a concatenation, flattening nested concatenations and avoiding
    /// concatenations of a single node.
    pub fn concat(nodes: impl IntoIterator<Item = Node>) -> Node {
        let mut items = Vec::new();
        for node in nodes {
            match node {
                Node::Concat(inner) => items.extend(inner),
                other => items.push(other),
            }
        }
        match items.len() {
            0 => Node::Epsilon,
            1 => items.remove(0),
            _ => Node::Concat(items),
        }
    }

    fn precedence(&self) -> Precedence {
        match self {
            Node::Union(items) if items.len() > 1 => Precedence::Union,
            Node::Concat(items) if items.len() > 1 => Precedence::Concat,
            Node::Union(items) | Node::Concat(items) => {
                items.first().map_or(Precedence::Atom, Node::precedence)
            }
            Node::Star(_) | Node::Plus(_) | Node::Optional(_) | Node::MultiOp(..) => {
                Precedence::Postfix
            }
            Node::Symbol(_) | Node::Epsilon | Node::Empty | Node::EmptyGroup => Precedence::Atom,
        }
    }

    fn fmt_at(&self, f: &mut fmt::Formatter<'_>, required: Precedence) -> fmt::Result {
        if self.precedence() < required {
            write!(f, "(")?;
            self.fmt_at(f, Precedence::Union)?;
            return write!(f, ")");
        }
        match self {
            Node::Symbol(c) => write!(f, "{c}"),
            Node::Epsilon => write!(f, "{EPSILON}"),
            Node::Empty => write!(f, "{EMPTY_LANGUAGE}"),
            Node::EmptyGroup => write!(f, "()"),
            Node::Union(items) if items.is_empty() => write!(f, "{EMPTY_LANGUAGE}"),
            Node::Concat(items) if items.is_empty() => write!(f, "{EPSILON}"),
            Node::Union(items) | Node::Concat(items) if items.len() == 1 => {
                items[0].fmt_at(f, required)
            }
            Node::Union(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, "|")?;
                    }
                    item.fmt_at(f, Precedence::Concat)?;
                }
                Ok(())
            }
            Node::Concat(items) => items
                .iter()
                .try_for_each(|item| item.fmt_at(f, Precedence::Postfix)),
            Node::Star(inner) | Node::Plus(inner) | Node::Optional(inner) => {
                inner.fmt_at(f, Precedence::Postfix)?;
                let op = match self {
                    Node::Star(_) => '*',
                    Node::Plus(_) => '+',
                    _ => '?',
                };
                write!(f, "{op}")
            }
            Node::MultiOp(inner, ops) => {
                inner.fmt_at(f, Precedence::Postfix)?;
                write!(f, "{}", ops.iter().map(Postfix::as_char).join(""))
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(f, Precedence::Union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(c: char) -> Node {
        Node::Symbol(c)
    }

    #[test]
    fn minimal_parentheses() {
        let node = Node::concat([
            Node::union([sym('a'), sym('b')]).apply(Postfix::Star),
            sym('a'),
            Node::concat([sym('b'), sym('b')]),
        ]);
        assert_eq!(node.to_string(), "(a|b)*abb");

        let node = Node::union([
            Node::concat([sym('a'), sym('b')]),
            sym('c').apply(Postfix::Optional),
        ]);
        assert_eq!(node.to_string(), "ab|c?");

        let node = Node::concat([sym('a'), Node::union([sym('b'), Node::Epsilon])]);
        assert_eq!(node.to_string(), "a(b|ε)");

        let node = Node::MultiOp(Box::new(sym('a')), vec![Postfix::Star, Postfix::Plus]);
        assert_eq!(node.to_string(), "a*+");
        assert_eq!(
            sym('a').apply(Postfix::Star).apply(Postfix::Optional).to_string(),
            "a*?"
        );
    }

    #[test]
    fn postfix_dominance() {
        use Postfix::*;
        assert_eq!(Star.then(Plus), Star);
        assert_eq!(Plus.then(Optional), Star);
        assert_eq!(Optional.then(Plus), Star);
        assert_eq!(Plus.then(Plus), Plus);
        assert_eq!(Optional.then(Optional), Optional);
    }
}
