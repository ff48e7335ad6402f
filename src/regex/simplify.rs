use std::ops::Range;

use itertools::Itertools;
use tracing::{debug, trace};

use super::ast::{Node, Postfix};

/// Rewrites `node` bottom-up with the algebraic identities below until nothing changes
/// any more or `max_iterations` rounds have been made.
///
/// - `()` is `ε`, `εR = R`, `∅R = ∅`.
/// - `RR* = R*R = R+` and more generally `R(SR)*S = (RS)+`, `R*R* = R*`.
/// - unions are flattened and deduplicated, `R|ε = R?` unless `R` already matches the
///   empty word, `R|YR = Y?R` and `R|RY = RY?`. `∅` is kept inside unions.
/// - stacked postfix operators collapse, a star dominates plus which dominates optional.
pub fn simplify_ast(node: &Node, max_iterations: usize) -> Node {
    let mut current = node.clone();
    for iteration in 0..max_iterations {
        let next = rewrite(&current);
        if next == current {
            debug!("regex simplification reached a fixpoint after {iteration} rounds");
            return current;
        }
        trace!("round {iteration}: `{current}` -> `{next}`");
        current = next;
    }
    debug!("regex simplification stopped after {max_iterations} rounds");
    current
}

fn rewrite(node: &Node) -> Node {
    match node {
        Node::Symbol(_) | Node::Epsilon | Node::Empty => node.clone(),
        Node::EmptyGroup => Node::Epsilon,
        Node::Union(items) => union(items.iter().map(rewrite)),
        Node::Concat(items) => concat(items.iter().map(rewrite)),
        Node::Star(inner) => star(rewrite(inner)),
        Node::Plus(inner) => plus(rewrite(inner)),
        Node::Optional(inner) => optional(rewrite(inner)),
        Node::MultiOp(inner, operators) => {
            let inner = rewrite(inner);
            match operators.iter().copied().reduce(Postfix::then) {
                Some(operator) => postfix(inner, operator),
                None => inner,
            }
        }
    }
}

fn postfix(inner: Node, operator: Postfix) -> Node {
    match operator {
        Postfix::Star => star(inner),
        Postfix::Plus => plus(inner),
        Postfix::Optional => optional(inner),
    }
}

fn star(inner: Node) -> Node {
    match inner {
        Node::Star(x) | Node::Plus(x) | Node::Optional(x) => star(*x),
        Node::Epsilon | Node::Empty | Node::EmptyGroup => Node::Epsilon,
        Node::Union(items) if items.contains(&Node::Epsilon) => {
            star(Node::union(items.into_iter().filter(|i| *i != Node::Epsilon)))
        }
        other => Node::Star(Box::new(other)),
    }
}

fn plus(inner: Node) -> Node {
    match inner {
        Node::Star(x) | Node::Optional(x) => star(*x),
        Node::Plus(x) => Node::Plus(x),
        Node::Epsilon | Node::EmptyGroup => Node::Epsilon,
        Node::Empty => Node::Empty,
        other => Node::Plus(Box::new(other)),
    }
}

fn optional(inner: Node) -> Node {
    match inner {
        Node::Star(x) | Node::Plus(x) => star(*x),
        Node::Optional(x) => Node::Optional(x),
        Node::Epsilon | Node::Empty | Node::EmptyGroup => Node::Epsilon,
        other => Node::Optional(Box::new(other)),
    }
}

fn matches_empty_word(node: &Node) -> bool {
    match node {
        Node::Epsilon | Node::EmptyGroup | Node::Star(_) | Node::Optional(_) => true,
        Node::Symbol(_) | Node::Empty => false,
        Node::Plus(inner) => matches_empty_word(inner),
        Node::Union(items) => items.iter().any(matches_empty_word),
        Node::Concat(items) => items.iter().all(matches_empty_word),
        Node::MultiOp(inner, operators) => {
            operators.iter().any(|op| *op != Postfix::Plus) || matches_empty_word(inner)
        }
    }
}

/// The factors of a concatenation, or the node itself.
fn factors(node: &Node) -> &[Node] {
    match node {
        Node::Concat(items) => items,
        other => std::slice::from_ref(other),
    }
}

fn flatten_concat(node: Node, into: &mut Vec<Node>) -> bool {
    match node {
        Node::Concat(items) => items.into_iter().all(|item| flatten_concat(item, into)),
        Node::Epsilon | Node::EmptyGroup => true,
        Node::Empty => false,
        other => {
            into.push(other);
            true
        }
    }
}

fn concat(items: impl IntoIterator<Item = Node>) -> Node {
    let mut flat = Vec::new();
    for item in items {
        if !flatten_concat(item, &mut flat) {
            return Node::Empty;
        }
    }
    flat.dedup_by(|later, earlier| later == earlier && matches!(earlier, Node::Star(_)));
    while let Some((range, repeated)) = repeated_block(&flat) {
        let tail = flat.split_off(range.end);
        flat.truncate(range.start);
        flat.push(repeated);
        flat.extend(tail);
    }
    Node::concat(flat)
}

/// Finds factors `R (S R)* S`, which together are `(R S)+`. Either `R` or `S` may be
/// empty, which covers `R R*` and `S* S`.
fn repeated_block(items: &[Node]) -> Option<(Range<usize>, Node)> {
    for (i, item) in items.iter().enumerate() {
        let Node::Star(inner) = item else {
            continue;
        };
        let block = factors(inner);
        if block.is_empty() {
            continue;
        }
        for split in 0..=block.len() {
            let (s, r) = block.split_at(split);
            if i < r.len() || i + 1 + s.len() > items.len() {
                continue;
            }
            let (start, end) = (i - r.len(), i + 1 + s.len());
            if items[start..i] == *r && items[i + 1..end] == *s {
                let body = Node::concat(r.iter().chain(s).cloned());
                return Some((start..end, Node::Plus(Box::new(body))));
            }
        }
    }
    None
}

fn flatten_union(node: Node, into: &mut Vec<Node>) {
    match node {
        Node::Union(items) => items.into_iter().for_each(|item| flatten_union(item, into)),
        Node::EmptyGroup => into.push(Node::Epsilon),
        other => into.push(other),
    }
}

fn union(items: impl IntoIterator<Item = Node>) -> Node {
    let mut flat = Vec::new();
    for item in items {
        flatten_union(item, &mut flat);
    }
    let mut flat = flat.into_iter().unique().collect_vec();

    if flat.len() > 1 && flat.contains(&Node::Epsilon) {
        flat.retain(|item| *item != Node::Epsilon);
        if !flat.iter().any(matches_empty_word) {
            let rest = std::mem::take(&mut flat);
            flat.push(optional(Node::union(rest)));
        }
    }

    while let Some((keep, drop, factored)) = common_factor(&flat) {
        flat[keep] = factored;
        flat.remove(drop);
    }
    Node::union(flat)
}

/// Finds two alternatives `R` and `YR` (or `R` and `RY`) and returns their indices
/// together with the merged alternative `Y?R` (or `RY?`).
fn common_factor(items: &[Node]) -> Option<(usize, usize, Node)> {
    for (i, j) in (0..items.len()).tuple_combinations() {
        for (short, long) in [(i, j), (j, i)] {
            let (a, b) = (factors(&items[short]), factors(&items[long]));
            if b.len() <= a.len() {
                continue;
            }
            let rest = b.len() - a.len();
            let factored = if b.ends_with(a) {
                let y = optional(Node::concat(b[..rest].iter().cloned()));
                concat(std::iter::once(y).chain(a.iter().cloned()))
            } else if b.starts_with(a) {
                let y = optional(Node::concat(b[a.len()..].iter().cloned()));
                concat(a.iter().cloned().chain(std::iter::once(y)))
            } else {
                continue;
            };
            return Some((i, j, factored));
        }
    }
    None
}

fn is_literal(c: char) -> bool {
    !matches!(c, '(' | ')' | '|' | '*' | '+' | '?')
}

/// Applies purely textual rewrites until the text no longer changes or `max_iterations`
/// passes have been made: stacked postfix operators are merged, repeated `ε` collapse
/// and parentheses around a single literal are dropped.
pub fn simplify_text(regex: &str, max_iterations: usize) -> String {
    let mut current = regex.chars().collect_vec();
    for _ in 0..max_iterations {
        let next = rewrite_text(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current.into_iter().collect()
}

fn rewrite_text(chars: &[char]) -> Vec<char> {
    let mut out: Vec<char> = Vec::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let stacked = out
            .last()
            .copied()
            .and_then(Postfix::from_char)
            .zip(Postfix::from_char(c));
        if let (Some((first, second)), Some(last)) = (stacked, out.last_mut()) {
            *last = first.then(second).as_char();
            i += 1;
            continue;
        }
        if c == 'ε' && out.last() == Some(&'ε') {
            i += 1;
            continue;
        }
        if c == '(' && chars.get(i + 2) == Some(&')') {
            if let Some(&inner) = chars.get(i + 1).filter(|inner| is_literal(**inner)) {
                out.push(inner);
                i += 3;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}
