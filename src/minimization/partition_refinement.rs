use std::collections::{BTreeSet, VecDeque};

use itertools::Itertools;
use tracing::trace;

use crate::{
    automaton::{Automaton, Label, State},
    error::AutomatonError,
    math::{OrderedSet, Partition, Set},
};

/// Computes the minimal DFA accepting the same language as `fsa`.
///
/// Unreachable states are removed first. States are then grouped into the coarsest
/// partition that respects acceptance and transitions, and every class becomes one
/// state. A class with a single member keeps the member's name, larger classes are named
/// by their sorted members. If `fsa` is partial, so is the result: missing transitions
/// are treated as leading into an implicit dead state, and the class of that dead state
/// is not part of the output.
///
/// Fails if `fsa` is not deterministic.
///
/// # Example
/// ```
/// use fsa_algebra::prelude::*;
///
/// let dfa = Automaton::builder()
///     .with_transitions([("0", "a", "1"), ("1", "a", "2"), ("2", "a", "1")])
///     .with_initial("0")
///     .with_accepting(["1", "2"])
///     .build()
///     .unwrap();
/// assert_eq!(minimize_dfa(&dfa).unwrap().size(), 2);
/// ```
pub fn minimize_dfa(fsa: &Automaton) -> Result<Automaton, AutomatonError> {
    fsa.ensure_deterministic("DFA minimisation")?;
    Ok(refine(&fsa.remove_unreachable()))
}

/// Partition refinement on an automaton that is known to be deterministic and to have
/// no unreachable states.
pub(crate) fn refine(dfa: &Automaton) -> Automaton {
    if dfa.size() <= 1 {
        return dfa.clone();
    }

    let symbols = dfa
        .alphabet()
        .iter()
        .map(|sym| Label::Symbol(sym.clone()))
        .collect_vec();
    let n = dfa.size();
    let partial = !dfa.is_complete();
    // the implicit dead state gets the index after all real states
    let sink = n;
    let universe = if partial { n + 1 } else { n };

    let index_of = |q: &State| dfa.states().get_index_of(q);
    let mut delta = vec![vec![sink; symbols.len()]; universe];
    for (i, q) in dfa.states().iter().enumerate() {
        for (s, label) in symbols.iter().enumerate() {
            if let Some(target) = dfa
                .targets(q, label)
                .and_then(|targets| targets.first())
                .and_then(index_of)
            {
                delta[i][s] = target;
            }
        }
    }

    // inverse[target][symbol] holds all states that reach target on symbol
    let mut inverse = vec![vec![Vec::new(); symbols.len()]; universe];
    for (source, row) in delta.iter().enumerate() {
        for (s, &target) in row.iter().enumerate() {
            inverse[target][s].push(source);
        }
    }

    let (accepting, rejecting): (Vec<usize>, Vec<usize>) =
        (0..universe).partition(|&i| i < n && dfa.is_accepting(&dfa.states()[i]));
    let mut partition = Partition::new([accepting, rejecting]);
    let mut class_of = vec![0; universe];
    for (c, class) in partition.iter().enumerate() {
        for &q in class {
            class_of[q] = c;
        }
    }

    let mut queued = vec![true; partition.size()];
    let mut worklist: VecDeque<usize> = (0..partition.size()).collect();

    while let Some(splitter_idx) = worklist.pop_front() {
        queued[splitter_idx] = false;
        let splitter = partition[splitter_idx].clone();
        for s in 0..symbols.len() {
            let involved: BTreeSet<usize> = splitter
                .iter()
                .flat_map(|&q| inverse[q][s].iter().copied())
                .collect();
            if involved.is_empty() {
                continue;
            }
            let affected: BTreeSet<usize> = involved.iter().map(|&q| class_of[q]).collect();
            for class in affected {
                let Some(appended) = partition.split(class, &involved) else {
                    continue;
                };
                for &q in &partition[appended] {
                    class_of[q] = appended;
                }
                queued.push(false);
                let requeue =
                    if queued[class] || partition[appended].len() < partition[class].len() {
                        appended
                    } else {
                        class
                    };
                if !queued[requeue] {
                    queued[requeue] = true;
                    worklist.push_back(requeue);
                }
            }
        }
    }
    trace!(
        "partition refinement found {} classes for {} states",
        partition.size(),
        n
    );

    let initial = dfa.initial().and_then(index_of).unwrap_or(0);
    collapse(
        dfa,
        &partition,
        &class_of,
        &delta,
        initial,
        partial.then_some(sink),
    )
}

/// Builds the quotient automaton whose states are the classes of `partition`.
fn collapse(
    dfa: &Automaton,
    partition: &Partition<usize>,
    class_of: &[usize],
    delta: &[Vec<usize>],
    initial: usize,
    sink: Option<usize>,
) -> Automaton {
    let dead_class = sink.map(|q| class_of[q]);
    let initial_class = class_of[initial];

    let mut names = vec![String::new(); partition.size()];
    let mut taken: Set<State> = Set::default();
    // the initial class comes first, the remaining ones by their smallest member
    let order = partition
        .iter()
        .enumerate()
        .filter(|(c, _)| Some(*c) != dead_class || *c == initial_class)
        .sorted_by_key(|(c, class)| (*c != initial_class, class.first().copied()))
        .map(|(c, _)| c)
        .collect_vec();

    let mut out = Automaton::for_alphabet(dfa.alphabet().iter().cloned());
    for &c in &order {
        let members: OrderedSet<&State> = partition[c]
            .iter()
            .filter(|&&q| Some(q) != sink)
            .map(|&q| &dfa.states()[q])
            .collect();
        let mut name = if members.len() == 1 {
            members.iter().join("")
        } else {
            format!("{{{}}}", members.iter().join(","))
        };
        while !taken.insert(name.clone()) {
            name.push('\'');
        }
        out.add_state(name.clone());
        if members.iter().any(|q| dfa.is_accepting(q)) {
            out.add_accepting(name.clone());
        }
        names[c] = name;
    }

    for &c in &order {
        let Some(&representative) = partition[c].iter().find(|&&q| Some(q) != sink) else {
            continue;
        };
        for (s, symbol) in dfa.alphabet().iter().enumerate() {
            let target = class_of[delta[representative][s]];
            if Some(target) == dead_class {
                continue;
            }
            out.add_transition(
                names[c].clone(),
                Label::Symbol(symbol.clone()),
                names[target].clone(),
            );
        }
    }
    out
}
