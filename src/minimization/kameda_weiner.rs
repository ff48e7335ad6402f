//! The Kameda–Weiner method searches for a small non-deterministic automaton by looking
//! at the state map of the input: rows are states of the determinized automaton, columns
//! are states of the determinized dual, and a cell is set iff the two underlying subsets
//! share a state. Every state of a candidate automaton is a maximal all-true rectangle
//! (a prime grid) of this matrix, and a candidate is obtained from every set of grids
//! that covers all true cells.
//!
//! Not every cover yields an automaton for the right language, so each candidate is
//! checked for equivalence before it is accepted.

use bit_set::BitSet;
use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    automaton::{Automaton, Label, State},
    determinization::{determinize_with_subsets, Determinized},
    equivalence::are_equivalent,
    math::{IndexedSet, OrderedSet},
};

use super::{Budget, MinimizationConfig};

/// A rectangle of the state map in which every cell is set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    /// Indices of the rows, i.e. of states of the determinized automaton.
    pub rows: BitSet,
    /// Indices of the columns, i.e. of states of the determinized dual.
    pub cols: BitSet,
}

impl Grid {
    fn is_dominated_by(&self, other: &Grid) -> bool {
        self != other && self.rows.is_subset(&other.rows) && self.cols.is_subset(&other.cols)
    }
}

/// The state map of an automaton together with the transition structure of its
/// determinization, which is all that is needed to synthesize candidates.
#[derive(Debug, Clone)]
pub struct StateMap {
    /// For every row, the set of columns whose cell is set.
    cells: Vec<BitSet>,
    columns: usize,
    /// `successors[row][symbol]` is the row reached in the determinized automaton.
    successors: Vec<Vec<Option<usize>>>,
    alphabet: Vec<State>,
}

impl StateMap {
    /// Builds the state map of `nfa`. Row 0 belongs to the initial state of the
    /// determinization and column 0 to the initial state of the determinized dual.
    pub fn new(nfa: &Automaton) -> Self {
        let Determinized {
            automaton: dfa,
            subsets: rows,
        } = determinize_with_subsets(nfa);
        let reversed = nfa.reversed();
        let synthetic_start = reversed.initial().cloned();
        let Determinized { subsets, .. } = determinize_with_subsets(&reversed);
        let cols: Vec<OrderedSet<State>> = subsets
            .into_iter()
            .map(|mut subset| {
                if let Some(start) = &synthetic_start {
                    subset.remove(start);
                }
                subset
            })
            .collect();

        let cells = rows
            .iter()
            .map(|row| {
                cols.iter()
                    .enumerate()
                    .filter(|(_, col)| !row.is_disjoint(col))
                    .map(|(j, _)| j)
                    .collect::<BitSet>()
            })
            .collect_vec();

        let alphabet = dfa.alphabet().iter().cloned().collect_vec();
        let successors = dfa
            .states()
            .iter()
            .map(|q| {
                alphabet
                    .iter()
                    .map(|sym| {
                        dfa.successor(q, sym)
                            .and_then(|target| dfa.states().get_index_of(target))
                    })
                    .collect_vec()
            })
            .collect_vec();

        Self {
            cells,
            columns: cols.len(),
            successors,
            alphabet,
        }
    }

    /// The number of rows.
    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    /// The number of columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Returns `true` if the cell in `row` and `col` is set.
    pub fn is_set(&self, row: usize, col: usize) -> bool {
        self.cells.get(row).is_some_and(|cells| cells.contains(col))
    }

    fn cell_id(&self, row: usize, col: usize) -> usize {
        row * self.columns + col
    }

    fn true_cells(&self) -> BitSet {
        self.cells
            .iter()
            .enumerate()
            .flat_map(|(i, cols)| cols.iter().map(move |j| (i, j)))
            .map(|(i, j)| self.cell_id(i, j))
            .collect()
    }

    fn covered_cells(&self, grid: &Grid) -> BitSet {
        grid.rows
            .iter()
            .flat_map(|i| grid.cols.iter().map(move |j| (i, j)))
            .map(|(i, j)| self.cell_id(i, j))
            .collect()
    }

    /// All rows whose set cells include every column of `cols`.
    fn rows_covering(&self, cols: &BitSet) -> BitSet {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, row)| cols.is_subset(row))
            .map(|(i, _)| i)
            .collect()
    }

    /// All columns that are set in every row of `rows`.
    fn columns_covering(&self, rows: &BitSet) -> BitSet {
        let mut cols: BitSet = (0..self.columns).collect();
        for i in rows {
            cols.intersect_with(&self.cells[i]);
        }
        cols
    }

    /// Enumerates prime grids. From every set cell a grid is grown once by first fixing
    /// the row and once by first fixing the column, both of which end in a maximal
    /// rectangle. Every set cell is contained in at least one of the returned grids.
    pub fn prime_grids(&self) -> Vec<Grid> {
        let mut found: IndexedSet<Grid> = IndexedSet::default();
        for (i, row) in self.cells.iter().enumerate() {
            for j in row {
                let cols = row.clone();
                let rows = self.rows_covering(&cols);
                found.insert(Grid { rows, cols });

                let rows = self.rows_covering(&BitSet::from_iter([j]));
                let cols = self.columns_covering(&rows);
                debug_assert!(rows.contains(i) && cols.contains(j));
                found.insert(Grid { rows, cols });
            }
        }
        found
            .iter()
            .filter(|g| !found.iter().any(|h| g.is_dominated_by(h)))
            .cloned()
            .collect()
    }

    /// Searches covers consisting of exactly `size` grids, or fewer if some grid
    /// already covers what several others would. At most `limit` covers are returned.
    pub fn covers(
        &self,
        grids: &[Grid],
        size: usize,
        limit: usize,
        budget: &Budget,
    ) -> Vec<Vec<usize>> {
        let coverage = grids.iter().map(|g| self.covered_cells(g)).collect_vec();
        let mut search = CoverSearch {
            coverage: &coverage,
            size,
            limit,
            budget,
            found: IndexedSet::default(),
        };
        search.run(self.true_cells(), &mut Vec::new());
        search.found.into_iter().collect()
    }

    /// Builds the automaton with one state per grid of `cover`.
    ///
    /// A grid is initial if it contains row 0 and accepting if it contains column 0. On a
    /// symbol, a grid moves to every grid of the cover that contains the successor of
    /// each of its rows, and has no transition if some row has no successor. If several
    /// grids are initial, an additional initial state combining their transitions is
    /// introduced.
    pub fn synthesize(&self, grids: &[Grid], cover: &[usize]) -> Automaton {
        let chosen = cover.iter().map(|&g| &grids[g]).collect_vec();
        let names = (0..chosen.len()).map(|k| format!("g{k}")).collect_vec();
        let initial = (0..chosen.len())
            .filter(|&k| chosen[k].rows.contains(0))
            .collect_vec();
        if initial.is_empty() {
            return Automaton::for_alphabet(self.alphabet.iter().cloned());
        }

        let mut out = Automaton::for_alphabet(self.alphabet.iter().cloned());
        let start = if let [single] = initial.as_slice() {
            names[*single].clone()
        } else {
            "g_start".to_string()
        };
        out.set_initial(start.clone());
        for (k, grid) in chosen.iter().enumerate() {
            out.add_state(names[k].clone());
            if grid.cols.contains(0) {
                out.add_accepting(names[k].clone());
            }
        }

        for (k, grid) in chosen.iter().enumerate() {
            for (s, symbol) in self.alphabet.iter().enumerate() {
                let Some(targets) = self.grid_successors(&chosen, grid, s) else {
                    continue;
                };
                for t in &targets {
                    out.add_transition(
                        names[k].clone(),
                        Label::Symbol(symbol.clone()),
                        names[t].clone(),
                    );
                }
            }
        }

        if initial.len() > 1 {
            if initial.iter().any(|&k| chosen[k].cols.contains(0)) {
                out.add_accepting(start.clone());
            }
            let mut inherited = Vec::new();
            for &k in &initial {
                for (source, label, target) in out.transitions() {
                    if *source == names[k] {
                        inherited.push((label.clone(), target.clone()));
                    }
                }
            }
            for (label, target) in inherited {
                out.add_transition(start.clone(), label, target);
            }
        }
        out
    }

    fn grid_successors(&self, chosen: &[&Grid], grid: &Grid, symbol: usize) -> Option<BitSet> {
        let mut targets: Option<BitSet> = None;
        for row in &grid.rows {
            let successor = self.successors[row][symbol]?;
            let containing: BitSet = chosen
                .iter()
                .enumerate()
                .filter(|(_, g)| g.rows.contains(successor))
                .map(|(k, _)| k)
                .collect();
            match targets.as_mut() {
                Some(targets) => targets.intersect_with(&containing),
                None => targets = Some(containing),
            }
        }
        targets.filter(|t| !t.is_empty())
    }
}

struct CoverSearch<'a> {
    coverage: &'a [BitSet],
    size: usize,
    limit: usize,
    budget: &'a Budget,
    found: IndexedSet<Vec<usize>>,
}

impl CoverSearch<'_> {
    fn run(&mut self, uncovered: BitSet, chosen: &mut Vec<usize>) {
        if self.found.len() >= self.limit || self.budget.is_exhausted() {
            return;
        }
        let Some(cell) = uncovered.iter().next() else {
            self.found.insert(chosen.iter().copied().sorted().collect());
            return;
        };
        if chosen.len() >= self.size {
            return;
        }
        for (g, covered) in self.coverage.iter().enumerate() {
            if !covered.contains(cell) || chosen.contains(&g) {
                continue;
            }
            let mut rest = uncovered.clone();
            rest.difference_with(covered);
            chosen.push(g);
            self.run(rest, chosen);
            chosen.pop();
        }
    }
}

/// Result of a [`kameda_weiner`] run, with the figures that explain what was searched.
#[derive(Debug, Clone, Default)]
pub struct KamedaWeinerOutcome {
    /// The smallest verified automaton that is strictly smaller than the input, if any.
    pub automaton: Option<Automaton>,
    /// Number of rows of the state map.
    pub rows: usize,
    /// Number of columns of the state map.
    pub columns: usize,
    /// Number of prime grids.
    pub prime_grids: usize,
    /// Size of the covers from which the result was synthesized.
    pub cover_size: Option<usize>,
    /// Number of candidate automata that were synthesized and checked.
    pub covers_tried: usize,
    /// Whether the search was cut short because the budget ran out.
    pub exhausted: bool,
}

impl KamedaWeinerOutcome {
    /// Summarizes the search in one line.
    pub fn describe(&self) -> String {
        let found = match (&self.automaton, self.cover_size) {
            (Some(fsa), Some(size)) => {
                format!("{} states from a cover of size {size}", fsa.size())
            }
            _ => "no smaller automaton".to_string(),
        };
        format!(
            "{}x{} state map, {} prime grids, {} covers tried, {found}{}",
            self.rows,
            self.columns,
            self.prime_grids,
            self.covers_tried,
            if self.exhausted { " (budget exhausted)" } else { "" }
        )
    }
}

/// Looks for an automaton with fewer states than `nfa` that accepts the same language.
///
/// Cover sizes are searched in increasing order, starting at one and ending below the
/// size of `nfa` (or at [`MinimizationConfig::max_cover_size`]). For each size at most
/// [`MinimizationConfig::max_covers`] covers are synthesized, trimmed and verified. The
/// search stops at the first size which yields a verified candidate. The budget is
/// consulted between sizes and during the cover search.
pub fn kameda_weiner(nfa: &Automaton, config: &MinimizationConfig) -> KamedaWeinerOutcome {
    let mut outcome = KamedaWeinerOutcome::default();
    if nfa.size() <= 1 {
        return outcome;
    }

    let map = StateMap::new(nfa);
    let grids = map.prime_grids();
    outcome.rows = map.rows();
    outcome.columns = map.columns();
    outcome.prime_grids = grids.len();
    debug!(
        "Kameda–Weiner on {} states: {}x{} state map with {} prime grids",
        nfa.size(),
        map.rows(),
        map.columns(),
        grids.len()
    );
    if grids.is_empty() {
        return outcome;
    }

    let mut best = nfa.size();
    let largest = config
        .max_cover_size
        .unwrap_or(map.rows())
        .min(best - 1)
        .min(grids.len());
    for size in 1..=largest {
        if size >= best {
            break;
        }
        if config.budget.is_exhausted() {
            outcome.exhausted = true;
            break;
        }
        let covers = map.covers(&grids, size, config.max_covers, &config.budget);
        trace!("found {} covers of size {size}", covers.len());
        for cover in covers {
            outcome.covers_tried += 1;
            let candidate = map.synthesize(&grids, &cover).trim();
            if candidate.size() >= best || !are_equivalent(&candidate, nfa) {
                trace!("cover {cover:?} does not yield a smaller equivalent automaton");
                continue;
            }
            best = candidate.size();
            outcome.automaton = Some(candidate);
            outcome.cover_size = Some(size);
        }
        if outcome.automaton.is_some() {
            break;
        }
    }
    if config.budget.is_exhausted() {
        outcome.exhausted = true;
    }
    debug!("Kameda–Weiner: {}", outcome.describe());
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    /// Words over {a, b} whose third symbol from the end is `a`. The minimal DFA needs
    /// eight states, the NFA four.
    fn third_from_end() -> Automaton {
        Automaton::builder()
            .with_transitions([
                ("0", "a", "0"),
                ("0", "b", "0"),
                ("0", "a", "1"),
                ("1", "a", "2"),
                ("1", "b", "2"),
                ("2", "a", "3"),
                ("2", "b", "3"),
            ])
            .with_initial("0")
            .with_accepting(["3"])
            .build()
            .unwrap()
    }

    #[test]
    fn state_map_geometry() {
        let nfa = third_from_end();
        let map = StateMap::new(&nfa);
        assert_eq!(map.rows(), determinize(&nfa).size());
        // row 0 is {0}, column 0 is {3}
        assert!(!map.is_set(0, 0));
        let grids = map.prime_grids();
        assert!(!grids.is_empty());
        for grid in &grids {
            for i in &grid.rows {
                for j in &grid.cols {
                    assert!(map.is_set(i, j));
                }
            }
        }
        for (i, j) in (0..map.rows()).cartesian_product(0..map.columns()) {
            if map.is_set(i, j) {
                assert!(grids
                    .iter()
                    .any(|g| g.rows.contains(i) && g.cols.contains(j)));
            }
        }
    }

    #[test_log::test]
    fn shrinks_redundant_nfa() {
        // two copies of a*b glued to the same initial state
        let nfa = Automaton::builder()
            .with_transitions([
                ("s", "a", "p"),
                ("s", "a", "q"),
                ("s", "b", "f"),
                ("p", "a", "p"),
                ("q", "a", "q"),
                ("p", "b", "f"),
                ("q", "b", "g"),
            ])
            .with_initial("s")
            .with_accepting(["f", "g"])
            .build()
            .unwrap();
        let outcome = kameda_weiner(&nfa, &MinimizationConfig::default());
        assert!(outcome.describe().contains("prime grids"));
        let smaller = outcome.automaton.expect("a smaller automaton exists");
        assert!(smaller.size() < nfa.size());
        assert!(are_equivalent(&smaller, &nfa));
    }

    #[test]
    fn never_beats_the_nfa_when_it_is_minimal() {
        let nfa = third_from_end();
        let outcome = kameda_weiner(&nfa, &MinimizationConfig::default());
        if let Some(fsa) = outcome.automaton {
            assert!(fsa.size() < nfa.size());
            assert!(are_equivalent(&fsa, &nfa));
        }
    }

    #[test]
    fn respects_exhausted_budget() {
        let config = MinimizationConfig::default()
            .with_budget(Budget::unlimited().with_timeout(std::time::Duration::ZERO));
        let outcome = kameda_weiner(&third_from_end(), &config);
        assert!(outcome.automaton.is_none());
        assert!(outcome.exhausted);
    }
}
