use crate::{
    automaton::{Automaton, Label, Symbol},
    math,
};
use tracing::{debug, trace};

/// The alphabet `a`, `b`, ... with `symbols` letters. At most 26 letters are produced.
pub fn alphabet_of_size(symbols: usize) -> Vec<Symbol> {
    ('a'..='z').take(symbols).map(String::from).collect()
}

fn state_name(index: usize) -> String {
    format!("q{index}")
}

/// Uses a sprout-like algorithm to generate a random complete DFA. `symbols` determines the
/// number of distinct symbols. `probability` determines the probability of a back edge to
/// some state being inserted. The algorithm is as follows:
/// 1. Start with a single state.
/// 2. For each symbol, go through the existing states in order and with probability
///    `probability` add an edge to that state.
/// 3. If no edge to an existing state was added, an edge to a new state is inserted.
/// 4. Repeat until all states and symbols have been treated.
///
/// Every state is accepting with probability one half.
pub fn generate_random_dfa(symbols: usize, probability: f64) -> Automaton {
    let alphabet = alphabet_of_size(symbols);
    let mut dfa = Automaton::for_alphabet(alphabet.iter().cloned());
    dfa.add_state(state_name(0));

    let mut current = 0;
    let mut symbol_position = 0;
    'outer: loop {
        if current >= dfa.size() {
            // all states have been treated
            break 'outer;
        }
        if symbol_position >= alphabet.len() {
            symbol_position = 0;
            current += 1;
            continue 'outer;
        }
        let symbol = Label::Symbol(alphabet[symbol_position].clone());
        symbol_position += 1;

        for target in 0..=current {
            if fastrand::f64() < probability {
                dfa.add_transition(state_name(current), symbol, state_name(target));
                continue 'outer;
            }
        }
        // no target was found so we create it
        let target = dfa.size();
        dfa.add_transition(state_name(current), symbol, state_name(target));
    }

    for q in 0..dfa.size() {
        if fastrand::bool() {
            dfa.add_accepting(state_name(q));
        }
    }
    trace!("generated random DFA {}", dfa.summary());
    dfa
}

/// Generates a random complete DFA with `size` states by drawing the target of every
/// transition uniformly. Depending on the draw, some states may be unreachable.
pub fn generate_random_dfa_sized(symbols: usize, size: usize) -> Automaton {
    let alphabet = alphabet_of_size(symbols);
    let mut dfa = Automaton::for_alphabet(alphabet.iter().cloned());
    for q in 0..size {
        dfa.add_state(state_name(q));
    }
    for q in 0..size {
        for symbol in &alphabet {
            let target = fastrand::usize(..size);
            dfa.add_transition(
                state_name(q),
                Label::Symbol(symbol.clone()),
                state_name(target),
            );
        }
        if fastrand::bool() {
            dfa.add_accepting(state_name(q));
        }
    }
    dfa
}

/// Generates a random NFA with `size` states. Every possible transition over the
/// `symbols` letters is present with probability `density`, epsilon transitions between
/// distinct states with probability `density / 4`. `q0` is initial, every state is
/// accepting with probability 0.3 and the last state is always accepting.
pub fn generate_random_nfa(symbols: usize, size: usize, density: f64) -> Automaton {
    let alphabet = alphabet_of_size(symbols);
    let mut nfa = Automaton::for_alphabet(alphabet.iter().cloned());
    if size == 0 {
        return nfa;
    }
    for q in 0..size {
        nfa.add_state(state_name(q));
    }
    for p in 0..size {
        for q in 0..size {
            for symbol in &alphabet {
                if fastrand::f64() < density {
                    nfa.add_transition(
                        state_name(p),
                        Label::Symbol(symbol.clone()),
                        state_name(q),
                    );
                }
            }
            if p != q && fastrand::f64() < density / 4.0 {
                nfa.add_transition(state_name(p), Label::Epsilon, state_name(q));
            }
        }
        if p + 1 == size || fastrand::f64() < 0.3 {
            nfa.add_accepting(state_name(p));
        }
    }
    debug!("generated random NFA {}", nfa.summary());
    nfa
}

/// Generate a random word over `alphabet` whose length is drawn uniformly from the range
/// `min_len..=max_len`.
pub fn generate_random_word(alphabet: &[Symbol], min_len: usize, max_len: usize) -> Vec<Symbol> {
    assert!(min_len <= max_len);
    if alphabet.is_empty() {
        return Vec::new();
    }
    let len = fastrand::usize(min_len..=max_len);
    (0..len)
        .map(|_| alphabet[fastrand::usize(..alphabet.len())].clone())
        .collect()
}

/// Generate a set of at most `number` distinct random words as in [`generate_random_word`].
/// Fewer words are returned if the range does not admit that many distinct words.
pub fn generate_random_words(
    alphabet: &[Symbol],
    min_len: usize,
    max_len: usize,
    number: usize,
) -> math::Set<Vec<Symbol>> {
    let mut word_set = math::Set::with_capacity_and_hasher(number, Default::default());
    let mut attempts = 0;
    while word_set.len() < number && attempts < 16 * number {
        word_set.insert(generate_random_word(alphabet, min_len, max_len));
        attempts += 1;
    }
    word_set
}

/// All words over `alphabet` of length at most `max_len`, shortest first.
pub fn words_up_to(alphabet: &[Symbol], max_len: usize) -> Vec<Vec<Symbol>> {
    let mut words = vec![vec![]];
    let mut layer: Vec<Vec<Symbol>> = vec![vec![]];
    for _ in 0..max_len {
        layer = layer
            .iter()
            .flat_map(|word| {
                alphabet.iter().map(move |symbol| {
                    let mut longer = word.clone();
                    longer.push(symbol.clone());
                    longer
                })
            })
            .collect();
        words.extend(layer.iter().cloned());
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    fn agree_on_short_words(left: &Automaton, right: &Automaton, alphabet: &[Symbol]) {
        for word in words_up_to(alphabet, 5) {
            assert_eq!(
                left.accepts(&word),
                right.accepts(&word),
                "automata disagree on {word:?}"
            );
        }
    }

    #[test]
    fn generators() {
        fastrand::seed(3);
        let dfa = generate_random_dfa(2, 0.5);
        assert!(dfa.is_deterministic());
        assert!(dfa.is_complete());
        assert!(dfa.is_connected());

        let sized = generate_random_dfa_sized(3, 6);
        assert_eq!(sized.size(), 6);
        assert!(sized.is_complete());

        let nfa = generate_random_nfa(2, 4, 0.4);
        assert_eq!(nfa.size(), 4);
        assert!(nfa.is_accepting("q3"));

        let alphabet = alphabet_of_size(2);
        assert_eq!(words_up_to(&alphabet, 3).len(), 15);
        let words = generate_random_words(&alphabet, 1, 10, 20);
        assert_eq!(words.len(), 20);
        assert_eq!(generate_random_words(&alphabet, 1, 1, 5).len(), 2);
    }

    #[test_log::test]
    fn cleanup_preserves_language() {
        fastrand::seed(11);
        let alphabet = alphabet_of_size(2);
        for _ in 0..25 {
            let nfa = generate_random_nfa(2, 5, 0.3);
            agree_on_short_words(&nfa, &nfa.trim(), &alphabet);
            agree_on_short_words(&nfa, &nfa.remove_epsilon(), &alphabet);
            agree_on_short_words(&nfa, &nfa.remove_unreachable(), &alphabet);
        }
    }

    #[test_log::test]
    fn subset_construction_and_minimization() {
        fastrand::seed(5);
        let alphabet = alphabet_of_size(2);
        for _ in 0..25 {
            let nfa = generate_random_nfa(2, 5, 0.3);
            let dfa = determinize(&nfa);
            assert!(dfa.is_deterministic());
            agree_on_short_words(&nfa, &dfa, &alphabet);

            let minimal = minimize_dfa(&dfa).unwrap();
            assert!(minimal.size() <= dfa.size());
            agree_on_short_words(&nfa, &minimal, &alphabet);
            assert_eq!(minimize_dfa(&minimal).unwrap().size(), minimal.size());
            assert!(are_equivalent(&nfa, &minimal));
        }
    }

    #[test]
    fn minimal_dfas_of_equivalent_automata_have_equal_size() {
        fastrand::seed(9);
        for _ in 0..25 {
            let dfa = generate_random_dfa(2, 0.4);
            let minimal = minimize_dfa(&dfa).unwrap();
            let detour = minimize_dfa(&determinize(&dfa.reversed().reversed())).unwrap();
            assert!(are_equivalent(&dfa, &detour));
            assert_eq!(minimal.trim().size(), detour.trim().size());
        }
    }

    #[test]
    fn complement_flips_membership() {
        fastrand::seed(13);
        let alphabet = alphabet_of_size(2);
        for _ in 0..10 {
            let dfa = generate_random_dfa_sized(2, 5);
            let complemented = complement(&dfa).unwrap();
            for word in words_up_to(&alphabet, 4) {
                assert_ne!(dfa.accepts(&word), complemented.accepts(&word));
            }
        }
    }

    #[test_log::test]
    fn regex_round_trip() {
        fastrand::seed(17);
        for _ in 0..10 {
            let nfa = generate_random_nfa(2, 4, 0.3);
            let conversion = fsa_to_regex(&nfa, &RegexConfig::new());
            assert!(conversion.verification.is_trusted());
            assert!(are_equivalent(&nfa, &regex_to_fsa(&conversion.regex).unwrap()));
        }
    }
}
