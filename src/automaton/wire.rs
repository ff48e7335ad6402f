use serde::{Deserialize, Serialize};

use crate::{error::AutomatonError, math::OrderedMap};

use super::{Automaton, Label, State, Symbol};

/// The shape in which automata travel over the wire. All fields are optional so that a
/// missing field can be reported as [`AutomatonError::MissingField`] instead of as an
/// opaque deserialization failure.
///
/// Transitions map a state to a map from symbol to the list of targets, where the empty
/// string is the key for epsilon transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs)]
pub struct RawAutomaton {
    pub states: Option<Vec<State>>,
    pub alphabet: Option<Vec<Symbol>>,
    pub transitions: Option<OrderedMap<State, OrderedMap<String, Vec<State>>>>,
    pub starting_state: Option<State>,
    pub accepting_states: Option<Vec<State>>,
}

impl TryFrom<RawAutomaton> for Automaton {
    type Error = AutomatonError;

    fn try_from(raw: RawAutomaton) -> Result<Self, Self::Error> {
        let states = raw.states.ok_or(AutomatonError::MissingField("states"))?;
        let alphabet = raw
            .alphabet
            .ok_or(AutomatonError::MissingField("alphabet"))?;
        let transitions = raw
            .transitions
            .ok_or(AutomatonError::MissingField("transitions"))?;
        let initial = raw
            .starting_state
            .ok_or(AutomatonError::MissingField("startingState"))?;
        let accepting = raw
            .accepting_states
            .ok_or(AutomatonError::MissingField("acceptingStates"))?;

        let mut builder = Automaton::builder()
            .with_states(states.iter().cloned())
            .with_alphabet(alphabet)
            .with_accepting(accepting)
            .with_transitions(transitions.into_iter().flat_map(|(source, by_symbol)| {
                by_symbol.into_iter().flat_map(move |(symbol, targets)| {
                    let source = source.clone();
                    targets
                        .into_iter()
                        .map(move |target| (source.clone(), Label::new(symbol.clone()), target))
                })
            }));
        // the automaton without states carries an empty starting state on the wire
        if !(states.is_empty() && initial.is_empty()) {
            builder = builder.with_initial(initial);
        }
        builder.build()
    }
}

impl From<Automaton> for RawAutomaton {
    fn from(fsa: Automaton) -> Self {
        let mut transitions: OrderedMap<State, OrderedMap<String, Vec<State>>> =
            OrderedMap::default();
        for (source, label, target) in fsa.transitions() {
            transitions
                .entry(source.clone())
                .or_default()
                .entry(label.wire_key().to_string())
                .or_default()
                .push(target.clone());
        }
        RawAutomaton {
            states: Some(fsa.states().iter().cloned().collect()),
            alphabet: Some(fsa.alphabet().iter().cloned().collect()),
            transitions: Some(transitions),
            starting_state: Some(fsa.initial().cloned().unwrap_or_default()),
            accepting_states: Some(fsa.accepting_states().iter().cloned().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{math::OrderedMap, prelude::*};

    const PAYLOAD: &str = r#"{
        "states": ["S0", "S1", "S2"],
        "alphabet": ["a", "b"],
        "transitions": {
            "S0": {"a": ["S0", "S1"], "b": ["S0"]},
            "S1": {"b": ["S2"], "": ["S0"]}
        },
        "startingState": "S0",
        "acceptingStates": ["S2"]
    }"#;

    #[test]
    fn deserializes_wire_payload() {
        let fsa: Automaton = serde_json::from_str(PAYLOAD).unwrap();
        assert_eq!(fsa.size(), 3);
        assert!(fsa.has_epsilon_transitions());
        assert!(fsa.accepts(["a", "b"]));
        assert!(!fsa.accepts(["b"]));

        let json = serde_json::to_string(&fsa).unwrap();
        let back: Automaton = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fsa);
    }

    #[test]
    fn missing_fields_are_reported() {
        let raw: RawAutomaton =
            serde_json::from_str(r#"{"states": ["q"], "alphabet": [], "transitions": {}}"#)
                .unwrap();
        assert_eq!(
            Automaton::try_from(raw),
            Err(AutomatonError::MissingField("startingState"))
        );

        let err = serde_json::from_str::<Automaton>(r#"{"states": []}"#).unwrap_err();
        assert!(err.to_string().contains("alphabet"));
    }

    #[test]
    fn empty_automaton_on_the_wire() {
        let raw = RawAutomaton::from(Automaton::empty());
        assert_eq!(raw.starting_state.as_deref(), Some(""));
        assert_eq!(Automaton::try_from(raw), Ok(Automaton::empty()));
    }

    #[test]
    fn invalid_target_is_rejected() {
        let raw = RawAutomaton {
            states: Some(vec!["q".into()]),
            alphabet: Some(vec!["a".into()]),
            transitions: Some(OrderedMap::from([(
                "q".to_string(),
                OrderedMap::from([("a".to_string(), vec!["x".to_string()])]),
            )])),
            starting_state: Some("q".into()),
            accepting_states: Some(vec![]),
        };
        let err = Automaton::try_from(raw).unwrap_err();
        assert!(err.is_client_error());
        assert!(matches!(err, AutomatonError::UnknownTransitionTarget { .. }));
    }
}
