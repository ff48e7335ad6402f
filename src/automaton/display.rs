use std::fmt;

use itertools::Itertools;
use owo_colors::OwoColorize;

use super::{Automaton, Label, State};

impl Automaton {
    fn labels_for_table(&self) -> Vec<Label> {
        let mut labels: Vec<Label> = self
            .alphabet
            .iter()
            .map(|sym| Label::Symbol(sym.clone()))
            .collect();
        if self.has_epsilon_transitions() {
            labels.push(Label::Epsilon);
        }
        labels
    }

    /// Returns a string representation of the transition table. The decorator is applied
    /// to the name of each state in the first column.
    pub fn build_transition_table<SD>(&self, state_decorator: SD) -> String
    where
        SD: Fn(&State) -> String,
    {
        let labels = self.labels_for_table();
        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("State".to_string()).chain(labels.iter().map(|l| l.to_string())),
        );
        for q in &self.states {
            let mut row = vec![state_decorator(q)];
            for label in &labels {
                row.push(match self.targets(q, label) {
                    Some(targets) if targets.len() == 1 => targets.iter().join(""),
                    Some(targets) => format!("{{{}}}", targets.iter().join(", ")),
                    None => "-".to_string(),
                });
            }
            builder.push_record(row);
        }
        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }

    fn plain_state_marker(&self, q: &State) -> String {
        let arrow = if self.initial() == Some(q) { "→ " } else { "" };
        let star = if self.is_accepting(q) { " *" } else { "" };
        format!("{arrow}{q}{star}")
    }

    /// Renders the transition table with the initial state in bold and accepting states
    /// in green, for display on a terminal.
    pub fn show_colored(&self) -> String {
        self.build_transition_table(|q| {
            let name = self.plain_state_marker(q);
            match (self.initial() == Some(q), self.is_accepting(q)) {
                (true, true) => name.bold().green().to_string(),
                (true, false) => name.bold().to_string(),
                (false, true) => name.green().to_string(),
                (false, false) => name,
            }
        })
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.build_transition_table(|q| self.plain_state_marker(q))
        )
    }
}
