//! Conversions between automata and regular expressions.
//!
//! Regular expressions are flat strings over literal characters, `|`, the postfix
//! operators `*`, `+` and `?`, parentheses, `ε` for the empty word and `∅` for the empty
//! language. [`regex_to_fsa`] builds an automaton by Thompson's construction and
//! [`fsa_to_regex`] goes the other way by state elimination. Any regex that is produced
//! by simplification is converted back and compared against the language it should
//! denote before it is handed out, see [`Verification`].
use std::fmt;

use tracing::{debug, warn};

use crate::{
    automaton::Automaton,
    equivalence::are_equivalent,
    error::RegexSyntaxError,
    minimization::{minimize_nfa, MinimizationConfig},
};

pub mod ast;
mod elimination;
mod parser;
mod simplify;
mod thompson;

pub use elimination::eliminate_states;
pub use parser::parse;
pub use simplify::{simplify_ast, simplify_text};
pub use thompson::regex_to_fsa;

/// Tunables of the regex simplifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplifyConfig {
    /// Upper bound on the rounds of the rewriting loops.
    pub max_iterations: usize,
    /// Whether the textual rewrites run before the syntax tree is simplified.
    pub textual_pass: bool,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        Self {
            max_iterations: 32,
            textual_pass: true,
        }
    }
}

/// Tunables of [`fsa_to_regex`].
#[derive(Debug, Clone)]
pub struct RegexConfig {
    /// How the eliminated regex is simplified.
    pub simplify: SimplifyConfig,
    /// Whether the automaton is minimized before its states are eliminated. Fewer states
    /// usually give a shorter expression.
    pub minimize_first: bool,
    /// Used when `minimize_first` is set.
    pub minimization: MinimizationConfig,
}

impl Default for RegexConfig {
    fn default() -> Self {
        Self {
            simplify: SimplifyConfig::default(),
            minimize_first: true,
            minimization: MinimizationConfig::default(),
        }
    }
}

impl RegexConfig {
    /// The default configuration, which minimizes first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the automaton is minimized before elimination.
    pub fn with_minimize_first(mut self, minimize_first: bool) -> Self {
        self.minimize_first = minimize_first;
        self
    }
}

/// Which of the candidate expressions was returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimplificationStrategy {
    /// Textual rewrites followed by simplification of the syntax tree.
    AstSimplified,
    /// Only the textual rewrites.
    TextualOnly,
    /// The expression as it was produced, without any simplification.
    Unsimplified,
}

impl fmt::Display for SimplificationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimplificationStrategy::AstSimplified => write!(f, "ast"),
            SimplificationStrategy::TextualOnly => write!(f, "textual"),
            SimplificationStrategy::Unsimplified => write!(f, "unsimplified"),
        }
    }
}

/// The outcome of checking a simplified expression against the language it should
/// denote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The most simplified candidate denotes the expected language.
    Verified,
    /// The most simplified candidate was rejected, a less simplified one was verified.
    Fallback {
        /// Why the more simplified candidates were rejected.
        reason: String,
    },
    /// Not even the unsimplified expression could be verified. It is returned anyway.
    BothFailed {
        /// Why the last candidate was rejected.
        reason: String,
    },
}

impl Verification {
    /// Returns `true` unless every candidate failed.
    pub fn is_trusted(&self) -> bool {
        !matches!(self, Verification::BothFailed { .. })
    }
}

/// A regular expression together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegexConversion {
    /// The expression.
    pub regex: String,
    /// The result of verifying it.
    pub verification: Verification,
    /// Which candidate it is.
    pub strategy: SimplificationStrategy,
}

fn verify(candidate: &str, reference: &Automaton) -> Result<(), String> {
    let fsa = regex_to_fsa(candidate).map_err(|e| format!("`{candidate}` does not parse: {e}"))?;
    if are_equivalent(&fsa, reference) {
        Ok(())
    } else {
        Err(format!("`{candidate}` denotes a different language"))
    }
}

/// Produces the simplified candidates for `raw`, most simplified first.
fn candidates(raw: &str, config: &SimplifyConfig) -> Vec<(SimplificationStrategy, String)> {
    let textual = if config.textual_pass {
        simplify_text(raw, config.max_iterations)
    } else {
        raw.to_string()
    };
    let mut out = Vec::with_capacity(3);
    match parse(&textual) {
        Ok(node) => out.push((
            SimplificationStrategy::AstSimplified,
            simplify_ast(&node, config.max_iterations).to_string(),
        )),
        Err(e) => debug!("skipping tree simplification of `{textual}`: {e}"),
    }
    if config.textual_pass {
        out.push((SimplificationStrategy::TextualOnly, textual));
    }
    out.push((SimplificationStrategy::Unsimplified, raw.to_string()));
    out
}

/// Returns the first candidate that denotes the language of `reference`. If none does,
/// the last candidate is returned flagged as [`Verification::BothFailed`].
fn select(
    candidates: Vec<(SimplificationStrategy, String)>,
    reference: &Automaton,
) -> RegexConversion {
    let mut rejected: Vec<String> = Vec::new();
    let mut last = None;
    for (strategy, regex) in candidates {
        match verify(&regex, reference) {
            Ok(()) => {
                let verification = if rejected.is_empty() {
                    Verification::Verified
                } else {
                    warn!("falling back to {strategy} regex `{regex}`");
                    Verification::Fallback {
                        reason: rejected.join("; "),
                    }
                };
                return RegexConversion {
                    regex,
                    verification,
                    strategy,
                };
            }
            Err(reason) => {
                debug!("{strategy} candidate rejected: {reason}");
                rejected.push(reason);
                last = Some((strategy, regex));
            }
        }
    }
    let (strategy, regex) = last.unwrap_or((SimplificationStrategy::Unsimplified, String::new()));
    warn!("no candidate regex could be verified, returning `{regex}`");
    RegexConversion {
        regex,
        verification: Verification::BothFailed {
            reason: rejected.pop().unwrap_or_default(),
        },
        strategy,
    }
}

/// Converts `fsa` into an equivalent regular expression.
///
/// The automaton is trimmed and, if configured, minimized. Its states are then
/// eliminated and the resulting expression simplified. Each candidate is checked
/// against `fsa` itself and the most simplified one that passes is returned.
///
/// # Example
/// ```
/// use fsa_algebra::prelude::*;
///
/// let fsa = Automaton::builder()
///     .with_transitions([("q", "a", "q")])
///     .with_initial("q")
///     .with_accepting(["q"])
///     .build()
///     .unwrap();
/// let conversion = fsa_to_regex(&fsa, &RegexConfig::new());
/// assert_eq!(conversion.verification, Verification::Verified);
/// assert!(regex_equivalent(&conversion.regex, "a*").unwrap());
/// ```
pub fn fsa_to_regex(fsa: &Automaton, config: &RegexConfig) -> RegexConversion {
    let mut source = fsa.trim();
    if config.minimize_first {
        source = minimize_nfa(&source, &config.minimization).automaton;
    }
    let raw = eliminate_states(&source);
    debug!("state elimination over {} yields `{raw}`", source.summary());
    select(candidates(&raw, &config.simplify), fsa)
}

/// Simplifies `regex`, guaranteeing that the result denotes the same language.
///
/// ```
/// use fsa_algebra::prelude::*;
///
/// let simplified = simplify_regex("aa*|ε", &SimplifyConfig::default()).unwrap();
/// assert_eq!(simplified.regex, "a*");
/// ```
pub fn simplify_regex(
    regex: &str,
    config: &SimplifyConfig,
) -> Result<RegexConversion, RegexSyntaxError> {
    let reference = regex_to_fsa(regex)?;
    Ok(select(candidates(regex, config), &reference))
}

/// Decides whether two regular expressions denote the same language.
pub fn regex_equivalent(left: &str, right: &str) -> Result<bool, RegexSyntaxError> {
    Ok(are_equivalent(&regex_to_fsa(left)?, &regex_to_fsa(right)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test_log::test]
    fn single_state_loop_becomes_star() {
        let fsa = Automaton::builder()
            .with_transitions([("q", "a", "q")])
            .with_initial("q")
            .with_accepting(["q"])
            .build()
            .unwrap();
        let conversion = fsa_to_regex(&fsa, &RegexConfig::new());
        assert_eq!(conversion.regex, "a*");
        assert_eq!(conversion.verification, Verification::Verified);
        assert_eq!(conversion.strategy, SimplificationStrategy::AstSimplified);
    }

    #[test_log::test]
    fn round_trips_preserve_language() {
        for regex in [
            "a",
            "a|b",
            "a*",
            "a+",
            "(a|b)*abb",
            "a?b",
            "(ab)*|(ba)*",
        ] {
            let fsa = regex_to_fsa(regex).unwrap();
            for config in [RegexConfig::new(), RegexConfig::new().with_minimize_first(false)] {
                let conversion = fsa_to_regex(&fsa, &config);
                assert!(conversion.verification.is_trusted(), "{regex}");
                assert!(
                    regex_equivalent(regex, &conversion.regex).unwrap(),
                    "`{regex}` came back as `{}`",
                    conversion.regex
                );
            }
        }
    }

    #[test]
    fn degenerate_automata() {
        let conversion = fsa_to_regex(&Automaton::empty(), &RegexConfig::new());
        assert_eq!(conversion.regex, "∅");
        assert!(conversion.verification.is_trusted());

        let epsilon = regex_to_fsa("ε").unwrap();
        let conversion = fsa_to_regex(&epsilon, &RegexConfig::new());
        assert!(regex_equivalent(&conversion.regex, "ε").unwrap());
    }

    #[test]
    fn simplifies_and_verifies() {
        let config = SimplifyConfig::default();
        let simplified = simplify_regex("a**|ε", &config).unwrap();
        assert_eq!(simplified.regex, "a*");
        assert_eq!(simplified.verification, Verification::Verified);

        let simplified = simplify_regex("ab(ab)*", &config).unwrap();
        assert_eq!(simplified.regex, "(ab)+");

        assert_eq!(
            simplify_regex("(a", &config),
            Err(RegexSyntaxError::UnbalancedParenthesis { position: 0 })
        );
    }

    #[test]
    fn textual_pass_can_be_disabled() {
        let config = SimplifyConfig {
            textual_pass: false,
            ..Default::default()
        };
        let found = candidates("(a)**", &config);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0], (SimplificationStrategy::AstSimplified, "a*".to_string()));
        assert_eq!(found[1].0, SimplificationStrategy::Unsimplified);
    }

    #[test_log::test]
    fn falls_back_when_verification_fails() {
        let reference = regex_to_fsa("a").unwrap();
        let conversion = select(
            vec![
                (SimplificationStrategy::AstSimplified, "b".into()),
                (SimplificationStrategy::TextualOnly, "(a".into()),
                (SimplificationStrategy::Unsimplified, "(a)".into()),
            ],
            &reference,
        );
        assert_eq!(conversion.regex, "(a)");
        assert_eq!(conversion.strategy, SimplificationStrategy::Unsimplified);
        assert!(matches!(conversion.verification, Verification::Fallback { .. }));

        let conversion = select(
            vec![
                (SimplificationStrategy::AstSimplified, "b".into()),
                (SimplificationStrategy::Unsimplified, "c".into()),
            ],
            &reference,
        );
        assert_eq!(conversion.regex, "c");
        assert!(!conversion.verification.is_trusted());
    }

    #[test]
    fn decides_regex_equivalence() {
        assert!(regex_equivalent("(a|b)*", "(a*b*)*").unwrap());
        assert!(regex_equivalent("a(ba)*b", "(ab)+").unwrap());
        assert!(!regex_equivalent("a*", "a+").unwrap());
        assert!(regex_equivalent("a|", "a").is_err());
    }
}
