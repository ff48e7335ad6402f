use crate::error::RegexSyntaxError;

use super::ast::{Node, Postfix};

/*
Union   : Concat
        : Concat '|' Union
Concat  : Postfix
        : Postfix Concat
Postfix : Atom
        : Postfix ('*' | '+' | '?')
Atom    : CHAR
        : 'ε'
        : '∅'
        : '(' ')'
        : '(' Union ')'
*/

/// Recursive descent parser producing a [`Node`] from the flat regex syntax.
struct Parser {
    chars: Vec<char>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn union(&mut self) -> Result<Node, RegexSyntaxError> {
        let mut alternatives = vec![self.concat()?];
        while self.peek() == Some('|') {
            self.position += 1;
            match self.peek() {
                Some(operator @ ('|' | '*' | '+' | '?')) => {
                    return Err(RegexSyntaxError::OperatorAfterUnion {
                        operator,
                        position: self.position,
                    })
                }
                None => {
                    return Err(RegexSyntaxError::UnexpectedEnd {
                        position: self.position,
                    })
                }
                Some(')') => {
                    return Err(RegexSyntaxError::UnexpectedCharacter {
                        character: ')',
                        position: self.position,
                    })
                }
                Some(_) => alternatives.push(self.concat()?),
            }
        }
        Ok(Node::union(alternatives))
    }

    fn concat(&mut self) -> Result<Node, RegexSyntaxError> {
        let mut factors = vec![self.postfix()?];
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            factors.push(self.postfix()?);
        }
        Ok(Node::concat(factors))
    }

    fn postfix(&mut self) -> Result<Node, RegexSyntaxError> {
        let atom = self.atom()?;
        let mut operators = Vec::new();
        while let Some(op) = self.peek().and_then(Postfix::from_char) {
            operators.push(op);
            self.position += 1;
        }
        Ok(match operators.as_slice() {
            [] => atom,
            [single] => atom.apply(*single),
            _ => Node::MultiOp(Box::new(atom), operators),
        })
    }

    fn atom(&mut self) -> Result<Node, RegexSyntaxError> {
        let position = self.position;
        let Some(c) = self.peek() else {
            return Err(RegexSyntaxError::UnexpectedEnd { position });
        };
        self.position += 1;
        match c {
            '(' => {
                if self.peek() == Some(')') {
                    self.position += 1;
                    return Ok(Node::EmptyGroup);
                }
                let inner = self.union()?;
                if self.peek() != Some(')') {
                    return Err(RegexSyntaxError::UnbalancedParenthesis { position });
                }
                self.position += 1;
                Ok(inner)
            }
            ')' => Err(RegexSyntaxError::UnbalancedParenthesis { position }),
            '*' | '+' | '?' | '|' => Err(RegexSyntaxError::MissingOperand {
                operator: c,
                position,
            }),
            'ε' => Ok(Node::Epsilon),
            '∅' => Ok(Node::Empty),
            c => Ok(Node::Symbol(c)),
        }
    }
}

/// Parses `input` into a syntax tree. The empty string denotes the empty word.
///
/// Positions in errors count characters, not bytes.
pub fn parse(input: &str) -> Result<Node, RegexSyntaxError> {
    let mut parser = Parser {
        chars: input.chars().collect(),
        position: 0,
    };
    if parser.chars.is_empty() {
        return Ok(Node::Epsilon);
    }
    let node = parser.union()?;
    match parser.peek() {
        None => Ok(node),
        Some(')') => Err(RegexSyntaxError::UnbalancedParenthesis {
            position: parser.position,
        }),
        Some(character) => Err(RegexSyntaxError::UnexpectedCharacter {
            character,
            position: parser.position,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints() {
        for regex in [
            "a",
            "a|b",
            "a*",
            "a+",
            "(a|b)*abb",
            "a?b",
            "(ab)*|(ba)*",
            "a*+",
            "ε",
            "∅",
            "()",
            "a b",
        ] {
            assert_eq!(parse(regex).unwrap().to_string(), regex);
        }
        assert_eq!(parse("").unwrap(), Node::Epsilon);
        assert_eq!(parse("((a))").unwrap(), Node::Symbol('a'));
        assert_eq!(parse("(ab)c").unwrap().to_string(), "abc");
    }

    #[test]
    fn stacked_operators() {
        let node = parse("a*+?").unwrap();
        assert_eq!(
            node,
            Node::MultiOp(
                Box::new(Node::Symbol('a')),
                vec![Postfix::Star, Postfix::Plus, Postfix::Optional]
            )
        );
    }

    #[test]
    fn reports_positions() {
        assert_eq!(
            parse("*a"),
            Err(RegexSyntaxError::MissingOperand {
                operator: '*',
                position: 0
            })
        );
        assert_eq!(
            parse("(ab"),
            Err(RegexSyntaxError::UnbalancedParenthesis { position: 0 })
        );
        assert_eq!(
            parse("ab)"),
            Err(RegexSyntaxError::UnbalancedParenthesis { position: 2 })
        );
        assert_eq!(
            parse("a|*"),
            Err(RegexSyntaxError::OperatorAfterUnion {
                operator: '*',
                position: 2
            })
        );
        assert_eq!(
            parse("a||b"),
            Err(RegexSyntaxError::OperatorAfterUnion {
                operator: '|',
                position: 2
            })
        );
        assert_eq!(
            parse("a|"),
            Err(RegexSyntaxError::UnexpectedEnd { position: 2 })
        );
        assert_eq!(
            parse("|a"),
            Err(RegexSyntaxError::MissingOperand {
                operator: '|',
                position: 0
            })
        );
        assert_eq!(parse("εa(").unwrap_err().position(), 3);
    }
}
