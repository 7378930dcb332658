//! Calculator tool: evaluates arithmetic expressions.
//!
//! Grammar (recursive descent, highest precedence last):
//!
//! ```text
//! sum     = product (('+' | '-') product)*
//! product = power (('*' | '/' | '%') power)*
//! power   = unary ('^' power)?
//! unary   = '-' unary | '+' unary | atom
//! atom    = NUMBER | '(' sum ')'
//! ```

use schemars::JsonSchema;
use serde::Deserialize;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

pub const NAME: &str = "calculator";
pub const DESCRIPTION: &str = "Evaluate an arithmetic expression. Supports +, -, *, /, % (remainder), ^ (power), parentheses and decimal numbers.";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CalculatorArgs {
    /// The expression to evaluate, e.g. "(2 + 3) * 4"
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("empty expression")]
    Empty,
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("missing closing parenthesis")]
    UnclosedParen,
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NotFinite,
    #[error("expression nested too deeply (limit {0})")]
    TooDeep(usize),
}

/// Nesting limit for parentheses, unary signs and `^` chains.
pub const MAX_DEPTH: usize = 256;

/// Tool entry point: evaluate and render the result.
pub fn calculate(args: CalculatorArgs) -> Result<String, CalcError> {
    evaluate(&args.expression).map(format_number)
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    if expression.trim().is_empty() {
        return Err(CalcError::Empty);
    }
    let mut cursor = Cursor {
        chars: expression.char_indices().peekable(),
        depth: 0,
    };
    let value = cursor.sum()?;
    cursor.skip_ws();
    if let Some((offset, ch)) = cursor.chars.next() {
        return Err(CalcError::UnexpectedChar { ch, offset });
    }
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CalcError::NotFinite)
    }
}

/// Integers print without a fractional part.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

struct Cursor<'a> {
    chars: Peekable<CharIndices<'a>>,
    depth: usize,
}

impl Cursor<'_> {
    fn skip_ws(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    /// Consume `op` if it is the next non-blank character.
    fn eat(&mut self, op: char) -> bool {
        self.skip_ws();
        self.chars.next_if(|&(_, c)| c == op).is_some()
    }

    /// Run one recursive step, failing once `MAX_DEPTH` is reached.
    fn nested(
        &mut self,
        step: impl FnOnce(&mut Self) -> Result<f64, CalcError>,
    ) -> Result<f64, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let result = step(self);
        self.depth -= 1;
        result
    }

    fn sum(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.product()?;
        loop {
            if self.eat('+') {
                acc += self.product()?;
            } else if self.eat('-') {
                acc -= self.product()?;
            } else {
                return Ok(acc);
            }
        }
    }

    fn product(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.power()?;
        loop {
            if self.eat('*') {
                acc *= self.power()?;
            } else if self.eat('/') {
                let divisor = self.power()?;
                if divisor == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                acc /= divisor;
            } else if self.eat('%') {
                let divisor = self.power()?;
                if divisor == 0.0 {
                    return Err(CalcError::DivisionByZero);
                }
                acc %= divisor;
            } else {
                return Ok(acc);
            }
        }
    }

    // Right-associative: 2^3^2 = 2^9
    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.unary()?;
        if self.eat('^') {
            let exponent = self.nested(Self::power)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.eat('-') {
            return Ok(-self.nested(Self::unary)?);
        }
        if self.eat('+') {
            return self.nested(Self::unary);
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<f64, CalcError> {
        self.skip_ws();
        match self.chars.peek().copied() {
            None => Err(CalcError::UnexpectedEnd),
            Some((_, '(')) => {
                self.chars.next();
                let inner = self.nested(Self::sum)?;
                if self.eat(')') {
                    Ok(inner)
                } else {
                    Err(CalcError::UnclosedParen)
                }
            }
            Some((_, c)) if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::new();
                while let Some((_, c)) = self.chars.next_if(|(_, c)| c.is_ascii_digit() || *c == '.') {
                    literal.push(c);
                }
                literal
                    .parse()
                    .map_err(|_| CalcError::InvalidNumber(literal))
            }
            Some((offset, ch)) => Err(CalcError::UnexpectedChar { ch, offset }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_and_grouping() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), 21.0);
        assert_eq!(evaluate("10 - 4 - 3").unwrap(), 3.0);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(evaluate("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(evaluate("-2 ^ 2").unwrap(), 4.0);
    }

    #[test]
    fn remainder_and_decimals() {
        assert_eq!(evaluate("17 % 5").unwrap(), 2.0);
        assert!((evaluate("3.14 * 2").unwrap() - 6.28).abs() < 1e-10);
        assert!((evaluate("(10 + 5) / 3 - 2 * (1 + 1)").unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn unary_signs() {
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("+4 * -(1 + 1)").unwrap(), -8.0);
    }

    #[test]
    fn errors_are_specific() {
        assert_eq!(evaluate("1 / 0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("5 % 0"), Err(CalcError::DivisionByZero));
        assert_eq!(evaluate("2 +"), Err(CalcError::UnexpectedEnd));
        assert_eq!(evaluate("   "), Err(CalcError::Empty));
        assert_eq!(evaluate("(1 + 2"), Err(CalcError::UnclosedParen));
        assert_eq!(evaluate("1.2.3"), Err(CalcError::InvalidNumber("1.2.3".into())));
        assert_eq!(
            evaluate("2 x 3"),
            Err(CalcError::UnexpectedChar { ch: 'x', offset: 2 })
        );
        assert_eq!(evaluate("10 ^ 400"), Err(CalcError::NotFinite));
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let parens = format!("{}1{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(evaluate(&parens), Err(CalcError::TooDeep(MAX_DEPTH)));

        let signs = format!("{}1", "-".repeat(10_000));
        assert_eq!(evaluate(&signs), Err(CalcError::TooDeep(MAX_DEPTH)));

        let tower = format!("{}1", "1^".repeat(10_000));
        assert_eq!(evaluate(&tower), Err(CalcError::TooDeep(MAX_DEPTH)));
    }

    #[test]
    fn moderate_nesting_still_evaluates() {
        let parens = format!("{}7{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(evaluate(&parens).unwrap(), 7.0);
        assert_eq!(evaluate(&format!("{}3", "-".repeat(100))).unwrap(), 3.0);
    }

    #[test]
    fn results_render_compactly() {
        let calc = |e: &str| {
            calculate(CalculatorArgs {
                expression: e.into(),
            })
            .unwrap()
        };
        assert_eq!(calc("10 / 2"), "5");
        assert_eq!(calc("2 + 2"), "4");
        assert!(calc("10 / 3").starts_with("3.333"));
    }
}
