//! Numeric comparison expressions such as `99`, `>98`, `<=100` or `98-100`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GeneSearchError, Result};

fn single_number() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^([<>]=?)?(-?[0-9.]+)$").unwrap())
}

fn number_range() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(-?[0-9.]+)-(-?[0-9.]+)$").unwrap())
}

/// A number as written in the query, with its parsed value.
///
/// Equality is matched against the literal text so that values such as
/// `007` or `1.10` keep their exact spelling.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    text: String,
    value: f64,
}

impl NumberLiteral {
    /// Parse a literal, keeping `text` as written.
    pub fn parse(text: &str) -> Result<Self> {
        let value = parse_number(text, text)?;
        Ok(NumberLiteral {
            text: text.to_string(),
            value,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Whether the parsed value prints back as the literal.
    pub fn is_canonical(&self) -> bool {
        self.value.to_string() == self.text
    }
}

impl From<f64> for NumberLiteral {
    fn from(value: f64) -> Self {
        NumberLiteral {
            text: value.to_string(),
            value,
        }
    }
}

impl fmt::Display for NumberLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A parsed numeric comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NumberExpression {
    Equal(NumberLiteral),
    GreaterThan(f64),
    GreaterThanOrEqual(f64),
    LessThan(f64),
    LessThanOrEqual(f64),
    /// Inclusive on both ends.
    Between(f64, f64),
}

impl NumberExpression {
    /// Parse an expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use genesearch::query::NumberExpression;
    ///
    /// let expr = NumberExpression::parse("98-100").unwrap();
    /// assert!(expr.matches(99.0));
    /// assert!(!NumberExpression::parse(">99").unwrap().matches(99.0));
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if let Some(caps) = single_number().captures(input) {
            let value = parse_number(&caps[2], input)?;
            return Ok(match caps.get(1).map(|m| m.as_str()) {
                None => NumberExpression::Equal(NumberLiteral {
                    text: caps[2].to_string(),
                    value,
                }),
                Some(">") => NumberExpression::GreaterThan(value),
                Some(">=") => NumberExpression::GreaterThanOrEqual(value),
                Some("<") => NumberExpression::LessThan(value),
                Some("<=") => NumberExpression::LessThanOrEqual(value),
                Some(op) => {
                    return Err(GeneSearchError::query_parse(format!(
                        "Unsupported numeric operator {op}"
                    )));
                }
            });
        }
        if let Some(caps) = number_range().captures(input) {
            let lower = parse_number(&caps[1], input)?;
            let upper = parse_number(&caps[2], input)?;
            return Ok(NumberExpression::Between(lower, upper));
        }
        Err(GeneSearchError::query_parse(format!(
            "Cannot parse numeric query {input}"
        )))
    }

    /// Exact equality with `value`.
    pub fn equal(value: f64) -> Self {
        NumberExpression::Equal(value.into())
    }

    /// Whether `value` satisfies the expression.
    pub fn matches(&self, value: f64) -> bool {
        match *self {
            NumberExpression::Equal(ref x) => value == x.value,
            NumberExpression::GreaterThan(x) => value > x,
            NumberExpression::GreaterThanOrEqual(x) => value >= x,
            NumberExpression::LessThan(x) => value < x,
            NumberExpression::LessThanOrEqual(x) => value <= x,
            NumberExpression::Between(lower, upper) => value >= lower && value <= upper,
        }
    }
}

fn parse_number(text: &str, input: &str) -> Result<f64> {
    text.parse::<f64>().map_err(|_| {
        GeneSearchError::query_parse(format!("Cannot parse numeric query {input}"))
    })
}

impl fmt::Display for NumberExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberExpression::Equal(literal) => write!(f, "{literal}"),
            NumberExpression::GreaterThan(x) => write!(f, ">{x}"),
            NumberExpression::GreaterThanOrEqual(x) => write!(f, ">={x}"),
            NumberExpression::LessThan(x) => write!(f, "<{x}"),
            NumberExpression::LessThanOrEqual(x) => write!(f, "<={x}"),
            NumberExpression::Between(lower, upper) => write!(f, "{lower}-{upper}"),
        }
    }
}

impl FromStr for NumberExpression {
    type Err = GeneSearchError;

    fn from_str(s: &str) -> Result<Self> {
        NumberExpression::parse(s)
    }
}

impl TryFrom<String> for NumberExpression {
    type Error = GeneSearchError;

    fn try_from(value: String) -> Result<Self> {
        NumberExpression::parse(&value)
    }
}

impl From<NumberExpression> for String {
    fn from(value: NumberExpression) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_expression_law() {
        let matches = |expr: &str| NumberExpression::parse(expr).unwrap().matches(99.0);
        assert!(matches("99"));
        assert!(matches(">98"));
        assert!(!matches(">99"));
        assert!(matches("98-100"));
        assert!(!matches("100-101"));
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            NumberExpression::parse(">=98").unwrap(),
            NumberExpression::GreaterThanOrEqual(98.0)
        );
        assert_eq!(
            NumberExpression::parse("<100").unwrap(),
            NumberExpression::LessThan(100.0)
        );
        assert!(NumberExpression::parse("<=99").unwrap().matches(99.0));
        assert!(!NumberExpression::parse("<99").unwrap().matches(99.0));
    }

    #[test]
    fn test_negative_numbers() {
        assert_eq!(NumberExpression::parse("-1").unwrap(), NumberExpression::equal(-1.0));
        assert_eq!(
            NumberExpression::parse("-5--1").unwrap(),
            NumberExpression::Between(-5.0, -1.0)
        );
    }

    #[test]
    fn test_equality_keeps_literal() {
        for text in ["1.10", "007", "12345678901234567891"] {
            let expr = NumberExpression::parse(text).unwrap();
            assert_eq!(expr.to_string(), text);
            let NumberExpression::Equal(literal) = expr else {
                panic!("expected equality for {text}");
            };
            assert_eq!(literal.text(), text);
            assert!(!literal.is_canonical());
        }
        let NumberExpression::Equal(literal) = NumberExpression::parse("42").unwrap() else {
            panic!("expected equality");
        };
        assert!(literal.is_canonical());
        assert_eq!(literal.value(), 42.0);
    }

    #[test]
    fn test_invalid_expressions() {
        assert!(NumberExpression::parse("abc").is_err());
        assert!(NumberExpression::parse("1.2.3").is_err());
        assert!(NumberExpression::parse("=>5").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(NumberExpression::parse("99.0").unwrap().to_string(), "99.0");
        assert_eq!(NumberExpression::parse(">=1.5").unwrap().to_string(), ">=1.5");
        assert_eq!(NumberExpression::parse("98-100").unwrap().to_string(), "98-100");
    }
}
