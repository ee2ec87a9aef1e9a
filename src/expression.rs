//! Product expressions such as `1.5*B*B`.
//!
//! An expression is a `*`-separated list of factors. Numeric factors multiply
//! into a coefficient; identifiers name species and keep their multiplicity.

use crate::error::{Result, SimError};

#[derive(Clone, Debug, PartialEq)]
pub enum Factor<'a> {
    Number(f64),
    Identifier(&'a str),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Product {
    pub coefficient: f64,
    pub species: Vec<String>,
}

impl Product {
    fn unit() -> Self {
        Self {
            coefficient: 1.0,
            species: Vec::new(),
        }
    }
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    }
}

fn classify<'a>(expression: &str, token: &'a str) -> Result<Factor<'a>> {
    let invalid = || SimError::InvalidFactor {
        expression: expression.to_string(),
        factor: token.to_string(),
    };
    let starts_numeric = token
        .chars()
        .next()
        .is_some_and(|ch| ch.is_ascii_digit() || matches!(ch, '.' | '+' | '-'));
    if starts_numeric {
        let value: f64 = token.parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }
        Ok(Factor::Number(value))
    } else if is_identifier(token) {
        Ok(Factor::Identifier(token))
    } else {
        Err(invalid())
    }
}

/// Splits `expression` into tagged factors, failing on the first factor that is
/// neither a finite number nor an identifier.
pub fn tokenize(expression: &str) -> Result<Vec<Factor<'_>>> {
    let trimmed = expression.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split('*')
        .map(|token| classify(expression, token.trim()))
        .collect()
}

pub fn parse(expression: &str) -> Result<Product> {
    let mut product = Product::unit();
    for factor in tokenize(expression)? {
        match factor {
            Factor::Number(value) => product.coefficient *= value,
            Factor::Identifier(name) => product.species.push(name.to_string()),
        }
    }
    Ok(product)
}
