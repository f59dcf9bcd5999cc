use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tester::TestError;

/// Relation between the value read from the stream and the expected value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    /// Matches regardless of operands.
    Any,
}

impl Operator {
    /// Parse the relation symbol used in rule text.
    pub fn from_symbol(symbol: &str) -> Result<Self, TestError> {
        match symbol {
            "=" => Ok(Operator::Equal),
            "!" => Ok(Operator::NotEqual),
            ">" => Ok(Operator::GreaterThan),
            "<" => Ok(Operator::LessThan),
            ">=" => Ok(Operator::GreaterOrEqual),
            "<=" => Ok(Operator::LessOrEqual),
            "x" => Ok(Operator::Any),
            other => Err(TestError::UnknownOperator(other.to_string())),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "!",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
            Operator::Any => "x",
        }
    }

    /// True for the operators that only ask about (in)equality.
    pub fn is_equality(&self) -> bool {
        matches!(self, Operator::Equal | Operator::NotEqual | Operator::Any)
    }

    /// Evaluate `actual <op> expected`.
    ///
    /// Both operands share one type, so there is never any implicit widening.
    pub fn compare<T: PartialOrd>(&self, actual: T, expected: T) -> bool {
        match self {
            Operator::Any => true,
            Operator::Equal => actual == expected,
            Operator::NotEqual => actual != expected,
            Operator::GreaterThan => actual > expected,
            Operator::LessThan => actual < expected,
            Operator::GreaterOrEqual => actual >= expected,
            Operator::LessOrEqual => actual <= expected,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
