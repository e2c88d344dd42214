use crate::tokenizer::TokenType;
use std::fmt;

/// What the parser was looking for when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Token(TokenType),
    Literal,
    CompositeOperator,
    ComparisonOperator,
}

impl From<TokenType> for Expected {
    fn from(token_type: TokenType) -> Self {
        Expected::Token(token_type)
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(token_type) => write!(f, "{}", token_type),
            Expected::Literal => write!(f, "LITERAL"),
            Expected::CompositeOperator => write!(f, ";/,"),
            Expected::ComparisonOperator => write!(f, "COMPARISON_OPERATOR"),
        }
    }
}

/// Error types for tokenizing and parsing filter queries.
/// Positions are byte offsets into the decoded query.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    /// No token spec matched at `position`
    UnexpectedToken { position: usize, token: String },
    UnexpectedTokenType {
        position: usize,
        actual: TokenType,
        expected: Expected,
    },
    UnexpectedInputEnd { expected: Expected },
    /// A policy-checked token (field name) was rejected
    PolicyViolation(String),
    /// An AST shape the parser relies on was violated
    UnexpectedInput(String),
    NestingTooDeep { position: usize, max_depth: usize },
    InvalidNumber { position: usize, literal: String },
}

impl FilterError {
    /// Byte offset of the failure, when the error carries one
    pub fn position(&self) -> Option<usize> {
        match self {
            FilterError::UnexpectedToken { position, .. }
            | FilterError::UnexpectedTokenType { position, .. }
            | FilterError::NestingTooDeep { position, .. }
            | FilterError::InvalidNumber { position, .. } => Some(*position),
            FilterError::UnexpectedInputEnd { .. }
            | FilterError::PolicyViolation(_)
            | FilterError::UnexpectedInput(_) => None,
        }
    }
}

impl fmt::Display for FilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterError::UnexpectedToken { position, token } => {
                write!(f, "Unexpected token: \"{}\" at position \"{}\"", token, position)
            }
            FilterError::UnexpectedTokenType {
                position,
                actual,
                expected,
            } => write!(
                f,
                "Unexpected token: \"{}\" at position \"{}\", expected: \"{}\"",
                actual, position, expected
            ),
            FilterError::UnexpectedInputEnd { expected } => {
                write!(f, "Unexpected end of input, expected: \"{}\"", expected)
            }
            FilterError::PolicyViolation(field) => {
                write!(f, "Policy violation, policy disallow \"{}\"", field)
            }
            FilterError::UnexpectedInput(input) => write!(f, "Unexpected input \"{}\"", input),
            FilterError::NestingTooDeep {
                position,
                max_depth,
            } => write!(
                f,
                "Nesting too deep at position \"{}\", maximum depth is {}",
                position, max_depth
            ),
            FilterError::InvalidNumber { position, literal } => write!(
                f,
                "Invalid numeric literal \"{}\" at position \"{}\"",
                literal, position
            ),
        }
    }
}

impl std::error::Error for FilterError {}
