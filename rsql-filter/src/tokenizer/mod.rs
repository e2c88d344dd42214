//! Lazy, spec-driven tokenizer.
//!
//! The source is matched against an ordered list of [`Spec`]s, one token
//! per call. This is first-match lexing, not longest-match: the earliest
//! spec in the list whose pattern matches at the cursor wins, so catch-all
//! patterns must come last.

pub mod policy;

pub use policy::{Policy, PolicyMode};

use crate::errors::FilterError;
use regex::Regex;
use std::fmt;
use tracing::{trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    Skip,
    ContextStart,
    ContextEnd,
    AndComposite,
    OrComposite,
    ValueCompare,
    StringWildcardCompare,
    NumericRangeCompare,
    ArrayCompare,
    BoolLiteral,
    QuotedStringLiteral,
    NumericLiteral,
    ObjectIdLiteral,
    FieldName,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Skip => "SKIP",
            TokenType::ContextStart => "(",
            TokenType::ContextEnd => ")",
            TokenType::AndComposite => ";",
            TokenType::OrComposite => ",",
            TokenType::ValueCompare => "VALUE_COMPARE_OPERATOR",
            TokenType::StringWildcardCompare => "QUOTED_STRING_VALUE_COMPARE_OPERATOR",
            TokenType::NumericRangeCompare => "NUMERIC_VALUE_COMPARE_OPERATOR",
            TokenType::ArrayCompare => "ARRAY_COMPARE_OPERATOR",
            TokenType::BoolLiteral => "BOOL_LITERAL",
            TokenType::QuotedStringLiteral => "QUOTED_STRING_LITERAL",
            TokenType::NumericLiteral => "NUMERIC_LITERAL",
            TokenType::ObjectIdLiteral => "OBJECT_ID_LITERAL",
            TokenType::FieldName => "FIELD_NAME",
        };
        write!(f, "{}", name)
    }
}

/// A matched slice of the source, tagged with its type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub token_type: TokenType,
    pub value: &'a str,
}

impl<'a> Token<'a> {
    pub fn new(token_type: TokenType, value: &'a str) -> Self {
        Self { token_type, value }
    }
}

/// Pattern to token type rule. Patterns should be anchored with `^`.
#[derive(Debug, Clone)]
pub struct Spec {
    pattern: Regex,
    token_type: TokenType,
}

impl Spec {
    pub fn new(pattern: &str, token_type: TokenType) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            token_type,
        })
    }

    pub fn token_type(&self) -> TokenType {
        self.token_type
    }

    /// Length of the non-empty prefix of `input` matched by this spec
    fn match_len(&self, input: &str) -> Option<usize> {
        self.pattern
            .find(input)
            .filter(|m| m.start() == 0 && !m.as_str().is_empty())
            .map(|m| m.end())
    }
}

/// Pulls tokens from `source` on demand. Holds a cursor, so one instance
/// serves exactly one scan and must not be shared.
#[derive(Debug)]
pub struct Tokenizer<'a> {
    source: &'a str,
    cursor: usize,
    specs: &'a [Spec],
    skip_type: TokenType,
    policy_check_type: TokenType,
    policy: Option<&'a Policy>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(
        source: &'a str,
        skip_type: TokenType,
        policy_check_type: TokenType,
        specs: &'a [Spec],
        policy: Option<&'a Policy>,
    ) -> Self {
        Self {
            source,
            cursor: 0,
            specs,
            skip_type,
            policy_check_type,
            policy,
        }
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor
    }

    pub fn has_more_tokens(&self) -> bool {
        self.cursor < self.source.len()
    }

    /// Returns the next token, or `None` once the source is exhausted.
    /// Tokens of the skip type are consumed silently.
    pub fn next_token(&mut self) -> Result<Option<Token<'a>>, FilterError> {
        let source = self.source;

        while self.has_more_tokens() {
            let rest = &source[self.cursor..];
            let Some((token_type, len)) = self
                .specs
                .iter()
                .find_map(|spec| spec.match_len(rest).map(|len| (spec.token_type(), len)))
            else {
                return Err(FilterError::UnexpectedToken {
                    position: self.cursor,
                    token: rest.chars().next().map(String::from).unwrap_or_default(),
                });
            };

            let value = &rest[..len];
            self.cursor += len;

            if token_type == self.skip_type {
                continue;
            }

            if token_type == self.policy_check_type {
                if let Some(policy) = self.policy {
                    if !policy.allow(value) {
                        warn!(field = value, "Rejected by policy");
                        return Err(FilterError::PolicyViolation(value.to_string()));
                    }
                }
            }

            trace!(%token_type, value, cursor = self.cursor, "Token");
            return Ok(Some(Token::new(token_type, value)));
        }

        Ok(None)
    }
}
