use super::escape;
use super::types::{BoolOp, CompareOp, CompareValue, FilterNode, Literal};
use crate::errors::{Expected, FilterError};
use crate::tokenizer::{Policy, Spec, Token, TokenType, Tokenizer};
use serde::Deserialize;
use tracing::{debug, warn};

lazy_static::lazy_static! {
    /// Earlier entries take priority over later ones. FIELD_NAME is the
    /// catch-all and has to stay last.
    static ref RSQL_SPECS: Vec<Spec> = [
        (r"^\s+", TokenType::Skip),
        (r"^\(", TokenType::ContextStart),
        (r"^\)", TokenType::ContextEnd),
        (r"^;", TokenType::AndComposite),
        (r"^,", TokenType::OrComposite),
        (r"^(==|!=)", TokenType::ValueCompare),
        (r"^(=sw=|=ew=)", TokenType::StringWildcardCompare),
        (r"^(=gt=|=ge=|=lt=|=le=)", TokenType::NumericRangeCompare),
        (r"^(=in=|=out=)", TokenType::ArrayCompare),
        (r"(?i)^(true|false)", TokenType::BoolLiteral),
        (r"^[-+]?[0-9]+(\.[0-9]+)?", TokenType::NumericLiteral),
        (r#"^("[^"]*"|'[^']*')"#, TokenType::QuotedStringLiteral),
        (r"^\$oid\([0-9a-fA-F]{24}\)", TokenType::ObjectIdLiteral),
        (r"^[^!=]*", TokenType::FieldName),
    ]
    .into_iter()
    .map(|(pattern, token_type)| Spec::new(pattern, token_type).expect("valid built-in token pattern"))
    .collect();
}

const DEFAULT_MAX_DEPTH: usize = 64;
const OBJECT_ID_PREFIX: &str = "$oid(";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum nesting of parenthesized contexts
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// RSQL filter parser.
///
/// The parser itself only holds configuration; the cursor and lookahead
/// live in a per-call state, so one instance can be shared and reused.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    policy: Option<Policy>,
    config: ParserConfig,
}

impl Parser {
    pub fn new(policy: Option<Policy>) -> Self {
        Self::with_config(policy, ParserConfig::default())
    }

    pub fn with_config(policy: Option<Policy>, config: ParserConfig) -> Self {
        Self { policy, config }
    }

    pub fn policy(&self) -> Option<&Policy> {
        self.policy.as_ref()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses `query` into a filter tree. The empty query yields `None`,
    /// meaning no filter at all.
    pub fn parse(&self, query: &str) -> Result<Option<FilterNode>, FilterError> {
        if query.is_empty() {
            debug!("Empty RSQL query, no filter");
            return Ok(None);
        }

        let decoded = escape::decode(query);
        debug!(query = %decoded, "Parsing RSQL query");

        let mut state = ParseState::new(&decoded, self.policy.as_ref(), self.config.max_depth)?;
        let node = state.expression()?;
        state.finish()?;

        debug!(filter = %node, "Parsed RSQL query");
        Ok(Some(node))
    }
}

/// Mutable state of a single parse: tokenizer cursor, one token of
/// lookahead and the current context depth.
struct ParseState<'a> {
    tokenizer: Tokenizer<'a>,
    lookahead: Option<Token<'a>>,
    depth: usize,
    max_depth: usize,
}

impl<'a> ParseState<'a> {
    fn new(
        query: &'a str,
        policy: Option<&'a Policy>,
        max_depth: usize,
    ) -> Result<Self, FilterError> {
        let mut tokenizer = Tokenizer::new(
            query,
            TokenType::Skip,
            TokenType::FieldName,
            RSQL_SPECS.as_slice(),
            policy,
        );
        let lookahead = tokenizer.next_token()?;
        Ok(Self {
            tokenizer,
            lookahead,
            depth: 0,
            max_depth,
        })
    }

    fn lookahead_type(&self) -> Option<TokenType> {
        self.lookahead.map(|token| token.token_type)
    }

    /// Byte offset where the lookahead token starts
    fn lookahead_start(&self) -> usize {
        let cursor = self.tokenizer.cursor_position();
        self.lookahead
            .map_or(cursor, |token| cursor - token.value.len())
    }

    fn eat(&mut self, expected: TokenType) -> Result<Token<'a>, FilterError> {
        let token = self.lookahead.ok_or(FilterError::UnexpectedInputEnd {
            expected: expected.into(),
        })?;

        if token.token_type != expected {
            return Err(FilterError::UnexpectedTokenType {
                position: self.tokenizer.cursor_position(),
                actual: token.token_type,
                expected: expected.into(),
            });
        }

        self.lookahead = self.tokenizer.next_token()?;
        Ok(token)
    }

    /// Anything left after a complete top-level expression is an error
    fn finish(&self) -> Result<(), FilterError> {
        match self.lookahead {
            Some(token) => Err(FilterError::UnexpectedToken {
                position: self.lookahead_start(),
                token: token.value.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// expression := (context | comparison) [ compositeOp expression ]
    ///
    /// The chain is collected iteratively and folded from the right, which
    /// builds the same tree as the right-recursive rule without recursing
    /// once per operator. Every switch between `;` and `,` nests one more
    /// boolean node, so it counts toward the depth limit like a context.
    fn expression(&mut self) -> Result<FilterNode, FilterError> {
        let base_depth = self.depth;
        let mut operands = vec![self.operand()?];
        let mut operators: Vec<BoolOp> = Vec::new();

        while let Some(token) = self.lookahead {
            if token.token_type == TokenType::ContextEnd {
                break;
            }
            let position = self.lookahead_start();
            let op = self.composite_operator()?;
            if operators.last().is_some_and(|last| *last != op) {
                self.descend(position)?;
            }
            operators.push(op);
            operands.push(self.operand()?);
        }
        self.depth = base_depth;

        let mut right = operands
            .pop()
            .ok_or_else(|| FilterError::UnexpectedInput("empty expression".to_string()))?;
        while let Some(op) = operators.pop() {
            // one node per run of the same operator, children in source order
            let mut run = Vec::new();
            loop {
                let left = operands
                    .pop()
                    .ok_or_else(|| FilterError::UnexpectedInput("missing operand".to_string()))?;
                run.push(left);
                if operators.last() != Some(&op) {
                    break;
                }
                operators.pop();
            }
            run.reverse();
            right = combine(run, op, right)?;
        }
        Ok(right)
    }

    /// Enters one nesting level, failing past `max_depth`
    fn descend(&mut self, position: usize) -> Result<(), FilterError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            warn!(position, max_depth = self.max_depth, "RSQL query nested too deep");
            return Err(FilterError::NestingTooDeep {
                position,
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    fn operand(&mut self) -> Result<FilterNode, FilterError> {
        match self.lookahead_type() {
            None => Err(FilterError::UnexpectedInputEnd {
                expected: TokenType::FieldName.into(),
            }),
            Some(TokenType::ContextStart) => self.context(),
            Some(_) => self.comparison(),
        }
    }

    /// context := "(" expression ")"
    fn context(&mut self) -> Result<FilterNode, FilterError> {
        let position = self.lookahead_start();
        self.eat(TokenType::ContextStart)?;

        self.descend(position)?;

        let node = self.expression()?;
        self.eat(TokenType::ContextEnd)?;
        self.depth -= 1;
        Ok(node)
    }

    /// compositeOp := ";" | ","
    fn composite_operator(&mut self) -> Result<BoolOp, FilterError> {
        match self.lookahead_type() {
            Some(TokenType::AndComposite) => {
                self.eat(TokenType::AndComposite)?;
                Ok(BoolOp::And)
            }
            Some(TokenType::OrComposite) => {
                self.eat(TokenType::OrComposite)?;
                Ok(BoolOp::Or)
            }
            Some(actual) => Err(FilterError::UnexpectedTokenType {
                position: self.lookahead_start(),
                actual,
                expected: Expected::CompositeOperator,
            }),
            None => Err(FilterError::UnexpectedInputEnd {
                expected: Expected::CompositeOperator,
            }),
        }
    }

    /// comparison := FIELD_NAME ( valueCmp | wildcardCmp | rangeCmp | arrayCmp )
    fn comparison(&mut self) -> Result<FilterNode, FilterError> {
        let field = self.eat(TokenType::FieldName)?.value.to_string();

        let Some(token) = self.lookahead else {
            return Err(FilterError::UnexpectedInputEnd {
                expected: Expected::ComparisonOperator,
            });
        };

        match token.token_type {
            TokenType::ValueCompare => self.value_comparison(field),
            TokenType::StringWildcardCompare => self.wildcard_comparison(field),
            TokenType::NumericRangeCompare => self.range_comparison(field),
            TokenType::ArrayCompare => self.array_comparison(field),
            _ => Err(FilterError::UnexpectedToken {
                position: self.lookahead_start(),
                token: token.value.to_string(),
            }),
        }
    }

    /// valueCmp := ("==" | "!=") ( literal | "(" literalList ")" )
    fn value_comparison(&mut self, field: String) -> Result<FilterNode, FilterError> {
        let op: CompareOp = self.eat(TokenType::ValueCompare)?.value.parse()?;

        let value = if self.lookahead_type() == Some(TokenType::ContextStart) {
            CompareValue::List(self.parenthesized_list()?)
        } else {
            CompareValue::Single(self.literal()?)
        };

        Ok(FilterNode::comparison(field, op, value))
    }

    /// wildcardCmp := ("=sw=" | "=ew=") quotedString
    fn wildcard_comparison(&mut self, field: String) -> Result<FilterNode, FilterError> {
        let op: CompareOp = self.eat(TokenType::StringWildcardCompare)?.value.parse()?;
        let text = self.string_literal()?;
        Ok(FilterNode::comparison(
            field,
            op,
            CompareValue::Single(Literal::String(text)),
        ))
    }

    /// rangeCmp := ("=gt=" | "=ge=" | "=lt=" | "=le=") numericLiteral
    fn range_comparison(&mut self, field: String) -> Result<FilterNode, FilterError> {
        let op: CompareOp = self.eat(TokenType::NumericRangeCompare)?.value.parse()?;
        let number = self.numeric_literal()?;
        Ok(FilterNode::comparison(field, op, CompareValue::Single(number)))
    }

    /// arrayCmp := ("=in=" | "=out=") "(" literalList ")"
    fn array_comparison(&mut self, field: String) -> Result<FilterNode, FilterError> {
        let op: CompareOp = self.eat(TokenType::ArrayCompare)?.value.parse()?;
        let items = self.parenthesized_list()?;
        Ok(FilterNode::comparison(field, op, CompareValue::List(items)))
    }

    fn parenthesized_list(&mut self) -> Result<Vec<Literal>, FilterError> {
        self.eat(TokenType::ContextStart)?;
        let items = self.literal_list()?;
        self.eat(TokenType::ContextEnd)?;
        Ok(items)
    }

    /// literalList := literal ("," literal)*
    ///
    /// The separator is the OR token; inside a list it only separates.
    fn literal_list(&mut self) -> Result<Vec<Literal>, FilterError> {
        let mut items = vec![self.literal()?];
        while self.lookahead_type() == Some(TokenType::OrComposite) {
            self.eat(TokenType::OrComposite)?;
            items.push(self.literal()?);
        }
        Ok(items)
    }

    /// literal := boolLiteral | quotedString | numericLiteral | objectId
    fn literal(&mut self) -> Result<Literal, FilterError> {
        let Some(token) = self.lookahead else {
            return Err(FilterError::UnexpectedInputEnd {
                expected: Expected::Literal,
            });
        };

        match token.token_type {
            TokenType::BoolLiteral => {
                self.eat(TokenType::BoolLiteral)?;
                Ok(Literal::Bool(token.value.eq_ignore_ascii_case("true")))
            }
            TokenType::QuotedStringLiteral => self.string_literal().map(Literal::String),
            TokenType::NumericLiteral => self.numeric_literal(),
            TokenType::ObjectIdLiteral => self.object_id_literal(),
            actual => Err(FilterError::UnexpectedTokenType {
                position: self.lookahead_start(),
                actual,
                expected: Expected::Literal,
            }),
        }
    }

    fn string_literal(&mut self) -> Result<String, FilterError> {
        let token = self.eat(TokenType::QuotedStringLiteral)?;
        Ok(strip_quotes(token.value).to_string())
    }

    /// A '.' makes the literal a float, anything else is a 64-bit integer.
    /// Values out of range for either fail instead of saturating.
    fn numeric_literal(&mut self) -> Result<Literal, FilterError> {
        let position = self.lookahead_start();
        let text = self.eat(TokenType::NumericLiteral)?.value;

        let invalid = || FilterError::InvalidNumber {
            position,
            literal: text.to_string(),
        };
        if text.contains('.') {
            match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Literal::Float(value)),
                _ => Err(invalid()),
            }
        } else {
            text.parse::<i64>().map(Literal::Int).map_err(|_| invalid())
        }
    }

    fn object_id_literal(&mut self) -> Result<Literal, FilterError> {
        let text = self.eat(TokenType::ObjectIdLiteral)?.value;
        let hex = text
            .strip_prefix(OBJECT_ID_PREFIX)
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or_else(|| FilterError::UnexpectedInput(text.to_string()))?;
        Ok(Literal::ObjectId(hex.to_ascii_lowercase()))
    }
}

/// Joins `lefts` and `right` under `op`. A right side that already is a
/// node of the same operator is merged into the same node, so chains like
/// `a;(b;c)` end up as one n-ary node.
fn combine(
    mut lefts: Vec<FilterNode>,
    op: BoolOp,
    right: FilterNode,
) -> Result<FilterNode, FilterError> {
    match right {
        FilterNode::Boolean {
            op: right_op,
            children,
        } if right_op == op => lefts.extend(children),
        right => lefts.push(right),
    }
    FilterNode::boolean(op, lefts)
}

/// Removes exactly one pair of matching surrounding quotes
fn strip_quotes(text: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|quote| text.strip_prefix(quote)?.strip_suffix(quote))
        .unwrap_or(text)
}
