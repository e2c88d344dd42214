/// AST types for RSQL filter expressions
use crate::errors::FilterError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Literal {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// 24 lowercase hex digits
    ObjectId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,         // ==
    Ne,         // !=
    Gt,         // =gt=
    Ge,         // =ge=
    Lt,         // =lt=
    Le,         // =le=
    StartsWith, // =sw=
    EndsWith,   // =ew=
    In,         // =in=
    NotIn,      // =out=
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CompareValue {
    Single(Literal),
    List(Vec<Literal>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BoolOp {
    And, // ;
    Or,  // ,
}

/// Filter expression tree. `Boolean` nodes always hold at least two
/// children, and chains of the same operator are flattened into one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum FilterNode {
    Comparison {
        field: String,
        op: CompareOp,
        value: CompareValue,
    },
    Boolean {
        op: BoolOp,
        children: Vec<FilterNode>,
    },
}

impl FilterNode {
    pub fn comparison(field: impl Into<String>, op: CompareOp, value: CompareValue) -> Self {
        FilterNode::Comparison {
            field: field.into(),
            op,
            value,
        }
    }

    /// Builds a boolean node, rejecting fewer than two children
    pub fn boolean(op: BoolOp, children: Vec<FilterNode>) -> Result<Self, FilterError> {
        if children.len() < 2 {
            return Err(FilterError::UnexpectedInput(format!(
                "{} with {} operand(s)",
                op,
                children.len()
            )));
        }
        Ok(FilterNode::Boolean { op, children })
    }
}

impl FromStr for CompareOp {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(CompareOp::Eq),
            "!=" => Ok(CompareOp::Ne),
            "=gt=" => Ok(CompareOp::Gt),
            "=ge=" => Ok(CompareOp::Ge),
            "=lt=" => Ok(CompareOp::Lt),
            "=le=" => Ok(CompareOp::Le),
            "=sw=" => Ok(CompareOp::StartsWith),
            "=ew=" => Ok(CompareOp::EndsWith),
            "=in=" => Ok(CompareOp::In),
            "=out=" => Ok(CompareOp::NotIn),
            _ => Err(FilterError::UnexpectedInput(s.to_string())),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Eq => write!(f, "=="),
            CompareOp::Ne => write!(f, "!="),
            CompareOp::Gt => write!(f, "=gt="),
            CompareOp::Ge => write!(f, "=ge="),
            CompareOp::Lt => write!(f, "=lt="),
            CompareOp::Le => write!(f, "=le="),
            CompareOp::StartsWith => write!(f, "=sw="),
            CompareOp::EndsWith => write!(f, "=ew="),
            CompareOp::In => write!(f, "=in="),
            CompareOp::NotIn => write!(f, "=out="),
        }
    }
}

impl fmt::Display for BoolOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoolOp::And => write!(f, ";"),
            BoolOp::Or => write!(f, ","),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) if s.contains('"') => write!(f, "'{}'", s),
            Literal::String(s) => write!(f, "\"{}\"", s),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => {
                // keep the '.', otherwise the value reparses as an integer
                let text = x.to_string();
                if text.contains('.') {
                    write!(f, "{}", text)
                } else {
                    write!(f, "{}.0", text)
                }
            }
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::ObjectId(hex) => write!(f, "$oid({})", hex),
        }
    }
}

impl fmt::Display for CompareValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareValue::Single(literal) => write!(f, "{}", literal),
            CompareValue::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Prints RSQL text. Trees produced by [`Parser::parse`](crate::Parser::parse)
/// reparse into an equal tree; a hand-built boolean node nested directly
/// under one with the same operator comes back flattened.
impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Comparison { field, op, value } => write!(f, "{}{}{}", field, op, value),
            FilterNode::Boolean { op, children } => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", op)?;
                    }
                    match child {
                        FilterNode::Boolean { .. } => write!(f, "({})", child)?,
                        FilterNode::Comparison { .. } => write!(f, "{}", child)?,
                    }
                }
                Ok(())
            }
        }
    }
}
