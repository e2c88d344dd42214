//! Renders filter trees as MongoDB query documents (extended JSON).

use crate::rsql::{BoolOp, CompareOp, CompareValue, FilterNode, Literal};
use serde_json::{json, Map, Value as JsonValue};

/// Renders an optional filter; the empty filter matches everything
pub fn render_filter(filter: Option<&FilterNode>) -> JsonValue {
    match filter {
        Some(node) => render(node),
        None => JsonValue::Object(Map::new()),
    }
}

pub fn render(node: &FilterNode) -> JsonValue {
    match node {
        FilterNode::Comparison { field, op, value } => {
            let mut document = Map::new();
            document.insert(field.clone(), render_condition(*op, value));
            JsonValue::Object(document)
        }
        FilterNode::Boolean { op, children } => {
            let key = match op {
                BoolOp::And => "$and",
                BoolOp::Or => "$or",
            };
            let mut document = Map::new();
            document.insert(
                key.to_string(),
                JsonValue::Array(children.iter().map(render).collect()),
            );
            JsonValue::Object(document)
        }
    }
}

fn render_condition(op: CompareOp, value: &CompareValue) -> JsonValue {
    let operand = render_value(value);
    match op {
        CompareOp::Eq => operand,
        CompareOp::Ne => json!({ "$ne": operand }),
        CompareOp::Gt => json!({ "$gt": operand }),
        CompareOp::Ge => json!({ "$gte": operand }),
        CompareOp::Lt => json!({ "$lt": operand }),
        CompareOp::Le => json!({ "$lte": operand }),
        CompareOp::In => json!({ "$in": operand }),
        CompareOp::NotIn => json!({ "$nin": operand }),
        CompareOp::StartsWith | CompareOp::EndsWith => {
            json!({ "$regex": wildcard_pattern(op, value) })
        }
    }
}

/// Anchored regex for `=sw=`/`=ew=`. The literal is escaped, so it only
/// ever matches itself.
pub fn wildcard_pattern(op: CompareOp, value: &CompareValue) -> String {
    let text = match value {
        CompareValue::Single(Literal::String(s)) => regex::escape(s),
        other => regex::escape(&other.to_string()),
    };
    match op {
        CompareOp::EndsWith => format!("{}$", text),
        _ => format!("^{}", text),
    }
}

fn render_value(value: &CompareValue) -> JsonValue {
    match value {
        CompareValue::Single(literal) => render_literal(literal),
        CompareValue::List(items) => JsonValue::Array(items.iter().map(render_literal).collect()),
    }
}

fn render_literal(literal: &Literal) -> JsonValue {
    match literal {
        Literal::String(s) => JsonValue::String(s.clone()),
        Literal::Int(i) => json!(i),
        Literal::Float(x) => json!(x),
        Literal::Bool(b) => JsonValue::Bool(*b),
        Literal::ObjectId(hex) => json!({ "$oid": hex }),
    }
}
