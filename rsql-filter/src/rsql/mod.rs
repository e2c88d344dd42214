pub mod escape;
mod parser;
mod types;

pub use parser::{Parser, ParserConfig};
pub use types::{BoolOp, CompareOp, CompareValue, FilterNode, Literal};
