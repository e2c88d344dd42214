//! RSQL filter queries (`age=ge=18;name=="steven"`) compiled into a boolean
//! filter tree and rendered as MongoDB query documents.
//!
//! ```
//! use rsql_filter::{mongo, Parser, Policy};
//!
//! let parser = Parser::new(Some(Policy::whitelist(["name", "age"])));
//! let filter = parser.parse(r#"name=="steven";age=ge=18"#).unwrap();
//! let document = mongo::render_filter(filter.as_ref());
//! assert_eq!(
//!     document.to_string(),
//!     r#"{"$and":[{"name":"steven"},{"age":{"$gte":18}}]}"#
//! );
//! ```

pub mod config;
pub mod errors;
pub mod mongo;
pub mod rsql;
pub mod tokenizer;

pub use config::FilterConfig;
pub use errors::{Expected, FilterError};
pub use rsql::{BoolOp, CompareOp, CompareValue, FilterNode, Literal, Parser, ParserConfig};
pub use tokenizer::{Policy, PolicyMode};
