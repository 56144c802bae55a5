pub mod document;
mod error;
pub mod pattern;
pub mod schema;
pub mod sort_key;
pub mod symbol;

pub use document::{
    ClassifiedDocument, DocType, GraphEntry, GraphLink, LinkEdge, LinkMethod, LinkedDocument,
    StructuredDocument,
};
pub use error::ConfigError;
pub use pattern::{Pattern, Template, load_patterns, parse_patterns};
pub use schema::graph;
pub use sort_key::symbol_sort_key;
