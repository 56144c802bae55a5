//! Persistence for the linked document graph: Parquet for analysis, JSON
//! for downstream rendering.

mod error;
pub mod graph;

pub use error::StoreError;
pub use graph::{
    GraphStore, batch_to_entries, entries_to_batch, read_json, read_parquet, write_json,
    write_parquet,
};
