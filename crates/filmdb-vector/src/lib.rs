//! filmdb-vector
//!
//! Flat inner-product index over record embeddings, the batch build that
//! fills it, LanceDB persistence, and post-filtered search.

pub mod build;
pub mod document;
pub mod flat;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use build::build_flat_index;
pub use document::embedding_text;
pub use flat::FlatIndex;
pub use search::VectorIndex;
pub use table::load_flat_index;
pub use writer::save_flat_index;
