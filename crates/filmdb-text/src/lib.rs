//! filmdb-text
//!
//! Tantivy-backed lexical index over the film catalog: multi-field OR term
//! matching, fuzzy name expansion and hard year/genre/director/rating filters.

pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::LexicalIndexBuilder;
pub use search::{LexicalIndex, LexicalOptions};
