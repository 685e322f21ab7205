//! Shared domain model for the film retrieval engine: records, filters,
//! search traits, configuration and query understanding.

pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod logging;
pub mod query;
pub mod store;
pub mod traits;
pub mod types;

pub use config::Settings;
pub use error::{Error, Result};
pub use query::{RuleParser, SplitQuery};
pub use store::RecordStore;
pub use traits::{Embedder, LexicalSearcher, VectorSearcher};
pub use types::{FilterSpec, FusedResult, ParsedQuery, Record, RecordId, ScoredHit, SearchMode, SourceKind};
