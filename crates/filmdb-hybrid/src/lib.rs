pub mod engine;
pub mod fusion;

pub use engine::{HybridSearchEngine, RetrievalParams, DEFAULT_EMBED_TIMEOUT};
pub use fusion::{fuse, FusionConfig};
