use crate::error::Result;
use crate::types::{FilterSpec, ScoredHit};

/// Text to fixed-length vector. Implementations must be deterministic for
/// identical input and return L2-normalized vectors of length `dim()`.
pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

/// Keyword retrieval with filters applied as hard constraints during search.
pub trait LexicalSearcher: Send + Sync {
    fn search(&self, search_term: &str, filters: &FilterSpec, limit: usize) -> Result<Vec<ScoredHit>>;
}

/// Dense retrieval with filters applied after the k-NN step.
///
/// The two halves are separate so callers can bound the embedding step
/// (the dominant latency) with a timeout.
pub trait VectorSearcher: Send + Sync {
    fn embed_query(&self, text: &str) -> Result<Vec<f32>>;
    fn search_embedding(&self, query: &[f32], filters: &FilterSpec, k: usize) -> Result<Vec<ScoredHit>>;

    fn search(&self, search_term: &str, filters: &FilterSpec, k: usize) -> Result<Vec<ScoredHit>> {
        if search_term.trim().is_empty() {
            return Ok(Vec::new());
        }
        let query = self.embed_query(search_term)?;
        self.search_embedding(&query, filters, k)
    }
}
