//! Async retrieval orchestrator.
//!
//! Both paths run on blocking tasks; the query embedding is the only step
//! under a timeout. In fused mode a failed vector path falls back to lexical
//! results, an unavailable lexical index falls back to vector results, and
//! losing both is reported as `IndexUnavailable`.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use filmdb_core::config::Settings;
use filmdb_core::error::{Error, Result};
use filmdb_core::traits::{LexicalSearcher, VectorSearcher};
use filmdb_core::types::{FusedResult, ParsedQuery, ScoredHit, SearchMode};

use crate::fusion::{fuse, FusionConfig};

pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-call retrieval knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalParams {
    pub mode: SearchMode,
    pub lexical_limit: usize,
    pub vector_k: usize,
    pub final_limit: usize,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self { mode: SearchMode::Fused, lexical_limit: 100, vector_k: 100, final_limit: 20 }
    }
}

impl From<&Settings> for RetrievalParams {
    fn from(s: &Settings) -> Self {
        Self {
            mode: s.search.strategy,
            lexical_limit: s.search.lexical_limit,
            vector_k: s.search.vector_k,
            final_limit: s.search.final_limit,
        }
    }
}

impl RetrievalParams {
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_final_limit(mut self, final_limit: usize) -> Self {
        self.final_limit = final_limit;
        self
    }
}

pub struct HybridSearchEngine {
    lexical: Option<Arc<dyn LexicalSearcher>>,
    vector: Option<Arc<dyn VectorSearcher>>,
    fusion: FusionConfig,
    embed_timeout: Duration,
}

impl HybridSearchEngine {
    pub fn new(fusion: FusionConfig) -> Self {
        Self { lexical: None, vector: None, fusion, embed_timeout: DEFAULT_EMBED_TIMEOUT }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(FusionConfig::from(&settings.fusion))
            .with_embed_timeout(Duration::from_millis(settings.embedding.timeout_ms))
    }

    pub fn with_lexical(mut self, lexical: Arc<dyn LexicalSearcher>) -> Self {
        self.lexical = Some(lexical);
        self
    }

    pub fn with_vector(mut self, vector: Arc<dyn VectorSearcher>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    pub fn has_lexical(&self) -> bool { self.lexical.is_some() }

    pub fn has_vector(&self) -> bool { self.vector.is_some() }

    /// Run one query. The result is ordered and bounded to `final_limit`.
    pub async fn retrieve(
        &self,
        lexical_query: &ParsedQuery,
        vector_query: &ParsedQuery,
        params: &RetrievalParams,
    ) -> Result<Vec<FusedResult>> {
        debug!(
            mode = %params.mode,
            lexical_term = %lexical_query.search_term,
            vector_term = %vector_query.search_term,
            filters = ?lexical_query.filters,
            "retrieve"
        );

        let mut results = match params.mode {
            SearchMode::Lexical => {
                let hits = self.search_lexical(lexical_query, params.lexical_limit).await?;
                fuse(&hits, &[], &self.fusion)
            }
            SearchMode::Vector => {
                let hits = self.search_vector(vector_query, params.vector_k).await?;
                fuse(&[], &hits, &self.fusion)
            }
            SearchMode::Fused => {
                let (lexical, vector) = tokio::join!(
                    self.search_lexical(lexical_query, params.lexical_limit),
                    self.search_vector(vector_query, params.vector_k),
                );
                self.fuse_or_degrade(lexical, vector)?
            }
        };
        results.truncate(params.final_limit);
        Ok(results)
    }

    fn fuse_or_degrade(
        &self,
        lexical: Result<Vec<ScoredHit>>,
        vector: Result<Vec<ScoredHit>>,
    ) -> Result<Vec<FusedResult>> {
        match (lexical, vector) {
            (Ok(l), Ok(v)) => Ok(fuse(&l, &v, &self.fusion)),
            (Ok(l), Err(e)) if e.is_degradable() => {
                warn!(error = %e, "vector path failed, returning lexical results only");
                Ok(fuse(&l, &[], &self.fusion))
            }
            (Err(Error::IndexUnavailable(reason)), Ok(v)) => {
                warn!(reason = %reason, "lexical index unavailable, returning vector results only");
                Ok(fuse(&[], &v, &self.fusion))
            }
            (Err(l), Err(v)) if l.is_degradable() && v.is_degradable() => {
                Err(Error::IndexUnavailable(format!("both retrieval paths failed (lexical: {l}; vector: {v})")))
            }
            (Err(e), _) | (_, Err(e)) => Err(e),
        }
    }

    async fn search_lexical(&self, query: &ParsedQuery, limit: usize) -> Result<Vec<ScoredHit>> {
        let searcher = self
            .lexical
            .clone()
            .ok_or_else(|| Error::IndexUnavailable("lexical index not loaded".into()))?;
        let term = query.search_term.clone();
        let filters = query.filters.clone();
        tokio::task::spawn_blocking(move || searcher.search(&term, &filters, limit))
            .await
            .map_err(|e| Error::Operation(format!("lexical search task failed: {e}")))?
    }

    async fn search_vector(&self, query: &ParsedQuery, k: usize) -> Result<Vec<ScoredHit>> {
        let searcher = self
            .vector
            .clone()
            .ok_or_else(|| Error::IndexUnavailable("vector index not loaded".into()))?;
        if !query.has_term() {
            return Ok(Vec::new());
        }

        let text = query.search_term.clone();
        let embedder = Arc::clone(&searcher);
        let task = tokio::task::spawn_blocking(move || embedder.embed_query(&text));
        let embedding = match tokio::time::timeout(self.embed_timeout, task).await {
            Ok(Ok(embedding)) => embedding?,
            Ok(Err(e)) => return Err(Error::Embedding(format!("embedding task failed: {e}"))),
            Err(_) => {
                return Err(Error::Embedding(format!(
                    "query embedding timed out after {} ms",
                    self.embed_timeout.as_millis()
                )))
            }
        };

        let filters = query.filters.clone();
        tokio::task::spawn_blocking(move || searcher.search_embedding(&embedding, &filters, k))
            .await
            .map_err(|e| Error::Operation(format!("vector search task failed: {e}")))?
    }
}
