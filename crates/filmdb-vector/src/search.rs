use std::sync::Arc;

use tracing::debug;

use filmdb_core::error::{Error, Result};
use filmdb_core::filter::matches;
use filmdb_core::store::RecordStore;
use filmdb_core::traits::{Embedder, VectorSearcher};
use filmdb_core::types::{FilterSpec, ScoredHit};

use crate::flat::{l2_normalize, FlatIndex};

/// Query handle: flat vectors, the records they point at, and the embedder
/// that produced them.
pub struct VectorIndex {
	flat: FlatIndex,
	store: Arc<RecordStore>,
	embedder: Arc<dyn Embedder>,
}

impl VectorIndex {
	pub fn new(flat: FlatIndex, store: Arc<RecordStore>, embedder: Arc<dyn Embedder>) -> Result<Self> {
		if !flat.is_empty() && flat.dim() != embedder.dim() {
			return Err(Error::InvalidConfig(format!(
				"vector index has {} dims but the embedder produces {}",
				flat.dim(),
				embedder.dim()
			)));
		}
		Ok(Self { flat, store, embedder })
	}

	pub fn len(&self) -> usize { self.flat.len() }
	pub fn is_empty(&self) -> bool { self.flat.is_empty() }
}

impl VectorSearcher for VectorIndex {
	fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
		let mut query = self.embedder.embed(text).map_err(|e| Error::Embedding(e.to_string()))?;
		let norm = query.iter().map(|x| x * x).sum::<f32>().sqrt();
		if !norm.is_finite() || norm == 0.0 {
			return Err(Error::Embedding(format!("no usable embedding for query '{text}'")));
		}
		l2_normalize(&mut query);
		Ok(query)
	}

	/// Top-`k` by inner product, then drop candidates failing `filters`.
	/// Survivors are re-ranked from 1 in their original order.
	fn search_embedding(&self, query: &[f32], filters: &FilterSpec, k: usize) -> Result<Vec<ScoredHit>> {
		if self.flat.is_empty() { return Ok(Vec::new()); }
		let candidates = self.flat.top_k(query, k)?;
		let retrieved = candidates.len();
		let hits: Vec<ScoredHit> = candidates
			.into_iter()
			.filter(|(id, _)| self.store.get(*id).is_some_and(|record| matches(record, filters)))
			.enumerate()
			.map(|(i, (record_id, raw_score))| ScoredHit { record_id, raw_score, rank: i + 1 })
			.collect();
		debug!(retrieved, kept = hits.len(), "vector post-filter");
		Ok(hits)
	}
}
