//! Exact inner-product k-NN over a contiguous row-major matrix.

use filmdb_core::error::{Error, Result};
use filmdb_core::types::RecordId;

/// L2-normalize in place. The zero vector is left as is.
pub fn l2_normalize(v: &mut [f32]) {
	let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
	if norm > 0.0 && norm.is_finite() {
		for x in v.iter_mut() { *x /= norm; }
	}
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
	a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
	dim: usize,
	ids: Vec<RecordId>,
	data: Vec<f32>,
}

impl FlatIndex {
	pub fn new(dim: usize) -> Self {
		Self { dim, ids: Vec::new(), data: Vec::new() }
	}

	pub fn with_capacity(dim: usize, rows: usize) -> Self {
		Self { dim, ids: Vec::with_capacity(rows), data: Vec::with_capacity(rows * dim) }
	}

	pub fn dim(&self) -> usize { self.dim }
	pub fn len(&self) -> usize { self.ids.len() }
	pub fn is_empty(&self) -> bool { self.ids.is_empty() }
	pub fn ids(&self) -> &[RecordId] { &self.ids }

	/// Row `i` as stored (normalized).
	pub fn vector(&self, i: usize) -> Option<&[f32]> {
		(i < self.len()).then(|| &self.data[i * self.dim..(i + 1) * self.dim])
	}

	/// Append one row; the vector is normalized on the way in.
	pub fn push(&mut self, id: RecordId, mut vector: Vec<f32>) -> Result<()> {
		if vector.len() != self.dim {
			return Err(Error::Operation(format!("vector for record {id} has {} dims, index has {}", vector.len(), self.dim)));
		}
		l2_normalize(&mut vector);
		self.ids.push(id);
		self.data.extend_from_slice(&vector);
		Ok(())
	}

	/// Top `k` rows by inner product with `query`, best first. Equal scores
	/// keep row order. Returns `(id, score)` pairs.
	pub fn top_k(&self, query: &[f32], k: usize) -> Result<Vec<(RecordId, f32)>> {
		if query.len() != self.dim {
			return Err(Error::Embedding(format!("query has {} dims, index has {}", query.len(), self.dim)));
		}
		if k == 0 || self.is_empty() { return Ok(Vec::new()); }
		let mut scored: Vec<(usize, f32)> = self
			.data
			.chunks_exact(self.dim)
			.enumerate()
			.map(|(row, v)| (row, dot(v, query)))
			.collect();
		scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
		scored.truncate(k);
		Ok(scored.into_iter().map(|(row, score)| (self.ids[row], score)).collect())
	}
}
