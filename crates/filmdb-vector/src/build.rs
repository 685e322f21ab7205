use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use filmdb_core::store::RecordStore;
use filmdb_core::traits::Embedder;

use crate::document::embedding_text;
use crate::flat::FlatIndex;

fn progress_bar(len: usize) -> ProgressBar {
	let pb = ProgressBar::new(len as u64);
	let style = ProgressStyle::default_bar()
		.template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({percent}%) {msg}")
		.map(|s| s.progress_chars("#>-"))
		.unwrap_or_else(|_| ProgressStyle::default_bar());
	pb.set_style(style);
	pb
}

/// Embed every record in store order, `batch_size` texts per embedder call.
pub fn build_flat_index(store: &RecordStore, embedder: &dyn Embedder, batch_size: usize) -> Result<FlatIndex> {
	let batch_size = batch_size.max(1);
	let mut index = FlatIndex::with_capacity(embedder.dim(), store.len());
	let records: Vec<_> = store.iter().collect();
	let pb = progress_bar(records.len());

	for batch in records.chunks(batch_size) {
		let texts: Vec<String> = batch.iter().map(|r| embedding_text(r)).collect();
		let vectors = embedder.embed_batch(&texts)?;
		if vectors.len() != batch.len() {
			bail!("embedder returned {} vectors for {} texts", vectors.len(), batch.len());
		}
		for (record, vector) in batch.iter().zip(vectors) {
			index.push(record.id, vector)?;
		}
		pb.inc(batch.len() as u64);
	}
	pb.finish_with_message("embedded");
	info!(records = index.len(), dim = index.dim(), "vector index built");
	Ok(index)
}
