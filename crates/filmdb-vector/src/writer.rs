use anyhow::Result;
use arrow_array::{FixedSizeListArray, RecordBatch, RecordBatchIterator, UInt64Array};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::flat::FlatIndex;
use crate::schema::build_arrow_schema;
use crate::table::open_db;

const ROWS_PER_BATCH: usize = 1000;

/// Replace `table` under `db_dir` with the rows of `index`, in index order.
pub async fn save_flat_index(index: &FlatIndex, db_dir: &Path, table: &str) -> Result<()> {
	std::fs::create_dir_all(db_dir)?;
	let table_dir = db_dir.join(format!("{table}.lance"));
	if table_dir.exists() { std::fs::remove_dir_all(&table_dir)?; }

	let db = open_db(db_dir).await?;
	let dim = i32::try_from(index.dim())?;
	let schema = build_arrow_schema(dim);
	let mut batches = Vec::new();
	for start in (0..index.len()).step_by(ROWS_PER_BATCH) {
		let end = (start + ROWS_PER_BATCH).min(index.len());
		batches.push(to_record_batch(index, start, end, dim)?);
	}

	let mut batches = batches.into_iter();
	let first: Vec<_> = batches.next().into_iter().map(Ok).collect();
	let reader = RecordBatchIterator::new(first.into_iter(), schema.clone());
	let tbl = db.create_table(table, Box::new(reader)).execute().await?;
	for batch in batches {
		let reader = RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema.clone());
		tbl.add(Box::new(reader)).execute().await?;
	}
	info!(dir = %db_dir.display(), table, rows = index.len(), "vector table written");
	Ok(())
}

fn to_record_batch(index: &FlatIndex, start: usize, end: usize, dim: i32) -> Result<RecordBatch> {
	let ids = UInt64Array::from(index.ids()[start..end].to_vec());
	let vectors = (start..end).map(|i| index.vector(i).map(|v| v.iter().copied().map(Some).collect::<Vec<_>>()));
	let vectors = FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(vectors, dim);
	Ok(RecordBatch::try_new(build_arrow_schema(dim), vec![Arc::new(ids), Arc::new(vectors)])?)
}
