//! LanceDB connection and read-back of persisted vectors.

use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{Array, FixedSizeListArray, RecordBatch, UInt64Array};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{connect, Connection};
use std::path::Path;
use tracing::info;

use filmdb_core::error::{Error, Result};

use crate::flat::FlatIndex;
use crate::schema::{ID_COLUMN, VECTOR_COLUMN};

pub async fn open_db(db_dir: &Path) -> lancedb::Result<Connection> {
	connect(db_dir.to_string_lossy().as_ref()).execute().await
}

fn unavailable(e: impl std::fmt::Display) -> Error { Error::IndexUnavailable(e.to_string()) }

/// Read every row of `table` back into a [`FlatIndex`], preserving row order.
pub async fn load_flat_index(db_dir: &Path, table: &str) -> Result<FlatIndex> {
	if !db_dir.exists() {
		return Err(Error::IndexUnavailable(format!("no vector store at {}", db_dir.display())));
	}
	let db = open_db(db_dir).await.map_err(unavailable)?;
	let names = db.table_names().execute().await.map_err(unavailable)?;
	if !names.iter().any(|n| n == table) {
		return Err(Error::IndexUnavailable(format!("vector table '{table}' not found in {}", db_dir.display())));
	}
	let tbl = db.open_table(table).execute().await.map_err(unavailable)?;
	let total = tbl.count_rows(None).await.map_err(unavailable)?;
	if total == 0 { return Ok(FlatIndex::default()); }

	let mut stream = tbl.query().limit(total).execute().await.map_err(unavailable)?;
	let mut index: Option<FlatIndex> = None;
	while let Some(batch) = stream.try_next().await.map_err(unavailable)? {
		append_batch(&mut index, &batch)?;
	}
	let index = index.unwrap_or_default();
	info!(dir = %db_dir.display(), table, rows = index.len(), dim = index.dim(), "vector table loaded");
	Ok(index)
}

fn append_batch(index: &mut Option<FlatIndex>, batch: &RecordBatch) -> Result<()> {
	let ids = batch
		.column_by_name(ID_COLUMN)
		.and_then(|c| c.as_any().downcast_ref::<UInt64Array>())
		.ok_or_else(|| Error::IndexUnavailable("vector table lacks a u64 id column".into()))?;
	let vectors = batch
		.column_by_name(VECTOR_COLUMN)
		.and_then(|c| c.as_any().downcast_ref::<FixedSizeListArray>())
		.ok_or_else(|| Error::IndexUnavailable("vector table lacks a fixed-size vector column".into()))?;
	let dim = usize::try_from(vectors.value_length()).map_err(unavailable)?;
	let index = index.get_or_insert_with(|| FlatIndex::new(dim));
	for row in 0..batch.num_rows() {
		if !vectors.is_valid(row) { continue; }
		let values = vectors.value(row);
		let values = values.as_primitive::<Float32Type>().values().to_vec();
		index.push(ids.value(row), values)?;
	}
	Ok(())
}
