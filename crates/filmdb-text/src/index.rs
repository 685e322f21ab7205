use anyhow::Result;
use std::path::Path;
use tantivy::{Index, IndexWriter, TantivyDocument};
use tracing::info;

use filmdb_core::store::RecordStore;
use filmdb_core::types::Record;

use crate::search::{LexicalIndex, LexicalOptions};
use crate::tantivy_utils::{build_schema, register_tokenizers, LexicalFields};

const DEFAULT_MEMORY_BUDGET: usize = 100_000_000;

/// Writes every record of a store into a fresh tantivy index.
///
/// One writer thread and one commit. Each document stores its insertion
/// position as a fast field; the searcher breaks score ties on it, so the
/// ranking holds however many segments the memory budget produces.
pub struct LexicalIndexBuilder {
	memory_budget: usize,
	options: LexicalOptions,
}

impl Default for LexicalIndexBuilder {
	fn default() -> Self {
		Self { memory_budget: DEFAULT_MEMORY_BUDGET, options: LexicalOptions::default() }
	}
}

impl LexicalIndexBuilder {
	pub fn new() -> Self { Self::default() }

	pub fn with_options(mut self, options: LexicalOptions) -> Self {
		self.options = options;
		self
	}

	/// Recreates `index_dir` from scratch.
	pub fn build_in_dir(&self, store: &RecordStore, index_dir: &Path) -> Result<LexicalIndex> {
		if index_dir.exists() { std::fs::remove_dir_all(index_dir)?; }
		std::fs::create_dir_all(index_dir)?;
		let index = Index::create_in_dir(index_dir, build_schema())?;
		let count = self.write(&index, store)?;
		info!(dir = %index_dir.display(), documents = count, "lexical index written");
		Ok(LexicalIndex::from_index(index, self.options)?)
	}

	pub fn build_in_ram(&self, store: &RecordStore) -> Result<LexicalIndex> {
		let index = Index::create_in_ram(build_schema());
		self.write(&index, store)?;
		Ok(LexicalIndex::from_index(index, self.options)?)
	}

	fn write(&self, index: &Index, store: &RecordStore) -> Result<usize> {
		register_tokenizers(index);
		let fields = LexicalFields::from_schema(&index.schema())?;
		let mut writer: IndexWriter = index.writer_with_num_threads(1, self.memory_budget)?;
		let mut count = 0;
		for (position, record) in store.iter().enumerate() {
			writer.add_document(to_document(&fields, record, position as u64))?;
			count += 1;
		}
		writer.commit()?;
		Ok(count)
	}
}

pub(crate) fn to_document(fields: &LexicalFields, record: &Record, position: u64) -> TantivyDocument {
	let mut doc = TantivyDocument::default();
	doc.add_u64(fields.id, record.id);
	doc.add_u64(fields.position, position);
	doc.add_text(fields.title, &record.title);
	doc.add_text(fields.overview, &record.overview);
	for genre in &record.genres { doc.add_text(fields.genres, genre); }
	for actor in &record.actors { doc.add_text(fields.actors, actor); }
	for character in &record.characters { doc.add_text(fields.characters, character); }
	if record.has_director() {
		doc.add_text(fields.director, &record.director);
		doc.add_text(fields.director_exact, record.director.trim());
	}
	// unknown year/rating are left out so range filters cannot match them
	if let Some(year) = record.known_year() { doc.add_i64(fields.year, i64::from(year)); }
	if let Some(rating) = record.known_rating() { doc.add_f64(fields.rating, f64::from(rating)); }
	doc
}
