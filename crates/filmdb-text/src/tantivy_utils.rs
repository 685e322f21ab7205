//! Schema and analyzers for the film lexical index.
use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, FAST, INDEXED, STORED};
use tantivy::tokenizer::{LowerCaser, RawTokenizer, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

use filmdb_core::query::STOP_WORDS;

pub const TEXT_ANALYZER: &str = "film_text";
pub const KEYWORD_ANALYZER: &str = "film_keyword";
pub const POSITION_FIELD: &str = "position";

/// Resolved field handles. Order of `text_fields` is the order clauses are built in.
#[derive(Debug, Clone, Copy)]
pub struct LexicalFields {
	pub id: Field,
	pub position: Field,
	pub title: Field,
	pub overview: Field,
	pub genres: Field,
	pub actors: Field,
	pub characters: Field,
	pub director: Field,
	pub director_exact: Field,
	pub year: Field,
	pub rating: Field,
}

impl LexicalFields {
	pub fn from_schema(schema: &Schema) -> tantivy::Result<Self> {
		Ok(Self {
			id: schema.get_field("id")?,
			position: schema.get_field(POSITION_FIELD)?,
			title: schema.get_field("title")?,
			overview: schema.get_field("overview")?,
			genres: schema.get_field("genres")?,
			actors: schema.get_field("actors")?,
			characters: schema.get_field("characters")?,
			director: schema.get_field("director")?,
			director_exact: schema.get_field("director_exact")?,
			year: schema.get_field("year")?,
			rating: schema.get_field("rating")?,
		})
	}

	/// Analyzed fields matched term-by-term.
	pub fn text_fields(&self) -> [Field; 5] {
		[self.title, self.overview, self.actors, self.characters, self.director]
	}

	/// Proper-noun fields that also get edit-distance-1 expansion.
	pub fn fuzzy_fields(&self) -> [Field; 3] {
		[self.actors, self.characters, self.director]
	}
}

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_u64_field("id", INDEXED | STORED | FAST);
	schema_builder.add_u64_field(POSITION_FIELD, STORED | FAST);

	let text_indexing = TextFieldIndexing::default()
		.set_tokenizer(TEXT_ANALYZER)
		.set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_indexing);
	for name in ["title", "overview", "actors", "characters", "director"] {
		schema_builder.add_text_field(name, text_options.clone());
	}

	let keyword_indexing = TextFieldIndexing::default()
		.set_tokenizer(KEYWORD_ANALYZER)
		.set_index_option(IndexRecordOption::WithFreqs);
	let keyword_options = TextOptions::default().set_indexing_options(keyword_indexing);
	schema_builder.add_text_field("genres", keyword_options.clone());
	schema_builder.add_text_field("director_exact", keyword_options);

	schema_builder.add_i64_field("year", INDEXED | FAST);
	schema_builder.add_f64_field("rating", INDEXED | FAST);
	schema_builder.build()
}

pub fn register_tokenizers(index: &Index) {
	let text = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(TEXT_ANALYZER, text);

	let keyword = TextAnalyzer::builder(RawTokenizer::default()).filter(LowerCaser).build();
	index.tokenizers().register(KEYWORD_ANALYZER, keyword);
}
