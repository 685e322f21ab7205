use std::cmp::Reverse;
use std::ops::Bound;
use std::path::Path;

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, ConstScoreQuery, FuzzyTermQuery, Occur, Query, RangeQuery, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::tokenizer::TokenStream;
use tantivy::{DocAddress, DocId, Index, IndexReader, ReloadPolicy, Score, SegmentReader, TantivyDocument, Term};
use tracing::debug;

use filmdb_core::error::{Error, Result};
use filmdb_core::traits::LexicalSearcher;
use filmdb_core::types::{FilterSpec, ScoredHit};

use crate::tantivy_utils::{register_tokenizers, LexicalFields, POSITION_FIELD};

/// Terms at or below this many characters are never fuzzed.
const MIN_FUZZY_CHARS: usize = 2;
const FUZZY_DISTANCE: u8 = 1;

#[derive(Debug, Clone, Copy)]
pub struct LexicalOptions {
	/// Edit-distance-1 expansion on actors, characters and director.
	pub fuzzy: bool,
}

impl Default for LexicalOptions {
	fn default() -> Self { Self { fuzzy: true } }
}

/// Read-only handle over a built tantivy index.
pub struct LexicalIndex {
	index: Index,
	reader: IndexReader,
	fields: LexicalFields,
	options: LexicalOptions,
}

fn unavailable(e: impl std::fmt::Display) -> Error { Error::IndexUnavailable(e.to_string()) }
fn failed(e: impl std::fmt::Display) -> Error { Error::Operation(e.to_string()) }

impl LexicalIndex {
	pub fn open(index_dir: &Path, options: LexicalOptions) -> Result<Self> {
		if !index_dir.join("meta.json").exists() {
			return Err(Error::IndexUnavailable(format!("no lexical index at {}", index_dir.display())));
		}
		let index = Index::open_in_dir(index_dir).map_err(unavailable)?;
		Self::from_index(index, options).map_err(unavailable)
	}

	pub(crate) fn from_index(index: Index, options: LexicalOptions) -> tantivy::Result<Self> {
		register_tokenizers(&index);
		let fields = LexicalFields::from_schema(&index.schema())?;
		let reader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		Ok(Self { index, reader, fields, options })
	}

	pub fn options(&self) -> LexicalOptions { self.options }

	pub fn num_docs(&self) -> u64 { self.reader.searcher().num_docs() }

	/// Analyze `text` with the index's own analyzer; duplicates removed, order kept.
	fn terms(&self, text: &str) -> Result<Vec<String>> {
		let mut analyzer = self.index.tokenizer_for_field(self.fields.title).map_err(failed)?;
		let mut stream = analyzer.token_stream(text);
		let mut terms: Vec<String> = Vec::new();
		while let Some(token) = stream.next() {
			if !terms.contains(&token.text) { terms.push(token.text.clone()); }
		}
		Ok(terms)
	}

	/// ANY term in ANY field.
	fn term_clause(&self, terms: &[String]) -> Box<dyn Query> {
		let f = &self.fields;
		let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
		for term in terms {
			for field in f.text_fields() {
				clauses.push((Occur::Should, Box::new(TermQuery::new(Term::from_field_text(field, term), IndexRecordOption::WithFreqs))));
			}
			clauses.push((Occur::Should, Box::new(TermQuery::new(Term::from_field_text(f.genres, term), IndexRecordOption::WithFreqs))));
			if self.options.fuzzy && term.chars().count() > MIN_FUZZY_CHARS {
				for field in f.fuzzy_fields() {
					clauses.push((Occur::Should, Box::new(FuzzyTermQuery::new(Term::from_field_text(field, term), FUZZY_DISTANCE, true))));
				}
			}
		}
		Box::new(BooleanQuery::new(clauses))
	}

	/// Hard constraints; each contributes nothing to the score.
	fn filter_clauses(&self, filters: &FilterSpec) -> Vec<(Occur, Box<dyn Query>)> {
		let f = &self.fields;
		let mut queries: Vec<Box<dyn Query>> = Vec::new();
		if filters.has_year() {
			let bound = |v: Option<u32>| v.map_or(Bound::Unbounded, |y| Bound::Included(Term::from_field_i64(f.year, i64::from(y))));
			queries.push(Box::new(RangeQuery::new(bound(filters.year_min), bound(filters.year_max))));
		}
		if let Some(genre) = filters.genre() {
			queries.push(Box::new(TermQuery::new(Term::from_field_text(f.genres, &genre), IndexRecordOption::Basic)));
		}
		if let Some(director) = filters.director() {
			queries.push(Box::new(TermQuery::new(Term::from_field_text(f.director_exact, &director), IndexRecordOption::Basic)));
		}
		if filters.has_rating() {
			let bound = |v: Option<f32>| v.map_or(Bound::Unbounded, |r| Bound::Included(Term::from_field_f64(f.rating, f64::from(r))));
			queries.push(Box::new(RangeQuery::new(bound(filters.rating_min), bound(filters.rating_max))));
		}
		queries.into_iter().map(|q| (Occur::Must, Box::new(ConstScoreQuery::new(q, 0.0)) as Box<dyn Query>)).collect()
	}

	fn build_query(&self, search_term: &str, filters: &FilterSpec) -> Result<Option<Box<dyn Query>>> {
		let terms = self.terms(search_term)?;
		let mut clauses = self.filter_clauses(filters);
		if terms.is_empty() && clauses.is_empty() { return Ok(None); }
		if !terms.is_empty() { clauses.push((Occur::Must, self.term_clause(&terms))); }
		debug!(terms = ?terms, filters = ?filters, "lexical query");
		Ok(Some(Box::new(BooleanQuery::new(clauses))))
	}

	fn hit_keys(&self, searcher: &tantivy::Searcher, addr: DocAddress) -> Result<(u64, u64)> {
		let doc: TantivyDocument = searcher.doc(addr).map_err(failed)?;
		let id = doc.get_first(self.fields.id).and_then(|v| v.as_u64());
		let position = doc.get_first(self.fields.position).and_then(|v| v.as_u64());
		match (id, position) {
			(Some(id), Some(position)) => Ok((id, position)),
			_ => Err(Error::Operation(format!("document {addr:?} lacks id or position"))),
		}
	}
}

impl LexicalSearcher for LexicalIndex {
	fn search(&self, search_term: &str, filters: &FilterSpec, limit: usize) -> Result<Vec<ScoredHit>> {
		if limit == 0 { return Ok(Vec::new()); }
		let Some(query) = self.build_query(search_term, filters)? else { return Ok(Vec::new()) };

		let searcher = self.reader.searcher();
		// Ties are ranked by insertion position inside the collector, so the
		// limit cut never depends on segment layout.
		let collector = TopDocs::with_limit(limit).tweak_score(|segment: &SegmentReader| {
			let positions = segment.fast_fields().u64(POSITION_FIELD).ok();
			move |doc: DocId, score: Score| {
				let position = positions.as_ref().and_then(|c| c.first(doc)).unwrap_or(u64::MAX);
				(score, Reverse(position))
			}
		});
		let top_docs = searcher.search(&*query, &collector).map_err(failed)?;

		let mut scored: Vec<(f32, u64, u64)> = Vec::with_capacity(top_docs.len());
		for ((score, _), addr) in top_docs {
			let (id, position) = self.hit_keys(&searcher, addr)?;
			scored.push((score, position, id));
		}
		scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

		Ok(scored
			.into_iter()
			.enumerate()
			.map(|(i, (score, _, id))| ScoredHit { record_id: id, raw_score: score, rank: i + 1 })
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::index::to_document;
	use crate::tantivy_utils::build_schema;
	use filmdb_core::types::Record;
	use tantivy::IndexWriter;

	fn twin(id: u64) -> Record {
		Record { id, title: "Twin Peaks".into(), ..Record::default() }
	}

	#[test]
	fn tie_cut_follows_position_across_segments() {
		let index = Index::create_in_ram(build_schema());
		register_tokenizers(&index);
		let fields = LexicalFields::from_schema(&index.schema()).unwrap();
		let mut writer: IndexWriter = index.writer_with_num_threads(1, 15_000_000).unwrap();
		// later positions land in the first segment
		for (position, id) in [(2u64, 30u64), (3, 40)] {
			writer.add_document(to_document(&fields, &twin(id), position)).unwrap();
		}
		writer.commit().unwrap();
		for (position, id) in [(0u64, 10u64), (1, 20)] {
			writer.add_document(to_document(&fields, &twin(id), position)).unwrap();
		}
		writer.commit().unwrap();

		let lexical = LexicalIndex::from_index(index, LexicalOptions::default()).unwrap();
		assert_eq!(lexical.reader.searcher().segment_readers().len(), 2);
		let hits = lexical.search("twin", &FilterSpec::default(), 2).unwrap();
		assert_eq!(hits.iter().map(|h| h.record_id).collect::<Vec<_>>(), vec![10, 20]);
	}
}
