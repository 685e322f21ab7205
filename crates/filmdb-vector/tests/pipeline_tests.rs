use std::sync::Arc;

use filmdb_core::error::Error;
use filmdb_core::store::RecordStore;
use filmdb_core::traits::{Embedder, VectorSearcher};
use filmdb_core::types::{FilterSpec, Record, RecordId};
use filmdb_embed::HashEmbedder;
use filmdb_vector::{build_flat_index, FlatIndex, VectorIndex};

fn movie(id: RecordId, title: &str, overview: &str, year: u32, rating: f32) -> Record {
    Record { id, title: title.into(), overview: overview.into(), year, rating, ..Record::default() }
}

fn store() -> Arc<RecordStore> {
    Arc::new(
        RecordStore::new(vec![
            movie(1, "Star Drift", "astronauts drift through deep space toward a dying star", 2014, 8.6),
            movie(2, "Harbor Lights", "a fisherman falls in love in a quiet harbor town", 1995, 7.1),
            movie(3, "Orbit", "deep space astronauts repair a broken orbit station", 1999, 6.4),
            movie(4, "Bakery", "a baker opens a small bakery in paris", 2001, 0.0),
        ])
        .expect("store"),
    )
}

fn index(store: &Arc<RecordStore>) -> VectorIndex {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::new(512));
    let flat = build_flat_index(store, embedder.as_ref(), 2).expect("build");
    VectorIndex::new(flat, store.clone(), embedder).expect("index")
}

struct BrokenEmbedder;

impl Embedder for BrokenEmbedder {
    fn dim(&self) -> usize { 4 }
    fn max_len(&self) -> usize { 8 }
    fn embed_batch(&self, _texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        anyhow::bail!("model not loaded")
    }
}

#[test]
fn nearest_records_come_first() {
    let store = store();
    let index = index(&store);
    let hits = index.search("deep space astronauts", &FilterSpec::default(), 4).expect("search");
    assert_eq!(hits.len(), 4);
    let top_two: Vec<RecordId> = hits.iter().take(2).map(|h| h.record_id).collect();
    assert!(top_two.contains(&1) && top_two.contains(&3));
    assert!(hits.windows(2).all(|w| w[0].raw_score >= w[1].raw_score));
    assert!(hits.iter().all(|h| h.raw_score <= 1.0 + 1e-5));
}

#[test]
fn unmatched_rating_filter_yields_empty_not_error() {
    let store = store();
    let index = index(&store);
    let filters = FilterSpec { rating_min: Some(9.0), ..FilterSpec::default() };
    let hits = index.search("deep space astronauts", &filters, 4).expect("search");
    assert!(hits.is_empty());
}

#[test]
fn survivors_are_reranked_from_one() {
    let store = store();
    let index = index(&store);
    let nineties = FilterSpec { year_min: Some(1990), year_max: Some(1999), ..FilterSpec::default() };
    let hits = index.search("deep space astronauts", &nineties, 4).expect("search");
    let found: Vec<RecordId> = hits.iter().map(|h| h.record_id).collect();
    assert_eq!(found.first(), Some(&3));
    assert!(found.iter().all(|id| *id == 2 || *id == 3));
    assert_eq!(hits.iter().map(|h| h.rank).collect::<Vec<_>>(), (1..=hits.len()).collect::<Vec<_>>());
}

#[test]
fn filtering_happens_after_the_k_cut() {
    let store = store();
    let index = index(&store);
    let query = index.embed_query("astronauts drift through deep space toward a dying star").unwrap();
    let unfiltered = index.search_embedding(&query, &FilterSpec::default(), 1).unwrap();
    assert_eq!(unfiltered[0].record_id, 1);

    // record 3 also matches the filter but never makes the candidate set
    let nineties = FilterSpec { year_max: Some(1999), ..FilterSpec::default() };
    assert!(index.search_embedding(&query, &nineties, 1).unwrap().is_empty());
    assert!(!index.search_embedding(&query, &nineties, 4).unwrap().is_empty());
}

#[test]
fn blank_term_skips_embedding() {
    let store = store();
    let mut flat = FlatIndex::new(4);
    flat.push(1, vec![1.0, 0.0, 0.0, 0.0]).unwrap();
    let index = VectorIndex::new(flat, store, Arc::new(BrokenEmbedder)).unwrap();
    assert!(index.search("   ", &FilterSpec::default(), 5).unwrap().is_empty());
    let err = index.search("space", &FilterSpec::default(), 5).unwrap_err();
    assert!(matches!(err, Error::Embedding(_)));
}

#[test]
fn punctuation_only_query_is_an_embedding_error() {
    let store = store();
    let index = index(&store);
    for query in ["?!", "...", " -- "] {
        let err = index.search(query, &FilterSpec::default(), 4).unwrap_err();
        assert!(matches!(err, Error::Embedding(_)), "{query:?} gave {err:?}");
    }
}

#[test]
fn records_missing_from_store_are_dropped() {
    let store = store();
    let mut flat = FlatIndex::new(4);
    flat.push(99, vec![1.0, 0.0, 0.0, 0.0]).unwrap();
    flat.push(2, vec![0.5, 0.5, 0.0, 0.0]).unwrap();
    let index = VectorIndex::new(flat, store, Arc::new(BrokenEmbedder)).unwrap();
    let hits = index.search_embedding(&[1.0, 0.0, 0.0, 0.0], &FilterSpec::default(), 5).unwrap();
    assert_eq!(hits.iter().map(|h| (h.record_id, h.rank)).collect::<Vec<_>>(), vec![(2, 1)]);
}

#[test]
fn dimension_mismatch_is_rejected() {
    let store = store();
    let mut flat = FlatIndex::new(3);
    flat.push(1, vec![1.0, 0.0, 0.0]).unwrap();
    assert!(matches!(VectorIndex::new(flat, store, Arc::new(BrokenEmbedder)), Err(Error::InvalidConfig(_))));
}
