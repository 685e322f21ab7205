use filmdb_core::error::Error;
use filmdb_core::store::RecordStore;
use filmdb_core::traits::LexicalSearcher;
use filmdb_core::types::{FilterSpec, Record, RecordId};
use filmdb_text::{LexicalIndex, LexicalIndexBuilder, LexicalOptions};

fn movie(id: RecordId, title: &str, overview: &str) -> Record {
    Record { id, title: title.into(), overview: overview.into(), ..Record::default() }
}

fn catalog() -> RecordStore {
    let mut matrix = movie(1, "The Matrix", "A hacker learns reality is a simulation.");
    matrix.genres = vec!["Science Fiction".into(), "Action".into()];
    matrix.director = "Lana Wachowski".into();
    matrix.actors = vec!["Keanu Reeves".into(), "Carrie-Anne Moss".into()];
    matrix.characters = vec!["Neo".into(), "Trinity".into()];
    matrix.year = 1999;
    matrix.rating = 8.7;

    let mut heat = movie(2, "Heat", "A detective hunts a crew of professional thieves.");
    heat.genres = vec!["Crime".into(), "Drama".into()];
    heat.director = "Michael Mann".into();
    heat.actors = vec!["Al Pacino".into(), "Robert De Niro".into()];
    heat.year = 1995;
    heat.rating = 8.3;

    let mut arrival = movie(3, "Arrival", "A linguist decodes an alien simulation of language.");
    arrival.genres = vec!["Science Fiction".into(), "Drama".into()];
    arrival.director = "Denis Villeneuve".into();
    arrival.actors = vec!["Amy Adams".into()];
    arrival.year = 2016;

    let undated = movie(4, "Lost Reel", "A simulation nobody can date.");

    RecordStore::new(vec![matrix, heat, arrival, undated]).expect("store")
}

fn ids(hits: &[filmdb_core::types::ScoredHit]) -> Vec<RecordId> {
    hits.iter().map(|h| h.record_id).collect()
}

#[test]
fn term_in_title_beats_absent_term() {
    let store = RecordStore::new(vec![movie(1, "Space Adventure", ""), movie(2, "Ocean Adventure", "")]).unwrap();
    let index = LexicalIndexBuilder::new().build_in_ram(&store).expect("index");
    let hits = index.search("space", &FilterSpec::default(), 10).expect("search");
    assert_eq!(hits.first().map(|h| h.record_id), Some(1));
    assert!(hits.iter().all(|h| h.record_id != 2 || h.rank > 1));
    assert_eq!(hits[0].rank, 1);
}

#[test]
fn any_term_in_any_field_matches() {
    let index = LexicalIndexBuilder::new().build_in_ram(&catalog()).expect("index");
    let hits = index.search("thieves linguist", &FilterSpec::default(), 10).expect("search");
    let mut found = ids(&hits);
    found.sort_unstable();
    assert_eq!(found, vec![2, 3]);
}

#[test]
fn filters_are_hard_constraints() {
    let index = LexicalIndexBuilder::new().build_in_ram(&catalog()).expect("index");

    let nineties = FilterSpec { year_min: Some(1990), year_max: Some(1999), ..FilterSpec::default() };
    let mut found = ids(&index.search("simulation", &nineties, 10).unwrap());
    found.sort_unstable();
    assert_eq!(found, vec![1], "undated record never matches a year filter");

    let sci_fi = FilterSpec { genre: Some("Science Fiction".into()), ..FilterSpec::default() };
    let mut found = ids(&index.search("simulation", &sci_fi, 10).unwrap());
    found.sort_unstable();
    assert_eq!(found, vec![1, 3]);

    let partial_genre = FilterSpec { genre: Some("fiction".into()), ..FilterSpec::default() };
    assert!(index.search("simulation", &partial_genre, 10).unwrap().is_empty());

    let director = FilterSpec { director: Some("lana wachowski".into()), ..FilterSpec::default() };
    assert_eq!(ids(&index.search("simulation", &director, 10).unwrap()), vec![1]);
    let surname_only = FilterSpec { director: Some("Wachowski".into()), ..FilterSpec::default() };
    assert!(index.search("simulation", &surname_only, 10).unwrap().is_empty());

    let rated = FilterSpec { rating_min: Some(8.5), ..FilterSpec::default() };
    assert_eq!(ids(&index.search("simulation", &rated, 10).unwrap()), vec![1], "unknown rating is excluded");
}

#[test]
fn fuzzy_expansion_on_names_only() {
    let store = catalog();
    let fuzzy = LexicalIndexBuilder::new().build_in_ram(&store).expect("index");
    let hits = fuzzy.search("keenu", &FilterSpec::default(), 10).unwrap();
    assert_eq!(ids(&hits), vec![1]);

    let exact = LexicalIndexBuilder::new().with_options(LexicalOptions { fuzzy: false }).build_in_ram(&store).unwrap();
    assert!(exact.search("keenu", &FilterSpec::default(), 10).unwrap().is_empty());

    // overview is not a name field
    assert!(fuzzy.search("simulatin", &FilterSpec::default(), 10).unwrap().is_empty());
}

#[test]
fn empty_term_selects_by_filters_alone() {
    let index = LexicalIndexBuilder::new().build_in_ram(&catalog()).expect("index");
    let drama = FilterSpec { genre: Some("drama".into()), ..FilterSpec::default() };
    let hits = index.search("   ", &drama, 10).unwrap();
    assert_eq!(ids(&hits), vec![2, 3], "insertion order");
    assert!(hits.iter().all(|h| h.raw_score == 0.0));

    assert!(index.search("", &FilterSpec::default(), 10).unwrap().is_empty());
    assert!(index.search("the of", &FilterSpec::default(), 10).unwrap().is_empty(), "stop words only");
}

#[test]
fn equal_scores_follow_insertion_order() {
    let store = RecordStore::new(vec![movie(20, "Twin Peaks", ""), movie(10, "Twin Peaks", ""), movie(30, "Twin Peaks", "")]).unwrap();
    let index = LexicalIndexBuilder::new().build_in_ram(&store).unwrap();
    let hits = index.search("twin", &FilterSpec::default(), 10).unwrap();
    assert_eq!(ids(&hits), vec![20, 10, 30]);
    assert_eq!(hits.iter().map(|h| h.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn score_rises_with_frequency_and_falls_with_length() {
    let store = RecordStore::new(vec![
        movie(1, "One", "robot city garden tree"),
        movie(2, "Two", "robot robot robot tree"),
        movie(3, "Three", "robot"),
        movie(4, "Four", "robot walks through a long and winding valley of quiet glass towers"),
    ])
    .unwrap();
    let index = LexicalIndexBuilder::new().build_in_ram(&store).unwrap();
    let hits = index.search("robot", &FilterSpec::default(), 10).unwrap();
    let score = |id: RecordId| hits.iter().find(|h| h.record_id == id).map(|h| h.raw_score).unwrap();
    assert!(score(2) > score(1));
    assert!(score(3) > score(4));
    assert!(hits.windows(2).all(|w| w[0].raw_score >= w[1].raw_score));
}

#[test]
fn limit_bounds_the_result() {
    let index = LexicalIndexBuilder::new().build_in_ram(&catalog()).unwrap();
    let hits = index.search("simulation", &FilterSpec::default(), 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(index.search("simulation", &FilterSpec::default(), 0).unwrap().is_empty());
}

#[test]
fn persisted_index_reopens() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("tantivy");
    let store = catalog();
    let built = LexicalIndexBuilder::new().build_in_dir(&store, &dir).expect("build");
    let before = built.search("simulation", &FilterSpec::default(), 10).unwrap();

    let reopened = LexicalIndex::open(&dir, LexicalOptions::default()).expect("open");
    assert_eq!(reopened.num_docs(), 4);
    assert_eq!(ids(&reopened.search("simulation", &FilterSpec::default(), 10).unwrap()), ids(&before));
}

#[test]
fn missing_index_is_unavailable() {
    let tmp = tempfile::tempdir().unwrap();
    let err = LexicalIndex::open(&tmp.path().join("absent"), LexicalOptions::default()).err().expect("error");
    assert!(matches!(err, Error::IndexUnavailable(_)));
}
