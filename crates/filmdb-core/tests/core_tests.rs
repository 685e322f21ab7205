use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

use filmdb_core::dataset::DatasetLoader;
use filmdb_core::{Error, RecordStore};

const CATALOG: &str = r#"{"id": 1, "title": "Interstellar", "overview": "Explorers travel through a wormhole in space.", "genres": ["Science Fiction", "Drama"], "director": "Christopher Nolan", "actors": "Matthew McConaughey, Anne Hathaway", "characters": ["Cooper", "Brand"], "year": 2014, "rating": 8.6}
{"id": "2", "title": "The Abyss", "overview": "A diving team meets something under the ocean.", "genres": "Adventure, Science Fiction", "director": "James Cameron", "year": "1989", "rating": ""}

{"id": 3, "title": "Untitled", "year": null}
"#;

#[test]
fn loads_mixed_list_and_number_encodings() {
    let records = DatasetLoader::new().parse(Cursor::new(CATALOG)).expect("parse");
    assert_eq!(records.len(), 3, "blank lines are skipped");

    let interstellar = &records[0];
    assert_eq!(interstellar.actors, vec!["Matthew McConaughey", "Anne Hathaway"]);
    assert_eq!(interstellar.characters, vec!["Cooper", "Brand"]);
    assert_eq!(interstellar.known_year(), Some(2014));

    let abyss = &records[1];
    assert_eq!(abyss.id, 2);
    assert_eq!(abyss.genres, vec!["Adventure", "Science Fiction"]);
    assert_eq!(abyss.year, 1989);
    assert_eq!(abyss.known_rating(), None, "empty rating means unknown");

    let untitled = &records[2];
    assert_eq!(untitled.known_year(), None);
    assert!(untitled.genres.is_empty());
}

#[test]
fn limit_stops_early() {
    let records = DatasetLoader::new().with_limit(1).parse(Cursor::new(CATALOG)).expect("parse");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].title, "Interstellar");
}

#[test]
fn malformed_year_reports_line_number() {
    let data = "{\"id\": 1, \"title\": \"ok\"}\n{\"id\": 2, \"title\": \"bad\", \"year\": \"soon\"}\n";
    let err = DatasetLoader::new().parse(Cursor::new(data)).unwrap_err();
    match err.downcast_ref::<Error>() {
        Some(Error::InvalidRecord { line, .. }) => assert_eq!(*line, 2),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn load_from_file_feeds_record_store() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("movies.jsonl");
    fs::write(&path, CATALOG).unwrap();

    let records = DatasetLoader::new().load(&path).expect("load");
    let store = RecordStore::new(records).expect("store");
    assert_eq!(store.len(), 3);
    assert_eq!(
        store.get(2).map(|r| r.genres.clone()),
        Some(vec!["adventure".to_string(), "science fiction".to_string()])
    );
}

#[test]
fn missing_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    assert!(DatasetLoader::new().load(&tmp.path().join("nope.jsonl")).is_err());
}
