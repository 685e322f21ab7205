//! Immutable in-memory catalog keyed by record id.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{Record, RecordId};

#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    by_id: HashMap<RecordId, usize>,
}

impl RecordStore {
    /// Build the store, normalizing genres and rejecting duplicate ids.
    /// Insertion order is preserved and is the order both indices see.
    pub fn new(records: Vec<Record>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(records.len());
        let mut normalized = Vec::with_capacity(records.len());
        for mut record in records {
            if by_id.insert(record.id, normalized.len()).is_some() {
                return Err(Error::DuplicateRecord(record.id));
            }
            record.genres = normalize_genres(&record.genres);
            normalized.push(record);
        }
        Ok(Self { records: normalized, by_id })
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        self.by_id.get(&id).map(|&pos| &self.records[pos])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.records.iter().map(|r| r.id)
    }
}

fn normalize_genres(genres: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(genres.len());
    for g in genres {
        let g = g.trim().to_lowercase();
        if !g.is_empty() && !out.contains(&g) {
            out.push(g);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: RecordId, genres: &[&str]) -> Record {
        Record { id, title: format!("t{id}"), genres: genres.iter().map(|s| s.to_string()).collect(), ..Record::default() }
    }

    #[test]
    fn genres_are_lowercased_and_deduplicated() {
        let store = RecordStore::new(vec![rec(7, &[" Drama", "drama", "Science Fiction", ""])]).expect("store");
        assert_eq!(store.get(7).map(|r| r.genres.clone()), Some(vec!["drama".to_string(), "science fiction".to_string()]));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = RecordStore::new(vec![rec(1, &[]), rec(1, &[])]).unwrap_err();
        assert!(matches!(err, Error::DuplicateRecord(1)));
    }

    #[test]
    fn iteration_keeps_insertion_order() {
        let store = RecordStore::new(vec![rec(30, &[]), rec(10, &[]), rec(20, &[])]).expect("store");
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![30, 10, 20]);
        assert!(store.get(99).is_none());
        assert_eq!(store.len(), 3);
    }
}
