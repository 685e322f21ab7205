//! JSON Lines catalog loader.
//!
//! List fields accept either JSON arrays or comma-separated strings. `year`
//! and `rating` accept numbers, numeric strings, empty strings or null (the
//! last two meaning unknown); anything else fails the load with the line
//! number, since a half-parsed catalog would silently skew both indices.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::types::{Record, RecordId};

#[derive(Debug, Default, Clone)]
pub struct DatasetLoader {
    limit: Option<usize>,
}

impl DatasetLoader {
    pub fn new() -> Self { Self::default() }

    /// Stop after `limit` records.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn load(&self, path: &Path) -> anyhow::Result<Vec<Record>> {
        let file = File::open(path).with_context(|| format!("Failed to open dataset {}", path.display()))?;
        let records = self.parse(BufReader::new(file))?;
        info!(path = %path.display(), records = records.len(), "loaded dataset");
        Ok(records)
    }

    pub fn parse<R: BufRead>(&self, reader: R) -> anyhow::Result<Vec<Record>> {
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            if self.limit.is_some_and(|limit| records.len() >= limit) {
                break;
            }
            let line = line.with_context(|| format!("Failed to read dataset line {}", idx + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(parse_line(&line, idx + 1)?);
        }
        Ok(records)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrText {
    List(Vec<String>),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

#[derive(Deserialize)]
struct RawRecord {
    id: NumberOrText,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    genres: Option<ListOrText>,
    #[serde(default)]
    director: Option<String>,
    #[serde(default)]
    actors: Option<ListOrText>,
    #[serde(default)]
    characters: Option<ListOrText>,
    #[serde(default)]
    year: Option<NumberOrText>,
    #[serde(default)]
    rating: Option<NumberOrText>,
    #[serde(default)]
    votes: Option<NumberOrText>,
    #[serde(default)]
    popularity: Option<NumberOrText>,
    #[serde(default)]
    budget: Option<NumberOrText>,
}

fn parse_line(line: &str, line_no: usize) -> Result<Record> {
    let invalid = |reason: String| Error::InvalidRecord { line: line_no, reason };
    let raw: RawRecord = serde_json::from_str(line).map_err(|e| invalid(e.to_string()))?;

    let id = parse_id(&raw.id).map_err(invalid)?;
    let year = parse_year(raw.year.as_ref()).map_err(invalid)?;
    let rating = parse_rating(raw.rating.as_ref()).map_err(invalid)?;

    Ok(Record {
        id,
        title: raw.title.unwrap_or_default().trim().to_string(),
        overview: raw.overview.unwrap_or_default().trim().to_string(),
        genres: split_list(raw.genres),
        director: raw.director.unwrap_or_default().trim().to_string(),
        actors: split_list(raw.actors),
        characters: split_list(raw.characters),
        year,
        rating,
        votes: lenient_number(raw.votes.as_ref()).max(0.0) as u64,
        popularity: lenient_number(raw.popularity.as_ref()),
        budget: lenient_number(raw.budget.as_ref()),
    })
}

fn split_list(value: Option<ListOrText>) -> Vec<String> {
    let items: Vec<String> = match value {
        None => Vec::new(),
        Some(ListOrText::List(items)) => items,
        Some(ListOrText::Text(text)) => text.split(',').map(str::to_string).collect(),
    };
    items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
}

fn numeric(value: &NumberOrText) -> std::result::Result<Option<f64>, String> {
    match value {
        NumberOrText::Number(n) => Ok(Some(*n)),
        NumberOrText::Text(t) if t.trim().is_empty() => Ok(None),
        NumberOrText::Text(t) => t.trim().parse::<f64>().map(Some).map_err(|_| format!("'{t}' is not a number")),
    }
}

fn parse_id(value: &NumberOrText) -> std::result::Result<RecordId, String> {
    match numeric(value)? {
        Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as RecordId),
        Some(n) => Err(format!("invalid id {n}")),
        None => Err("missing id".to_string()),
    }
}

fn parse_year(value: Option<&NumberOrText>) -> std::result::Result<u32, String> {
    let Some(value) = value else { return Ok(0) };
    match numeric(value)? {
        None => Ok(0),
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => Ok(n as u32),
        Some(n) => Err(format!("invalid year {n}")),
    }
}

fn parse_rating(value: Option<&NumberOrText>) -> std::result::Result<f32, String> {
    let Some(value) = value else { return Ok(0.0) };
    match numeric(value)? {
        None => Ok(0.0),
        Some(n) if n >= 0.0 && n.is_finite() => Ok(n as f32),
        Some(n) => Err(format!("invalid rating {n}")),
    }
}

fn lenient_number(value: Option<&NumberOrText>) -> f64 {
    value
        .and_then(|v| numeric(v).ok().flatten())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}
