//! Table and JSON rendering for search results.

use std::fmt::Write as _;
use std::time::Duration;

use anyhow::Result;
use serde::Serialize;

use filmdb_core::types::{FusedResult, Record, RecordId, SearchMode, SourceKind};

const TITLE_WIDTH: usize = 50;
const RULE_WIDTH: usize = 88;

/// A fused result joined with its catalog record.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedHit {
    pub rank: usize,
    pub id: RecordId,
    pub title: String,
    pub year: Option<u32>,
    pub genres: Vec<String>,
    pub director: String,
    pub rating: Option<f32>,
    pub score: f64,
    pub rrf_score: f64,
    pub source: SourceKind,
    pub lexical_rank: Option<usize>,
    pub vector_rank: Option<usize>,
}

impl ResolvedHit {
    pub fn new(rank: usize, record: &Record, result: &FusedResult) -> Self {
        Self {
            rank,
            id: record.id,
            title: record.title.clone(),
            year: record.known_year(),
            genres: record.genres.clone(),
            director: record.director.clone(),
            rating: record.known_rating(),
            score: result.fused_score,
            rrf_score: result.rrf_score,
            source: result.source,
            lexical_rank: result.lexical_rank,
            vector_rank: result.vector_rank,
        }
    }
}

/// Wall-clock breakdown in seconds.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Timing {
    pub parse: f64,
    pub retrieve: f64,
    pub total: f64,
}

impl Timing {
    pub fn new(parse: Duration, retrieve: Duration, total: Duration) -> Self {
        Self { parse: parse.as_secs_f64(), retrieve: retrieve.as_secs_f64(), total: total.as_secs_f64() }
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    results: &'a [ResolvedHit],
    timing: Timing,
    count: usize,
}

pub fn format_json(hits: &[ResolvedHit], timing: &Timing) -> Result<String> {
    let output = JsonOutput { results: hits, timing: *timing, count: hits.len() };
    Ok(serde_json::to_string_pretty(&output)?)
}

pub fn format_table(query: &str, mode: SearchMode, hits: &[ResolvedHit], timing: &Timing) -> String {
    let mut out = String::new();
    let rule = "=".repeat(RULE_WIDTH);
    let _ = writeln!(out, "Query: {query}  [{mode}]");
    let _ = writeln!(out, "{rule}");

    if hits.is_empty() {
        let _ = writeln!(out, "No results found.");
    } else {
        let _ = writeln!(out, "{:<6} {:<50} {:<6} {:<8} {:<8}", "Rank", "Title", "Year", "Score", "Source");
        let _ = writeln!(out, "{}", "-".repeat(RULE_WIDTH));
        for hit in hits {
            let year = hit.year.map(|y| y.to_string()).unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{:<6} {:<50} {:<6} {:<8.3} {:<8}",
                hit.rank,
                truncate_title(&hit.title),
                year,
                hit.score,
                hit.source.to_string()
            );
        }
    }

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Timing: parse {:.3}s | retrieve {:.3}s | total {:.3}s", timing.parse, timing.retrieve, timing.total);
    out.trim_end().to_string()
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() <= TITLE_WIDTH {
        return title.to_string();
    }
    let head: String = title.chars().take(TITLE_WIDTH - 3).collect();
    format!("{head}...")
}
