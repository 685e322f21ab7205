//! Weighted reciprocal-rank fusion with min-max normalization and provenance.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use filmdb_core::config::FusionSettings;
use filmdb_core::types::{FusedResult, RecordId, ScoredHit, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Rank damping constant; larger flattens the curve.
    pub k: u32,
    pub lexical_weight: f64,
    pub vector_weight: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self { k: 60, lexical_weight: 1.0, vector_weight: 1.0 }
    }
}

impl From<&FusionSettings> for FusionConfig {
    fn from(s: &FusionSettings) -> Self {
        Self { k: s.k, lexical_weight: s.lexical_weight, vector_weight: s.vector_weight }
    }
}

impl FusionConfig {
    /// `weight / (k + rank)` for a 1-based rank.
    pub fn contribution(&self, weight: f64, rank: usize) -> f64 {
        weight / (f64::from(self.k) + rank as f64)
    }
}

#[derive(Default)]
struct Candidate {
    rrf: f64,
    lexical_rank: Option<usize>,
    vector_rank: Option<usize>,
}

/// Merge two ranked lists.
///
/// A hit's rank is its 1-based position in its list; a repeated id within
/// one list only counts at its best position. Ordering is fused score
/// descending, then `Both` before single-source, then lower rank sum, then
/// lower id.
pub fn fuse(lexical: &[ScoredHit], vector: &[ScoredHit], config: &FusionConfig) -> Vec<FusedResult> {
    let mut by_id: HashMap<RecordId, Candidate> = HashMap::with_capacity(lexical.len() + vector.len());

    for (i, hit) in lexical.iter().enumerate() {
        let c = by_id.entry(hit.record_id).or_default();
        if c.lexical_rank.is_none() {
            c.lexical_rank = Some(i + 1);
            c.rrf += config.contribution(config.lexical_weight, i + 1);
        }
    }
    for (i, hit) in vector.iter().enumerate() {
        let c = by_id.entry(hit.record_id).or_default();
        if c.vector_rank.is_none() {
            c.vector_rank = Some(i + 1);
            c.rrf += config.contribution(config.vector_weight, i + 1);
        }
    }

    let (min, max) = by_id
        .values()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), c| (lo.min(c.rrf), hi.max(c.rrf)));
    let span = max - min;

    let mut results: Vec<FusedResult> = by_id
        .into_iter()
        .map(|(record_id, c)| {
            let source = match (c.lexical_rank, c.vector_rank) {
                (Some(_), Some(_)) => SourceKind::Both,
                (None, Some(_)) => SourceKind::Vector,
                _ => SourceKind::Lexical,
            };
            let fused_score = if span > 0.0 { (c.rrf - min) / span } else { 1.0 };
            FusedResult {
                record_id,
                fused_score,
                rrf_score: c.rrf,
                source,
                lexical_rank: c.lexical_rank,
                vector_rank: c.vector_rank,
            }
        })
        .collect();
    results.sort_by(compare);
    results
}

fn compare(a: &FusedResult, b: &FusedResult) -> Ordering {
    b.rrf_score
        .total_cmp(&a.rrf_score)
        .then_with(|| (b.source == SourceKind::Both).cmp(&(a.source == SourceKind::Both)))
        .then_with(|| a.rank_sum().cmp(&b.rank_sum()))
        .then_with(|| a.record_id.cmp(&b.record_id))
}
