//! Domain types shared by the lexical and vector engines.

use serde::{Deserialize, Serialize};

pub type RecordId = u64;

/// One catalog entry.
///
/// `year == 0` and `rating == 0.0` mean unknown. `genres` are lower-cased by
/// the record store before any index sees them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub director: String,
    #[serde(default)]
    pub actors: Vec<String>,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub year: u32,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub votes: u64,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub budget: f64,
}

impl Record {
    pub fn known_year(&self) -> Option<u32> {
        (self.year > 0).then_some(self.year)
    }

    pub fn known_rating(&self) -> Option<f32> {
        (self.rating > 0.0 && self.rating.is_finite()).then_some(self.rating)
    }

    pub fn has_director(&self) -> bool {
        !self.director.trim().is_empty()
    }
}

/// Structured query constraints. `None` always means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_min: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_max: Option<f32>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.year_min.is_none()
            && self.year_max.is_none()
            && self.genre().is_none()
            && self.director().is_none()
            && self.rating_min.is_none()
            && self.rating_max.is_none()
    }

    pub fn has_year(&self) -> bool {
        self.year_min.is_some() || self.year_max.is_some()
    }

    pub fn has_rating(&self) -> bool {
        self.rating_min.is_some() || self.rating_max.is_some()
    }

    /// Lower-cased, trimmed genre; blank strings count as absent.
    pub fn genre(&self) -> Option<String> {
        normalized(self.genre.as_deref())
    }

    /// Lower-cased, trimmed director; blank strings count as absent.
    pub fn director(&self) -> Option<String> {
        normalized(self.director.as_deref())
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

/// Search text plus filters for one retrieval path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    pub search_term: String,
    #[serde(default)]
    pub filters: FilterSpec,
}

impl ParsedQuery {
    pub fn new(search_term: impl Into<String>, filters: FilterSpec) -> Self {
        Self { search_term: search_term.into(), filters }
    }

    pub fn has_term(&self) -> bool {
        !self.search_term.trim().is_empty()
    }
}

/// Retrieval strategy, resolved once per call and never inferred from data.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    #[serde(alias = "bm25")]
    Lexical,
    #[serde(alias = "semantic")]
    Vector,
    #[default]
    #[serde(alias = "hybrid")]
    Fused,
}

impl std::str::FromStr for SearchMode {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lexical" | "bm25" => Ok(SearchMode::Lexical),
            "vector" | "semantic" => Ok(SearchMode::Vector),
            "fused" | "hybrid" => Ok(SearchMode::Fused),
            other => Err(crate::error::Error::InvalidConfig(format!("unknown search mode '{other}'"))),
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SearchMode::Lexical => "lexical",
            SearchMode::Vector => "vector",
            SearchMode::Fused => "fused",
        };
        f.write_str(label)
    }
}

/// Which retrieval path(s) produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Lexical,
    Vector,
    Both,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            SourceKind::Lexical => "lexical",
            SourceKind::Vector => "vector",
            SourceKind::Both => "both",
        };
        f.write_str(label)
    }
}

/// A hit from a single retrieval path. `rank` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHit {
    pub record_id: RecordId,
    pub raw_score: f32,
    pub rank: usize,
}

/// Output unit of fusion.
///
/// `rrf_score` is the weighted reciprocal-rank sum; `fused_score` is the same
/// value min-max normalized over the candidate set, so it lies in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub record_id: RecordId,
    pub fused_score: f64,
    pub rrf_score: f64,
    pub source: SourceKind,
    pub lexical_rank: Option<usize>,
    pub vector_rank: Option<usize>,
}

impl FusedResult {
    pub fn rank_sum(&self) -> usize {
        self.lexical_rank.unwrap_or(0) + self.vector_rank.unwrap_or(0)
    }
}
