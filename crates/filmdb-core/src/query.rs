//! Query understanding: decoding structured parser output and a local
//! rule-based parser that pulls year, genre and rating constraints out of
//! free text.

use regex::Regex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::filter::decode_filters;
use crate::types::{FilterSpec, ParsedQuery};

/// English stop words removed from the lexical term.
pub const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "can", "for", "from", "have", "if", "in", "is", "it", "may",
    "not", "of", "on", "or", "tbd", "that", "the", "this", "to", "us", "we", "when", "will", "with", "yet", "you",
    "your",
];

/// Catalog vocabulary that carries no retrieval signal.
pub const DOMAIN_WORDS: &[&str] =
    &["movies", "movie", "genre", "director", "cast", "actor", "actors", "characters", "films", "film"];

const GENRES: &[&str] = &[
    "adventure",
    "animation",
    "children",
    "comedy",
    "crime",
    "documentary",
    "drama",
    "family",
    "fantasy",
    "film-noir",
    "history",
    "horror",
    "imax",
    "music",
    "musical",
    "mystery",
    "romance",
    "sci-fi",
    "science fiction",
    "thriller",
    "tv movie",
    "war",
    "western",
];

const GENRE_SYNONYMS: &[(&str, &str)] = &[
    ("rom-com", "romance"),
    ("romcom", "romance"),
    ("romantic", "romance"),
    ("scifi", "sci-fi"),
    ("action", "action"),
];

const RATING_CEILING: f32 = 10.0;
const HIGHLY_RATED_FLOOR: f32 = 7.0;

impl ParsedQuery {
    /// Decode `{ "search_term": .., "filters": {..} }` as emitted by an
    /// external (LLM) parser. Markdown code fences around the object are
    /// tolerated; malformed filter values are dropped, not fatal.
    pub fn from_json(text: &str) -> Result<Self> {
        let body = strip_code_fence(text);
        let value: Value =
            serde_json::from_str(body).map_err(|e| Error::Operation(format!("unparseable parser output: {e}")))?;
        let Some(obj) = value.as_object() else {
            return Err(Error::Operation("parser output is not a JSON object".into()));
        };
        let search_term = match obj.get("search_term") {
            Some(Value::String(s)) => s.trim().to_string(),
            None | Some(Value::Null) => String::new(),
            Some(other) => return Err(Error::Operation(format!("search_term must be a string, got {other}"))),
        };
        let filters = obj.get("filters").map(decode_filters).unwrap_or_default();
        Ok(ParsedQuery { search_term, filters })
    }
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else { return trimmed };
    // drop the info string ("json") on the opening fence line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// The same query shaped for each retrieval path.
///
/// Filters are identical; the lexical term is keyword-cleaned while the
/// vector term keeps the user's phrasing for the embedder.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitQuery {
    pub lexical: ParsedQuery,
    pub vector: ParsedQuery,
}

pub struct RuleParser {
    year_range: Regex,
    temporal_short: Regex,
    temporal_full: Regex,
    decade_short: Regex,
    decade_full: Regex,
    single_year: Regex,
    genres: Vec<(Regex, &'static str)>,
    synonyms: Vec<(Regex, &'static str)>,
    rated: Regex,
    comparison: Regex,
    operator: Regex,
    plus: Regex,
    highly_rated: Regex,
    rating_range: Regex,
    word: Regex,
    spaces: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Operation(format!("bad pattern {pattern}: {e}")))
}

fn whole_word(phrase: &str) -> Result<Regex> {
    compile(&format!(r"(?i)\b{}\b", regex::escape(phrase)))
}

impl RuleParser {
    pub fn new() -> Result<Self> {
        let genres = GENRES.iter().map(|g| Ok((whole_word(g)?, *g))).collect::<Result<Vec<_>>>()?;
        let synonyms =
            GENRE_SYNONYMS.iter().map(|(s, g)| Ok((whole_word(s)?, *g))).collect::<Result<Vec<_>>>()?;
        Ok(Self {
            year_range: compile(r"(?i)\b((?:19|20)\d{2})\s*(?:-|to)\s*((?:19|20)\d{2})\b")?,
            temporal_short: compile(r"(?i)\b(early|mid|late)\s+(\d{2})s\b")?,
            temporal_full: compile(r"(?i)\b(early|mid|late)\s+((?:19|20)\d{2})s?\b")?,
            decade_short: compile(r"(?i)\b(\d{2})s\b")?,
            decade_full: compile(r"(?i)\b((?:19|20)\d)0s\b")?,
            single_year: compile(r"\b(?:19|20)\d{2}\b")?,
            genres,
            synonyms,
            rated: compile(r"(?i)\b(?:rated|rating|score)\s+(\d+(?:\.\d+)?)(\s*\+)?")?,
            comparison: compile(
                r"(?i)\b(?:(?:rated|rating|score)\s+)?(above|over|more than|below|under|less than)\s+(\d+(?:\.\d+)?)\b",
            )?,
            operator: compile(r"(>=|<=|>|<)\s*(\d+(?:\.\d+)?)")?,
            plus: compile(r"\b(\d+(?:\.\d+)?)\s*\+")?,
            highly_rated: compile(r"(?i)\b(?:highly|well|top|best)\s+rated\b")?,
            rating_range: compile(r"(?i)\b(\d+(?:\.\d+)?)\s*(?:-|to)\s*(\d+(?:\.\d+)?)(?:\s*(?:rated|rating|score))?\b")?,
            word: compile(r"\w+")?,
            spaces: compile(r"\s+")?,
        })
    }

    /// Extract filters and a keyword search term from free text.
    pub fn parse(&self, raw: &str) -> ParsedQuery {
        let mut text = raw.to_string();
        let mut filters = FilterSpec::default();

        if let Some((min, max)) = self.extract_years(&mut text) {
            filters.year_min = Some(min);
            filters.year_max = Some(max);
        }
        filters.genre = self.extract_genre(&mut text).map(str::to_string);
        if let Some((min, max)) = self.extract_rating(&mut text) {
            filters.rating_min = Some(min);
            filters.rating_max = Some(max);
        }

        ParsedQuery { search_term: self.keywords(&text), filters }
    }

    /// Parse once and shape the result for both retrieval paths.
    pub fn split(&self, raw: &str) -> SplitQuery {
        let lexical = self.parse(raw);
        let vector = ParsedQuery { search_term: raw.trim().to_string(), filters: lexical.filters.clone() };
        SplitQuery { lexical, vector }
    }

    fn extract_years(&self, text: &mut String) -> Option<(u32, u32)> {
        if let Some(c) = self.year_range.captures(text) {
            let (a, b) = (c[1].parse::<u32>().ok()?, c[2].parse::<u32>().ok()?);
            let span = (a.min(b), a.max(b));
            remove_first(&self.year_range, text);
            return Some(span);
        }
        if let Some(c) = self.temporal_short.captures(text) {
            let base = century_for(c[2].parse::<u32>().ok()?);
            let span = period_span(&c[1], base);
            remove_first(&self.temporal_short, text);
            return Some(span);
        }
        if let Some(c) = self.temporal_full.captures(text) {
            let decade = c[2].parse::<u32>().ok()? / 10 * 10;
            let span = period_span(&c[1], decade);
            remove_first(&self.temporal_full, text);
            return Some(span);
        }
        if let Some(c) = self.decade_full.captures(text) {
            let decade = c[1].parse::<u32>().ok()? * 10;
            remove_first(&self.decade_full, text);
            return Some((decade, decade + 9));
        }
        if let Some(c) = self.decade_short.captures(text) {
            let decade = century_for(c[1].parse::<u32>().ok()?);
            remove_first(&self.decade_short, text);
            return Some((decade, decade + 9));
        }
        if let Some(m) = self.single_year.find(text) {
            let year = m.as_str().parse::<u32>().ok()?;
            remove_first(&self.single_year, text);
            return Some((year, year));
        }
        None
    }

    fn extract_genre(&self, text: &mut String) -> Option<&'static str> {
        let haystack = text.as_str();
        let found = self
            .genres
            .iter()
            .chain(self.synonyms.iter())
            .find(|(re, _)| re.is_match(haystack))?;
        remove_first(&found.0, text);
        Some(found.1)
    }

    fn extract_rating(&self, text: &mut String) -> Option<(f32, f32)> {
        if let Some(c) = self.rated.captures(text) {
            let value = c[1].parse::<f32>().ok()?;
            let span = if c.get(2).is_some() { (value, RATING_CEILING) } else { (value, value) };
            remove_first(&self.rated, text);
            return Some(span);
        }
        if let Some(c) = self.comparison.captures(text) {
            let value = c[2].parse::<f32>().ok()?;
            let span = match c[1].to_lowercase().as_str() {
                "above" | "over" | "more than" => (value, RATING_CEILING),
                _ => (0.0, value),
            };
            remove_first(&self.comparison, text);
            return Some(span);
        }
        if let Some(c) = self.plus.captures(text) {
            let value = c[1].parse::<f32>().ok()?;
            remove_first(&self.plus, text);
            return Some((value, RATING_CEILING));
        }
        if let Some(c) = self.operator.captures(text) {
            let value = c[2].parse::<f32>().ok()?;
            let span = if c[1].starts_with('>') { (value, RATING_CEILING) } else { (0.0, value) };
            remove_first(&self.operator, text);
            return Some(span);
        }
        if self.highly_rated.is_match(text) {
            remove_first(&self.highly_rated, text);
            return Some((HIGHLY_RATED_FLOOR, RATING_CEILING));
        }
        if let Some(c) = self.rating_range.captures(text) {
            let (a, b) = (c[1].parse::<f32>().ok()?, c[2].parse::<f32>().ok()?);
            remove_first(&self.rating_range, text);
            return Some((a.min(b), a.max(b)));
        }
        None
    }

    fn keywords(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = self
            .word
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|w| !STOP_WORDS.contains(w) && !DOMAIN_WORDS.contains(w))
            .collect();
        self.spaces.replace_all(&words.join(" "), " ").trim().to_string()
    }
}

fn remove_first(re: &Regex, text: &mut String) {
    *text = re.replacen(text, 1, " ").into_owned();
}

/// Two-digit decades: 20..=99 are 19xx, the rest 20xx.
fn century_for(two_digits: u32) -> u32 {
    if two_digits >= 20 { 1900 + two_digits } else { 2000 + two_digits }
}

fn period_span(period: &str, decade: u32) -> (u32, u32) {
    match period.to_lowercase().as_str() {
        "early" => (decade, decade + 4),
        "mid" => (decade + 3, decade + 6),
        _ => (decade + 5, decade + 9),
    }
}
