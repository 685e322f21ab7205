//! Filter evaluation for post-filtered (vector) results, and lenient decoding
//! of raw filter values coming from an external query parser.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Error;
use crate::types::{FilterSpec, Record};

/// True when `record` satisfies every active dimension of `filters`.
///
/// A record with an unknown year, rating or director never satisfies an
/// active filter on that dimension. Genre matching is substring-or-equality
/// against each entry of the record's genre set.
pub fn matches(record: &Record, filters: &FilterSpec) -> bool {
    matches_year(record, filters)
        && matches_genre(record, filters)
        && matches_director(record, filters)
        && matches_rating(record, filters)
}

fn matches_year(record: &Record, filters: &FilterSpec) -> bool {
    if !filters.has_year() {
        return true;
    }
    let Some(year) = record.known_year() else { return false };
    filters.year_min.map_or(true, |min| year >= min) && filters.year_max.map_or(true, |max| year <= max)
}

fn matches_genre(record: &Record, filters: &FilterSpec) -> bool {
    let Some(wanted) = filters.genre() else { return true };
    record.genres.iter().any(|g| g.to_lowercase().contains(&wanted))
}

fn matches_director(record: &Record, filters: &FilterSpec) -> bool {
    let Some(wanted) = filters.director() else { return true };
    record.has_director() && record.director.trim().to_lowercase() == wanted
}

fn matches_rating(record: &Record, filters: &FilterSpec) -> bool {
    if !filters.has_rating() {
        return true;
    }
    let Some(rating) = record.known_rating() else { return false };
    filters.rating_min.map_or(true, |min| rating >= min) && filters.rating_max.map_or(true, |max| rating <= max)
}

/// Decode a raw `filters` JSON object into a [`FilterSpec`].
///
/// Malformed values are logged as [`Error::FilterValueInvalid`] and the
/// dimension is left unconstrained. Unknown keys are ignored.
pub fn decode_filters(raw: &Value) -> FilterSpec {
    let Some(obj) = raw.as_object() else {
        if !raw.is_null() {
            report(Error::FilterValueInvalid { field: "filters", value: raw.to_string() });
        }
        return FilterSpec::default();
    };
    FilterSpec {
        year_min: decode_year(obj, "year_min"),
        year_max: decode_year(obj, "year_max"),
        genre: decode_text(obj, "genre"),
        director: decode_text(obj, "director"),
        rating_min: decode_rating(obj, "rating_min"),
        rating_max: decode_rating(obj, "rating_max"),
    }
}

fn report(err: Error) {
    warn!(error = %err, "ignoring filter dimension");
}

fn present<'a>(obj: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    match obj.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(v) => Some(v),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn decode_year(obj: &Map<String, Value>, field: &'static str) -> Option<u32> {
    let value = present(obj, field)?;
    match as_number(value) {
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => Some(n as u32),
        _ => {
            report(Error::FilterValueInvalid { field, value: value.to_string() });
            None
        }
    }
}

fn decode_rating(obj: &Map<String, Value>, field: &'static str) -> Option<f32> {
    let value = present(obj, field)?;
    match as_number(value) {
        Some(n) if n >= 0.0 => Some(n as f32),
        _ => {
            report(Error::FilterValueInvalid { field, value: value.to_string() });
            None
        }
    }
}

fn decode_text(obj: &Map<String, Value>, field: &'static str) -> Option<String> {
    match present(obj, field)? {
        Value::String(s) => Some(s.trim().to_string()),
        other => {
            report(Error::FilterValueInvalid { field, value: other.to_string() });
            None
        }
    }
}
