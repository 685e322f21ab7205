use thiserror::Error;

use crate::types::RecordId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Invalid filter value for '{field}': {value}")]
    FilterValueInvalid { field: &'static str, value: String },

    #[error("Invalid record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },

    #[error("Duplicate record id: {0}")]
    DuplicateRecord(RecordId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

impl Error {
    /// Errors the orchestrator may recover from by dropping the failing path.
    pub fn is_degradable(&self) -> bool {
        matches!(self, Error::IndexUnavailable(_) | Error::Embedding(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_path_failures_are_degradable() {
        assert!(Error::IndexUnavailable("gone".into()).is_degradable());
        assert!(Error::Embedding("timeout".into()).is_degradable());
        assert!(!Error::Operation("task panicked".into()).is_degradable());
        assert!(!Error::InvalidConfig("k = 0".into()).is_degradable());
        assert!(!Error::DuplicateRecord(7).is_degradable());
    }
}
