//! Error types.
//!
//! Two layers:
//!
//! - [`MatchError`]: structural failures of the matching core (grid mismatch,
//!   missing match table, empty input). Per-point misses are *not* errors.
//! - [`AppError`]: what the binary reports, carrying the process exit code.

use crate::domain::CurveId;

/// Structural failures raised by selection and classification.
///
/// Any of these aborts the whole pass; no partial results are returned.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchError {
    /// Two compared curves are not sampled on the same grid.
    #[error("Grid mismatch: {0}")]
    ShapeMismatch(String),

    /// Classification was invoked without any match records.
    #[error("No match table: classification needs at least one series → candidate match.")]
    MissingMatchTable,

    /// No candidates, no training series, or an empty grid.
    #[error("Empty input: {0}")]
    EmptyInput(&'static str),

    /// A grid coordinate or curve value is NaN or infinite.
    #[error("Non-finite value: {0}")]
    NonFinite(String),

    /// The match table references a candidate absent from the candidate table.
    #[error("Match table references unknown candidate {0}.")]
    UnknownCandidate(CurveId),

    #[error("Invalid tolerance factor {0} (must be finite and >= 0).")]
    InvalidTolerance(f64),
}

impl MatchError {
    /// Exit code used when this error reaches the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            MatchError::InvalidTolerance(_) => 2,
            _ => 3,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_errors_map_to_exit_codes() {
        let app: AppError = MatchError::MissingMatchTable.into();
        assert_eq!(app.exit_code(), 3);

        let app: AppError = MatchError::InvalidTolerance(-1.0).into();
        assert_eq!(app.exit_code(), 2);
        assert!(app.to_string().contains("-1"));
    }
}
