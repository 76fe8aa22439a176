//! Error types for loading instances, building tours and exporting results.

use thiserror::Error;

/// Errors raised by the solver library.
///
/// Validation problems found by the score calculator are not listed here:
/// they are diagnostics and resolve to a score of 0 (see [`crate::scoring`]).
#[derive(Debug, Error)]
pub enum SolverError {
    /// Reading the input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// An order line could not be parsed, or the input ended early.
    #[error("malformed input at line {line}: {reason}")]
    MalformedInput {
        /// 1-indexed physical line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },
    /// Fewer orders than the selection size are available.
    #[error("insufficient orders: {required} required, {available} available")]
    InsufficientOrders { required: usize, available: usize },
    /// An answer file does not follow the two-line output format.
    #[error("malformed answer: {0}")]
    MalformedAnswer(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
