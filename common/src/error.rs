use thiserror::Error;

/// Errors raised by the matrix algebra.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MathError {
    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Invalid rotation order: {0}")]
    InvalidRotationOrder(i64),

    #[error("Invalid axis: {0} (expected 0, 1 or 2)")]
    InvalidAxis(i64),
}
