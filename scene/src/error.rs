use thiserror::Error;

use crate::common::MathError;
use crate::{NodeId, NodeKind};

/// Errors raised by transform operations on the scene graph.
///
/// Argument and handle errors abort the operation that raised them. Channel
/// writes already made by that operation are not rolled back.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error("Node {0} does not exist")]
    InvalidHandle(NodeId),

    #[error("Invalid rotation order: {0}")]
    InvalidRotationOrder(i64),

    #[error("Unable to bake scale into node {node} of kind '{kind}'")]
    UnsupportedGeometryKind { node: NodeId, kind: NodeKind },

    #[error("Node {0} is not a transform")]
    NotATransform(NodeId),

    #[error("Matrix for node {0} is not invertible")]
    SingularMatrix(NodeId),
}

impl From<MathError> for TransformError {
    fn from(error: MathError) -> Self {
        match error {
            MathError::Argument(message) => TransformError::Argument(message),
            MathError::InvalidRotationOrder(order) => TransformError::InvalidRotationOrder(order),
            MathError::InvalidAxis(axis) => {
                TransformError::Argument(format!("invalid axis {} (expected 0, 1 or 2)", axis))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_math_error_conversion() {
        assert_eq!(
            TransformError::from(MathError::InvalidRotationOrder(7)),
            TransformError::InvalidRotationOrder(7)
        );
        assert!(matches!(
            TransformError::from(MathError::InvalidAxis(4)),
            TransformError::Argument(_)
        ));
    }
}
