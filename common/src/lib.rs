//! Matrix algebra for hierarchical transform editing.
//!
//! Every matrix in this crate follows the row-vector convention: a point is
//! transformed as `p' = p × M`, rows 0..2 hold the X/Y/Z axes and row 3 holds
//! the translation `(tx, ty, tz, 1)`. The product `a × b` applies `a` first.
//!
//! Matrices are stored as [`cgmath::Matrix4`]. cgmath is column-major with
//! column vectors, and that storage is byte-for-byte the row-major storage of
//! the equivalent row-vector matrix, so `m[r]` is row `r` and the flat 16
//! element array is the interchange form. Only the product differs: use
//! [`row_mul`] to multiply in row-vector order.
//!
//! Three conventions are load-bearing and tested explicitly:
//! - local matrices compose as `scale × rotate × translate`,
//! - each [`RotationOrder`] is a fixed multiplication sequence where the first
//!   named axis rotates first (`XYZ` is `Rx × Ry × Rz`),
//! - a world matrix is `local × parentOffset × parentWorld`.

mod error;
mod matrix;
mod rotation;

pub use error::MathError;
pub use matrix::{
    approx_eq, axis_rotation_matrix, axis_vectors, compose_rotation, compose_scale,
    compose_translation, create_aim_matrix, decompose_matrix, decompose_slice, is_identity,
    matrix_from_slice, matrix_to_array, rotation_from_matrix, rotation_matrix_from_matrix,
    row_mul, scale_matrix_from_matrix, scale_matrix_from_slice, transform_point,
    transform_vector, uniform_scale_matrix, Axis, AxisVectors, TransformComponents,
};
pub use rotation::{euler_from_rotation, EulerRotation, RotationOrder};

/// Tolerance used for identity and equality checks on matrix elements.
pub const EPSILON: f64 = 1e-9;
