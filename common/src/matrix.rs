//! Composition and decomposition of affine matrices.
//!
//! All functions here are pure. See the crate docs for the row-vector
//! convention.

use std::fmt;

use cgmath::{
    EuclideanSpace, InnerSpace, Matrix3, Matrix4, Point3, Quaternion, Rad, SquareMatrix, Vector3,
    Vector4,
};

use crate::{euler_from_rotation, EulerRotation, MathError, RotationOrder, EPSILON};

// =============================================================================
// Products
// =============================================================================

/// Row-vector product `a × b`: `a` is applied first, then `b`.
pub fn row_mul(a: &Matrix4<f64>, b: &Matrix4<f64>) -> Matrix4<f64> {
    b * a
}

/// Transforms a point (implicit w = 1) as `p × m`.
pub fn transform_point(point: Point3<f64>, matrix: &Matrix4<f64>) -> Point3<f64> {
    Point3::from_homogeneous(matrix * point.to_homogeneous())
}

/// Transforms a direction (w = 0) as `v × m`, ignoring translation.
pub fn transform_vector(vector: Vector3<f64>, matrix: &Matrix4<f64>) -> Vector3<f64> {
    (matrix * vector.extend(0.0)).truncate()
}

// =============================================================================
// Composition
// =============================================================================

/// Identity with row 3 set to `(v.x, v.y, v.z, 1)`.
pub fn compose_translation(translation: Vector3<f64>) -> Matrix4<f64> {
    Matrix4::from_translation(translation)
}

/// `diag(s.x, s.y, s.z, 1)`.
pub fn compose_scale(scale: Vector3<f64>) -> Matrix4<f64> {
    Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z)
}

/// Builds the rotation for `euler` by multiplying the elementary axis
/// rotations in the sequence named by its order.
pub fn compose_rotation(euler: &EulerRotation) -> Matrix4<f64> {
    let rx = Matrix4::from_angle_x(Rad(euler.x));
    let ry = Matrix4::from_angle_y(Rad(euler.y));
    let rz = Matrix4::from_angle_z(Rad(euler.z));

    match euler.order {
        RotationOrder::Xyz => row_mul(&row_mul(&rx, &ry), &rz),
        RotationOrder::Yzx => row_mul(&row_mul(&ry, &rz), &rx),
        RotationOrder::Zxy => row_mul(&row_mul(&rz, &rx), &ry),
        RotationOrder::Xzy => row_mul(&row_mul(&rx, &rz), &ry),
        RotationOrder::Yxz => row_mul(&row_mul(&ry, &rx), &rz),
        RotationOrder::Zyx => row_mul(&row_mul(&rz, &ry), &rx),
    }
}

/// Translate, rotate and scale channels of an affine matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformComponents {
    pub translation: Vector3<f64>,
    pub rotation: EulerRotation,
    pub scale: Vector3<f64>,
}

impl TransformComponents {
    pub fn identity(order: RotationOrder) -> Self {
        Self {
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: EulerRotation::identity(order),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Composes `scale × rotate × translate`.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        let scale = compose_scale(self.scale);
        let rotation = compose_rotation(&self.rotation);
        let translation = compose_translation(self.translation);
        row_mul(&row_mul(&scale, &rotation), &translation)
    }
}

impl fmt::Display for TransformComponents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate [{}, {}, {}] rotate [{}, {}, {}] ({}) scale [{}, {}, {}]",
            self.translation.x,
            self.translation.y,
            self.translation.z,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
            self.rotation.order,
            self.scale.x,
            self.scale.y,
            self.scale.z
        )
    }
}

// =============================================================================
// Decomposition
// =============================================================================

fn upper3(matrix: &Matrix4<f64>) -> Matrix3<f64> {
    Matrix3::from_cols(matrix.x.truncate(), matrix.y.truncate(), matrix.z.truncate())
}

/// Splits `matrix` into translation, euler rotation (in `order`) and scale.
///
/// Scale is the length of each axis row; a mirrored basis (negative
/// determinant) is reported as negative scale on all three axes. Shear and
/// the projective column are ignored.
pub fn decompose_matrix(matrix: &Matrix4<f64>, order: RotationOrder) -> TransformComponents {
    let translation = matrix.w.truncate();
    let basis = upper3(matrix);

    let mut scale = Vector3::new(
        basis.x.magnitude(),
        basis.y.magnitude(),
        basis.z.magnitude(),
    );
    if basis.determinant() < 0.0 {
        scale = -scale;
    }

    let rotation = if scale.x.abs() < EPSILON || scale.y.abs() < EPSILON || scale.z.abs() < EPSILON
    {
        EulerRotation::identity(order)
    } else {
        let rotation = Matrix3::from_cols(basis.x / scale.x, basis.y / scale.y, basis.z / scale.z);
        euler_from_rotation(&rotation, order)
    };

    TransformComponents {
        translation,
        rotation,
        scale,
    }
}

/// [`decompose_matrix`] over the 16-double interchange form.
pub fn decompose_slice(
    values: &[f64],
    order: RotationOrder,
) -> Result<TransformComponents, MathError> {
    if values.len() != 16 {
        return Err(MathError::Argument(format!(
            "decompose expects 16 values ({} given)",
            values.len()
        )));
    }
    Ok(decompose_matrix(&matrix_from_slice(values)?, order))
}

/// Euler angles of the rotation part of `matrix`, with scale removed.
pub fn rotation_from_matrix(matrix: &Matrix4<f64>, order: RotationOrder) -> EulerRotation {
    decompose_matrix(matrix, order).rotation
}

/// Copies the upper 3×3 block into an otherwise identity matrix.
pub fn rotation_matrix_from_matrix(matrix: &Matrix4<f64>) -> Matrix4<f64> {
    Matrix4::from(upper3(matrix))
}

/// Scale matrix built from the axis row lengths of `matrix`.
pub fn scale_matrix_from_matrix(matrix: &Matrix4<f64>) -> Matrix4<f64> {
    let axes = axis_vectors(matrix, false);
    compose_scale(Vector3::new(
        axes.x.magnitude(),
        axes.y.magnitude(),
        axes.z.magnitude(),
    ))
}

pub fn uniform_scale_matrix(scale: f64) -> Matrix4<f64> {
    Matrix4::from_scale(scale)
}

// =============================================================================
// Axis vectors
// =============================================================================

/// The three axis rows of a matrix plus its position row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisVectors {
    pub x: Vector3<f64>,
    pub y: Vector3<f64>,
    pub z: Vector3<f64>,
    pub position: Point3<f64>,
}

/// Rows 0..2 of `matrix` (optionally unit length) and row 3 as a point.
pub fn axis_vectors(matrix: &Matrix4<f64>, normalize: bool) -> AxisVectors {
    let x = matrix.x.truncate();
    let y = matrix.y.truncate();
    let z = matrix.z.truncate();
    let position = Point3::from_vec(matrix.w.truncate());

    if normalize {
        AxisVectors {
            x: x.normalize(),
            y: y.normalize(),
            z: z.normalize(),
            position,
        }
    } else {
        AxisVectors { x, y, z, position }
    }
}

/// One of the three basis axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X = 0,
    Y = 1,
    Z = 2,
}

impl TryFrom<i64> for Axis {
    type Error = MathError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Axis::X),
            1 => Ok(Axis::Y),
            2 => Ok(Axis::Z),
            _ => Err(MathError::InvalidAxis(value)),
        }
    }
}

impl Axis {
    pub fn unit(self) -> Vector3<f64> {
        match self {
            Axis::X => Vector3::unit_x(),
            Axis::Y => Vector3::unit_y(),
            Axis::Z => Vector3::unit_z(),
        }
    }
}

/// Builds an orthonormal, right-handed basis aiming `forward_axis` along
/// `forward * forward_sign`, with `up_axis` derived from `up * up_sign`.
///
/// The up vector only needs to be roughly perpendicular to the forward
/// vector; the remaining axis is the cross product of the other two.
pub fn create_aim_matrix(
    forward_axis: Axis,
    forward: Vector3<f64>,
    up_axis: Axis,
    up: Vector3<f64>,
    origin: Point3<f64>,
    forward_sign: f64,
    up_sign: f64,
) -> Result<Matrix4<f64>, MathError> {
    let forward = forward * forward_sign;
    let up = up * up_sign;

    let (x, y, z) = match (forward_axis, up_axis) {
        (Axis::X, Axis::Y) => {
            let z = forward.cross(up);
            (forward, z.cross(forward), z)
        }
        (Axis::X, Axis::Z) => {
            let y = up.cross(forward);
            (forward, y, forward.cross(y))
        }
        (Axis::Y, Axis::X) => {
            let z = up.cross(forward);
            (forward.cross(z), forward, z)
        }
        (Axis::Y, Axis::Z) => {
            let x = forward.cross(up);
            (x, forward, x.cross(forward))
        }
        (Axis::Z, Axis::X) => {
            let y = forward.cross(up);
            (y.cross(forward), y, forward)
        }
        (Axis::Z, Axis::Y) => {
            let x = up.cross(forward);
            (x, forward.cross(x), forward)
        }
        (forward_axis, _) => {
            return Err(MathError::Argument(format!(
                "aim matrix needs distinct forward and up axes ({:?} given twice)",
                forward_axis
            )));
        }
    };

    for axis in [x, y, z] {
        if axis.magnitude2() < EPSILON {
            return Err(MathError::Argument(
                "aim matrix forward and up vectors must be non-zero and not parallel".to_string(),
            ));
        }
    }

    let (x, y, z) = (x.normalize(), y.normalize(), z.normalize());
    Ok(Matrix4::from_cols(
        x.extend(0.0),
        y.extend(0.0),
        z.extend(0.0),
        origin.to_homogeneous(),
    ))
}

/// Rotation carrying the +X axis onto `axis`.
pub fn axis_rotation_matrix(axis: Vector3<f64>) -> Matrix4<f64> {
    let rotation = Quaternion::from_arc(Vector3::unit_x(), axis.normalize(), None);
    Matrix4::from(rotation)
}

// =============================================================================
// Interchange form
// =============================================================================

/// Flattens `matrix` into 16 doubles, row-major.
pub fn matrix_to_array(matrix: &Matrix4<f64>) -> [f64; 16] {
    let rows: [[f64; 4]; 4] = (*matrix).into();
    let mut values = [0.0; 16];
    for (chunk, row) in values.chunks_exact_mut(4).zip(rows.iter()) {
        chunk.copy_from_slice(row);
    }
    values
}

/// Reads a matrix from 16 row-major doubles. Four values are accepted as a
/// diagonal shorthand.
pub fn matrix_from_slice(values: &[f64]) -> Result<Matrix4<f64>, MathError> {
    match values.len() {
        16 => {
            let mut rows = [[0.0; 4]; 4];
            for (row, chunk) in rows.iter_mut().zip(values.chunks_exact(4)) {
                row.copy_from_slice(chunk);
            }
            Ok(Matrix4::from(rows))
        }
        4 => Ok(Matrix4::from_diagonal(Vector4::new(
            values[0], values[1], values[2], values[3],
        ))),
        n => Err(MathError::Argument(format!(
            "matrix expects 4 or 16 values ({} given)",
            n
        ))),
    }
}

/// Scale matrix from three per-axis factors, or four diagonal values.
pub fn scale_matrix_from_slice(values: &[f64]) -> Result<Matrix4<f64>, MathError> {
    match values.len() {
        3 => Ok(compose_scale(Vector3::new(values[0], values[1], values[2]))),
        4 => matrix_from_slice(values),
        n => Err(MathError::Argument(format!(
            "scale matrix expects 3 or 4 values ({} given)",
            n
        ))),
    }
}

// =============================================================================
// Comparison
// =============================================================================

/// Element-wise comparison within `epsilon`.
pub fn approx_eq(a: &Matrix4<f64>, b: &Matrix4<f64>, epsilon: f64) -> bool {
    let a = matrix_to_array(a);
    let b = matrix_to_array(b);
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= epsilon)
}

pub fn is_identity(matrix: &Matrix4<f64>, epsilon: f64) -> bool {
    approx_eq(matrix, &Matrix4::identity(), epsilon)
}
