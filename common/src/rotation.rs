//! Rotation orders and euler angles.

use std::fmt;
use std::str::FromStr;

use cgmath::{Matrix3, Vector3};

use crate::{compose_rotation, rotation_from_matrix, MathError, EPSILON};

/// The sequence in which elementary axis rotations are applied.
///
/// The first named axis rotates first. Discriminants match the integer
/// encoding used by scene files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RotationOrder {
    #[default]
    Xyz = 0,
    Yzx = 1,
    Zxy = 2,
    Xzy = 3,
    Yxz = 4,
    Zyx = 5,
}

impl RotationOrder {
    pub const ALL: [RotationOrder; 6] = [
        RotationOrder::Xyz,
        RotationOrder::Yzx,
        RotationOrder::Zxy,
        RotationOrder::Xzy,
        RotationOrder::Yxz,
        RotationOrder::Zyx,
    ];

    /// Axis indices `(first, second, third)` in application order.
    pub fn axes(self) -> (usize, usize, usize) {
        match self {
            RotationOrder::Xyz => (0, 1, 2),
            RotationOrder::Yzx => (1, 2, 0),
            RotationOrder::Zxy => (2, 0, 1),
            RotationOrder::Xzy => (0, 2, 1),
            RotationOrder::Yxz => (1, 0, 2),
            RotationOrder::Zyx => (2, 1, 0),
        }
    }

    /// True for the cyclic permutations of XYZ.
    pub fn is_cyclic(self) -> bool {
        matches!(
            self,
            RotationOrder::Xyz | RotationOrder::Yzx | RotationOrder::Zxy
        )
    }

    pub fn index(self) -> i64 {
        self as i64
    }
}

impl TryFrom<i64> for RotationOrder {
    type Error = MathError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RotationOrder::Xyz),
            1 => Ok(RotationOrder::Yzx),
            2 => Ok(RotationOrder::Zxy),
            3 => Ok(RotationOrder::Xzy),
            4 => Ok(RotationOrder::Yxz),
            5 => Ok(RotationOrder::Zyx),
            _ => Err(MathError::InvalidRotationOrder(value)),
        }
    }
}

impl FromStr for RotationOrder {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xyz" => Ok(RotationOrder::Xyz),
            "yzx" => Ok(RotationOrder::Yzx),
            "zxy" => Ok(RotationOrder::Zxy),
            "xzy" => Ok(RotationOrder::Xzy),
            "yxz" => Ok(RotationOrder::Yxz),
            "zyx" => Ok(RotationOrder::Zyx),
            other => other
                .parse::<i64>()
                .map_err(|_| MathError::Argument(format!("unknown rotation order '{}'", s)))
                .and_then(RotationOrder::try_from),
        }
    }
}

impl fmt::Display for RotationOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RotationOrder::Xyz => "xyz",
            RotationOrder::Yzx => "yzx",
            RotationOrder::Zxy => "zxy",
            RotationOrder::Xzy => "xzy",
            RotationOrder::Yxz => "yxz",
            RotationOrder::Zyx => "zyx",
        };
        f.write_str(name)
    }
}

/// Three angles in radians, meaningful only together with their order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EulerRotation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub order: RotationOrder,
}

impl EulerRotation {
    pub const fn new(x: f64, y: f64, z: f64, order: RotationOrder) -> Self {
        Self { x, y, z, order }
    }

    /// A zero rotation in the given order.
    pub const fn identity(order: RotationOrder) -> Self {
        Self::new(0.0, 0.0, 0.0, order)
    }

    pub fn from_vector(angles: Vector3<f64>, order: RotationOrder) -> Self {
        Self::new(angles.x, angles.y, angles.z, order)
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Angle about the axis with the given index (0 = X).
    pub fn angle(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn is_identity(&self) -> bool {
        self.x.abs() < EPSILON && self.y.abs() < EPSILON && self.z.abs() < EPSILON
    }

    /// Expresses the same orientation under another rotation order.
    pub fn reorder(&self, order: RotationOrder) -> Self {
        if order == self.order {
            return *self;
        }
        rotation_from_matrix(&compose_rotation(self), order)
    }
}

/// Extracts euler angles from a pure rotation.
///
/// `rotation` must be orthonormal. The middle axis of `order` is resolved to
/// `[-π/2, π/2]`. At gimbal lock the last axis is pinned to zero and the
/// first axis absorbs the combined angle.
pub fn euler_from_rotation(rotation: &Matrix3<f64>, order: RotationOrder) -> EulerRotation {
    let (i, j, k) = order.axes();
    let sign = if order.is_cyclic() { 1.0 } else { -1.0 };

    // cgmath's m[col][row] is the column-vector matrix Rk·Rj·Ri.
    let r = |row: usize, col: usize| rotation[col][row];

    let cos_j = r(i, i).hypot(r(j, i));
    let mut angles = [0.0; 3];

    if cos_j > 1e-10 {
        angles[i] = (sign * r(k, j)).atan2(r(k, k));
        angles[j] = (-sign * r(k, i)).atan2(cos_j);
        angles[k] = (sign * r(j, i)).atan2(r(i, i));
    } else {
        angles[i] = (-sign * r(j, k)).atan2(r(j, j));
        angles[j] = (-sign * r(k, i)).atan2(cos_j);
        angles[k] = 0.0;
    }

    EulerRotation::new(angles[0], angles[1], angles[2], order)
}
