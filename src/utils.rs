use crate::types::{Axis, Matrix, Position};
use cgmath::{Deg, Rad, SquareMatrix};

/// Snap values within `f64::EPSILON` of zero to exactly 0.0 (so no -0.0 ends up in matrices).
pub(crate) fn snap_to_zero(value: f64) -> f64 {
    if value.abs() < f64::EPSILON {
        0.0
    } else {
        value
    }
}

/// Rotation matrix about a principal axis, angle in DEGREES.
pub fn rotation_matrix(angle: f64, axis: Axis) -> Matrix {
    let Rad(angle) = Rad::from(Deg(angle));
    let sin_a = snap_to_zero(angle.sin());
    let cos_a = snap_to_zero(angle.cos());
    let msin_a = snap_to_zero(-sin_a);

    let mut matrix = Matrix::identity();
    match axis {
        Axis::X => {
            matrix.y.y = cos_a;
            matrix.y.z = sin_a;
            matrix.z.y = msin_a;
            matrix.z.z = cos_a;
        }
        Axis::Y => {
            matrix.x.x = cos_a;
            matrix.x.z = msin_a;
            matrix.z.x = sin_a;
            matrix.z.z = cos_a;
        }
        Axis::Z => {
            matrix.x.x = cos_a;
            matrix.x.y = sin_a;
            matrix.y.x = msin_a;
            matrix.y.y = cos_a;
        }
    }
    matrix
}

/// Translation matrix along a single axis.
pub fn axis_translation(value: f64, axis: Axis) -> Matrix {
    let displacement = match axis {
        Axis::X => Position::new(value, 0.0, 0.0),
        Axis::Y => Position::new(0.0, value, 0.0),
        Axis::Z => Position::new(0.0, 0.0, value),
    };
    Matrix::from_translation(displacement)
}

/// Translation column of a transform.
pub(crate) fn translation_of(matrix: &Matrix) -> Position {
    matrix.w.truncate()
}
