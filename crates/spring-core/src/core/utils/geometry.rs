use nalgebra::{Matrix3, Point3, Vector3};

/// A rigid-body transform `x' = R·x + t` with an arbitrary 3×3 linear part.
///
/// Symmetry operators and superposition results are both expressed as 3×4 matrices
/// whose rows are `[r1, r2, r3, t]`, i.e. `x' = a·x + b·y + c·z + d` per output axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub rotation: Matrix3<f64>,
    pub translation: Vector3<f64>,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub fn identity() -> Self {
        Self {
            rotation: Matrix3::identity(),
            translation: Vector3::zeros(),
        }
    }

    /// Builds a transform from three `[a, b, c, d]` rows.
    pub fn from_rows(rows: [[f64; 4]; 3]) -> Self {
        let rotation = Matrix3::new(
            rows[0][0], rows[0][1], rows[0][2], //
            rows[1][0], rows[1][1], rows[1][2], //
            rows[2][0], rows[2][1], rows[2][2],
        );
        let translation = Vector3::new(rows[0][3], rows[1][3], rows[2][3]);
        Self {
            rotation,
            translation,
        }
    }

    pub fn rows(&self) -> [[f64; 4]; 3] {
        let r = &self.rotation;
        let t = &self.translation;
        [
            [r[(0, 0)], r[(0, 1)], r[(0, 2)], t.x],
            [r[(1, 0)], r[(1, 1)], r[(1, 2)], t.y],
            [r[(2, 0)], r[(2, 1)], r[(2, 2)], t.z],
        ]
    }

    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation * point.coords + self.translation)
    }

    /// Returns the transform undoing this one, or `None` if the linear part is singular.
    pub fn inverse(&self) -> Option<Self> {
        let rotation = self.rotation.try_inverse()?;
        let translation = -(rotation * self.translation);
        Some(Self {
            rotation,
            translation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Unit};

    const TOLERANCE: f64 = 1e-9;

    fn assert_points_eq(a: &Point3<f64>, b: &Point3<f64>) {
        assert!(
            (a - b).norm() < TOLERANCE,
            "points differ: {:?} vs {:?}",
            a,
            b
        );
    }

    fn quarter_turn_about_z_with_shift() -> AffineTransform {
        AffineTransform::from_rows([
            [0.0, -1.0, 0.0, 1.0],
            [1.0, 0.0, 0.0, 2.0],
            [0.0, 0.0, 1.0, 3.0],
        ])
    }

    #[test]
    fn identity_leaves_points_unchanged() {
        let p = Point3::new(1.5, -2.0, 7.25);
        assert_points_eq(&AffineTransform::identity().apply(&p), &p);
    }

    #[test]
    fn rows_follow_the_linear_then_translation_convention() {
        let transform = quarter_turn_about_z_with_shift();
        let moved = transform.apply(&Point3::new(1.0, 0.0, 0.0));
        assert_points_eq(&moved, &Point3::new(1.0, 3.0, 3.0));
        assert_eq!(transform.rows()[1], [1.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn inverse_round_trips_points() {
        let axis = Unit::new_normalize(Vector3::new(1.0, 2.0, -0.5));
        let rotation = Rotation3::from_axis_angle(&axis, 0.73);
        let transform = AffineTransform {
            rotation: *rotation.matrix(),
            translation: Vector3::new(-4.0, 11.0, 0.25),
        };
        let inverse = transform.inverse().unwrap();

        for p in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.8, -1.2, 9.9),
            Point3::new(-20.0, 5.5, 1.0),
        ] {
            assert_points_eq(&inverse.apply(&transform.apply(&p)), &p);
        }
    }

    #[test]
    fn inverse_of_singular_transform_is_none() {
        let singular = AffineTransform::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ]);
        assert!(singular.inverse().is_none());
    }
}
