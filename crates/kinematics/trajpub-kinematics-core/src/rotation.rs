//! Rotation encodings used on output channels.

use nalgebra::UnitQuaternion;

/// Euler angles `[z, y, x]` such that `R = Rz(a0) * Ry(a1) * Rx(a2)`.
///
/// The first angle is kept in `[0, pi]`; the other two absorb the sign.
/// This is lossy near the singularity and discontinuous when the yaw
/// crosses zero, so consumers should not differentiate it.
pub fn euler_zyx(rotation: &UnitQuaternion<f64>) -> [f64; 3] {
    let m = rotation.to_rotation_matrix().into_inner();

    let mut a0 = m[(1, 0)].atan2(m[(0, 0)]);
    let c2 = m[(2, 2)].hypot(m[(2, 1)]);
    let a1 = if a0 < 0.0 {
        a0 += std::f64::consts::PI;
        (-m[(2, 0)]).atan2(-c2)
    } else {
        (-m[(2, 0)]).atan2(c2)
    };
    let (s0, c0) = a0.sin_cos();
    let a2 = (s0 * m[(0, 2)] - c0 * m[(1, 2)]).atan2(c0 * m[(1, 1)] - s0 * m[(0, 1)]);
    [a0, a1, a2]
}

/// Quaternion as `[w, x, y, z]`.
pub fn quaternion_wxyz(rotation: &UnitQuaternion<f64>) -> [f64; 4] {
    [rotation.w, rotation.i, rotation.j, rotation.k]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn zyx(z: f64, y: f64, x: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Vector3::z_axis(), z)
            * UnitQuaternion::from_axis_angle(&Vector3::y_axis(), y)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), x)
    }

    #[test]
    fn identity_is_zero() {
        let angles = euler_zyx(&UnitQuaternion::identity());
        for a in angles {
            assert_relative_eq!(a, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn recovers_positive_angles() {
        let angles = euler_zyx(&zyx(0.3, 0.2, 0.1));
        assert_relative_eq!(angles[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(angles[1], 0.2, epsilon = 1e-12);
        assert_relative_eq!(angles[2], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn negative_yaw_is_folded() {
        let q = zyx(-0.5, 0.0, 0.0);
        let angles = euler_zyx(&q);
        assert!(angles[0] >= 0.0);
        // Whatever the folding, the angles rebuild the same rotation.
        let rebuilt = zyx(angles[0], angles[1], angles[2]);
        assert_relative_eq!(rebuilt.angle_to(&q), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn quaternion_is_scalar_first() {
        let q = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        let [w, x, y, z] = quaternion_wxyz(&q);
        let s = std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(w, s, epsilon = 1e-12);
        assert_relative_eq!(x, 0.0);
        assert_relative_eq!(y, 0.0);
        assert_relative_eq!(z, s, epsilon = 1e-12);
    }
}
