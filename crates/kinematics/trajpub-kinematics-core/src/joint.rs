//! Joint models: configuration layout, joint transform and motion subspace.

use nalgebra::{Isometry3, Quaternion, Translation3, Unit, UnitQuaternion, Vector3};

use crate::data::Motion;
use crate::model::JointIndex;
use crate::space::LieGroupSpace;

const MIN_ROTATION_NORM: f64 = 1e-12;

/// Motion a joint allows between its parent placement and its child body.
#[derive(Clone, Debug, PartialEq)]
pub enum JointModel {
    /// Rotation about `axis`, one angle.
    Revolute { axis: Unit<Vector3<f64>> },
    /// Rotation about `axis` without limits, stored as (cos, sin).
    RevoluteUnbounded { axis: Unit<Vector3<f64>> },
    /// Translation along `axis`.
    Prismatic { axis: Unit<Vector3<f64>> },
    /// Translation along the first `dims` axes of x, y, z.
    Translation { dims: usize },
    /// Translation in the xy-plane plus rotation about z.
    Planar,
    /// Unconstrained rigid motion. Velocity is (linear, angular) in the
    /// child frame.
    FreeFlyer,
}

impl JointModel {
    pub fn revolute(axis: Vector3<f64>) -> Self {
        JointModel::Revolute {
            axis: Unit::new_normalize(axis),
        }
    }

    pub fn revolute_unbounded(axis: Vector3<f64>) -> Self {
        JointModel::RevoluteUnbounded {
            axis: Unit::new_normalize(axis),
        }
    }

    pub fn prismatic(axis: Vector3<f64>) -> Self {
        JointModel::Prismatic {
            axis: Unit::new_normalize(axis),
        }
    }

    pub fn space(&self) -> LieGroupSpace {
        match self {
            JointModel::Revolute { .. } | JointModel::Prismatic { .. } => LieGroupSpace::R(1),
            JointModel::RevoluteUnbounded { .. } => LieGroupSpace::SO2,
            JointModel::Translation { dims } => LieGroupSpace::R(*dims),
            JointModel::Planar => LieGroupSpace::R2xSO2,
            JointModel::FreeFlyer => LieGroupSpace::R3xSO3,
        }
    }

    pub fn nq(&self) -> usize {
        self.space().nq()
    }

    pub fn nv(&self) -> usize {
        self.space().nv()
    }

    /// Neutral configuration of this joint.
    pub fn neutral(&self) -> Vec<f64> {
        match self {
            JointModel::RevoluteUnbounded { .. } => vec![1.0, 0.0],
            JointModel::Planar => vec![0.0, 0.0, 1.0, 0.0],
            JointModel::FreeFlyer => vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
            other => vec![0.0; other.nq()],
        }
    }

    /// Placement of the child frame relative to the joint's parent placement.
    /// `q` holds exactly `nq()` values.
    pub fn transform(&self, q: &[f64]) -> Isometry3<f64> {
        match self {
            JointModel::Revolute { axis } => {
                Isometry3::from_parts(Translation3::identity(), UnitQuaternion::from_axis_angle(axis, q[0]))
            }
            JointModel::RevoluteUnbounded { axis } => {
                let angle = q[1].atan2(q[0]);
                Isometry3::from_parts(Translation3::identity(), UnitQuaternion::from_axis_angle(axis, angle))
            }
            JointModel::Prismatic { axis } => {
                let t = axis.into_inner() * q[0];
                Isometry3::from_parts(Translation3::from(t), UnitQuaternion::identity())
            }
            JointModel::Translation { dims } => {
                let mut t = Vector3::zeros();
                for (i, value) in q.iter().take(*dims).enumerate() {
                    t[i] = *value;
                }
                Isometry3::from_parts(Translation3::from(t), UnitQuaternion::identity())
            }
            JointModel::Planar => {
                let angle = q[3].atan2(q[2]);
                Isometry3::from_parts(
                    Translation3::new(q[0], q[1], 0.0),
                    UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle),
                )
            }
            JointModel::FreeFlyer => {
                let raw = Quaternion::new(q[6], q[3], q[4], q[5]);
                let rotation = if raw.norm() < MIN_ROTATION_NORM {
                    UnitQuaternion::identity()
                } else {
                    UnitQuaternion::from_quaternion(raw)
                };
                Isometry3::from_parts(Translation3::new(q[0], q[1], q[2]), rotation)
            }
        }
    }

    /// Spatial velocity of the child frame relative to the parent placement,
    /// expressed in the child frame. `v` holds exactly `nv()` values.
    pub fn motion(&self, v: &[f64]) -> Motion {
        match self {
            JointModel::Revolute { axis } | JointModel::RevoluteUnbounded { axis } => {
                Motion::new(Vector3::zeros(), axis.into_inner() * v[0])
            }
            JointModel::Prismatic { axis } => Motion::new(axis.into_inner() * v[0], Vector3::zeros()),
            JointModel::Translation { dims } => {
                let mut linear = Vector3::zeros();
                for (i, value) in v.iter().take(*dims).enumerate() {
                    linear[i] = *value;
                }
                Motion::new(linear, Vector3::zeros())
            }
            JointModel::Planar => Motion::new(Vector3::new(v[0], v[1], 0.0), Vector3::new(0.0, 0.0, v[2])),
            JointModel::FreeFlyer => {
                Motion::new(Vector3::new(v[0], v[1], v[2]), Vector3::new(v[3], v[4], v[5]))
            }
        }
    }

    /// Column `dof` of the motion subspace, i.e. the motion produced by a
    /// unit velocity on that degree of freedom.
    pub fn motion_column(&self, dof: usize) -> Motion {
        let mut unit = [0.0; 6];
        unit[dof] = 1.0;
        self.motion(&unit[..self.nv()])
    }
}

/// What the discretization engine needs to know about a joint.
#[derive(Clone, Debug, PartialEq)]
pub struct JointInfo {
    pub name: String,
    pub index: JointIndex,
    pub rank_in_configuration: usize,
    pub config_size: usize,
    pub rank_in_velocity: usize,
    pub nb_dofs: usize,
    pub space: LieGroupSpace,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unbounded_revolute_reads_cos_sin() {
        let joint = JointModel::revolute_unbounded(Vector3::z());
        let half = std::f64::consts::FRAC_PI_2;
        let m = joint.transform(&[half.cos(), half.sin()]);
        let p = m * nalgebra::Point3::new(1.0, 0.0, 0.0);
        assert_relative_eq!(p.coords, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn freeflyer_uses_xyzw_layout() {
        let joint = JointModel::FreeFlyer;
        let s = std::f64::consts::FRAC_1_SQRT_2;
        // quarter turn about z
        let m = joint.transform(&[1.0, 2.0, 3.0, 0.0, 0.0, s, s]);
        assert_relative_eq!(m.translation.vector, Vector3::new(1.0, 2.0, 3.0));
        let x = m.rotation * Vector3::x();
        assert_relative_eq!(x, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn freeflyer_with_zero_quaternion_is_identity() {
        let m = JointModel::FreeFlyer.transform(&[0.0; 7]);
        assert_relative_eq!(m.rotation.angle(), 0.0);
    }

    #[test]
    fn motion_columns_match_nv() {
        let planar = JointModel::Planar;
        assert_eq!(planar.motion_column(0).linear, Vector3::x());
        assert_eq!(planar.motion_column(1).linear, Vector3::y());
        assert_eq!(planar.motion_column(2).angular, Vector3::z());

        let translation = JointModel::Translation { dims: 2 };
        assert_eq!(translation.nq(), 2);
        assert_eq!(translation.motion_column(1).linear, Vector3::y());
    }

    #[test]
    fn neutral_sizes_match_nq() {
        for joint in [
            JointModel::revolute(Vector3::x()),
            JointModel::revolute_unbounded(Vector3::x()),
            JointModel::prismatic(Vector3::x()),
            JointModel::Translation { dims: 3 },
            JointModel::Planar,
            JointModel::FreeFlyer,
        ] {
            assert_eq!(joint.neutral().len(), joint.nq());
        }
    }
}
