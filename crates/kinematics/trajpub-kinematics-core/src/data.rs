//! Working data for one forward-kinematics pass.

use std::sync::Arc;

use nalgebra::{DVector, Isometry3, Vector3};

use crate::error::{KinematicsError, KinematicsResult};
use crate::model::{FrameIndex, JointIndex, KinematicModel};

/// Spatial velocity: linear part at the frame origin, then angular part.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Motion {
    pub linear: Vector3<f64>,
    pub angular: Vector3<f64>,
}

impl Motion {
    pub fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    pub fn zero() -> Self {
        Self::new(Vector3::zeros(), Vector3::zeros())
    }

    /// Express a motion given in the frame of `m`'s parent in the frame of
    /// `m` itself (linear part moved to the new origin).
    pub fn act_inv(&self, m: &Isometry3<f64>) -> Motion {
        let rot_inv = m.rotation.inverse();
        let p = m.translation.vector;
        Motion {
            linear: rot_inv * (self.linear - p.cross(&self.angular)),
            angular: rot_inv * self.angular,
        }
    }

    /// Linear then angular components.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.linear.x,
            self.linear.y,
            self.linear.z,
            self.angular.x,
            self.angular.y,
            self.angular.z,
        ]
    }
}

impl std::ops::Add for Motion {
    type Output = Motion;
    fn add(self, rhs: Motion) -> Motion {
        Motion::new(self.linear + rhs.linear, self.angular + rhs.angular)
    }
}

/// Configuration, velocity and the placements/velocities derived from them.
///
/// Obtained through [`Device::sync`](crate::Device::sync); never shared
/// between two concurrent passes.
#[derive(Debug, Clone)]
pub struct DeviceData {
    model: Arc<KinematicModel>,
    q: DVector<f64>,
    v: DVector<f64>,
    joint_placements: Vec<Isometry3<f64>>,
    joint_velocities: Vec<Motion>,
    frame_placements: Vec<Isometry3<f64>>,
}

impl DeviceData {
    pub fn new(model: Arc<KinematicModel>) -> Self {
        let nj = model.joints().len();
        let nf = model.frames().len();
        let q = model.neutral_configuration();
        let v = DVector::zeros(model.nb_dofs());
        let mut data = Self {
            model,
            q,
            v,
            joint_placements: vec![Isometry3::identity(); nj],
            joint_velocities: vec![Motion::zero(); nj],
            frame_placements: vec![Isometry3::identity(); nf],
        };
        data.compute_frames_forward_kinematics();
        data
    }

    pub fn model(&self) -> &KinematicModel {
        &self.model
    }

    pub fn configuration(&self) -> &DVector<f64> {
        &self.q
    }

    pub fn velocity(&self) -> &DVector<f64> {
        &self.v
    }

    pub fn set_configuration(&mut self, q: &DVector<f64>) -> KinematicsResult<()> {
        if q.len() != self.model.config_size() {
            return Err(KinematicsError::DimensionMismatch {
                what: "configuration",
                expected: self.model.config_size(),
                actual: q.len(),
            });
        }
        self.q.copy_from(q);
        Ok(())
    }

    pub fn set_velocity(&mut self, v: &DVector<f64>) -> KinematicsResult<()> {
        if v.len() != self.model.nb_dofs() {
            return Err(KinematicsError::DimensionMismatch {
                what: "velocity",
                expected: self.model.nb_dofs(),
                actual: v.len(),
            });
        }
        self.v.copy_from(v);
        Ok(())
    }

    /// Update joint placements, joint velocities and frame placements from
    /// the current configuration and velocity.
    pub fn compute_frames_forward_kinematics(&mut self) {
        let model = Arc::clone(&self.model);
        for (i, joint) in model.joints().iter().enumerate() {
            let q = &self.q.as_slice()[joint.idx_q..joint.idx_q + joint.model.nq()];
            let v = &self.v.as_slice()[joint.idx_v..joint.idx_v + joint.model.nv()];
            let local = joint.placement * joint.model.transform(q);
            let (parent_placement, parent_velocity) = match joint.parent {
                Some(JointIndex(p)) => (self.joint_placements[p], self.joint_velocities[p]),
                None => (Isometry3::identity(), Motion::zero()),
            };
            self.joint_placements[i] = parent_placement * local;
            self.joint_velocities[i] = parent_velocity.act_inv(&local) + joint.model.motion(v);
        }
        for (f, frame) in model.frames().iter().enumerate() {
            self.frame_placements[f] = match frame.parent {
                Some(JointIndex(j)) => self.joint_placements[j] * frame.placement,
                None => frame.placement,
            };
        }
    }

    /// World placement of a joint frame.
    pub fn joint_placement(&self, joint: JointIndex) -> &Isometry3<f64> {
        &self.joint_placements[joint.0]
    }

    /// Spatial velocity of a joint frame, expressed in that frame.
    pub fn joint_velocity(&self, joint: JointIndex) -> &Motion {
        &self.joint_velocities[joint.0]
    }

    /// World placement of a frame.
    pub fn frame_placement(&self, frame: FrameIndex) -> &Isometry3<f64> {
        &self.frame_placements[frame.0]
    }

    /// Spatial velocity of a frame, expressed in that frame.
    pub fn frame_velocity(&self, frame: FrameIndex) -> Motion {
        let frame = &self.model.frames()[frame.0];
        match frame.parent {
            Some(JointIndex(j)) => self.joint_velocities[j].act_inv(&frame.placement),
            None => Motion::zero(),
        }
    }
}
