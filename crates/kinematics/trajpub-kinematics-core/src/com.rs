//! Center of mass of a set of subtrees.

use std::sync::Arc;

use nalgebra::{DVector, Matrix3xX, Vector3};

use crate::data::DeviceData;
use crate::error::{KinematicsError, KinematicsResult};
use crate::model::{JointIndex, KinematicModel};

/// Which quantities [`CenterOfMassComputation::compute`] should produce.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ComRequest {
    pub position: bool,
    pub jacobian: bool,
}

impl ComRequest {
    pub const NONE: ComRequest = ComRequest {
        position: false,
        jacobian: false,
    };
    pub const POSITION: ComRequest = ComRequest {
        position: true,
        jacobian: false,
    };
    pub const JACOBIAN: ComRequest = ComRequest {
        position: false,
        jacobian: true,
    };
    pub const ALL: ComRequest = ComRequest {
        position: true,
        jacobian: true,
    };

    pub fn is_empty(&self) -> bool {
        !self.position && !self.jacobian
    }
}

/// Result of one center-of-mass evaluation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ComQuantities {
    position: Option<Vector3<f64>>,
    jacobian: Option<Matrix3xX<f64>>,
}

impl ComQuantities {
    /// World position, when requested.
    pub fn position(&self) -> Option<&Vector3<f64>> {
        self.position.as_ref()
    }

    /// `3 x nv` jacobian in world coordinates, when requested.
    pub fn jacobian(&self) -> Option<&Matrix3xX<f64>> {
        self.jacobian.as_ref()
    }

    /// `J * v`, when the jacobian was requested.
    pub fn velocity(&self, v: &DVector<f64>) -> Option<Vector3<f64>> {
        self.jacobian.as_ref().map(|j| j * v)
    }
}

/// Mass-weighted center of the bodies carried by a set of subtrees.
#[derive(Clone, Debug)]
pub struct CenterOfMassComputation {
    name: String,
    model: Arc<KinematicModel>,
    roots: Vec<JointIndex>,
}

impl CenterOfMassComputation {
    /// Empty computation; add subtrees with [`add_subtree`](Self::add_subtree).
    pub fn new(model: Arc<KinematicModel>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model,
            roots: Vec::new(),
        }
    }

    /// Computation over every body of the model.
    pub fn whole_body(model: Arc<KinematicModel>, name: impl Into<String>) -> Self {
        let roots = model
            .joints()
            .iter()
            .enumerate()
            .filter(|(_, j)| j.parent.is_none())
            .map(|(i, _)| JointIndex(i))
            .collect();
        Self {
            name: name.into(),
            model,
            roots,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> &Arc<KinematicModel> {
        &self.model
    }

    /// Include every body below (and carried by) the named joint.
    pub fn add_subtree(&mut self, joint: &str) -> KinematicsResult<()> {
        let index = self
            .model
            .joint_index(joint)
            .ok_or_else(|| KinematicsError::JointNotFound(joint.to_string()))?;
        if !self.roots.contains(&index) {
            self.roots.push(index);
        }
        Ok(())
    }

    fn bodies(&self) -> impl Iterator<Item = JointIndex> + '_ {
        (0..self.model.joints().len())
            .map(JointIndex)
            .filter(|&j| self.roots.iter().any(|&r| self.model.is_ancestor(r, j)))
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies()
            .map(|j| self.model.joints()[j.0].body.mass)
            .sum()
    }

    /// Evaluate on `data`, whose forward kinematics must be up to date.
    /// A massless set yields zeros.
    pub fn compute(&self, data: &DeviceData, request: ComRequest) -> ComQuantities {
        let mut out = ComQuantities::default();
        if request.is_empty() {
            return out;
        }
        let joints = self.model.joints();
        let total = self.total_mass();
        let mut position = Vector3::zeros();
        let mut jacobian = Matrix3xX::zeros(self.model.nb_dofs());

        if total > 0.0 {
            for body in self.bodies() {
                let joint = &joints[body.0];
                if joint.body.mass <= 0.0 {
                    continue;
                }
                let weight = joint.body.mass / total;
                let point = data.joint_placement(body) * nalgebra::Point3::from(joint.body.lever);
                position += point.coords * weight;

                if !request.jacobian {
                    continue;
                }
                for ancestor in self.model.support(body) {
                    let a = &joints[ancestor.0];
                    let placement = data.joint_placement(ancestor);
                    let lever = point.coords - placement.translation.vector;
                    for dof in 0..a.model.nv() {
                        let s = a.model.motion_column(dof);
                        let angular = placement.rotation * s.angular;
                        let linear = placement.rotation * s.linear + angular.cross(&lever);
                        let mut column = jacobian.column_mut(a.idx_v + dof);
                        column += linear * weight;
                    }
                }
            }
        }

        if request.position {
            out.position = Some(position);
        }
        if request.jacobian {
            out.jacobian = Some(jacobian);
        }
        out
    }
}
