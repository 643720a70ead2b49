//! Kinematic tree description.
//!
//! Joints are stored in topological order: a joint's parent always has a
//! smaller index. Every joint owns a frame carrying its name; extra frames
//! (links, tool points) are attached to joints with a fixed placement.
//! Indices handed out by the builder stay valid for the life of the model.

use hashbrown::HashMap;
use nalgebra::{DVector, Isometry3, Vector3};

use crate::error::{KinematicsError, KinematicsResult};
use crate::joint::{JointInfo, JointModel};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JointIndex(pub usize);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameIndex(pub usize);

/// Rigid body carried by a joint.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub mass: f64,
    /// Center of mass in the joint frame.
    pub lever: Vector3<f64>,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            mass: 0.0,
            lever: Vector3::zeros(),
        }
    }
}

impl Body {
    /// Merge another body expressed in the same frame.
    pub fn append(&mut self, mass: f64, lever: Vector3<f64>) {
        let total = self.mass + mass;
        if total > 0.0 {
            self.lever = (self.lever * self.mass + lever * mass) / total;
        }
        self.mass = total;
    }
}

#[derive(Clone, Debug)]
pub struct Joint {
    pub name: String,
    pub parent: Option<JointIndex>,
    /// Placement of the joint in its parent's frame (world when no parent).
    pub placement: Isometry3<f64>,
    pub model: JointModel,
    pub idx_q: usize,
    pub idx_v: usize,
    pub body: Body,
}

#[derive(Clone, Debug)]
pub struct Frame {
    pub name: String,
    /// Supporting joint, `None` for frames fixed in the world.
    pub parent: Option<JointIndex>,
    pub placement: Isometry3<f64>,
}

#[derive(Clone, Debug)]
pub struct KinematicModel {
    name: String,
    joints: Vec<Joint>,
    frames: Vec<Frame>,
    joint_ids: HashMap<String, JointIndex>,
    frame_ids: HashMap<String, FrameIndex>,
    nq: usize,
    nv: usize,
}

pub const UNIVERSE_FRAME: &str = "universe";

impl KinematicModel {
    /// Empty model with a single `universe` frame at the world origin.
    pub fn new(name: impl Into<String>) -> Self {
        let mut model = Self {
            name: name.into(),
            joints: Vec::new(),
            frames: Vec::new(),
            joint_ids: HashMap::new(),
            frame_ids: HashMap::new(),
            nq: 0,
            nv: 0,
        };
        model.frames.push(Frame {
            name: UNIVERSE_FRAME.to_string(),
            parent: None,
            placement: Isometry3::identity(),
        });
        model
            .frame_ids
            .insert(UNIVERSE_FRAME.to_string(), FrameIndex(0));
        model
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a joint below `parent` (the world when `None`). A frame with
    /// the joint's name is created alongside.
    pub fn add_joint(
        &mut self,
        name: &str,
        parent: Option<JointIndex>,
        model: JointModel,
        placement: Isometry3<f64>,
    ) -> KinematicsResult<JointIndex> {
        if self.joint_ids.contains_key(name) || self.frame_ids.contains_key(name) {
            return Err(KinematicsError::DuplicateName(name.to_string()));
        }
        if let Some(JointIndex(p)) = parent {
            if p >= self.joints.len() {
                return Err(KinematicsError::UnknownJoint(p));
            }
        }
        if let JointModel::Translation { dims } = model {
            if dims == 0 || dims > 3 {
                return Err(KinematicsError::InvalidJoint {
                    name: name.to_string(),
                    reason: format!("translation joints span 1 to 3 axes, got {dims}"),
                });
            }
        }

        let index = JointIndex(self.joints.len());
        let (nq, nv) = (model.nq(), model.nv());
        self.joints.push(Joint {
            name: name.to_string(),
            parent,
            placement,
            model,
            idx_q: self.nq,
            idx_v: self.nv,
            body: Body::default(),
        });
        self.nq += nq;
        self.nv += nv;
        self.joint_ids.insert(name.to_string(), index);

        let frame = FrameIndex(self.frames.len());
        self.frames.push(Frame {
            name: name.to_string(),
            parent: Some(index),
            placement: Isometry3::identity(),
        });
        self.frame_ids.insert(name.to_string(), frame);
        Ok(index)
    }

    /// Attach a named frame to `parent` (the world when `None`).
    pub fn add_frame(
        &mut self,
        name: &str,
        parent: Option<JointIndex>,
        placement: Isometry3<f64>,
    ) -> KinematicsResult<FrameIndex> {
        if self.frame_ids.contains_key(name) {
            return Err(KinematicsError::DuplicateName(name.to_string()));
        }
        if let Some(JointIndex(p)) = parent {
            if p >= self.joints.len() {
                return Err(KinematicsError::UnknownJoint(p));
            }
        }
        let index = FrameIndex(self.frames.len());
        self.frames.push(Frame {
            name: name.to_string(),
            parent,
            placement,
        });
        self.frame_ids.insert(name.to_string(), index);
        Ok(index)
    }

    /// Add mass to the body carried by `joint`; `lever` is expressed in the
    /// joint frame.
    pub fn append_body(
        &mut self,
        joint: JointIndex,
        mass: f64,
        lever: Vector3<f64>,
    ) -> KinematicsResult<()> {
        let j = self
            .joints
            .get_mut(joint.0)
            .ok_or(KinematicsError::UnknownJoint(joint.0))?;
        j.body.append(mass, lever);
        Ok(())
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn config_size(&self) -> usize {
        self.nq
    }

    pub fn nb_dofs(&self) -> usize {
        self.nv
    }

    pub fn joint_index(&self, name: &str) -> Option<JointIndex> {
        self.joint_ids.get(name).copied()
    }

    /// Layout information for the named joint.
    pub fn joint(&self, name: &str) -> Option<JointInfo> {
        let index = self.joint_index(name)?;
        let joint = &self.joints[index.0];
        Some(JointInfo {
            name: joint.name.clone(),
            index,
            rank_in_configuration: joint.idx_q,
            config_size: joint.model.nq(),
            rank_in_velocity: joint.idx_v,
            nb_dofs: joint.model.nv(),
            space: joint.model.space(),
        })
    }

    pub fn frame_index(&self, name: &str) -> Option<FrameIndex> {
        self.frame_ids.get(name).copied()
    }

    pub fn has_frame(&self, name: &str) -> bool {
        self.frame_ids.contains_key(name)
    }

    pub fn frame_name(&self, frame: FrameIndex) -> Option<&str> {
        self.frames.get(frame.0).map(|f| f.name.as_str())
    }

    /// `true` when `ancestor` is `joint` or lies on its path to the world.
    pub fn is_ancestor(&self, ancestor: JointIndex, joint: JointIndex) -> bool {
        let mut current = Some(joint);
        while let Some(j) = current {
            if j == ancestor {
                return true;
            }
            current = self.joints[j.0].parent;
        }
        false
    }

    /// Joints from `joint` up to the root, `joint` first.
    pub fn support(&self, joint: JointIndex) -> Vec<JointIndex> {
        let mut chain = Vec::new();
        let mut current = Some(joint);
        while let Some(j) = current {
            chain.push(j);
            current = self.joints[j.0].parent;
        }
        chain
    }

    /// Concatenation of every joint's neutral configuration.
    pub fn neutral_configuration(&self) -> DVector<f64> {
        let mut q = Vec::with_capacity(self.nq);
        for joint in &self.joints {
            q.extend(joint.model.neutral());
        }
        DVector::from_vec(q)
    }

    pub fn total_mass(&self) -> f64 {
        self.joints.iter().map(|j| j.body.mass).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> KinematicModel {
        let mut model = KinematicModel::new("robot");
        let root = model
            .add_joint("root", None, JointModel::FreeFlyer, Isometry3::identity())
            .unwrap();
        let a = model
            .add_joint("a", Some(root), JointModel::revolute(Vector3::z()), Isometry3::identity())
            .unwrap();
        model
            .add_joint(
                "b",
                Some(a),
                JointModel::revolute_unbounded(Vector3::y()),
                Isometry3::identity(),
            )
            .unwrap();
        model
    }

    #[test]
    fn ranks_accumulate_in_order() {
        let model = sample();
        assert_eq!(model.config_size(), 7 + 1 + 2);
        assert_eq!(model.nb_dofs(), 6 + 1 + 1);
        let b = model.joint("b").unwrap();
        assert_eq!(b.rank_in_configuration, 8);
        assert_eq!(b.config_size, 2);
        assert_eq!(b.rank_in_velocity, 7);
        assert_eq!(b.nb_dofs, 1);
        assert_eq!(model.neutral_configuration().len(), model.config_size());
    }

    #[test]
    fn joints_own_frames() {
        let model = sample();
        assert_eq!(model.frame_index(UNIVERSE_FRAME), Some(FrameIndex(0)));
        let a = model.frame_index("a").unwrap();
        assert_eq!(model.frame_name(a), Some("a"));
        assert!(!model.has_frame("missing"));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut model = sample();
        let err = model
            .add_frame("a", None, Isometry3::identity())
            .unwrap_err();
        assert!(matches!(err, KinematicsError::DuplicateName(_)));
        let err = model
            .add_joint("b", None, JointModel::Planar, Isometry3::identity())
            .unwrap_err();
        assert!(matches!(err, KinematicsError::DuplicateName(_)));
    }

    #[test]
    fn translation_dims_are_validated() {
        let mut model = KinematicModel::new("m");
        let err = model
            .add_joint(
                "t",
                None,
                JointModel::Translation { dims: 4 },
                Isometry3::identity(),
            )
            .unwrap_err();
        assert!(matches!(err, KinematicsError::InvalidJoint { .. }));
    }

    #[test]
    fn support_walks_to_root() {
        let model = sample();
        let b = model.joint_index("b").unwrap();
        assert_eq!(
            model.support(b),
            vec![JointIndex(2), JointIndex(1), JointIndex(0)]
        );
        assert!(model.is_ancestor(JointIndex(0), b));
        assert!(!model.is_ancestor(b, JointIndex(1)));
    }

    #[test]
    fn body_append_merges_levers() {
        let mut body = Body::default();
        body.append(1.0, Vector3::new(1.0, 0.0, 0.0));
        body.append(1.0, Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(body.mass, 2.0);
        assert_eq!(body.lever, Vector3::new(0.5, 0.5, 0.0));
    }
}
