//! Build a [`KinematicModel`] from URDF XML.

use hashbrown::{HashMap, HashSet};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use crate::error::{KinematicsError, KinematicsResult};
use crate::joint::JointModel;
use crate::model::{JointIndex, KinematicModel};

/// Name given to the joint attaching the root link when it is not fixed.
pub const ROOT_JOINT_NAME: &str = "root_joint";

/// How the URDF root link is attached to the world.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum RootJoint {
    #[default]
    Fixed,
    FreeFlyer,
    Planar,
}

fn pose_to_isometry(pose: &urdf_rs::Pose) -> Isometry3<f64> {
    let [x, y, z] = pose.xyz.0;
    let [roll, pitch, yaw] = pose.rpy.0;
    Isometry3::from_parts(
        Translation3::new(x, y, z),
        UnitQuaternion::from_euler_angles(roll, pitch, yaw),
    )
}

fn joint_model(joint: &urdf_rs::Joint) -> KinematicsResult<Option<JointModel>> {
    let axis = Vector3::from(joint.axis.xyz.0);
    let model = match joint.joint_type {
        urdf_rs::JointType::Fixed => return Ok(None),
        urdf_rs::JointType::Revolute => JointModel::revolute(axis),
        urdf_rs::JointType::Continuous => JointModel::revolute_unbounded(axis),
        urdf_rs::JointType::Prismatic => JointModel::prismatic(axis),
        urdf_rs::JointType::Floating => JointModel::FreeFlyer,
        urdf_rs::JointType::Planar => {
            if (axis - Vector3::z()).norm() > 1e-9 {
                log::warn!(
                    "planar joint '{}' has normal {:?}; only z is supported",
                    joint.name,
                    axis
                );
            }
            JointModel::Planar
        }
        urdf_rs::JointType::Spherical => {
            return Err(KinematicsError::InvalidJoint {
                name: joint.name.clone(),
                reason: "spherical joints are not supported".to_string(),
            })
        }
    };
    if axis.norm() < 1e-12 {
        return Err(KinematicsError::InvalidJoint {
            name: joint.name.clone(),
            reason: "axis has zero length".to_string(),
        });
    }
    Ok(Some(model))
}

impl KinematicModel {
    /// Parse `urdf_xml` and attach its root link to the world with `root`.
    ///
    /// Fixed joints are folded into their parent joint; every link and every
    /// fixed joint becomes a frame. Link masses are lumped on the joint that
    /// carries them.
    pub fn from_urdf_str(urdf_xml: &str, root: RootJoint) -> KinematicsResult<Self> {
        if urdf_xml.trim().is_empty() {
            return Err(KinematicsError::Urdf("URDF XML is empty".to_string()));
        }
        let robot = urdf_rs::read_from_string(urdf_xml)
            .map_err(|err| KinematicsError::Urdf(err.to_string()))?;
        Self::from_urdf_robot(&robot, root)
    }

    pub fn from_urdf_robot(robot: &urdf_rs::Robot, root: RootJoint) -> KinematicsResult<Self> {
        let mut children: HashMap<&str, Vec<&urdf_rs::Joint>> = HashMap::new();
        let mut is_child: HashSet<&str> = HashSet::new();
        for joint in &robot.joints {
            children
                .entry(joint.parent.link.as_str())
                .or_default()
                .push(joint);
            is_child.insert(joint.child.link.as_str());
        }
        let links: HashMap<&str, &urdf_rs::Link> =
            robot.links.iter().map(|l| (l.name.as_str(), l)).collect();

        let roots: Vec<&urdf_rs::Link> = robot
            .links
            .iter()
            .filter(|l| !is_child.contains(l.name.as_str()))
            .collect();
        let root_link = match roots.as_slice() {
            [single] => *single,
            [] => return Err(KinematicsError::Urdf("no root link".to_string())),
            many => {
                return Err(KinematicsError::Urdf(format!(
                    "{} candidate root links",
                    many.len()
                )))
            }
        };

        let mut model = KinematicModel::new(robot.name.clone());
        let root_parent = match root {
            RootJoint::Fixed => None,
            RootJoint::FreeFlyer => Some(model.add_joint(
                ROOT_JOINT_NAME,
                None,
                JointModel::FreeFlyer,
                Isometry3::identity(),
            )?),
            RootJoint::Planar => Some(model.add_joint(
                ROOT_JOINT_NAME,
                None,
                JointModel::Planar,
                Isometry3::identity(),
            )?),
        };

        // (link, supporting joint, placement of the link in that joint's frame)
        let mut stack: Vec<(&urdf_rs::Link, Option<JointIndex>, Isometry3<f64>)> =
            vec![(root_link, root_parent, Isometry3::identity())];
        while let Some((link, parent, placement)) = stack.pop() {
            model.add_frame(&link.name, parent, placement)?;
            let mass = link.inertial.mass.value;
            if mass > 0.0 {
                let lever = placement * pose_to_isometry(&link.inertial.origin);
                match parent {
                    Some(joint) => model.append_body(joint, mass, lever.translation.vector)?,
                    None => log::debug!(
                        "link '{}' is fixed to the world; its mass is ignored",
                        link.name
                    ),
                }
            }

            let Some(joints) = children.get(link.name.as_str()) else {
                continue;
            };
            // Reverse so the first declared child is expanded first.
            for joint in joints.iter().rev() {
                let child = links.get(joint.child.link.as_str()).copied().ok_or_else(|| {
                    KinematicsError::Urdf(format!("link '{}' not declared", joint.child.link))
                })?;
                let origin = placement * pose_to_isometry(&joint.origin);
                match joint_model(joint)? {
                    None => {
                        model.add_frame(&joint.name, parent, origin)?;
                        stack.push((child, parent, origin));
                    }
                    Some(kind) => {
                        let index = model.add_joint(&joint.name, parent, kind, origin)?;
                        stack.push((child, Some(index), Isometry3::identity()));
                    }
                }
            }
        }

        log::info!(
            "loaded URDF '{}': {} joints, {} frames, nq = {}, nv = {}",
            model.name(),
            model.joints().len(),
            model.frames().len(),
            model.config_size(),
            model.nb_dofs()
        );
        Ok(model)
    }
}
