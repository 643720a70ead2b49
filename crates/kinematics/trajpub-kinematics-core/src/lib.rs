//! trajpub-kinematics-core
//!
//! Kinematic model used by the discretization engine:
//!
//! - [`KinematicModel`]: joints in topological order, frames and body masses.
//!   Built programmatically or from URDF (feature `urdf`).
//! - [`Device`]: shares an immutable model and hands out pooled working
//!   copies ([`DeviceSync`]) on which forward kinematics runs.
//! - [`CenterOfMassComputation`]: mass-weighted center and jacobian of a set
//!   of subtrees.

pub mod com;
pub mod data;
pub mod device;
pub mod error;
pub mod joint;
pub mod model;
pub mod rotation;
pub mod space;
#[cfg(feature = "urdf")]
pub mod urdf;

pub use com::{CenterOfMassComputation, ComQuantities, ComRequest};
pub use data::{DeviceData, Motion};
pub use device::{Device, DeviceSync};
pub use error::{KinematicsError, KinematicsResult};
pub use joint::{JointInfo, JointModel};
pub use model::{Body, Frame, FrameIndex, Joint, JointIndex, KinematicModel, UNIVERSE_FRAME};
pub use rotation::{euler_zyx, quaternion_wxyz};
pub use space::LieGroupSpace;
#[cfg(feature = "urdf")]
pub use urdf::{RootJoint, ROOT_JOINT_NAME};

pub use nalgebra;
