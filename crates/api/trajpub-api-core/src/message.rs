//! Message: payloads carried on output channels.
//! All numeric types use f64, matching the kinematic model.

use serde::{Deserialize, Serialize};

/// Coarse kind of a [`Message`], handy for dispatch and assertions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Vector,
    Vector3,
    Transform,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Message {
    /// Flat numeric sequence (whole-body vectors, frame spatial velocities).
    Vector(Vec<f64>),

    /// 3D vector (center-of-mass position and velocity).
    Vector3([f64; 3]),

    /// Rigid placement: translation and unit quaternion stored as (w, x, y, z).
    Transform {
        translation: [f64; 3],
        rotation: [f64; 4],
    },
}

impl Message {
    /// Return the coarse kind of this message.
    #[inline]
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Vector(_) => MessageKind::Vector,
            Message::Vector3(_) => MessageKind::Vector3,
            Message::Transform { .. } => MessageKind::Transform,
        }
    }

    pub fn vector3(x: f64, y: f64, z: f64) -> Self {
        Message::Vector3([x, y, z])
    }

    pub fn transform(translation: [f64; 3], rotation: [f64; 4]) -> Self {
        Message::Transform {
            translation,
            rotation,
        }
    }

    /// Number of scalars carried by the message.
    pub fn len(&self) -> usize {
        match self {
            Message::Vector(data) => data.len(),
            Message::Vector3(_) => 3,
            Message::Transform { .. } => 7,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the scalars of a `Vector` message.
    pub fn as_vector(&self) -> Option<&[f64]> {
        match self {
            Message::Vector(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_vector3(&self) -> Option<[f64; 3]> {
        match self {
            Message::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    /// Flatten any message into its scalars. Transforms are laid out as
    /// translation followed by (w, x, y, z).
    pub fn to_flat(&self) -> Vec<f64> {
        match self {
            Message::Vector(data) => data.clone(),
            Message::Vector3(v) => v.to_vec(),
            Message::Transform {
                translation,
                rotation,
            } => translation.iter().chain(rotation.iter()).copied().collect(),
        }
    }
}
