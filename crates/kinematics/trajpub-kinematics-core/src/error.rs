use thiserror::Error;

#[derive(Debug, Error)]
pub enum KinematicsError {
    #[error("name '{0}' is already used by another joint or frame")]
    DuplicateName(String),
    #[error("joint index {0} does not exist")]
    UnknownJoint(usize),
    #[error("joint '{0}' not found")]
    JointNotFound(String),
    #[error("invalid joint '{name}': {reason}")]
    InvalidJoint { name: String, reason: String },
    #[error("{what} has size {actual}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("failed to parse URDF: {0}")]
    Urdf(String),
}

pub type KinematicsResult<T> = Result<T, KinematicsError>;
