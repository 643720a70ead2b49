use thiserror::Error;

use trajpub_api_core::TopicError;
use trajpub_kinematics_core::KinematicsError;
use trajpub_transport_core::TransportError;

use crate::row_view::RowViewError;

#[derive(Debug, Error)]
pub enum DiscretizationError {
    #[error("no path set")]
    NotConfigured,
    #[error("path cannot be evaluated at t = {time}")]
    EvaluationFailed { time: f64 },
    #[error("transport not initialized")]
    NotInitialized,
    #[error("joint '{0}' not found in the device")]
    UnknownJoint(String),
    #[error("{what} of the path has size {actual}, the device expects {expected}")]
    PathSize {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("center-of-mass computation '{0}' was built on another model")]
    ForeignModel(String),
    #[error(transparent)]
    Topic(#[from] TopicError),
    #[error(transparent)]
    RowView(#[from] RowViewError),
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type DiscretizationResult<T> = Result<T, DiscretizationError>;
