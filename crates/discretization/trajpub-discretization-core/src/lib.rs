//! trajpub-discretization-core
//!
//! Samples a configuration-space [`Path`] at requested times and publishes:
//! - the whole-body position, velocity and acceleration of a joint subset
//!   (with a 6-scalar floating-base prefix when the subset has one);
//! - pose and spatial velocity of registered frames;
//! - position and velocity of registered centers of mass.
//!
//! Kinematics come from `trajpub-kinematics-core`, channels from any
//! `trajpub-transport-core` [`Transport`](trajpub_transport_core::Transport).

pub mod config;
pub mod discretization;
pub mod error;
pub mod mode;
pub mod path;
pub mod row_view;
pub mod target;
pub mod timings;

pub use config::DiscretizationConfig;
pub use discretization::{Discretization, FREEFLYER_PREFIX};
pub use error::{DiscretizationError, DiscretizationResult};
pub use mode::ComputationMode;
pub use path::{Path, PathError, PathSample, SampledPath};
pub use row_view::{RowView, RowViewError};
pub use target::{ChannelPair, ComTarget, FrameTarget};
pub use timings::ComputeTimings;
