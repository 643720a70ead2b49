//! Frame and center-of-mass targets and their output channels.

use std::sync::Arc;

use trajpub_api_core::Message;
use trajpub_kinematics_core::{CenterOfMassComputation, FrameIndex};
use trajpub_transport_core::{Publisher, Transport, TransportResult};

use crate::mode::ComputationMode;

/// Value and derivative channels of one target. A channel exists only when
/// the corresponding mode bit is enabled.
#[derive(Debug, Default)]
pub struct ChannelPair {
    value: Option<Box<dyn Publisher>>,
    derivative: Option<Box<dyn Publisher>>,
}

impl ChannelPair {
    /// Advertise the channels `mode` asks for.
    pub fn open(
        transport: &dyn Transport,
        mode: ComputationMode,
        value_topic: &str,
        derivative_topic: &str,
        queue_size: usize,
    ) -> TransportResult<Self> {
        let mut pair = ChannelPair::default();
        if mode.contains(ComputationMode::POSITION) {
            pair.value = Some(transport.advertise(value_topic, queue_size)?);
        }
        if mode.contains(ComputationMode::DERIVATIVE) {
            pair.derivative = Some(transport.advertise(derivative_topic, queue_size)?);
        }
        Ok(pair)
    }

    pub fn value(&self) -> Option<&dyn Publisher> {
        self.value.as_deref()
    }

    pub fn derivative(&self) -> Option<&dyn Publisher> {
        self.derivative.as_deref()
    }

    pub fn publish_value(&self, message: Message) {
        if let Some(channel) = &self.value {
            publish_or_warn(channel.as_ref(), message);
        }
    }

    pub fn publish_derivative(&self, message: Message) {
        if let Some(channel) = &self.derivative {
            publish_or_warn(channel.as_ref(), message);
        }
    }

    pub fn shutdown(&mut self) {
        for channel in [self.value.as_mut(), self.derivative.as_mut()]
            .into_iter()
            .flatten()
        {
            channel.shutdown();
        }
        self.value = None;
        self.derivative = None;
    }
}

/// Publish failures never abort a sampling pass.
pub(crate) fn publish_or_warn(channel: &dyn Publisher, message: Message) {
    if let Err(err) = channel.publish(message) {
        log::warn!("publish on {} failed: {err}", channel.topic());
    }
}

/// Pose and spatial velocity of a named frame.
#[derive(Debug)]
pub struct FrameTarget {
    pub frame: FrameIndex,
    pub name: String,
    pub mode: ComputationMode,
    pub channels: ChannelPair,
}

/// Position and velocity of a center of mass. Identified by the computation
/// handle, not by name.
#[derive(Debug)]
pub struct ComTarget {
    pub com: Arc<CenterOfMassComputation>,
    pub name: String,
    pub mode: ComputationMode,
    pub channels: ChannelPair,
}

impl ComTarget {
    pub fn is_same(&self, com: &Arc<CenterOfMassComputation>) -> bool {
        Arc::ptr_eq(&self.com, com)
    }
}

/// Topic suffixes, relative to the configured prefix.
pub(crate) fn frame_topics(name: &str) -> (String, String) {
    (format!("op_frame/{name}"), format!("velocity/op_frame/{name}"))
}

pub(crate) fn com_topics(name: &str) -> (String, String) {
    (format!("com/{name}"), format!("velocity/com/{name}"))
}
