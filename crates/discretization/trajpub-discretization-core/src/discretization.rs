//! Sampler: evaluates a path at a given time and publishes the whole-body
//! state plus every registered frame and center-of-mass target.
//!
//! All mutable state sits behind one mutex, so reconfiguration never
//! interleaves with an in-flight [`Discretization::compute`].

use std::sync::Arc;
use std::time::Instant;

use nalgebra::DVector;
use parking_lot::Mutex;

use trajpub_api_core::Message;
use trajpub_kinematics_core::{
    euler_zyx, quaternion_wxyz, CenterOfMassComputation, ComRequest, Device, JointIndex,
};
use trajpub_transport_core::{Publisher, Transport};

use crate::config::DiscretizationConfig;
use crate::error::{DiscretizationError, DiscretizationResult};
use crate::mode::ComputationMode;
use crate::path::Path;
use crate::row_view::RowView;
use crate::target::{com_topics, frame_topics, publish_or_warn, ChannelPair, ComTarget, FrameTarget};
use crate::timings::ComputeTimings;

/// Size of the floating-base prefix of whole-body vectors.
pub const FREEFLYER_PREFIX: usize = 6;

/// Which rows of q and v are published, and where the floating base is.
#[derive(Debug, Clone)]
struct JointLayout {
    configuration: RowView,
    velocity: RowView,
    /// Floating-base joint of the subset, if any.
    freeflyer: Option<JointIndex>,
}

impl Default for JointLayout {
    fn default() -> Self {
        Self {
            configuration: RowView::empty(),
            velocity: RowView::empty(),
            freeflyer: None,
        }
    }
}

impl JointLayout {
    fn prefix(&self) -> usize {
        if self.freeflyer.is_some() {
            FREEFLYER_PREFIX
        } else {
            0
        }
    }
}

#[derive(Debug)]
struct WholeBodyChannels {
    position: Box<dyn Publisher>,
    velocity: Box<dyn Publisher>,
    acceleration: Box<dyn Publisher>,
}

impl WholeBodyChannels {
    fn shutdown(&mut self) {
        self.position.shutdown();
        self.velocity.shutdown();
        self.acceleration.shutdown();
    }
}

#[derive(Debug)]
struct Scratch {
    q: DVector<f64>,
    v: DVector<f64>,
    a: DVector<f64>,
}

impl Default for Scratch {
    fn default() -> Self {
        Self {
            q: DVector::zeros(0),
            v: DVector::zeros(0),
            a: DVector::zeros(0),
        }
    }
}

impl Scratch {
    fn resize(&mut self, nq: usize, nv: usize) {
        if self.q.len() != nq {
            self.q = DVector::zeros(nq);
        }
        if self.v.len() != nv {
            self.v = DVector::zeros(nv);
            self.a = DVector::zeros(nv);
        }
    }
}

#[derive(Default)]
struct State {
    path: Option<Arc<dyn Path>>,
    layout: JointLayout,
    frames: Vec<FrameTarget>,
    coms: Vec<ComTarget>,
    /// Present between `initialize_transport` and `shutdown`.
    whole_body: Option<WholeBodyChannels>,
    scratch: Scratch,
    timings: ComputeTimings,
}

impl State {
    fn reset_targets(&mut self) {
        for target in &mut self.frames {
            target.channels.shutdown();
        }
        for target in &mut self.coms {
            target.channels.shutdown();
        }
        self.frames.clear();
        self.coms.clear();
    }
}

/// Samples a path and publishes the derived kinematic quantities.
pub struct Discretization {
    device: Arc<Device>,
    transport: Arc<dyn Transport>,
    config: DiscretizationConfig,
    state: Mutex<State>,
}

impl std::fmt::Debug for Discretization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discretization")
            .field("device", &self.device.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Discretization {
    pub fn new(
        device: Arc<Device>,
        transport: Arc<dyn Transport>,
        config: DiscretizationConfig,
    ) -> Self {
        Self {
            device,
            transport,
            config,
            state: Mutex::new(State::default()),
        }
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn config(&self) -> &DiscretizationConfig {
        &self.config
    }

    pub fn set_path(&self, path: Arc<dyn Path>) {
        self.state.lock().path = Some(path);
    }

    pub fn clear_path(&self) {
        self.state.lock().path = None;
    }

    pub fn path(&self) -> Option<Arc<dyn Path>> {
        self.state.lock().path.clone()
    }

    /// Start the transport session and (re)create the whole-body channels.
    ///
    /// Returns `true` when this call opened the session, `false` when it was
    /// already open; the channels are recreated in both cases.
    pub fn initialize_transport(&self) -> DiscretizationResult<bool> {
        let mut state = self.state.lock();
        let opened = state.whole_body.is_none();
        self.transport
            .init(&self.config.node_name, self.config.anonymous)?;
        let queue = self.config.queue_size;
        let channels = WholeBodyChannels {
            position: self.transport.advertise(&self.config.topic("position")?, queue)?,
            velocity: self.transport.advertise(&self.config.topic("velocity")?, queue)?,
            acceleration: self
                .transport
                .advertise(&self.config.topic("acceleration")?, queue)?,
        };
        if let Some(mut old) = state.whole_body.replace(channels) {
            old.shutdown();
        }
        if opened {
            log::info!(
                "discretization of '{}' publishing under '{}' as node {:?}",
                self.device.name(),
                self.config.topic_prefix,
                self.transport.node_name()
            );
        }
        Ok(opened)
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().whole_body.is_some()
    }

    /// Select the joints whose rows are published on the whole-body
    /// channels. Floating-base joints add no row but switch on the 6-scalar
    /// prefix. On error the previous selection is kept.
    pub fn set_joint_names<S: AsRef<str>>(&self, names: &[S]) -> DiscretizationResult<()> {
        let mut layout = JointLayout {
            configuration: RowView::new(),
            velocity: RowView::new(),
            freeflyer: None,
        };
        for name in names {
            let name = name.as_ref();
            let joint = self
                .device
                .joint(name)
                .ok_or_else(|| DiscretizationError::UnknownJoint(name.to_string()))?;
            if joint.space.is_floating_base() {
                if layout.freeflyer.is_some() {
                    log::warn!("joint '{name}' is a second floating base; the first one is used");
                } else {
                    layout.freeflyer = Some(joint.index);
                }
                continue;
            }
            layout
                .configuration
                .add_range(joint.rank_in_configuration, joint.config_size)?;
            layout
                .velocity
                .add_range(joint.rank_in_velocity, joint.nb_dofs)?;
        }
        layout.configuration.finalize();
        layout.velocity.finalize();
        log::debug!(
            "joint subset of {} names: {} configuration rows, {} velocity rows, freeflyer {}",
            names.len(),
            layout.configuration.size(),
            layout.velocity.size(),
            layout.freeflyer.is_some()
        );
        self.state.lock().layout = layout;
        Ok(())
    }

    pub fn has_freeflyer(&self) -> bool {
        self.state.lock().layout.freeflyer.is_some()
    }

    /// Selected configuration and velocity row counts.
    pub fn view_sizes(&self) -> (usize, usize) {
        let state = self.state.lock();
        (
            state.layout.configuration.size(),
            state.layout.velocity.size(),
        )
    }

    /// Register (or widen) a frame target. `Ok(false)` when the device has
    /// no frame with that name.
    pub fn add_frame(&self, name: &str, mode: ComputationMode) -> DiscretizationResult<bool> {
        let mut state = self.state.lock();
        if state.whole_body.is_none() {
            return Err(DiscretizationError::NotInitialized);
        }
        let Some(frame) = self.device.frame_index(name) else {
            log::warn!("device '{}' has no frame '{name}'", self.device.name());
            return Ok(false);
        };

        let existing = state.frames.iter().position(|t| t.frame == frame);
        let merged = existing.map_or(mode, |i| state.frames[i].mode | mode);
        let (value, derivative) = frame_topics(name);
        let channels = ChannelPair::open(
            self.transport.as_ref(),
            merged,
            &self.config.topic(&value)?,
            &self.config.topic(&derivative)?,
            self.config.queue_size,
        )?;

        match existing {
            Some(i) => {
                let target = &mut state.frames[i];
                target.channels.shutdown();
                target.channels = channels;
                target.mode = merged;
                target.name = name.to_string();
            }
            None => state.frames.push(FrameTarget {
                frame,
                name: name.to_string(),
                mode: merged,
                channels,
            }),
        }
        log::debug!("frame target '{name}': {merged}");
        Ok(true)
    }

    /// Register (or widen) a center-of-mass target. Targets are keyed by
    /// the computation handle: registering the same handle under another
    /// name merges into the existing target and renames its channels.
    /// The handle must share the device's model.
    pub fn add_center_of_mass(
        &self,
        name: &str,
        com: Arc<CenterOfMassComputation>,
        mode: ComputationMode,
    ) -> DiscretizationResult<bool> {
        let mut state = self.state.lock();
        if state.whole_body.is_none() {
            return Err(DiscretizationError::NotInitialized);
        }
        if !Arc::ptr_eq(com.model(), self.device.model()) {
            return Err(DiscretizationError::ForeignModel(com.name().to_string()));
        }

        let existing = state.coms.iter().position(|t| t.is_same(&com));
        let merged = existing.map_or(mode, |i| state.coms[i].mode | mode);
        let (value, derivative) = com_topics(name);
        let channels = ChannelPair::open(
            self.transport.as_ref(),
            merged,
            &self.config.topic(&value)?,
            &self.config.topic(&derivative)?,
            self.config.queue_size,
        )?;

        match existing {
            Some(i) => {
                let target = &mut state.coms[i];
                target.channels.shutdown();
                target.channels = channels;
                target.mode = merged;
                target.name = name.to_string();
            }
            None => state.coms.push(ComTarget {
                com,
                name: name.to_string(),
                mode: merged,
                channels,
            }),
        }
        log::debug!("center-of-mass target '{name}': {merged}");
        Ok(true)
    }

    /// Drop every frame and center-of-mass target and close their channels.
    pub fn reset_targets(&self) {
        self.state.lock().reset_targets();
    }

    /// Registered frame targets as `(name, mode)`, in registration order.
    pub fn frame_targets(&self) -> Vec<(String, ComputationMode)> {
        let state = self.state.lock();
        state
            .frames
            .iter()
            .map(|t| (t.name.clone(), t.mode))
            .collect()
    }

    /// Registered center-of-mass targets as `(name, mode)`, in registration
    /// order.
    pub fn com_targets(&self) -> Vec<(String, ComputationMode)> {
        let state = self.state.lock();
        state
            .coms
            .iter()
            .map(|t| (t.name.clone(), t.mode))
            .collect()
    }

    pub fn timings(&self) -> ComputeTimings {
        self.state.lock().timings
    }

    /// Sample the path at `time` and publish everything.
    ///
    /// Nothing is published unless the path evaluation and the forward
    /// kinematics pass succeed.
    pub fn compute(&self, time: f64) -> DiscretizationResult<()> {
        let started = Instant::now();
        let mut guard = self.state.lock();
        let State {
            path,
            layout,
            frames,
            coms,
            whole_body,
            scratch,
            timings,
        } = &mut *guard;

        let path = path.as_ref().ok_or(DiscretizationError::NotConfigured)?;
        let channels = whole_body
            .as_ref()
            .ok_or(DiscretizationError::NotInitialized)?;

        let (nq, nv) = (self.device.config_size(), self.device.nb_dofs());
        check_path_size("configuration", nq, path.output_size())?;
        check_path_size("velocity", nv, path.output_derivative_size())?;
        scratch.resize(nq, nv);

        if !path.eval(time, scratch.q.as_mut_slice()) {
            return Err(DiscretizationError::EvaluationFailed { time });
        }
        path.derivative(time, 1, scratch.v.as_mut_slice());
        path.derivative(time, 2, scratch.a.as_mut_slice());

        let mut data = self.device.sync();
        data.set_configuration(&scratch.q)?;
        data.set_velocity(&scratch.v)?;
        data.compute_frames_forward_kinematics();

        let prefix = layout.prefix();
        let mut position = vec![0.0; prefix + layout.configuration.size()];
        let mut velocity = vec![0.0; prefix + layout.velocity.size()];
        let mut acceleration = vec![0.0; prefix + layout.velocity.size()];
        if let Some(joint) = layout.freeflyer {
            let placement = data.joint_placement(joint);
            position[..3].copy_from_slice(placement.translation.vector.as_slice());
            position[3..6].copy_from_slice(&euler_zyx(&placement.rotation));
        }
        layout
            .configuration
            .extract_into(scratch.q.as_slice(), &mut position[prefix..])?;
        layout
            .velocity
            .extract_into(scratch.v.as_slice(), &mut velocity[prefix..])?;
        layout
            .velocity
            .extract_into(scratch.a.as_slice(), &mut acceleration[prefix..])?;

        publish_or_warn(channels.position.as_ref(), Message::Vector(position));
        publish_or_warn(channels.velocity.as_ref(), Message::Vector(velocity));
        publish_or_warn(channels.acceleration.as_ref(), Message::Vector(acceleration));

        for target in frames.iter() {
            if target.mode.contains(ComputationMode::POSITION) {
                let placement = data.frame_placement(target.frame);
                let t = placement.translation.vector;
                target.channels.publish_value(Message::transform(
                    [t.x, t.y, t.z],
                    quaternion_wxyz(&placement.rotation),
                ));
            }
            if target.mode.contains(ComputationMode::DERIVATIVE) {
                let motion = data.frame_velocity(target.frame);
                target
                    .channels
                    .publish_derivative(Message::Vector(motion.to_array().to_vec()));
            }
        }

        for target in coms.iter() {
            let request = ComRequest {
                position: target.mode.contains(ComputationMode::POSITION),
                jacobian: target.mode.contains(ComputationMode::DERIVATIVE),
            };
            let quantities = target.com.compute(&data, request);
            if let Some(p) = quantities.position() {
                target.channels.publish_value(Message::vector3(p.x, p.y, p.z));
            }
            if let Some(v) = quantities.velocity(&scratch.v) {
                target
                    .channels
                    .publish_derivative(Message::vector3(v.x, v.y, v.z));
            }
        }

        let elapsed = started.elapsed();
        timings.record(elapsed);
        log::debug!("compute(t = {time}) took {elapsed:?}");
        Ok(())
    }

    /// Close every channel and end the transport session. Calling it again
    /// is a no-op.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        let Some(mut channels) = state.whole_body.take() else {
            return;
        };
        state.reset_targets();
        channels.shutdown();
        log::info!("discretization of '{}' shut down", self.device.name());
    }
}

impl Drop for Discretization {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn check_path_size(what: &'static str, expected: usize, actual: usize) -> DiscretizationResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DiscretizationError::PathSize {
            what,
            expected,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajpub_kinematics_core::{JointModel, KinematicModel};
    use trajpub_kinematics_core::nalgebra::{Isometry3, Vector3};
    use trajpub_transport_core::Bus;

    struct Still(Vec<f64>);

    impl Path for Still {
        fn output_size(&self) -> usize {
            self.0.len()
        }
        fn output_derivative_size(&self) -> usize {
            self.0.len()
        }
        fn time_range(&self) -> (f64, f64) {
            (0.0, 1.0)
        }
        fn eval(&self, time: f64, q: &mut [f64]) -> bool {
            if !(0.0..=1.0).contains(&time) {
                return false;
            }
            q.copy_from_slice(&self.0);
            true
        }
        fn derivative(&self, _time: f64, _order: usize, out: &mut [f64]) {
            out.fill(0.0);
        }
    }

    fn setup() -> (Bus, Discretization) {
        let mut model = KinematicModel::new("slider");
        let x = model
            .add_joint("x", None, JointModel::prismatic(Vector3::x()), Isometry3::identity())
            .unwrap();
        model
            .add_frame("tool", Some(x), Isometry3::translation(0.0, 0.0, 1.0))
            .unwrap();
        let bus = Bus::new();
        let disc = Discretization::new(
            Arc::new(Device::new(model)),
            Arc::new(bus.clone()),
            DiscretizationConfig {
                anonymous: false,
                ..Default::default()
            },
        );
        (bus, disc)
    }

    #[test]
    fn initialize_reports_first_call() {
        let (bus, disc) = setup();
        assert!(!disc.is_initialized());
        assert!(disc.initialize_transport().unwrap());
        assert!(!disc.initialize_transport().unwrap());
        assert_eq!(bus.publisher_count("/hpp/target/position"), 1);
        assert_eq!(bus.node_name().as_deref(), Some("hpp_agimus"));
    }

    #[test]
    fn registration_requires_initialization() {
        let (_bus, disc) = setup();
        assert!(matches!(
            disc.add_frame("tool", ComputationMode::POSITION),
            Err(DiscretizationError::NotInitialized)
        ));
        disc.initialize_transport().unwrap();
        assert!(disc.add_frame("tool", ComputationMode::POSITION).unwrap());
        assert!(!disc.add_frame("missing", ComputationMode::POSITION).unwrap());
        assert_eq!(disc.frame_targets().len(), 1);
    }

    #[test]
    fn unknown_joint_keeps_previous_layout() {
        let (_bus, disc) = setup();
        disc.set_joint_names(&["x"]).unwrap();
        assert!(matches!(
            disc.set_joint_names(&["x", "nope"]),
            Err(DiscretizationError::UnknownJoint(name)) if name == "nope"
        ));
        assert_eq!(disc.view_sizes(), (1, 1));
    }

    #[test]
    fn compute_publishes_tool_pose() {
        let (bus, disc) = setup();
        disc.initialize_transport().unwrap();
        disc.set_joint_names(&["x"]).unwrap();
        disc.add_frame("tool", ComputationMode::POSITION).unwrap();
        disc.set_path(Arc::new(Still(vec![0.25])));
        disc.compute(0.5).unwrap();

        assert_eq!(
            bus.latest("/hpp/target/position"),
            Some(Message::Vector(vec![0.25]))
        );
        assert_eq!(
            bus.latest("/hpp/target/op_frame/tool"),
            Some(Message::transform([0.25, 0.0, 1.0], [1.0, 0.0, 0.0, 0.0]))
        );
        assert_eq!(disc.timings().count(), 1);
    }

    #[test]
    fn mismatched_path_is_rejected() {
        let (_bus, disc) = setup();
        disc.initialize_transport().unwrap();
        disc.set_path(Arc::new(Still(vec![0.0, 0.0])));
        assert!(matches!(
            disc.compute(0.0),
            Err(DiscretizationError::PathSize { expected: 1, actual: 2, .. })
        ));
    }

    #[test]
    fn shutdown_is_idempotent() {
        let (bus, disc) = setup();
        disc.initialize_transport().unwrap();
        disc.add_frame("tool", ComputationMode::POSITION).unwrap();
        disc.shutdown();
        disc.shutdown();
        assert!(!disc.is_initialized());
        assert!(disc.frame_targets().is_empty());
        assert_eq!(bus.publisher_count("/hpp/target/position"), 0);
        assert_eq!(bus.publisher_count("/hpp/target/op_frame/tool"), 0);
    }
}
