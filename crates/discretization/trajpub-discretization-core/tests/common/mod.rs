#![allow(dead_code)]

use std::sync::Arc;

use trajpub_discretization_core::{ComputationMode, Discretization, DiscretizationConfig, Path};
use trajpub_kinematics_core::{Device, KinematicModel};
use trajpub_transport_core::Bus;

pub const PREFIX: &str = "/hpp/target/";

pub fn topic(suffix: &str) -> String {
    format!("{PREFIX}{suffix}")
}

/// Same configuration, velocity and acceleration at every time of `[0, 1]`.
pub struct ConstantPath {
    pub q: Vec<f64>,
    pub v: Vec<f64>,
    pub a: Vec<f64>,
}

impl ConstantPath {
    pub fn new(q: Vec<f64>, v: Vec<f64>) -> Self {
        let a = vec![0.0; v.len()];
        Self { q, v, a }
    }
}

impl Path for ConstantPath {
    fn output_size(&self) -> usize {
        self.q.len()
    }

    fn output_derivative_size(&self) -> usize {
        self.v.len()
    }

    fn time_range(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn eval(&self, time: f64, q: &mut [f64]) -> bool {
        if !(0.0..=1.0).contains(&time) {
            return false;
        }
        q.copy_from_slice(&self.q);
        true
    }

    fn derivative(&self, _time: f64, order: usize, out: &mut [f64]) {
        match order {
            1 => out.copy_from_slice(&self.v),
            2 => out.copy_from_slice(&self.a),
            _ => out.fill(0.0),
        }
    }
}

/// A path that never evaluates.
pub struct BrokenPath {
    pub nq: usize,
    pub nv: usize,
}

impl Path for BrokenPath {
    fn output_size(&self) -> usize {
        self.nq
    }

    fn output_derivative_size(&self) -> usize {
        self.nv
    }

    fn time_range(&self) -> (f64, f64) {
        (0.0, 0.0)
    }

    fn eval(&self, _time: f64, _q: &mut [f64]) -> bool {
        false
    }

    fn derivative(&self, _time: f64, _order: usize, out: &mut [f64]) {
        out.fill(0.0);
    }
}

/// Discretization over `model` publishing on a private bus, transport
/// already initialized.
pub fn discretization(model: KinematicModel) -> (Bus, Arc<Device>, Discretization) {
    let bus = Bus::new();
    let device = Arc::new(Device::new(model));
    let config = DiscretizationConfig {
        anonymous: false,
        ..Default::default()
    };
    let disc = Discretization::new(Arc::clone(&device), Arc::new(bus.clone()), config);
    disc.initialize_transport().expect("transport init");
    (bus, device, disc)
}

/// Total messages published on every topic of the bus.
pub fn total_published(bus: &Bus) -> u64 {
    bus.topics().iter().map(|t| bus.publish_count(t)).sum()
}

pub const BOTH: ComputationMode = ComputationMode::POSITION_AND_DERIVATIVE;
