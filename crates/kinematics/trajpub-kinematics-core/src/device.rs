//! Shared robot model with pooled working copies.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::data::DeviceData;
use crate::joint::JointInfo;
use crate::model::{FrameIndex, KinematicModel};

/// A kinematic model shared by several users.
///
/// The model itself never changes. Each user that needs to run forward
/// kinematics borrows a private [`DeviceData`] through [`Device::sync`];
/// the data is returned to an internal pool when the guard drops so the
/// next caller reuses its buffers.
#[derive(Debug)]
pub struct Device {
    model: Arc<KinematicModel>,
    pool: Mutex<Vec<DeviceData>>,
}

impl Device {
    pub fn new(model: KinematicModel) -> Self {
        Self::from_shared(Arc::new(model))
    }

    pub fn from_shared(model: Arc<KinematicModel>) -> Self {
        Self {
            model,
            pool: Mutex::new(Vec::new()),
        }
    }

    pub fn model(&self) -> &Arc<KinematicModel> {
        &self.model
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn config_size(&self) -> usize {
        self.model.config_size()
    }

    pub fn nb_dofs(&self) -> usize {
        self.model.nb_dofs()
    }

    pub fn joint(&self, name: &str) -> Option<JointInfo> {
        self.model.joint(name)
    }

    pub fn frame_index(&self, name: &str) -> Option<FrameIndex> {
        self.model.frame_index(name)
    }

    /// Borrow a working copy. Concurrent callers each get their own.
    pub fn sync(&self) -> DeviceSync<'_> {
        let data = self.pool.lock().pop();
        let data = data.unwrap_or_else(|| {
            log::debug!("device '{}': allocating working data", self.model.name());
            DeviceData::new(Arc::clone(&self.model))
        });
        DeviceSync {
            device: self,
            data: Some(data),
        }
    }

    /// Number of idle working copies.
    pub fn pooled(&self) -> usize {
        self.pool.lock().len()
    }
}

/// Scoped access to a [`DeviceData`] borrowed from a [`Device`].
pub struct DeviceSync<'a> {
    device: &'a Device,
    data: Option<DeviceData>,
}

impl Deref for DeviceSync<'_> {
    type Target = DeviceData;

    fn deref(&self) -> &DeviceData {
        // `data` is only taken in `drop`.
        match &self.data {
            Some(data) => data,
            None => unreachable!("device data released twice"),
        }
    }
}

impl DerefMut for DeviceSync<'_> {
    fn deref_mut(&mut self) -> &mut DeviceData {
        match &mut self.data {
            Some(data) => data,
            None => unreachable!("device data released twice"),
        }
    }
}

impl Drop for DeviceSync<'_> {
    fn drop(&mut self) {
        if let Some(data) = self.data.take() {
            self.device.pool.lock().push(data);
        }
    }
}
