use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    robots: HashMap<String, String>,
    paths: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = fixtures_root().join(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a str> {
    map.get(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// URDF descriptions under `fixtures/robots`.
pub mod robots {
    use super::*;
    use trajpub_kinematics_core::{KinematicModel, RootJoint};

    pub fn keys() -> Vec<String> {
        MANIFEST.robots.keys().cloned().collect()
    }

    pub fn urdf(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.robots, "robot", name)?)
    }

    pub fn model(name: &str, root: RootJoint) -> Result<KinematicModel> {
        let xml = urdf(name)?;
        KinematicModel::from_urdf_str(&xml, root)
            .with_context(|| format!("failed to build robot fixture '{name}'"))
    }
}

/// Sampled-path documents under `fixtures/paths`.
pub mod paths {
    use super::*;

    pub fn keys() -> Vec<String> {
        MANIFEST.paths.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.paths, "path", name)?)
    }
}

/// Small models built in code, for layouts URDF cannot express.
pub mod models {
    use trajpub_kinematics_core::nalgebra::{Isometry3, Vector3};
    use trajpub_kinematics_core::{JointModel, KinematicModel};

    /// Two planar translation joints `a` (rows 0..2) and `b` (rows 2..4)
    /// in series, with a frame `end` on `b`.
    pub fn two_translations() -> KinematicModel {
        let mut model = KinematicModel::new("two_translations");
        let a = model
            .add_joint(
                "a",
                None,
                JointModel::Translation { dims: 2 },
                Isometry3::identity(),
            )
            .expect("joint a");
        let b = model
            .add_joint(
                "b",
                Some(a),
                JointModel::Translation { dims: 2 },
                Isometry3::identity(),
            )
            .expect("joint b");
        model
            .add_frame("end", Some(b), Isometry3::translation(0.0, 0.0, 1.0))
            .expect("frame end");
        model
    }

    /// Free-flying base `root_joint` carrying a revolute `hinge` about z at
    /// one meter along x, with a point mass on each body and a frame `tip`
    /// one meter past the hinge.
    pub fn floating_hinge() -> KinematicModel {
        let mut model = KinematicModel::new("floating_hinge");
        let root = model
            .add_joint(
                "root_joint",
                None,
                JointModel::FreeFlyer,
                Isometry3::identity(),
            )
            .expect("root joint");
        let hinge = model
            .add_joint(
                "hinge",
                Some(root),
                JointModel::revolute(Vector3::z()),
                Isometry3::translation(1.0, 0.0, 0.0),
            )
            .expect("hinge");
        model
            .add_frame("tip", Some(hinge), Isometry3::translation(1.0, 0.0, 0.0))
            .expect("frame tip");
        model
            .append_body(root, 1.0, Vector3::zeros())
            .expect("root body");
        model
            .append_body(hinge, 1.0, Vector3::new(1.0, 0.0, 0.0))
            .expect("hinge body");
        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajpub_kinematics_core::RootJoint;

    #[test]
    fn manifest_entries_load() {
        for name in robots::keys() {
            robots::model(&name, RootJoint::FreeFlyer).unwrap();
        }
        for name in paths::keys() {
            assert!(!paths::json(&name).unwrap().is_empty());
        }
        assert!(robots::urdf("missing").is_err());
    }

    #[test]
    fn code_models_have_expected_sizes() {
        let m = models::two_translations();
        assert_eq!((m.config_size(), m.nb_dofs()), (4, 4));
        let m = models::floating_hinge();
        assert_eq!((m.config_size(), m.nb_dofs()), (8, 7));
    }
}
