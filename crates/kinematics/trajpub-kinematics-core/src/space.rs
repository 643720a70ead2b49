//! Configuration-space types of joints.

use std::fmt;

/// Lie group a joint's configuration lives in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum LieGroupSpace {
    /// Euclidean space of the given dimension.
    R(usize),
    /// Planar rotation stored as (cos, sin).
    SO2,
    SE2,
    SE3,
    /// Planar translation and rotation stored as (x, y, cos, sin).
    R2xSO2,
    /// Translation and rotation stored as (x, y, z, qx, qy, qz, qw).
    R3xSO3,
}

impl LieGroupSpace {
    /// Configuration size.
    pub fn nq(&self) -> usize {
        match self {
            LieGroupSpace::R(n) => *n,
            LieGroupSpace::SO2 => 2,
            LieGroupSpace::SE2 | LieGroupSpace::R2xSO2 => 4,
            LieGroupSpace::SE3 | LieGroupSpace::R3xSO3 => 7,
        }
    }

    /// Tangent (velocity) size.
    pub fn nv(&self) -> usize {
        match self {
            LieGroupSpace::R(n) => *n,
            LieGroupSpace::SO2 => 1,
            LieGroupSpace::SE2 | LieGroupSpace::R2xSO2 => 3,
            LieGroupSpace::SE3 | LieGroupSpace::R3xSO3 => 6,
        }
    }

    /// Whether a joint in this space models an unconstrained base.
    pub fn is_floating_base(&self) -> bool {
        matches!(
            self,
            LieGroupSpace::SE3 | LieGroupSpace::R3xSO3 | LieGroupSpace::SE2 | LieGroupSpace::R2xSO2
        )
    }
}

impl fmt::Display for LieGroupSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LieGroupSpace::R(n) => write!(f, "R^{n}"),
            LieGroupSpace::SO2 => f.write_str("SO(2)"),
            LieGroupSpace::SE2 => f.write_str("SE(2)"),
            LieGroupSpace::SE3 => f.write_str("SE(3)"),
            LieGroupSpace::R2xSO2 => f.write_str("R^2*SO(2)"),
            LieGroupSpace::R3xSO3 => f.write_str("R^3*SO(3)"),
        }
    }
}
