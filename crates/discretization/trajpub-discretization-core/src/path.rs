//! Time-parameterized paths in configuration space.
//!
//! [`Path`] is what the discretization samples. [`SampledPath`] is a
//! ready-made implementation that interpolates recorded `{time, q, v, a}`
//! samples; it can be loaded from JSON:
//!
//! ```json
//! { "samples": [ { "time": 0.0, "q": [0.0], "v": [1.0], "a": [0.0] },
//!                { "time": 1.0, "q": [1.0], "v": [1.0], "a": [0.0] } ] }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A curve over a robot configuration space.
pub trait Path: Send + Sync {
    /// Size of a configuration.
    fn output_size(&self) -> usize;

    /// Size of a velocity (tangent) vector.
    fn output_derivative_size(&self) -> usize;

    /// Closed time interval over which the path is defined.
    fn time_range(&self) -> (f64, f64);

    /// Write the configuration at `time` into `q` (length `output_size()`).
    /// Returns `false` when the path cannot be evaluated at `time`.
    fn eval(&self, time: f64, q: &mut [f64]) -> bool;

    /// Write the derivative of the given `order` at `time` into `out`
    /// (length `output_derivative_size()`).
    fn derivative(&self, time: f64, order: usize, out: &mut [f64]);
}

#[derive(Debug, Error)]
pub enum PathError {
    #[error("path has no samples")]
    Empty,
    #[error("sample {index} goes back in time")]
    NonMonotonic { index: usize },
    #[error("sample {index}: non-finite value")]
    NonFinite { index: usize },
    #[error("sample {index}: {what} has size {actual}, expected {expected}")]
    SizeMismatch {
        index: usize,
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid path JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathSample {
    pub time: f64,
    pub q: Vec<f64>,
    pub v: Vec<f64>,
    pub a: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct PathDocument {
    samples: Vec<PathSample>,
}

/// Piecewise-linear interpolation of recorded samples.
#[derive(Clone, Debug)]
pub struct SampledPath {
    samples: Vec<PathSample>,
    nq: usize,
    nv: usize,
}

impl SampledPath {
    pub fn new(samples: Vec<PathSample>) -> Result<Self, PathError> {
        let first = samples.first().ok_or(PathError::Empty)?;
        let (nq, nv) = (first.q.len(), first.v.len());
        let mut previous = f64::NEG_INFINITY;
        for (index, s) in samples.iter().enumerate() {
            for (what, len, expected) in [("q", s.q.len(), nq), ("v", s.v.len(), nv), ("a", s.a.len(), nv)] {
                if len != expected {
                    return Err(PathError::SizeMismatch {
                        index,
                        what,
                        expected,
                        actual: len,
                    });
                }
            }
            let finite = s.time.is_finite()
                && s.q.iter().chain(&s.v).chain(&s.a).all(|x| x.is_finite());
            if !finite {
                return Err(PathError::NonFinite { index });
            }
            if s.time < previous {
                return Err(PathError::NonMonotonic { index });
            }
            previous = s.time;
        }
        Ok(Self { samples, nq, nv })
    }

    pub fn from_json_str(s: &str) -> Result<Self, PathError> {
        let doc: PathDocument = serde_json::from_str(s)?;
        Self::new(doc.samples)
    }

    pub fn samples(&self) -> &[PathSample] {
        &self.samples
    }

    /// Bracketing samples and blend factor for a time inside the range.
    fn locate(&self, time: f64) -> (usize, usize, f64) {
        let last = self.samples.len() - 1;
        let upper = self.samples.partition_point(|s| s.time <= time);
        if upper == 0 {
            return (0, 0, 0.0);
        }
        if upper > last {
            return (last, last, 0.0);
        }
        let (i0, i1) = (upper - 1, upper);
        let span = self.samples[i1].time - self.samples[i0].time;
        let alpha = if span > 0.0 {
            (time - self.samples[i0].time) / span
        } else {
            0.0
        };
        (i0, i1, alpha)
    }

    fn blend(&self, time: f64, pick: impl Fn(&PathSample) -> &[f64], out: &mut [f64]) {
        let (i0, i1, alpha) = self.locate(time);
        let a = pick(&self.samples[i0]);
        let b = pick(&self.samples[i1]);
        for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
            *o = x + (y - x) * alpha;
        }
    }
}

impl Path for SampledPath {
    fn output_size(&self) -> usize {
        self.nq
    }

    fn output_derivative_size(&self) -> usize {
        self.nv
    }

    fn time_range(&self) -> (f64, f64) {
        let first = self.samples.first().map_or(0.0, |s| s.time);
        let last = self.samples.last().map_or(0.0, |s| s.time);
        (first, last)
    }

    fn eval(&self, time: f64, q: &mut [f64]) -> bool {
        let (t0, t1) = self.time_range();
        if !(t0..=t1).contains(&time) || q.len() != self.nq {
            return false;
        }
        self.blend(time, |s| s.q.as_slice(), q);
        true
    }

    fn derivative(&self, time: f64, order: usize, out: &mut [f64]) {
        let (t0, t1) = self.time_range();
        let time = time.clamp(t0, t1);
        match order {
            0 => self.blend(time, |s| s.q.as_slice(), out),
            1 => self.blend(time, |s| s.v.as_slice(), out),
            2 => self.blend(time, |s| s.a.as_slice(), out),
            _ => out.fill(0.0),
        }
    }
}
