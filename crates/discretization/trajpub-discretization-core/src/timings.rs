//! Duration statistics of `compute` calls.

use std::time::Duration;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ComputeTimings {
    count: u64,
    last: Duration,
    total: Duration,
    max: Duration,
}

impl ComputeTimings {
    pub fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.last = elapsed;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }

    /// Number of successful calls measured.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn last(&self) -> Duration {
        self.last
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn mean(&self) -> Duration {
        match u32::try_from(self.count) {
            Ok(0) => Duration::ZERO,
            Ok(n) => self.total / n,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.count as f64),
        }
    }
}
