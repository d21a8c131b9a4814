//! Fixed-step scheduler
//!
//! Real frame time goes into a lag counter; every whole tick's worth of lag
//! runs one simulation step. What is left over is the render interpolation
//! hint. Stall clamping is the caller's business.

use crate::consts::TICK_MS;

/// Lag accumulator driving fixed 16 ms simulation ticks
#[derive(Debug, Clone, Default)]
pub struct FixedStep {
    lag_ms: f64,
    ticks: u64,
}

impl FixedStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `elapsed_ms` of real time and run `step` once per whole tick.
    /// Returns the leftover fraction of a tick in `[0, 1)`.
    pub fn advance(&mut self, elapsed_ms: f64, mut step: impl FnMut()) -> f64 {
        self.lag_ms += elapsed_ms.max(0.0);
        while self.lag_ms >= TICK_MS {
            step();
            self.lag_ms -= TICK_MS;
            self.ticks += 1;
        }
        self.lag_ms / TICK_MS
    }

    /// Ticks run since creation
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn lag_ms(&self) -> f64 {
        self.lag_ms
    }
}
