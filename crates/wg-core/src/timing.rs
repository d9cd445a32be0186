//! Lightweight wall-clock timing for service summaries.

use std::time::Instant;

/// A simple timer that measures elapsed time.
pub struct Timer {
    label: &'static str,
    start: Instant,
}

impl Timer {
    /// Create and start a new timer with the given label.
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    /// Seconds elapsed so far, without stopping.
    pub fn elapsed_s(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    /// Stop the timer and return elapsed time in seconds.
    pub fn stop(self) -> f64 {
        self.elapsed_s()
    }

    /// Stop the timer and emit a debug event with the elapsed time.
    pub fn stop_and_log(self) -> f64 {
        let label = self.label;
        let elapsed = self.stop();
        tracing::debug!(label, elapsed_s = elapsed, "timer stopped");
        elapsed
    }
}
