//! Small shared helpers: interpolation and phase timing.

use std::time::Instant;

/// Linear interpolation between `start` and `end`.
pub fn lerp(start: f64, end: f64, t: f64) -> f64 {
    start + t * (end - start)
}

/// RAII timer that logs elapsed time on drop.
pub struct Timed {
    name: &'static str,
    start: Instant,
}

impl Timed {
    /// Start a timer that logs at DEBUG level when dropped.
    pub fn debug(name: &'static str) -> Self {
        log::trace!("{}...", name);
        Self {
            name,
            start: Instant::now(),
        }
    }
}

impl Drop for Timed {
    fn drop(&mut self) {
        log::debug!("{}: {:.3?}", self.name, self.start.elapsed());
    }
}
