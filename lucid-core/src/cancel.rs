//! Cooperative task cancellation

use portable_atomic::{AtomicBool, Ordering};

/// Stop request flag shared between a long-running loop and its owner
///
/// The loop checks [`is_requested`](Self::is_requested) once per
/// iteration, so a request takes effect within one loop period.
pub struct StopToken {
    requested: AtomicBool,
}

impl StopToken {
    pub const fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
        }
    }

    /// Ask the loop to finish its current iteration and return
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Re-arm the token before restarting the loop
    pub fn clear(&self) {
        self.requested.store(false, Ordering::Release);
    }
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}
