//! Monotonic nanosecond clock backed by [`std::time::Instant`].
//!
//! The original PAL documents a known risk: its Linux `Clock::nanoTime()`
//! reads `CLOCK_REALTIME`, which is not monotonic across NTP adjustment. We
//! avoid that risk here since `Instant` is specified to be monotonic and
//! nothing in the spec requires wall-clock semantics (the state machine only
//! ever needs elapsed time, never calendar time).

use std::time::Instant;

use crate::pal::Clock;

pub struct LinuxClock {
    epoch: Instant,
}

impl LinuxClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for LinuxClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for LinuxClock {
    fn nano_time(&self) -> u64 {
        self.epoch.elapsed().as_nanos() as u64
    }
}
