//! Sample timestamps
//!
//! The speed scaling works on the time between the two latest motion samples, not on the poll interval.
//! Those samples are stamped by whoever sees the motion first, usually a motion/interrupt pin task,
//! so the timestamp pair is shared with the poll loop behind a critical-section mutex.

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Instant, Timer};
use embedded_hal_async::digital::Wait;

/// Pair of the two latest sample timestamps, in embassy-time ticks.
pub struct SampleClock {
    /// (previous_sample_time, last_sample_time)
    samples: Mutex<crate::RawMutex, Cell<(u64, u64)>>,
}

impl SampleClock {
    pub const fn new() -> Self {
        Self {
            samples: Mutex::new(Cell::new((0, 0))),
        }
    }

    /// Stamp a new sample at `ticks`, the former latest sample becomes the previous one.
    pub fn mark(&self, ticks: u64) {
        self.samples.lock(|samples| {
            let (_, last) = samples.get();
            samples.set((last, ticks));
        });
    }

    /// Stamp a new sample now
    pub fn mark_now(&self) {
        self.mark(Instant::now().as_ticks());
    }

    /// `(previous_sample_time, last_sample_time)`
    pub fn samples(&self) -> (u64, u64) {
        self.samples.lock(|samples| samples.get())
    }

    /// Ticks between the two latest samples.
    ///
    /// Returns `None` when the latest sample is older than the previous one, which means the pair was
    /// stamped from a clock that is not monotonic.
    pub fn elapsed(&self) -> Option<u64> {
        let (previous, last) = self.samples();
        last.checked_sub(previous)
    }
}

impl Default for SampleClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Stamp `clock` on every falling edge of the sensor's motion pin.
///
/// Run it alongside the poll loop when the motion pin is wired.
pub async fn watch_motion_pin<P: Wait>(pin: &mut P, clock: &SampleClock) -> ! {
    loop {
        match pin.wait_for_falling_edge().await {
            Ok(()) => {
                clock.mark_now();
                trace!("Motion pin edge, samples: {:?}", clock.samples());
            }
            Err(_) => {
                warn!("Failed to wait for motion pin edge");
                Timer::after_millis(1).await;
            }
        }
    }
}
