//! Motion processing
//!
//! Turns one raw register sample into the values reported for this cycle:
//!
//! ```text
//! raw sample --> delta --+--> accumulator (raw, unscaled)
//!                        |
//!                        +--> * scaling(elapsed) --> smoothing --> reported value
//! ```
//!
//! The scaling boosts movement when samples arrive in quick succession, approaching `max_speed` when the
//! elapsed time goes to zero. The smoothing is a recursive filter
//! `s = a * scaled + (1 - a) * s_prev`; `a` is allowed to exceed 1.0, which makes the filter lead
//! the newest sample instead of lagging behind it.

use portable_atomic::{AtomicI32, Ordering};

use crate::config::MotionParams;
use crate::transport::RawSample;

/// Exponent applied to `elapsed / max_time` in the speed scaling curve
const SCALING_DECAY: f64 = -3.0;

/// Running total of raw, unscaled deltas.
///
/// The poll loop only adds to it. Draining is left to the consumer, see [`MotionAccumulator::take`].
pub struct MotionAccumulator {
    x: AtomicI32,
    y: AtomicI32,
}

impl MotionAccumulator {
    pub const fn new() -> Self {
        Self {
            x: AtomicI32::new(0),
            y: AtomicI32::new(0),
        }
    }

    pub fn add(&self, dx: i32, dy: i32) {
        self.x.fetch_add(dx, Ordering::Relaxed);
        self.y.fetch_add(dy, Ordering::Relaxed);
    }

    /// Current totals
    pub fn load(&self) -> (i32, i32) {
        (self.x.load(Ordering::Relaxed), self.y.load(Ordering::Relaxed))
    }

    /// Read the totals and reset them to zero
    pub fn take(&self) -> (i32, i32) {
        (self.x.swap(0, Ordering::Relaxed), self.y.swap(0, Ordering::Relaxed))
    }
}

impl Default for MotionAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// Values to report for one cycle, `None` for an axis that didn't move.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionReport {
    pub x: Option<i32>,
    pub y: Option<i32>,
}

/// Speed scaling factor for two samples `elapsed_ticks` apart.
///
/// It's `max_speed` at 0 ticks, decays with `e^(-3 * elapsed / max_time)` and drops back to 1.0 after `max_time`.
/// A `max_time` of 0 disables the scaling.
pub fn scaling_factor(elapsed_ticks: u64, params: &MotionParams) -> f64 {
    let mut scaling = 1.0;
    if params.max_time > 0 && elapsed_ticks <= params.max_time as u64 {
        let exponent = SCALING_DECAY * elapsed_ticks as f64 / params.max_time as f64;
        scaling *= 1.0 + (params.max_speed as f64 - 1.0) * libm::exp(exponent);
    }
    scaling
}

/// One step of the smoothing filter, truncated toward zero
pub fn smooth(smoothing_factor: f64, scaled: i32, previous: i32) -> i32 {
    (smoothing_factor * scaled as f64 + (1.0 - smoothing_factor) * previous as f64) as i32
}

/// Filter state of one trackball
#[derive(Debug, Default)]
pub struct MotionProcessor {
    smoothed_x: i32,
    smoothed_y: i32,
    previous_smoothed_x: i32,
    previous_smoothed_y: i32,
}

impl MotionProcessor {
    pub const fn new() -> Self {
        Self {
            smoothed_x: 0,
            smoothed_y: 0,
            previous_smoothed_x: 0,
            previous_smoothed_y: 0,
        }
    }

    /// Process one sample.
    ///
    /// Returns `None` without touching any state when the sample has no movement. Otherwise the raw deltas are
    /// added to `accumulator`, both axes go through the filter and the axes with a non-zero delta are reported.
    /// An axis that didn't move is never reported, even when the filter still carries momentum for it.
    pub fn process(
        &mut self,
        sample: &RawSample,
        elapsed_ticks: u64,
        params: &MotionParams,
        accumulator: &MotionAccumulator,
    ) -> Option<MotionReport> {
        let delta_x = sample.delta_x();
        let delta_y = sample.delta_y();
        if delta_x == 0 && delta_y == 0 {
            return None;
        }

        let scaling = scaling_factor(elapsed_ticks, params);

        accumulator.add(delta_x as i32, delta_y as i32);

        let scaled_x = (delta_x as f64 * scaling) as i32;
        let scaled_y = (delta_y as f64 * scaling) as i32;

        self.smoothed_x = smooth(params.smoothing_factor, scaled_x, self.previous_smoothed_x);
        self.smoothed_y = smooth(params.smoothing_factor, scaled_y, self.previous_smoothed_y);
        self.previous_smoothed_x = self.smoothed_x;
        self.previous_smoothed_y = self.smoothed_y;

        trace!(
            "delta: ({}, {}), scaling: {}, smoothed: ({}, {})",
            delta_x, delta_y, scaling, self.smoothed_x, self.smoothed_y
        );

        Some(MotionReport {
            x: (delta_x != 0).then_some(self.smoothed_x),
            y: (delta_y != 0).then_some(self.smoothed_y),
        })
    }

    /// Output of the latest cycle with movement
    pub fn smoothed(&self) -> (i32, i32) {
        (self.smoothed_x, self.smoothed_y)
    }

    /// Memory of the smoothing filter
    pub fn previous_smoothed(&self) -> (i32, i32) {
        (self.previous_smoothed_x, self.previous_smoothed_y)
    }

    /// Clear the filter memory
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
