//! Trackball configuration
//!
//! Two layers of configuration exist:
//! - [`MotionConfig`]: the speed/smoothing tunables, shared by every trackball and adjustable at runtime
//! - [`TrackballConfig`]: the per-device wiring (bus address, poll rate, button code)

use embassy_time::Duration;
use portable_atomic::{AtomicF64, AtomicI32, AtomicU32, Ordering};

use crate::event::BTN_0;

/// Default upper bound multiplier for the fastest reported motion
pub const DEFAULT_MAX_SPEED: i32 = 25;
/// Default elapsed ticks threshold below which speed scaling kicks in
pub const DEFAULT_MAX_TIME: u32 = 5;
/// Default weight of the new sample in the smoothing filter
pub const DEFAULT_SMOOTHING_FACTOR: f64 = 1.3;

/// Default 7-bit I2C address of the AZ1UBALL
pub const DEFAULT_I2C_ADDRESS: u8 = 0x0A;
/// Default poll interval, 100Hz
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Process-wide motion tunables, read by every trackball on every poll cycle.
pub static MOTION_CONFIG: MotionConfig = MotionConfig::new();

/// Runtime-tunable motion parameters.
///
/// Every field is an independent atomic, so an update from a debug shell or a host tool is
/// picked up by the next poll cycle without any locking. Two fields updated back to back may be
/// observed half-applied for one cycle, which is acceptable for these knobs.
pub struct MotionConfig {
    max_speed: AtomicI32,
    max_time: AtomicU32,
    smoothing_factor: AtomicF64,
}

impl MotionConfig {
    pub const fn new() -> Self {
        Self {
            max_speed: AtomicI32::new(DEFAULT_MAX_SPEED),
            max_time: AtomicU32::new(DEFAULT_MAX_TIME),
            smoothing_factor: AtomicF64::new(DEFAULT_SMOOTHING_FACTOR),
        }
    }

    pub fn max_speed(&self) -> i32 {
        self.max_speed.load(Ordering::Relaxed)
    }

    pub fn set_max_speed(&self, max_speed: i32) {
        debug!("Set max_speed: {}", max_speed);
        self.max_speed.store(max_speed, Ordering::Relaxed);
    }

    pub fn max_time(&self) -> u32 {
        self.max_time.load(Ordering::Relaxed)
    }

    pub fn set_max_time(&self, max_time: u32) {
        debug!("Set max_time: {}", max_time);
        self.max_time.store(max_time, Ordering::Relaxed);
    }

    pub fn smoothing_factor(&self) -> f64 {
        self.smoothing_factor.load(Ordering::Relaxed)
    }

    /// Set the smoothing factor.
    ///
    /// Values above 1.0 are allowed, they make the filter overshoot the newest sample.
    pub fn set_smoothing_factor(&self, smoothing_factor: f64) {
        debug!("Set smoothing_factor: {}", smoothing_factor);
        self.smoothing_factor.store(smoothing_factor, Ordering::Relaxed);
    }

    /// Restore all tunables to their defaults
    pub fn reset(&self) {
        self.set_max_speed(DEFAULT_MAX_SPEED);
        self.set_max_time(DEFAULT_MAX_TIME);
        self.set_smoothing_factor(DEFAULT_SMOOTHING_FACTOR);
    }

    /// Load the current values, once per poll cycle.
    pub fn snapshot(&self) -> MotionParams {
        MotionParams {
            max_speed: self.max_speed(),
            max_time: self.max_time(),
            smoothing_factor: self.smoothing_factor(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A plain copy of [`MotionConfig`], used by the motion processor within one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionParams {
    pub max_speed: i32,
    pub max_time: u32,
    pub smoothing_factor: f64,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            max_speed: DEFAULT_MAX_SPEED,
            max_time: DEFAULT_MAX_TIME,
            smoothing_factor: DEFAULT_SMOOTHING_FACTOR,
        }
    }
}

/// Per-device configuration
#[derive(Clone, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackballConfig {
    /// Id carried by the events of this device
    pub device_id: u8,
    /// 7-bit I2C address
    pub address: u8,
    /// Fixed interval between two poll cycles
    pub poll_interval: Duration,
    /// Key code reported for the switch under the ball
    pub button_code: u16,
}

impl Default for TrackballConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            address: DEFAULT_I2C_ADDRESS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            button_code: BTN_0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MotionConfig::new();
        assert_eq!(config.max_speed(), 25);
        assert_eq!(config.max_time(), 5);
        assert_eq!(config.smoothing_factor(), 1.3);
        assert_eq!(config.snapshot(), MotionParams::default());

        let device = TrackballConfig::default();
        assert_eq!(device.address, 0x0A);
        assert_eq!(device.poll_interval, Duration::from_millis(10));
        assert_eq!(device.button_code, 0x100);
    }

    #[test]
    fn test_setters_are_visible_in_next_snapshot() {
        let config = MotionConfig::new();
        let before = config.snapshot();

        config.set_max_speed(10);
        config.set_max_time(20);
        config.set_smoothing_factor(0.5);

        // A snapshot taken earlier is a copy and keeps the old values
        assert_eq!(before.max_speed, 25);

        let after = config.snapshot();
        assert_eq!(after.max_speed, 10);
        assert_eq!(after.max_time, 20);
        assert_eq!(after.smoothing_factor, 0.5);

        config.reset();
        assert_eq!(config.snapshot(), MotionParams::default());
    }
}
