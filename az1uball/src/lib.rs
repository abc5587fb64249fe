//! Driver for the AZ1UBALL optical trackball.
//!
//! The sensor sits on an I2C bus and exposes a 5-byte register block: four movement counters
//! (left, right, up, down) and a status byte carrying the switch state. This crate polls that
//! block at a fixed rate, turns the counters into speed-scaled, smoothed relative motion and
//! publishes motion/button events.
//!
//! # Example
//! ```rust
//! use az1uball::{Az1uball, ChannelEmitter, Runnable, TrackballConfig, TrackballShared, TRACKBALL_EVENT_CHANNEL};
//!
//! static TRACKBALL: TrackballShared = TrackballShared::new();
//!
//! let config = TrackballConfig::default();
//! let emitter = ChannelEmitter::global(config.device_id);
//! let mut trackball = Az1uball::new_i2c(i2c, emitter, &TRACKBALL, config);
//!
//! embassy_futures::join::join3(
//!     // Poll the trackball at 100Hz
//!     trackball.run(),
//!     // Stamp motion samples from the motion pin
//!     az1uball::clock::watch_motion_pin(&mut motion_pin, &TRACKBALL.clock),
//!     async {
//!         loop {
//!             let event = TRACKBALL_EVENT_CHANNEL.receive().await;
//!             // Forward the event to the host
//!         }
//!     },
//! )
//! .await;
//! ```
//!
//! ## Feature flags
#![doc = document_features::document_features!()]
#![cfg_attr(not(test), no_std)]
#![allow(async_fn_in_trait)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

pub mod clock;
pub mod config;
pub mod device;
pub mod event;
pub mod motion;
pub mod transport;

pub use clock::SampleClock;
pub use config::{MOTION_CONFIG, MotionConfig, MotionParams, TrackballConfig};
pub use device::{Az1uball, DeviceError, Runnable, TrackballShared};
pub use event::{Axis, ChannelEmitter, EmitError, EventEmitter, TRACKBALL_EVENT_CHANNEL, TrackballEvent};
pub use motion::{MotionAccumulator, MotionProcessor};
pub use transport::{BusError, BusTransport, I2cTransport, RawSample};

/// Mutex flavour used by every shared structure in this crate.
///
/// The sample clock may be stamped from interrupt context, so a critical section is required.
pub type RawMutex = embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

/// Capacity of [`TRACKBALL_EVENT_CHANNEL`]
pub const TRACKBALL_EVENT_CHANNEL_SIZE: usize = 16;
