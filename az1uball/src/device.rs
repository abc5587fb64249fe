//! AZ1UBALL trackball device
//!
//! [`Az1uball`] owns the sensor's bus and event emitter and runs the poll loop:
//!
//! ```text
//! init(): bus ready? --> turbo mode cmd --> arm first poll
//!
//! +------------------------- loop ---------------------------+
//! | wait next_poll                                           |
//! |     |                                                    |
//! |     V                                                    |
//! | read register block --(error)--> log ------------+       |
//! |     |                                            |       |
//! |     V                                            |       |
//! | motion processor --> report X/Y                  |       |
//! |     |                                            |       |
//! |     V                                            V       |
//! | button changed? --> report key          next_poll = now + interval
//! +----------------------------------------------------------+
//! ```
//!
//! No error of a single cycle stops the loop, the next cycle is always scheduled.

use core::future::pending;

use embassy_time::{Instant, Timer};
use embedded_hal_async::i2c::I2c;

use crate::clock::SampleClock;
use crate::config::{MOTION_CONFIG, MotionConfig, TrackballConfig};
use crate::event::{Axis, EventEmitter};
use crate::motion::{MotionAccumulator, MotionProcessor};
use crate::transport::{BusError, BusTransport, I2cTransport, REGISTER_BLOCK_LEN, RawSample, TURBO_MODE_CMD};

/// Long running task of a device
pub trait Runnable {
    async fn run(&mut self) -> !;
}

/// Errors of the device bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    /// The bus is not ready
    BusNotReady,
    /// Enabling the turbo mode failed
    ConfigWrite(BusError),
}

impl From<BusError> for DeviceError {
    fn from(err: BusError) -> Self {
        match err {
            BusError::NotReady => DeviceError::BusNotReady,
            e => DeviceError::ConfigWrite(e),
        }
    }
}

/// Initialization state for the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitState {
    Pending,
    Ready,
    Failed,
}

/// State of a trackball that other contexts touch as well.
///
/// The accumulator is drained by the consumer of raw motion and the clock is stamped by the motion pin task,
/// so both live outside of [`Az1uball`], typically in a `static`.
pub struct TrackballShared {
    pub accumulator: MotionAccumulator,
    pub clock: SampleClock,
}

impl TrackballShared {
    pub const fn new() -> Self {
        Self {
            accumulator: MotionAccumulator::new(),
            clock: SampleClock::new(),
        }
    }
}

impl Default for TrackballShared {
    fn default() -> Self {
        Self::new()
    }
}

/// AZ1UBALL trackball
pub struct Az1uball<'a, B: BusTransport, E: EventEmitter> {
    transport: B,
    emitter: E,
    shared: &'a TrackballShared,
    motion_config: &'a MotionConfig,
    config: TrackballConfig,
    processor: MotionProcessor,
    init_state: InitState,
    button_pressed: bool,
    button_pressed_prev: bool,
    next_poll: Instant,
}

impl<'a, I2C: I2c, E: EventEmitter> Az1uball<'a, I2cTransport<I2C>, E> {
    /// Create a trackball on an I2C bus, at the address in `config`
    pub fn new_i2c(i2c: I2C, emitter: E, shared: &'a TrackballShared, config: TrackballConfig) -> Self {
        let transport = I2cTransport::new(i2c, config.address);
        Self::new(transport, emitter, shared, config)
    }
}

impl<'a, B: BusTransport, E: EventEmitter> Az1uball<'a, B, E> {
    /// Create a trackball using the process-wide [`MOTION_CONFIG`]
    pub fn new(transport: B, emitter: E, shared: &'a TrackballShared, config: TrackballConfig) -> Self {
        Self::with_motion_config(transport, emitter, shared, config, &MOTION_CONFIG)
    }

    /// Create a trackball reading its tunables from `motion_config`
    pub fn with_motion_config(
        transport: B,
        emitter: E,
        shared: &'a TrackballShared,
        config: TrackballConfig,
        motion_config: &'a MotionConfig,
    ) -> Self {
        Self {
            transport,
            emitter,
            shared,
            motion_config,
            config,
            processor: MotionProcessor::new(),
            init_state: InitState::Pending,
            button_pressed: false,
            button_pressed_prev: false,
            next_poll: Instant::MIN,
        }
    }

    /// Create and initialize a trackball
    pub async fn start(
        transport: B,
        emitter: E,
        shared: &'a TrackballShared,
        config: TrackballConfig,
    ) -> Result<Self, DeviceError> {
        let mut device = Self::new(transport, emitter, shared, config);
        device.init().await?;
        Ok(device)
    }

    /// Bring the sensor up and arm the first poll.
    ///
    /// A failure is final, the device never polls after it.
    pub async fn init(&mut self) -> Result<(), DeviceError> {
        let id = self.config.device_id;

        if !self.transport.is_ready() {
            error!("Trackball {}: Bus is not ready, address: {:#x}", id, self.config.address);
            self.init_state = InitState::Failed;
            return Err(DeviceError::BusNotReady);
        }

        if let Err(e) = self.transport.write_command(TURBO_MODE_CMD).await {
            error!("Trackball {}: Failed to set turbo mode: {:?}", id, e);
            self.init_state = InitState::Failed;
            return Err(e.into());
        }

        self.processor.reset();
        self.button_pressed = false;
        self.button_pressed_prev = false;
        self.next_poll = Instant::now() + self.config.poll_interval;
        self.init_state = InitState::Ready;

        info!("Trackball {}: Initialized, address: {:#x}", id, self.config.address);
        Ok(())
    }

    /// Run one poll cycle and schedule the next one.
    ///
    /// This is the per-cycle work handler driven by [`Runnable::run`]. It does nothing
    /// until [`Az1uball::init`] has succeeded.
    pub async fn poll_once(&mut self) {
        if self.init_state != InitState::Ready {
            warn!(
                "Trackball {}: Poll before initialization, skipped",
                self.config.device_id
            );
            return;
        }

        let mut buf = [0u8; REGISTER_BLOCK_LEN];
        match self.transport.read_block(&mut buf).await {
            Ok(()) => self.handle_sample(RawSample::from_block(&buf)),
            Err(e) => error!(
                "Trackball {}: Failed to read movement data: {:?}",
                self.config.device_id, e
            ),
        }

        self.next_poll = Instant::now() + self.config.poll_interval;
    }

    fn handle_sample(&mut self, sample: RawSample) {
        let id = self.config.device_id;
        let params = self.motion_config.snapshot();

        let (previous, last) = self.shared.clock.samples();
        let elapsed = match last.checked_sub(previous) {
            Some(elapsed) => elapsed,
            None => {
                warn!(
                    "Trackball {}: Sample timestamps out of order: previous {}, last {}",
                    id, previous, last
                );
                // No speed boost
                u64::MAX
            }
        };

        if let Some(report) = self
            .processor
            .process(&sample, elapsed, &params, &self.shared.accumulator)
        {
            if let Some(x) = report.x {
                match self.emitter.report_relative(Axis::X, x, true) {
                    Ok(()) => debug!("Trackball {}: Reported delta_x: {}", id, x),
                    Err(e) => error!("Trackball {}: Failed to report delta_x: {:?}", id, e),
                }
            }
            if let Some(y) = report.y {
                match self.emitter.report_relative(Axis::Y, y, true) {
                    Ok(()) => debug!("Trackball {}: Reported delta_y: {}", id, y),
                    Err(e) => error!("Trackball {}: Failed to report delta_y: {:?}", id, e),
                }
            }
        }

        self.button_pressed = sample.button_pressed();
        if self.button_pressed != self.button_pressed_prev {
            match self
                .emitter
                .report_key(self.config.button_code, self.button_pressed, true)
            {
                Ok(()) => debug!("Trackball {}: Reported switch state: {}", id, self.button_pressed),
                Err(e) => error!("Trackball {}: Failed to report key: {:?}", id, e),
            }
            // Advance even if the report failed, a state that can't be delivered now isn't retried
            self.button_pressed_prev = self.button_pressed;
        }
    }

    pub fn init_state(&self) -> InitState {
        self.init_state
    }

    /// Deadline of the next poll cycle
    pub fn next_poll(&self) -> Instant {
        self.next_poll
    }

    /// Switch state of the latest sample
    pub fn button_pressed(&self) -> bool {
        self.button_pressed
    }

    pub fn processor(&self) -> &MotionProcessor {
        &self.processor
    }

    pub fn shared(&self) -> &'a TrackballShared {
        self.shared
    }

    pub fn config(&self) -> &TrackballConfig {
        &self.config
    }

    pub fn transport(&self) -> &B {
        &self.transport
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    /// Consume the device and give the transport and emitter back
    pub fn release(self) -> (B, E) {
        (self.transport, self.emitter)
    }
}

impl<'a, B: BusTransport, E: EventEmitter> Runnable for Az1uball<'a, B, E> {
    async fn run(&mut self) -> ! {
        if self.init_state == InitState::Pending {
            if let Err(e) = self.init().await {
                error!("Trackball {}: Bring-up failed, not polling: {:?}", self.config.device_id, e);
            }
        }

        if self.init_state == InitState::Failed {
            loop {
                pending::<()>().await;
            }
        }

        loop {
            Timer::at(self.next_poll).await;
            self.poll_once().await;
        }
    }
}
