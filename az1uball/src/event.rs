//! Events published by the trackball
//!
//! The poll loop only knows the [`EventEmitter`] trait. [`ChannelEmitter`] is the default emitter,
//! it pushes [`TrackballEvent`]s into an embassy channel without ever waiting on it.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, Sender};
use postcard::experimental::max_size::MaxSize;
use serde::{Deserialize, Serialize};

use crate::TRACKBALL_EVENT_CHANNEL_SIZE;

/// Key code of the first generic button, reported for the switch under the ball
pub const BTN_0: u16 = 0x100;

/// Channel that [`ChannelEmitter::global`] publishes to
pub static TRACKBALL_EVENT_CHANNEL: Channel<crate::RawMutex, TrackballEvent, TRACKBALL_EVENT_CHANNEL_SIZE> =
    Channel::new();

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    X,
    Y,
}

/// Event emitted by a trackball.
///
/// `sync` marks the last event of a group that the consumer should apply together,
/// e.g. X and Y of the same poll cycle.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, MaxSize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrackballEvent {
    /// Relative movement on one axis
    Motion {
        device_id: u8,
        axis: Axis,
        value: i32,
        sync: bool,
    },
    /// The switch under the ball changed its state
    Button {
        device_id: u8,
        code: u16,
        pressed: bool,
        sync: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EmitError {
    /// The event queue is full, the event is dropped
    QueueFull,
}

/// Sink of trackball events.
///
/// Implementations must not block: the poll loop calls these from its cycle and moves on
/// whatever the result is.
pub trait EventEmitter {
    /// Report relative motion on `axis`
    fn report_relative(&mut self, axis: Axis, value: i32, sync: bool) -> Result<(), EmitError>;

    /// Report a key state
    fn report_key(&mut self, code: u16, pressed: bool, sync: bool) -> Result<(), EmitError>;
}

/// [`EventEmitter`] backed by an embassy channel
pub struct ChannelEmitter<'a, M: RawMutex, const N: usize> {
    device_id: u8,
    sender: Sender<'a, M, TrackballEvent, N>,
}

impl<'a, M: RawMutex, const N: usize> ChannelEmitter<'a, M, N> {
    pub fn new(device_id: u8, sender: Sender<'a, M, TrackballEvent, N>) -> Self {
        Self { device_id, sender }
    }

    fn publish(&self, event: TrackballEvent) -> Result<(), EmitError> {
        self.sender.try_send(event).map_err(|_| EmitError::QueueFull)
    }
}

impl ChannelEmitter<'static, crate::RawMutex, TRACKBALL_EVENT_CHANNEL_SIZE> {
    /// Emitter publishing to [`TRACKBALL_EVENT_CHANNEL`]
    pub fn global(device_id: u8) -> Self {
        Self::new(device_id, TRACKBALL_EVENT_CHANNEL.sender())
    }
}

impl<'a, M: RawMutex, const N: usize> EventEmitter for ChannelEmitter<'a, M, N> {
    fn report_relative(&mut self, axis: Axis, value: i32, sync: bool) -> Result<(), EmitError> {
        self.publish(TrackballEvent::Motion {
            device_id: self.device_id,
            axis,
            value,
            sync,
        })
    }

    fn report_key(&mut self, code: u16, pressed: bool, sync: bool) -> Result<(), EmitError> {
        self.publish(TrackballEvent::Button {
            device_id: self.device_id,
            code,
            pressed,
            sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    use super::*;

    #[test]
    fn test_channel_emitter_publishes_events() {
        let channel: Channel<NoopRawMutex, TrackballEvent, 4> = Channel::new();
        let mut emitter = ChannelEmitter::new(3, channel.sender());

        assert!(emitter.report_relative(Axis::X, -7, false).is_ok());
        assert!(emitter.report_key(BTN_0, true, true).is_ok());

        assert_eq!(
            channel.try_receive().ok(),
            Some(TrackballEvent::Motion {
                device_id: 3,
                axis: Axis::X,
                value: -7,
                sync: false,
            })
        );
        assert_eq!(
            channel.try_receive().ok(),
            Some(TrackballEvent::Button {
                device_id: 3,
                code: BTN_0,
                pressed: true,
                sync: true,
            })
        );
        assert!(channel.try_receive().is_err());
    }

    #[test]
    fn test_channel_emitter_reports_full_queue() {
        let channel: Channel<NoopRawMutex, TrackballEvent, 1> = Channel::new();
        let mut emitter = ChannelEmitter::new(0, channel.sender());

        assert_eq!(emitter.report_relative(Axis::Y, 1, true), Ok(()));
        assert_eq!(emitter.report_relative(Axis::Y, 2, true), Err(EmitError::QueueFull));

        // The queued event is untouched by the failed one
        assert_eq!(
            channel.try_receive().ok(),
            Some(TrackballEvent::Motion {
                device_id: 0,
                axis: Axis::Y,
                value: 1,
                sync: true,
            })
        );
    }

    #[test]
    fn test_global_emitter() {
        let mut emitter = ChannelEmitter::global(2);
        assert!(emitter.report_key(BTN_0, false, true).is_ok());
        assert_eq!(
            TRACKBALL_EVENT_CHANNEL.try_receive().ok(),
            Some(TrackballEvent::Button {
                device_id: 2,
                code: BTN_0,
                pressed: false,
                sync: true,
            })
        );
    }

    #[test]
    fn test_event_fits_in_max_size_buffer() {
        let event = TrackballEvent::Motion {
            device_id: 255,
            axis: Axis::Y,
            value: i32::MIN,
            sync: true,
        };
        let mut buf = [0u8; TrackballEvent::POSTCARD_MAX_SIZE];
        let bytes = postcard::to_slice(&event, &mut buf).unwrap();
        let decoded: TrackballEvent = postcard::from_bytes(bytes).unwrap();
        assert_eq!(decoded, event);
    }
}
