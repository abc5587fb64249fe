use az1uball::event::TrackballEvent;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub const ADDR: u8 = 0x0A;
pub const PRESSED: u8 = 0x80;

pub type TestChannel = Channel<NoopRawMutex, TrackballEvent, 16>;

/// Drain every event queued in `channel`
pub fn drain(channel: &TestChannel) -> Vec<TrackballEvent> {
    let mut events = Vec::new();
    while let Ok(event) = channel.try_receive() {
        events.push(event);
    }
    events
}
