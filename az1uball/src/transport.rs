//! Bus transport of the AZ1UBALL
//!
//! The sensor answers a plain 5-byte I2C read with its whole register block:
//!
//! | byte | content                            |
//! |------|------------------------------------|
//! | 0    | movement count to the left         |
//! | 1    | movement count to the right        |
//! | 2    | movement count up                  |
//! | 3    | movement count down                |
//! | 4    | status, bit 7 is the switch state  |

use embedded_hal_async::i2c::I2c;

/// Size of the register block returned by one read
pub const REGISTER_BLOCK_LEN: usize = 5;

/// Command enabling the high-rate ("turbo") sampling mode
pub const TURBO_MODE_CMD: u8 = 0x91;

/// Switch state bit in the status byte
pub const SWITCH_STATE_MASK: u8 = 0b1000_0000;

const REG_LEFT: usize = 0;
const REG_RIGHT: usize = 1;
const REG_UP: usize = 2;
const REG_DOWN: usize = 3;
const REG_STATUS: usize = 4;

/// Bus transport errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Reading the register block failed
    Read,
    /// Writing a command failed
    Write,
    /// The bus is not ready
    NotReady,
}

/// Transport the trackball is reached through.
pub trait BusTransport {
    /// Whether the underlying bus is usable.
    ///
    /// Only checked once at bring-up.
    fn is_ready(&mut self) -> bool {
        true
    }

    /// Read the whole register block
    async fn read_block(&mut self, buf: &mut [u8; REGISTER_BLOCK_LEN]) -> Result<(), BusError>;

    /// Write a single command byte
    async fn write_command(&mut self, cmd: u8) -> Result<(), BusError>;
}

/// [`BusTransport`] over an embedded-hal-async I2C bus
pub struct I2cTransport<I2C: I2c> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> I2cTransport<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Consume the transport and give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> BusTransport for I2cTransport<I2C> {
    async fn read_block(&mut self, buf: &mut [u8; REGISTER_BLOCK_LEN]) -> Result<(), BusError> {
        self.i2c.read(self.address, buf).await.map_err(|_| BusError::Read)
    }

    async fn write_command(&mut self, cmd: u8) -> Result<(), BusError> {
        self.i2c.write(self.address, &[cmd]).await.map_err(|_| BusError::Write)
    }
}

/// Decoded register block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub left: u8,
    pub right: u8,
    pub up: u8,
    pub down: u8,
    pub status: u8,
}

impl RawSample {
    pub fn from_block(buf: &[u8; REGISTER_BLOCK_LEN]) -> Self {
        Self {
            left: buf[REG_LEFT],
            right: buf[REG_RIGHT],
            up: buf[REG_UP],
            down: buf[REG_DOWN],
            status: buf[REG_STATUS],
        }
    }

    /// Horizontal delta, positive is rightward
    pub fn delta_x(&self) -> i16 {
        self.right as i16 - self.left as i16
    }

    /// Vertical delta, positive is downward
    pub fn delta_y(&self) -> i16 {
        self.down as i16 - self.up as i16
    }

    pub fn button_pressed(&self) -> bool {
        (self.status & SWITCH_STATE_MASK) != 0
    }
}
