use std::fmt;
use std::io;

use crate::gpio::{Level, Mode};

/// Driver for the physical pin operations behind a [`Board`].
///
/// Drivers perform no validation; the board only forwards operations on
/// pins it has accepted a claim for, and `write`/`read` are only ever
/// invoked after a matching `configure`. Any driver satisfying these four
/// operations can back a board through [`Board::with_driver`].
///
/// [`Board`]: struct.Board.html
/// [`Board::with_driver`]: struct.Board.html#method.with_driver
pub trait GpioDriver: fmt::Debug + Send {
    /// Configures the pin for the specified direction.
    fn configure(&mut self, pin: u8, mode: Mode) -> io::Result<()>;

    /// Drives the pin to the specified logic level.
    fn write(&mut self, pin: u8, level: Level) -> io::Result<()>;

    /// Reads the pin's current logic level.
    fn read(&mut self, pin: u8) -> io::Result<Level>;

    /// Releases the hardware, leaving it in a deterministic low/released
    /// state. Must be idempotent.
    fn shutdown(&mut self) -> io::Result<()>;
}
