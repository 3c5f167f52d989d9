use std::sync::Arc;

use crate::gpio::{BoardState, Level, Mode, Result};

/// Claimed GPIO pin.
///
/// `Pin`s are constructed by claiming them through [`Board::claim`], which
/// fixes the pin's direction for the lifetime of the claim. Driving
/// operations are only valid on a pin claimed as [`Output`], reading
/// operations only on a pin claimed as [`Input`]; misuse fails with
/// [`Error::WrongMode`].
///
/// Every operation re-validates the claim against the owning board by pin
/// number, so a handle whose pin has been released through
/// [`Board::release`] fails with [`Error::NotClaimed`], and any handle
/// fails with [`Error::Closed`] after [`Board::shutdown`].
///
/// [`Board::claim`]: struct.Board.html#method.claim
/// [`Board::release`]: struct.Board.html#method.release
/// [`Board::shutdown`]: struct.Board.html#method.shutdown
/// [`Output`]: enum.Mode.html#variant.Output
/// [`Input`]: enum.Mode.html#variant.Input
/// [`Error::WrongMode`]: enum.Error.html#variant.WrongMode
/// [`Error::NotClaimed`]: enum.Error.html#variant.NotClaimed
/// [`Error::Closed`]: enum.Error.html#variant.Closed
#[derive(Debug)]
pub struct Pin {
    pin: u8,
    mode: Mode,
    state: Arc<BoardState>,
}

impl Pin {
    #[inline]
    pub(crate) fn new(pin: u8, mode: Mode, state: Arc<BoardState>) -> Pin {
        Pin { pin, mode, state }
    }

    /// Returns the pin's physical position on the header.
    #[inline]
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Returns the direction the pin was claimed with.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Sets the pin's output state.
    #[inline]
    pub fn write(&mut self, level: Level) -> Result<()> {
        self.state.write(self.pin, level)
    }

    /// Sets the pin's output state to [`Low`].
    ///
    /// [`Low`]: enum.Level.html#variant.Low
    #[inline]
    pub fn set_low(&mut self) -> Result<()> {
        self.write(Level::Low)
    }

    /// Sets the pin's output state to [`High`].
    ///
    /// [`High`]: enum.Level.html#variant.High
    #[inline]
    pub fn set_high(&mut self) -> Result<()> {
        self.write(Level::High)
    }

    /// Toggles the pin's output state between [`Low`] and [`High`], based
    /// on the last driven level.
    ///
    /// [`Low`]: enum.Level.html#variant.Low
    /// [`High`]: enum.Level.html#variant.High
    pub fn toggle(&mut self) -> Result<()> {
        let level = self.state.tracked_level(self.pin)?;
        self.write(!level)
    }

    /// Reads the pin's logic level.
    #[inline]
    pub fn read(&self) -> Result<Level> {
        self.state.read(self.pin)
    }

    /// Reads the pin's logic level, and returns `true` if it's set to
    /// [`High`].
    ///
    /// [`High`]: enum.Level.html#variant.High
    #[inline]
    pub fn is_high(&self) -> Result<bool> {
        Ok(self.read()? == Level::High)
    }

    /// Reads the pin's logic level, and returns `true` if it's set to
    /// [`Low`].
    ///
    /// [`Low`]: enum.Level.html#variant.Low
    #[inline]
    pub fn is_low(&self) -> Result<bool> {
        Ok(self.read()? == Level::Low)
    }

    /// Returns `true` if the pin's last driven output state is [`High`].
    ///
    /// [`High`]: enum.Level.html#variant.High
    #[inline]
    pub fn is_set_high(&self) -> Result<bool> {
        Ok(self.state.tracked_level(self.pin)? == Level::High)
    }

    /// Returns `true` if the pin's last driven output state is [`Low`].
    ///
    /// [`Low`]: enum.Level.html#variant.Low
    #[inline]
    pub fn is_set_low(&self) -> Result<bool> {
        Ok(self.state.tracked_level(self.pin)? == Level::Low)
    }
}

impl PartialEq for Pin {
    fn eq(&self, other: &Pin) -> bool {
        self.pin == other.pin
    }
}

impl Eq for Pin {}
