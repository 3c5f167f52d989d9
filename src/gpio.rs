//! Interface for the GPIO header.
//!
//! Pins are addressed by their physical position on the 40-pin header
//! (BOARD numbering), rather than by BCM GPIO number. Position 1 is the
//! corner pin next to the microSD card slot.
//!
//! ## Reserved pins
//!
//! Fourteen header positions carry a fixed function: the 3.3V and 5V power
//! rails, the ground pins and the HAT ID EEPROM pins. These can never be
//! claimed; [`Board::claim`] refuses them with [`Error::ReservedPin`]. The
//! full catalogue is available through [`Board::reserved_pins`].
//!
//! ## Pins
//!
//! A pin is claimed for a fixed direction with [`Board::claim`], which
//! configures the hardware and returns an owned [`Pin`] handle. Claiming a
//! pin that's already claimed returns `Err(`[`Error::PinUsed`]`)`; the
//! existing claim stays intact. A pin's direction can't change for the
//! lifetime of the claim. Release the pin with [`Board::release`] and claim
//! it again to switch direction.
//!
//! By default, all claimed output pins are set low and the driver is shut
//! down when the last handle to the board goes out of scope. Use
//! [`Board::set_clear_on_drop`] to disable this behavior. Note that `drop`
//! methods aren't called when a process is abnormally terminated (for
//! instance when a `SIGINT` signal isn't caught).
//!
//! ## Drivers
//!
//! `Board` forwards all physical pin operations through the [`GpioDriver`]
//! trait. [`Board::new`] selects the Linux sysfs driver; tests and
//! non-standard setups can inject any other driver with
//! [`Board::with_driver`]. All validation lives in `Board` itself, so
//! drivers stay small.
//!
//! [`Board::claim`]: struct.Board.html#method.claim
//! [`Board::release`]: struct.Board.html#method.release
//! [`Board::reserved_pins`]: struct.Board.html#method.reserved_pins
//! [`Board::new`]: struct.Board.html#method.new
//! [`Board::with_driver`]: struct.Board.html#method.with_driver
//! [`Board::set_clear_on_drop`]: struct.Board.html#method.set_clear_on_drop
//! [`Pin`]: struct.Pin.html
//! [`GpioDriver`]: trait.GpioDriver.html
//! [`Error::ReservedPin`]: enum.Error.html#variant.ReservedPin
//! [`Error::PinUsed`]: enum.Error.html#variant.PinUsed

use std::collections::HashMap;
use std::error;
use std::fmt;
use std::io;
use std::ops::Not;
use std::result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

mod driver;
#[cfg(feature = "hal")]
mod hal;
pub mod mock;
mod pin;
pub mod sysfs;

pub use self::driver::GpioDriver;
pub use self::pin::Pin;

/// Number of pins on the physical GPIO header.
pub const MAX_PINS: u8 = 40;

// Header positions with a fixed function, sorted by position. Claims on
// these are always refused.
const RESERVED_PINS: &[(u8, &str)] = &[
    (1, "3.3V"),
    (2, "5V"),
    (4, "5V"),
    (6, "Ground"),
    (9, "Ground"),
    (14, "Ground"),
    (17, "3.3V"),
    (20, "Ground"),
    (25, "Ground"),
    (27, "ID EEPROM"),
    (28, "ID EEPROM"),
    (30, "Ground"),
    (34, "Ground"),
    (39, "Ground"),
];

/// Errors that can occur when accessing the GPIO header.
#[derive(Debug)]
pub enum Error {
    /// Invalid physical pin number.
    ///
    /// The 40-pin header is addressed by positions 1 through 40.
    InvalidPin(u8),
    /// Pin has a fixed function.
    ///
    /// The position refers to a power rail, a ground pin or one of the HAT
    /// ID EEPROM pins, and can never be configured as GPIO. The second
    /// field holds the fixed function's name.
    ReservedPin(u8, &'static str),
    /// Pin is already claimed.
    ///
    /// The pin is in use elsewhere in your application. Release it with
    /// [`Board::release`] before claiming it again.
    ///
    /// [`Board::release`]: struct.Board.html#method.release
    PinUsed(u8),
    /// Pin hasn't been claimed.
    ///
    /// The operation requires a prior [`Board::claim`] for this pin. You'll
    /// also see this error on a stale [`Pin`] handle whose pin has been
    /// released through the board.
    ///
    /// [`Board::claim`]: struct.Board.html#method.claim
    /// [`Pin`]: struct.Pin.html
    NotClaimed(u8),
    /// Operation doesn't match the pin's direction.
    ///
    /// Output pins can't be read, and input pins can't be driven. The
    /// `mode` field holds the direction the pin was claimed with. Switching
    /// direction requires a release followed by a new claim.
    WrongMode { pin: u8, mode: Mode },
    /// Board has been shut down.
    ///
    /// You should normally only see this error when you call a method
    /// after running [`Board::shutdown`]. The board is terminal at that
    /// point; construct a new one to continue.
    ///
    /// [`Board::shutdown`]: struct.Board.html#method.shutdown
    Closed,
    /// One or more pins couldn't be reset during shutdown.
    ///
    /// Shutdown is best-effort: a hardware failure while lowering one pin
    /// doesn't prevent the remaining pins from being lowered, or the driver
    /// from being shut down. The failures are collected here.
    Cleanup(Vec<(u8, io::Error)>),
    /// I/O error.
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::InvalidPin(pin) => write!(f, "Pin {} is not a valid header position", pin),
            Error::ReservedPin(pin, reason) => {
                write!(f, "Pin {} has a fixed function ({})", pin, reason)
            }
            Error::PinUsed(pin) => write!(f, "Pin {} is already claimed", pin),
            Error::NotClaimed(pin) => write!(f, "Pin {} hasn't been claimed", pin),
            Error::WrongMode { pin, mode } => {
                write!(f, "Pin {} is claimed as {}", pin, mode)
            }
            Error::Closed => write!(f, "Board has been shut down"),
            Error::Cleanup(ref failed) => {
                write!(f, "Failed to reset {} pin(s) during shutdown", failed.len())
            }
            Error::Io(ref err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

/// Result type returned from methods that can have `piboard::gpio::Error`s.
pub type Result<T> = result::Result<T, Error>;

/// Pin directions.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mode {
    Input,
    Output,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Mode::Input => write!(f, "In"),
            Mode::Output => write!(f, "Out"),
        }
    }
}

/// Pin logic levels.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[repr(u8)]
pub enum Level {
    Low = 0,
    High = 1,
}

impl From<bool> for Level {
    fn from(e: bool) -> Level {
        if e {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<u8> for Level {
    fn from(value: u8) -> Self {
        if value == 0 {
            Level::Low
        } else {
            Level::High
        }
    }
}

impl Not for Level {
    type Output = Level;

    fn not(self) -> Level {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Level::Low => write!(f, "Low"),
            Level::High => write!(f, "High"),
        }
    }
}

fn check_pin(pin: u8) -> Result<()> {
    if pin == 0 || pin > MAX_PINS {
        Err(Error::InvalidPin(pin))
    } else {
        Ok(())
    }
}

pub(crate) fn reserved_reason(pin: u8) -> Option<&'static str> {
    RESERVED_PINS
        .binary_search_by_key(&pin, |&(position, _)| position)
        .ok()
        .map(|index| RESERVED_PINS[index].1)
}

// A claimed pin as the board tracks it. The driven level is only meaningful
// for outputs; inputs keep the initial Low and never expose it.
#[derive(Debug, PartialEq, Copy, Clone)]
struct ClaimedPin {
    mode: Mode,
    level: Level,
}

#[derive(Debug)]
struct BoardInner {
    driver: Box<dyn GpioDriver>,
    claimed: HashMap<u8, ClaimedPin>,
    closed: bool,
}

// Board's state lives behind an Arc shared with every Pin handle, so a
// handle can re-validate its claim by position on every operation. One
// mutex serializes all mutating operations on the instance.
#[derive(Debug)]
pub(crate) struct BoardState {
    inner: Mutex<BoardInner>,
    clear_on_drop: AtomicBool,
}

impl BoardState {
    fn lock(&self) -> MutexGuard<'_, BoardInner> {
        self.inner.lock().unwrap()
    }

    pub(crate) fn write(&self, pin: u8, level: Level) -> Result<()> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(Error::Closed);
        }

        let BoardInner {
            ref mut driver,
            ref mut claimed,
            ..
        } = *inner;

        let entry = claimed.get_mut(&pin).ok_or(Error::NotClaimed(pin))?;
        if entry.mode != Mode::Output {
            return Err(Error::WrongMode {
                pin,
                mode: entry.mode,
            });
        }

        driver.write(pin, level)?;
        entry.level = level;
        debug!("pin {} set {}", pin, level);

        Ok(())
    }

    pub(crate) fn read(&self, pin: u8) -> Result<Level> {
        let mut inner = self.lock();
        if inner.closed {
            return Err(Error::Closed);
        }

        let BoardInner {
            ref mut driver,
            ref claimed,
            ..
        } = *inner;

        let entry = claimed.get(&pin).ok_or(Error::NotClaimed(pin))?;
        if entry.mode != Mode::Input {
            return Err(Error::WrongMode {
                pin,
                mode: entry.mode,
            });
        }

        Ok(driver.read(pin)?)
    }

    // Last driven level of an output pin.
    pub(crate) fn tracked_level(&self, pin: u8) -> Result<Level> {
        let inner = self.lock();
        if inner.closed {
            return Err(Error::Closed);
        }

        let entry = inner.claimed.get(&pin).ok_or(Error::NotClaimed(pin))?;
        if entry.mode != Mode::Output {
            return Err(Error::WrongMode {
                pin,
                mode: entry.mode,
            });
        }

        Ok(entry.level)
    }

    // Sets every still-claimed output low, shuts the driver down and marks
    // the board closed. Failed writes are collected; the loop never aborts.
    fn shutdown(&self) -> Result<()> {
        let mut inner = self.lock();
        if inner.closed {
            return Ok(());
        }

        let BoardInner {
            ref mut driver,
            ref mut claimed,
            ref mut closed,
        } = *inner;

        let mut failed: Vec<(u8, io::Error)> = Vec::new();
        for (&pin, entry) in claimed.iter() {
            if entry.mode == Mode::Output {
                if let Err(e) = driver.write(pin, Level::Low) {
                    warn!("failed to reset pin {} during shutdown: {}", pin, e);
                    failed.push((pin, e));
                }
            }
        }

        let driver_result = driver.shutdown();

        claimed.clear();
        *closed = true;
        debug!("board shut down");

        if !failed.is_empty() {
            Err(Error::Cleanup(failed))
        } else {
            driver_result.map_err(Error::Io)
        }
    }
}

impl Drop for BoardState {
    fn drop(&mut self) {
        if self.clear_on_drop.load(Ordering::SeqCst) {
            let _ = self.shutdown();
        }
    }
}

/// Provides claim-based access to the physical GPIO header.
///
/// `Board` can be cloned and shared between threads; clones refer to the
/// same underlying state, and every mutating operation is serialized.
#[derive(Clone, Debug)]
pub struct Board {
    state: Arc<BoardState>,
}

impl Board {
    /// Constructs a new `Board` backed by the Linux sysfs GPIO driver.
    ///
    /// There should be at most one `Board` per physical device; the
    /// hardware has no notion of shared ownership. Clone the `Board` to
    /// share it instead of constructing a second one.
    pub fn new() -> Result<Board> {
        Ok(Board::with_driver(Box::new(sysfs::SysfsDriver::new())))
    }

    /// Constructs a new `Board` backed by the specified driver.
    ///
    /// All pin operations the board considers valid are forwarded to
    /// `driver` without further checks.
    pub fn with_driver(driver: Box<dyn GpioDriver>) -> Board {
        Board {
            state: Arc::new(BoardState {
                inner: Mutex::new(BoardInner {
                    driver,
                    claimed: HashMap::new(),
                    closed: false,
                }),
                clear_on_drop: AtomicBool::new(true),
            }),
        }
    }

    /// Returns the fixed catalogue of reserved header positions and their
    /// functions, sorted by position.
    pub fn reserved_pins(&self) -> &'static [(u8, &'static str)] {
        RESERVED_PINS
    }

    /// Returns a human-readable listing of the reserved header positions,
    /// one `pin: function` pair per line.
    pub fn reserved_pin_listing(&self) -> String {
        let mut listing = String::new();
        for &(pin, reason) in RESERVED_PINS {
            listing.push_str(&format!("{}: {}\n", pin, reason));
        }

        listing
    }

    /// Returns `true` if the specified position has a fixed function.
    ///
    /// Returns [`Error::InvalidPin`] if `pin` isn't a position on the
    /// 40-pin header.
    ///
    /// [`Error::InvalidPin`]: enum.Error.html#variant.InvalidPin
    pub fn is_reserved(&self, pin: u8) -> Result<bool> {
        check_pin(pin)?;

        Ok(reserved_reason(pin).is_some())
    }

    /// Claims the specified pin for the specified direction and returns an
    /// owned [`Pin`] handle.
    ///
    /// Configures the hardware for the requested direction. The direction
    /// is fixed for the lifetime of the claim; release the pin and claim it
    /// again to change it. An output pin starts out with a tracked level of
    /// [`Low`].
    ///
    /// Returns [`Error::InvalidPin`] for positions outside the header,
    /// [`Error::ReservedPin`] for fixed-function positions,
    /// [`Error::PinUsed`] if the pin is already claimed (the existing claim
    /// stays intact), and [`Error::Closed`] after [`shutdown`].
    ///
    /// [`Pin`]: struct.Pin.html
    /// [`Low`]: enum.Level.html#variant.Low
    /// [`Error::InvalidPin`]: enum.Error.html#variant.InvalidPin
    /// [`Error::ReservedPin`]: enum.Error.html#variant.ReservedPin
    /// [`Error::PinUsed`]: enum.Error.html#variant.PinUsed
    /// [`Error::Closed`]: enum.Error.html#variant.Closed
    /// [`shutdown`]: #method.shutdown
    pub fn claim(&self, pin: u8, mode: Mode) -> Result<Pin> {
        check_pin(pin)?;

        let mut inner = self.state.lock();
        if inner.closed {
            return Err(Error::Closed);
        }
        if let Some(reason) = reserved_reason(pin) {
            return Err(Error::ReservedPin(pin, reason));
        }
        if inner.claimed.contains_key(&pin) {
            return Err(Error::PinUsed(pin));
        }

        inner.driver.configure(pin, mode)?;
        inner.claimed.insert(
            pin,
            ClaimedPin {
                mode,
                level: Level::Low,
            },
        );
        debug!("claimed pin {} as {}", pin, mode);

        Ok(Pin::new(pin, mode, self.state.clone()))
    }

    /// Releases the specified pin.
    ///
    /// An output pin is set low before the claim is removed. Any [`Pin`]
    /// handle for this position becomes stale; its operations fail with
    /// [`Error::NotClaimed`], as does a second `release` of the same pin.
    ///
    /// [`Pin`]: struct.Pin.html
    /// [`Error::NotClaimed`]: enum.Error.html#variant.NotClaimed
    pub fn release(&self, pin: u8) -> Result<()> {
        check_pin(pin)?;

        let mut inner = self.state.lock();
        if inner.closed {
            return Err(Error::Closed);
        }

        let entry = *inner.claimed.get(&pin).ok_or(Error::NotClaimed(pin))?;
        if entry.mode == Mode::Output {
            inner.driver.write(pin, Level::Low)?;
        }

        inner.claimed.remove(&pin);
        debug!("released pin {}", pin);

        Ok(())
    }

    /// Shuts the board down.
    ///
    /// Every still-claimed output pin is set low, the driver is shut down
    /// and all claims are removed. Resetting the pins is best-effort: a
    /// hardware failure on one pin doesn't prevent the remaining pins from
    /// being lowered, or the driver from being shut down. Such failures are
    /// aggregated into a single [`Error::Cleanup`].
    ///
    /// Afterwards the board is terminal: any claim, release or pin
    /// operation fails with [`Error::Closed`]. Calling `shutdown` again is
    /// a no-op.
    ///
    /// [`Error::Cleanup`]: enum.Error.html#variant.Cleanup
    /// [`Error::Closed`]: enum.Error.html#variant.Closed
    pub fn shutdown(&self) -> Result<()> {
        self.state.shutdown()
    }

    /// Returns the value of `clear_on_drop`.
    pub fn clear_on_drop(&self) -> bool {
        self.state.clear_on_drop.load(Ordering::SeqCst)
    }

    /// When enabled, the board is shut down when the last handle to its
    /// state (`Board` clone or [`Pin`]) goes out of scope. By default,
    /// `clear_on_drop` is set to `true`.
    ///
    /// ## Note
    ///
    /// Drop methods aren't called when a process is abnormally terminated,
    /// for instance when a user presses <kbd>Ctrl</kbd> + <kbd>C</kbd> and
    /// the `SIGINT` signal isn't caught. You can catch those using crates
    /// such as [`simple_signal`], or call [`shutdown`] manually.
    ///
    /// [`Pin`]: struct.Pin.html
    /// [`simple_signal`]: https://crates.io/crates/simple-signal
    /// [`shutdown`]: #method.shutdown
    pub fn set_clear_on_drop(&self, clear_on_drop: bool) {
        self.state
            .clear_on_drop
            .store(clear_on_drop, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_table_is_sorted_by_position() {
        for window in RESERVED_PINS.windows(2) {
            assert!(window[0].0 < window[1].0);
        }
    }

    #[test]
    fn reserved_reason_matches_table() {
        assert_eq!(reserved_reason(1), Some("3.3V"));
        assert_eq!(reserved_reason(27), Some("ID EEPROM"));
        assert_eq!(reserved_reason(39), Some("Ground"));
        assert_eq!(reserved_reason(3), None);
        assert_eq!(reserved_reason(40), None);
    }

    #[test]
    fn pin_numbers_outside_header_are_rejected() {
        assert!(matches!(check_pin(0), Err(Error::InvalidPin(0))));
        assert!(matches!(check_pin(41), Err(Error::InvalidPin(41))));
        assert!(check_pin(1).is_ok());
        assert!(check_pin(40).is_ok());
    }

    #[test]
    fn level_conversions() {
        assert_eq!(Level::from(true), Level::High);
        assert_eq!(Level::from(false), Level::Low);
        assert_eq!(Level::from(0u8), Level::Low);
        assert_eq!(Level::from(7u8), Level::High);
        assert_eq!(!Level::High, Level::Low);
    }

    #[test]
    fn reserved_pin_listing_includes_every_entry() {
        let board = Board::with_driver(Box::new(mock::MockDriver::new()));
        let listing = board.reserved_pin_listing();
        assert_eq!(listing.lines().count(), RESERVED_PINS.len());
        assert!(listing.starts_with("1: 3.3V\n"));
    }
}
