//! piboard provides claim-based access to the Raspberry Pi's physical
//! 40-pin GPIO header. Pins are addressed by their position on the header
//! (BOARD numbering), not by BCM GPIO number.
//!
//! A [`Board`] owns the catalogue of reserved header positions (power rails,
//! grounds, the HAT ID EEPROM pins) and tracks which pins are currently
//! claimed and in which direction. A pin can only be driven or read through
//! the [`Pin`] handle returned by [`Board::claim`], and a pin claimed for
//! input can't be driven, or vice versa. Physical operations are forwarded
//! to a [`GpioDriver`]; the default driver uses the Linux sysfs GPIO
//! interface, and [`mock::MockDriver`] stands in for the hardware in tests.
//!
//! The library can be used in conjunction with platform-agnostic drivers
//! through its `embedded-hal` trait implementations, enabled with the `hal`
//! feature.
//!
//! piboard requires Raspberry Pi OS or any similar, recent, Linux
//! distribution. Both `gnu` and `musl` libc targets are supported.
//!
//! [`Board`]: gpio/struct.Board.html
//! [`Board::claim`]: gpio/struct.Board.html#method.claim
//! [`Pin`]: gpio/struct.Pin.html
//! [`GpioDriver`]: gpio/trait.GpioDriver.html
//! [`mock::MockDriver`]: gpio/mock/struct.MockDriver.html

#![doc(html_root_url = "https://docs.rs/piboard/0.3.0")]

pub mod gpio;
pub mod system;
