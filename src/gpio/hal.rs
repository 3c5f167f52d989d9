use embedded_hal::digital::{
    Error as ErrorHal, ErrorKind, ErrorType, InputPin as InputPinHal, OutputPin as OutputPinHal,
    StatefulOutputPin as StatefulOutputPinHal,
};

use super::{Error, Pin};

/// `Error` trait implementation for `embedded-hal` v1.0.
///
/// Unlike drivers with infallible pin access, direction misuse and stale
/// claims surface at call time here, so the crate's own error type is
/// carried through the `embedded-hal` traits.
impl ErrorHal for Error {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// `ErrorType` trait implementation for `embedded-hal` v1.0.
impl ErrorType for Pin {
    type Error = Error;
}

/// `InputPin` trait implementation for `embedded-hal` v1.0.
impl InputPinHal for Pin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Pin::is_high(self)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Pin::is_low(self)
    }
}

/// `OutputPin` trait implementation for `embedded-hal` v1.0.
impl OutputPinHal for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Pin::set_low(self)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Pin::set_high(self)
    }
}

/// `StatefulOutputPin` trait implementation for `embedded-hal` v1.0.
impl StatefulOutputPinHal for Pin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Pin::is_set_high(self)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Pin::is_set_low(self)
    }

    fn toggle(&mut self) -> Result<(), Self::Error> {
        Pin::toggle(self)
    }
}
