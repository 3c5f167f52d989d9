//! Recording mock driver.
//!
//! [`MockDriver`] stands in for the hardware in tests. It records every
//! driver call in order, returns scripted logic levels for input reads, and
//! can be told to fail writes on selected pins to exercise the board's
//! best-effort shutdown path.
//!
//! `MockDriver` is a cheap handle over shared state: keep a clone around
//! after boxing one into [`Board::with_driver`] to inspect the recorded
//! calls afterwards.
//!
//! [`MockDriver`]: struct.MockDriver.html
//! [`Board::with_driver`]: ../struct.Board.html#method.with_driver

use std::collections::{HashMap, HashSet};
use std::io;
use std::sync::{Arc, Mutex};

use crate::gpio::{GpioDriver, Level, Mode};

/// A single recorded driver call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Configure(u8, Mode),
    Write(u8, Level),
    Read(u8),
    Shutdown,
}

#[derive(Debug, Default)]
struct MockState {
    ops: Vec<Op>,
    input_levels: HashMap<u8, Level>,
    failing_writes: HashSet<u8>,
}

/// GPIO driver that records calls instead of touching hardware.
#[derive(Debug, Clone, Default)]
pub struct MockDriver {
    state: Arc<Mutex<MockState>>,
}

impl MockDriver {
    pub fn new() -> MockDriver {
        MockDriver::default()
    }

    /// Sets the logic level returned by subsequent reads of the specified
    /// pin. Pins without a scripted level read as [`Low`].
    ///
    /// [`Low`]: ../enum.Level.html#variant.Low
    pub fn set_input_level(&self, pin: u8, level: Level) {
        self.state.lock().unwrap().input_levels.insert(pin, level);
    }

    /// Makes every subsequent write to the specified pin fail with an I/O
    /// error. Failed writes aren't recorded.
    pub fn fail_writes(&self, pin: u8) {
        self.state.lock().unwrap().failing_writes.insert(pin);
    }

    /// Returns every recorded call, in order.
    pub fn ops(&self) -> Vec<Op> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Number of `shutdown` calls recorded.
    pub fn shutdown_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .ops
            .iter()
            .filter(|&&op| op == Op::Shutdown)
            .count()
    }
}

impl GpioDriver for MockDriver {
    fn configure(&mut self, pin: u8, mode: Mode) -> io::Result<()> {
        self.state.lock().unwrap().ops.push(Op::Configure(pin, mode));

        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_writes.contains(&pin) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("mock write failure on pin {}", pin),
            ));
        }

        state.ops.push(Op::Write(pin, level));

        Ok(())
    }

    fn read(&mut self, pin: u8) -> io::Result<Level> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(Op::Read(pin));

        Ok(*state.input_levels.get(&pin).unwrap_or(&Level::Low))
    }

    fn shutdown(&mut self) -> io::Result<()> {
        self.state.lock().unwrap().ops.push(Op::Shutdown);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_calls_in_order() {
        let mock = MockDriver::new();
        let mut driver: Box<dyn GpioDriver> = Box::new(mock.clone());

        driver.configure(3, Mode::Output).unwrap();
        driver.write(3, Level::High).unwrap();
        driver.shutdown().unwrap();

        assert_eq!(
            mock.ops(),
            vec![
                Op::Configure(3, Mode::Output),
                Op::Write(3, Level::High),
                Op::Shutdown,
            ]
        );
    }

    #[test]
    fn scripted_input_levels() {
        let mock = MockDriver::new();
        mock.set_input_level(5, Level::High);

        let mut driver: Box<dyn GpioDriver> = Box::new(mock.clone());
        assert_eq!(driver.read(5).unwrap(), Level::High);
        assert_eq!(driver.read(7).unwrap(), Level::Low);
    }

    #[test]
    fn injected_write_failures_are_not_recorded() {
        let mock = MockDriver::new();
        mock.fail_writes(11);

        let mut driver: Box<dyn GpioDriver> = Box::new(mock.clone());
        assert!(driver.write(11, Level::High).is_err());
        assert!(mock.ops().is_empty());
    }
}
