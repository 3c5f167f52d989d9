//! System-related tools.
//!
//! Currently limited to [`cpu_temperature`], a convenience query for the
//! SoC temperature sensor. It's independent of the GPIO pin state machine.
//!
//! [`cpu_temperature`]: fn.cpu_temperature.html

use std::error;
use std::fmt;
use std::fs;
use std::result;

const THERMAL_ZONE: &str = "/sys/class/thermal/thermal_zone0/temp";

/// Errors that can occur when reading system sensors.
#[derive(Debug)]
pub enum Error {
    /// The temperature sensor couldn't be read.
    ///
    /// The sysfs thermal zone is missing, unreadable, or returned something
    /// that isn't a temperature. Non-fatal; the caller may retry or omit
    /// the reading.
    SensorUnavailable,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::SensorUnavailable => write!(f, "CPU temperature sensor unavailable"),
        }
    }
}

impl error::Error for Error {}

/// Result type returned from methods that can have `system::Error`s.
pub type Result<T> = result::Result<T, Error>;

/// Returns the CPU temperature in degrees Celsius, rounded to one decimal.
///
/// Reads the kernel's thermal zone, which reports millidegrees Celsius as
/// text.
pub fn cpu_temperature() -> Result<f64> {
    let raw = fs::read_to_string(THERMAL_ZONE).map_err(|_| Error::SensorUnavailable)?;

    parse_millidegrees(&raw)
}

fn parse_millidegrees(raw: &str) -> Result<f64> {
    let millidegrees: i32 = raw.trim().parse().map_err(|_| Error::SensorUnavailable)?;

    Ok((f64::from(millidegrees) / 100.0).round() / 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn millidegrees_round_to_one_decimal() {
        assert_eq!(parse_millidegrees("47123").unwrap(), 47.1);
        assert_eq!(parse_millidegrees("47150").unwrap(), 47.2);
        assert_eq!(parse_millidegrees("36000\n").unwrap(), 36.0);
        assert_eq!(parse_millidegrees("  -10540 ").unwrap(), -10.5);
    }

    #[test]
    fn non_numeric_readings_fail() {
        assert!(matches!(
            parse_millidegrees("cold"),
            Err(Error::SensorUnavailable)
        ));
        assert!(matches!(parse_millidegrees(""), Err(Error::SensorUnavailable)));
    }
}
