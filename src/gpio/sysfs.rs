//! Linux sysfs GPIO driver.
//!
//! Drives pins through `/sys/class/gpio`. The kernel interface is addressed
//! by BCM GPIO number, so the driver translates physical header positions
//! to BCM lines through a fixed lookup table before touching the
//! filesystem. Exported lines are tracked and unexported again on shutdown.

use std::collections::HashSet;
use std::ffi::CString;
use std::fs;
use std::fs::File;
use std::io;
use std::io::Write;
use std::os::linux::fs::MetadataExt;
use std::path::Path;
use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::gpio::{GpioDriver, Level, Mode};

// BCM GPIO line for each physical header position (index = position - 1).
// Power, ground and the ID EEPROM pins carry no usable line; the board
// never forwards those, but the driver reports them as invalid input
// rather than assuming.
#[rustfmt::skip]
const BCM_LINES: [Option<u8>; 40] = [
    None,     None,     Some(2),  None,     Some(3),  None,     Some(4),  Some(14),
    None,     Some(15), Some(17), Some(18), Some(27), None,     Some(22), Some(23),
    None,     Some(24), Some(10), None,     Some(9),  Some(25), Some(11), Some(8),
    None,     Some(7),  None,     None,     Some(5),  None,     Some(6),  Some(12),
    Some(13), None,     Some(19), Some(16), Some(26), Some(20), None,     Some(21),
];

fn bcm_line(pin: u8) -> io::Result<u8> {
    BCM_LINES
        .get((pin as usize).wrapping_sub(1))
        .copied()
        .flatten()
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("header position {} has no GPIO line", pin),
            )
        })
}

// Find group ID for the specified group name.
fn group_name_to_gid(name: &str) -> Option<u32> {
    if let Ok(name_cstr) = CString::new(name) {
        unsafe {
            let group_ptr = libc::getgrnam(name_cstr.as_ptr());

            if !group_ptr.is_null() {
                return Some((*group_ptr).gr_gid);
            }
        }
    }

    None
}

fn export(line: u8) -> io::Result<()> {
    // Only export if the line isn't already exported
    if !Path::new(&format!("/sys/class/gpio/gpio{}", line)).exists() {
        File::create("/sys/class/gpio/export")?.write_fmt(format_args!("{}", line))?;
    }

    // The directory created by exporting a line starts off owned by
    // root:root. There's a short delay before udev changes the group to
    // gpio. Since non-root users should be able to use the driver, wait for
    // max. 1s for the group to change. If this isn't working, check the
    // udev rules (/etc/udev/rules.d/99-com.rules).
    let gid_gpio = group_name_to_gid("gpio").unwrap_or(0);

    let mut counter = 0;
    while counter < 20 {
        let meta = fs::metadata(format!("/sys/class/gpio/gpio{}", line))?;
        if meta.st_gid() == gid_gpio {
            break;
        }

        thread::sleep(Duration::from_millis(50));
        counter += 1;
    }

    Ok(())
}

fn unexport(line: u8) -> io::Result<()> {
    // Only unexport if the line is actually exported
    if Path::new(&format!("/sys/class/gpio/gpio{}", line)).exists() {
        File::create("/sys/class/gpio/unexport")?.write_fmt(format_args!("{}", line))?;
    }

    Ok(())
}

fn set_direction(line: u8, mode: Mode) -> io::Result<()> {
    let b_direction: &[u8] = match mode {
        Mode::Input => b"in",
        // "low" configures the line as output and drives it low in one step
        Mode::Output => b"low",
    };

    File::create(format!("/sys/class/gpio/gpio{}/direction", line))?.write_all(b_direction)?;

    Ok(())
}

/// GPIO driver backed by the Linux sysfs interface.
///
/// This is the driver [`Board::new`] selects.
///
/// [`Board::new`]: ../struct.Board.html#method.new
#[derive(Debug, Default)]
pub struct SysfsDriver {
    exported: HashSet<u8>,
}

impl SysfsDriver {
    pub fn new() -> SysfsDriver {
        SysfsDriver::default()
    }
}

impl GpioDriver for SysfsDriver {
    fn configure(&mut self, pin: u8, mode: Mode) -> io::Result<()> {
        let line = bcm_line(pin)?;

        export(line)?;
        set_direction(line, mode)?;
        self.exported.insert(line);
        debug!("exported BCM line {} for pin {} ({})", line, pin, mode);

        Ok(())
    }

    fn write(&mut self, pin: u8, level: Level) -> io::Result<()> {
        let line = bcm_line(pin)?;
        let b_level: &[u8] = match level {
            Level::Low => b"0",
            Level::High => b"1",
        };

        File::create(format!("/sys/class/gpio/gpio{}/value", line))?.write_all(b_level)?;

        Ok(())
    }

    fn read(&mut self, pin: u8) -> io::Result<Level> {
        let line = bcm_line(pin)?;
        let value = fs::read_to_string(format!("/sys/class/gpio/gpio{}/value", line))?;

        match value.trim() {
            "0" => Ok(Level::Low),
            _ => Ok(Level::High),
        }
    }

    fn shutdown(&mut self) -> io::Result<()> {
        let mut result = Ok(());
        let lines: Vec<u8> = self.exported.drain().collect();

        for line in lines {
            if let Err(e) = unexport(line) {
                warn!("failed to unexport BCM line {}: {}", line, e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_positions_map_to_expected_lines() {
        assert_eq!(bcm_line(3).unwrap(), 2);
        assert_eq!(bcm_line(7).unwrap(), 4);
        assert_eq!(bcm_line(33).unwrap(), 13);
        assert_eq!(bcm_line(40).unwrap(), 21);
    }

    #[test]
    fn fixed_function_positions_have_no_line() {
        for pin in [1u8, 2, 6, 17, 20, 39] {
            assert!(bcm_line(pin).is_err());
        }
    }

    #[test]
    fn positions_outside_header_have_no_line() {
        assert!(bcm_line(0).is_err());
        assert!(bcm_line(41).is_err());
    }
}
