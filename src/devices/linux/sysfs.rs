//! sysfs GPIO and PWM access
//!
//! Pins and PWM channels are exported on open and unexported on drop, so a
//! driver releases its lines even when the daemon unwinds mid-operation.
//!
//! ```text
//! /sys/class/gpio/export            <- "23"
//! /sys/class/gpio/gpio23/direction  <- "out" | "in"
//! /sys/class/gpio/gpio23/value      <-> "0" | "1"
//!
//! /sys/class/pwm/pwmchip0/export          <- "0"
//! /sys/class/pwm/pwmchip0/pwm0/period     <- ns
//! /sys/class/pwm/pwmchip0/pwm0/duty_cycle <- ns
//! /sys/class/pwm/pwmchip0/pwm0/enable     <- "1"
//! ```

use crate::error::{Error, Result};
use std::fs::{self, File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// How long to wait for udev to make a freshly exported node writable
const EXPORT_SETTLE: Duration = Duration::from_millis(200);

/// Pin direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// Write to a sysfs attribute, retrying while udev is still fixing permissions
fn write_attr(path: &Path, value: &str) -> Result<()> {
    let deadline = Instant::now() + EXPORT_SETTLE;
    loop {
        match fs::write(path, value) {
            Ok(()) => return Ok(()),
            Err(e)
                if Instant::now() < deadline
                    && matches!(
                        e.kind(),
                        std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::NotFound
                    ) =>
            {
                thread::sleep(Duration::from_millis(10));
            }
            Err(e) => {
                return Err(Error::Device(format!(
                    "write {} to {}: {}",
                    value.trim(),
                    path.display(),
                    e
                )));
            }
        }
    }
}

/// One exported GPIO line
pub struct GpioPin {
    number: u32,
    root: PathBuf,
    value: File,
    exported_by_us: bool,
}

impl GpioPin {
    /// Export `number` under `root` and set its direction
    pub fn open(root: &Path, number: u32, direction: Direction) -> Result<Self> {
        let pin_dir = root.join(format!("gpio{}", number));
        let exported_by_us = if pin_dir.exists() {
            false
        } else {
            write_attr(&root.join("export"), &number.to_string())?;
            true
        };

        write_attr(&pin_dir.join("direction"), direction.as_str())?;

        let value = OpenOptions::new()
            .read(true)
            .write(direction == Direction::Out)
            .open(pin_dir.join("value"))
            .map_err(|e| Error::Device(format!("open gpio{} value: {}", number, e)))?;

        log::debug!("GPIO {} exported as {}", number, direction.as_str());

        Ok(Self {
            number,
            root: root.to_path_buf(),
            value,
            exported_by_us,
        })
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Drive the line
    pub fn write(&self, high: bool) -> Result<()> {
        let byte: &[u8] = if high { b"1" } else { b"0" };
        self.value.write_at(byte, 0)?;
        Ok(())
    }

    /// Sample the line
    pub fn read(&self) -> Result<bool> {
        let mut buf = [0u8; 1];
        self.value.read_at(&mut buf, 0)?;
        Ok(buf[0] == b'1')
    }
}

impl Drop for GpioPin {
    fn drop(&mut self) {
        if self.exported_by_us
            && let Err(e) = fs::write(self.root.join("unexport"), self.number.to_string())
        {
            log::warn!("Failed to unexport GPIO {}: {}", self.number, e);
        }
    }
}

/// One exported hardware PWM channel
pub struct PwmChannel {
    chip_dir: PathBuf,
    channel_dir: PathBuf,
    channel: u32,
    period_ns: u64,
    exported_by_us: bool,
}

impl PwmChannel {
    /// Export `channel` of `pwmchip{chip}` and program its period
    pub fn open(root: &Path, chip: u8, channel: u32, frequency_hz: u32) -> Result<Self> {
        let chip_dir = root.join(format!("pwmchip{}", chip));
        if !chip_dir.exists() {
            return Err(Error::DeviceUnavailable(format!(
                "{} not present",
                chip_dir.display()
            )));
        }

        let channel_dir = chip_dir.join(format!("pwm{}", channel));
        let exported_by_us = if channel_dir.exists() {
            false
        } else {
            write_attr(&chip_dir.join("export"), &channel.to_string())?;
            true
        };

        let period_ns = 1_000_000_000 / u64::from(frequency_hz.max(1));
        // Duty must not exceed the period, so clear it before changing period
        write_attr(&channel_dir.join("duty_cycle"), "0")?;
        write_attr(&channel_dir.join("period"), &period_ns.to_string())?;
        write_attr(&channel_dir.join("enable"), "1")?;

        log::debug!(
            "PWM chip {} channel {} at {} Hz",
            chip,
            channel,
            frequency_hz
        );

        Ok(Self {
            chip_dir,
            channel_dir,
            channel,
            period_ns,
            exported_by_us,
        })
    }

    /// Set duty cycle in percent of the period (0 = output held low)
    pub fn set_duty_percent(&self, percent: f32) -> Result<()> {
        let duty_ns = (self.period_ns as f64 * f64::from(percent.clamp(0.0, 100.0)) / 100.0) as u64;
        write_attr(&self.channel_dir.join("duty_cycle"), &duty_ns.to_string())
    }
}

impl Drop for PwmChannel {
    fn drop(&mut self) {
        let _ = fs::write(self.channel_dir.join("enable"), "0");
        if self.exported_by_us
            && let Err(e) = fs::write(self.chip_dir.join("unexport"), self.channel.to_string())
        {
            log::warn!("Failed to unexport PWM channel {}: {}", self.channel, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fake sysfs tree where the pin/channel directories already exist, so no
    /// export is attempted and nothing is unexported afterwards.
    fn fake_gpio_root(pin: u32) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let pin_dir = dir.path().join(format!("gpio{}", pin));
        fs::create_dir_all(&pin_dir).unwrap();
        fs::write(pin_dir.join("direction"), "in").unwrap();
        fs::write(pin_dir.join("value"), "0").unwrap();
        dir
    }

    #[test]
    fn test_gpio_direction_and_value() {
        let root = fake_gpio_root(23);
        let pin = GpioPin::open(root.path(), 23, Direction::Out).unwrap();

        let direction = fs::read_to_string(root.path().join("gpio23/direction")).unwrap();
        assert_eq!(direction, "out");

        pin.write(true).unwrap();
        assert!(pin.read().unwrap());
        pin.write(false).unwrap();
        assert!(!pin.read().unwrap());
        assert_eq!(pin.number(), 23);
    }

    #[test]
    fn test_pwm_missing_chip_is_unavailable() {
        let root = tempfile::tempdir().unwrap();
        let err = PwmChannel::open(root.path(), 0, 0, 50).err().unwrap();
        assert!(matches!(err, Error::DeviceUnavailable(_)));
    }

    #[test]
    fn test_pwm_period_and_duty() {
        let root = tempfile::tempdir().unwrap();
        let channel_dir = root.path().join("pwmchip0/pwm0");
        fs::create_dir_all(&channel_dir).unwrap();

        let pwm = PwmChannel::open(root.path(), 0, 0, 50).unwrap();
        assert_eq!(
            fs::read_to_string(channel_dir.join("period")).unwrap(),
            "20000000"
        );
        assert_eq!(fs::read_to_string(channel_dir.join("enable")).unwrap(), "1");

        pwm.set_duty_percent(7.0).unwrap();
        assert_eq!(
            fs::read_to_string(channel_dir.join("duty_cycle")).unwrap(),
            "1400000"
        );

        drop(pwm);
        assert_eq!(fs::read_to_string(channel_dir.join("enable")).unwrap(), "0");
    }
}
