//! Minimal i2c-dev register access
//!
//! Opens `/dev/i2c-N`, binds the slave address with the `I2C_SLAVE` ioctl and
//! performs SMBus-style register reads/writes with plain read(2)/write(2).

use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

/// ioctl request: set slave address for subsequent transfers
const I2C_SLAVE: libc::c_ulong = 0x0703;

/// Path of the character device for bus `bus`
pub fn bus_path(bus: u8) -> PathBuf {
    PathBuf::from(format!("/dev/i2c-{}", bus))
}

/// One slave device on an I2C bus
pub struct I2cDevice {
    file: File,
    address: u16,
}

impl I2cDevice {
    /// Open `path` and select `address`
    pub fn open(path: &Path, address: u16) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| Error::DeviceUnavailable(format!("{}: {}", path.display(), e)))?;

        // SAFETY: fd is valid for the lifetime of `file`; I2C_SLAVE takes the
        // address by value.
        let rc = unsafe { libc::ioctl(file.as_raw_fd(), I2C_SLAVE as _, libc::c_ulong::from(address)) };
        if rc < 0 {
            return Err(Error::DeviceUnavailable(format!(
                "I2C_SLAVE {:#04x} on {}: {}",
                address,
                path.display(),
                std::io::Error::last_os_error()
            )));
        }

        log::debug!("Opened {} for device {:#04x}", path.display(), address);
        Ok(Self { file, address })
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    /// Write one register
    pub fn write_byte_data(&mut self, register: u8, value: u8) -> Result<()> {
        self.file.write_all(&[register, value])?;
        Ok(())
    }

    /// Read one register
    pub fn read_byte_data(&mut self, register: u8) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_registers(register, &mut buf)?;
        Ok(buf[0])
    }

    /// Burst read starting at `register` (device auto-increments)
    pub fn read_registers(&mut self, register: u8, buf: &mut [u8]) -> Result<()> {
        self.file.write_all(&[register])?;
        self.file.read_exact(buf)?;
        Ok(())
    }
}
