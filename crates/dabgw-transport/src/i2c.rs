use i2cdev::core::I2CDevice;
use i2cdev::linux::LinuxI2CDevice;

use crate::link::{BusLink, LinkError};

/// I2C link to a bus companion (e.g. a cellular modem board).
pub struct I2cLink {
    dev: LinuxI2CDevice,
}

impl I2cLink {
    /// Opens the bus device at `path` addressing `target_address`.
    pub fn open(path: &str, target_address: u16) -> Result<Self, LinkError> {
        let dev = LinuxI2CDevice::new(path, target_address)
            .map_err(|err| LinkError::Backend(err.to_string()))?;
        Ok(Self { dev })
    }
}

impl BusLink for I2cLink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.dev
            .write(bytes)
            .map_err(|err| LinkError::Backend(err.to_string()))
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, LinkError> {
        let mut buf = vec![0_u8; len];
        self.dev
            .read(&mut buf)
            .map_err(|err| LinkError::Backend(err.to_string()))?;
        Ok(buf)
    }
}
