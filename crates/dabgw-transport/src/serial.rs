use std::io::Write;
use std::time::Duration;

use crate::link::{BusLink, LinkError};

const DEFAULT_SERIAL_TIMEOUT: Duration = Duration::from_secs(2);

/// Serial link used by the AIS transponder (fire-and-forget writes).
pub struct SerialLink {
    port: Box<dyn serialport::SerialPort>,
}

impl SerialLink {
    /// Opens `path` at the configured baud rate.
    pub fn open(path: &str, baud: u32) -> Result<Self, LinkError> {
        let port = serialport::new(path, baud)
            .timeout(DEFAULT_SERIAL_TIMEOUT)
            .open()
            .map_err(|err| LinkError::Backend(err.to_string()))?;
        Ok(Self { port })
    }
}

impl BusLink for SerialLink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.port.write_all(bytes)?;
        Ok(())
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, LinkError> {
        let mut buf = vec![0_u8; len];
        let got = std::io::Read::read(&mut self.port, &mut buf)?;
        buf.truncate(got);
        Ok(buf)
    }
}
