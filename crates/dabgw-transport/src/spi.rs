use std::io::{Read, Write};

use spidev::{SpiModeFlags, Spidev, SpidevOptions};

use crate::link::{BusLink, LinkError};

const SPI_SPEED_HZ: u32 = 500_000;

/// SPI link to a bus companion board.
pub struct SpiLink {
    dev: Spidev,
}

impl SpiLink {
    /// Opens `/dev/spidev<bus>.<chip_select>` in mode 0.
    pub fn open(bus: u8, chip_select: u8) -> Result<Self, LinkError> {
        let mut dev = Spidev::open(format!("/dev/spidev{bus}.{chip_select}"))?;
        let options = SpidevOptions::new()
            .bits_per_word(8)
            .max_speed_hz(SPI_SPEED_HZ)
            .mode(SpiModeFlags::SPI_MODE_0)
            .build();
        dev.configure(&options)?;
        Ok(Self { dev })
    }
}

impl BusLink for SpiLink {
    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.dev.write_all(bytes)?;
        Ok(())
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>, LinkError> {
        let mut buf = vec![0_u8; len];
        let got = self.dev.read(&mut buf)?;
        buf.truncate(got);
        Ok(buf)
    }
}
