use log::info;
use spidev::{SpiModeFlags, Spidev, SpidevOptions, SpidevTransfer};

use crate::BusTransport;
use crate::config::{BusConfig, SpiMode};
use crate::error::{Error, Result};

/// Linux `spidev` transport
///
/// The LED data line is driven from MOSI.
pub struct SpidevTransport {
    device: Spidev,
}

impl SpidevTransport {
    /// Open and configure the bus device
    pub fn open(config: &BusConfig) -> Result<Self> {
        let mut device = Spidev::open(&config.device).map_err(|source| Error::BusOpen {
            path: config.device.clone(),
            source,
        })?;

        let options = SpidevOptions::new()
            .bits_per_word(config.word_bits)
            .max_speed_hz(config.clock_hz)
            .mode(mode_flags(config.mode))
            .build();
        device
            .configure(&options)
            .map_err(|source| Error::BusConfigure {
                path: config.device.clone(),
                source,
            })?;

        info!(
            "opened {} at {} Hz, {}-bit words, {:?}",
            config.device, config.clock_hz, config.word_bits, config.mode
        );
        Ok(Self { device })
    }
}

impl BusTransport for SpidevTransport {
    fn transfer(&mut self, bytes: &[u8]) -> Result<usize> {
        let mut transfer = SpidevTransfer::write(bytes);
        self.device
            .transfer(&mut transfer)
            .map_err(|source| Error::Transfer { source })?;
        Ok(bytes.len())
    }
}

const fn mode_flags(mode: SpiMode) -> SpiModeFlags {
    match mode {
        SpiMode::Mode0 => SpiModeFlags::SPI_MODE_0,
        SpiMode::Mode1 => SpiModeFlags::SPI_MODE_1,
        SpiMode::Mode2 => SpiModeFlags::SPI_MODE_2,
        SpiMode::Mode3 => SpiModeFlags::SPI_MODE_3,
    }
}
