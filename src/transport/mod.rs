//! Bus transport implementations.

#[cfg(feature = "spidev")]
mod spidev;

#[cfg(feature = "spidev")]
pub use self::spidev::SpidevTransport;

use crate::BusTransport;
use crate::error::Result;

/// Transport that accepts every transfer without touching hardware
///
/// Used for dry runs on machines without an SPI device.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTransport {
    transfers: u64,
    bytes: u64,
}

impl NullTransport {
    pub const fn new() -> Self {
        Self {
            transfers: 0,
            bytes: 0,
        }
    }

    pub const fn transfers(&self) -> u64 {
        self.transfers
    }

    pub const fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl BusTransport for NullTransport {
    fn transfer(&mut self, bytes: &[u8]) -> Result<usize> {
        self.transfers += 1;
        self.bytes += bytes.len() as u64;
        Ok(bytes.len())
    }
}

impl<T: BusTransport + ?Sized> BusTransport for Box<T> {
    fn transfer(&mut self, bytes: &[u8]) -> Result<usize> {
        (**self).transfer(bytes)
    }
}
