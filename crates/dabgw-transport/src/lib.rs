//! Transport link contracts for the DAB acknowledgment gateway.
//!
//! The acknowledgment core only depends on the byte-oriented `BusLink`
//! and `SocketFactory` contracts defined here. Real serial/I2C/SPI/TCP
//! backends and the in-memory test links live alongside them.

pub mod link;
pub mod mem;
pub mod serial;
pub mod tcp;

#[cfg(target_os = "linux")]
pub mod i2c;
#[cfg(target_os = "linux")]
pub mod spi;

pub use link::{BusLink, LinkError, SocketConn, SocketFactory};
