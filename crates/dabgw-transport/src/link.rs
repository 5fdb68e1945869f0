use thiserror::Error;

/// Transport-level fault surfaced by a link operation.
///
/// These are expected operational events; callers convert them into a
/// failed-attempt outcome rather than propagating them upward.
#[derive(Debug, Error)]
pub enum LinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Backend-library fault (serial/bus drivers with non-io errors).
    #[error("backend fault: {0}")]
    Backend(String),
    /// Contract violation on an otherwise healthy link.
    #[error("link fault: {0}")]
    Fault(&'static str),
    #[error("short read: wanted {wanted} bytes, got {got}")]
    ShortRead { wanted: usize, got: usize },
}

/// Half-duplex byte link (serial, I2C, SPI).
///
/// Within one transaction the write must complete before a read is
/// attempted; implementations are not required to support interleaving.
pub trait BusLink: Send {
    /// Writes one payload onto the link.
    fn write(&mut self, bytes: &[u8]) -> Result<(), LinkError>;
    /// Reads up to `len` reply bytes; an empty result means no reply.
    fn read(&mut self, len: usize) -> Result<Vec<u8>, LinkError>;
}

/// One scoped connection produced by a [`SocketFactory`].
///
/// Dropping the connection releases the underlying socket; callers rely
/// on this to hold on every exit path.
pub trait SocketConn {
    /// Writes the whole buffer.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError>;
    /// Reads exactly `len` bytes.
    fn read_exact(&mut self, len: usize) -> Result<Vec<u8>, LinkError>;
}

/// Connection-oriented endpoint used by the Ethernet strategy.
pub trait SocketFactory: Send {
    /// Opens a fresh connection for one exchange.
    fn connect(&mut self) -> Result<Box<dyn SocketConn>, LinkError>;
}
