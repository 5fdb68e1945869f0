use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::link::{LinkError, SocketConn, SocketFactory};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP endpoint opening one scoped connection per exchange.
#[derive(Debug, Clone)]
pub struct TcpEndpoint {
    pub addr: String,
    pub port: u16,
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl TcpEndpoint {
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        Self {
            addr: addr.into(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }
}

impl SocketFactory for TcpEndpoint {
    fn connect(&mut self) -> Result<Box<dyn SocketConn>, LinkError> {
        let target = (self.addr.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or(LinkError::Fault("address did not resolve"))?;
        let stream = TcpStream::connect_timeout(&target, self.connect_timeout)?;
        stream.set_read_timeout(Some(self.io_timeout))?;
        stream.set_write_timeout(Some(self.io_timeout))?;
        Ok(Box::new(TcpConn { stream }))
    }
}

struct TcpConn {
    stream: TcpStream,
}

impl SocketConn for TcpConn {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        Ok(self.stream.write_all(bytes)?)
    }

    fn read_exact(&mut self, len: usize) -> Result<Vec<u8>, LinkError> {
        let mut buf = vec![0_u8; len];
        self.stream.read_exact(&mut buf)?;
        Ok(buf)
    }
}
