use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr, TcpStream};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Error, Debug)]
pub enum Esp32Error {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Device not connected")]
    NotConnected,
}

pub type Result<T> = std::result::Result<T, Esp32Error>;

/// Sensor hub reachable over a plain TCP stream. It pushes comma-separated
/// readings and never expects anything back.
pub struct Esp32 {
    connection: Option<TcpStream>,
    address: String,
    port: u16,
}

/// Second handle on the device socket. Shutting it down wakes a blocked
/// `receive` on the owning `Esp32`.
pub struct ShutdownHandle {
    stream: TcpStream,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            debug!("Socket shutdown after interrupt failed: {}", e);
        }
    }
}

impl Esp32 {
    pub fn new(ip_address: &str, port: u16) -> Self {
        info!("Initializing ESP32 with address: {}:{}", ip_address, port);
        Esp32 {
            connection: None,
            address: ip_address.to_string(),
            port,
        }
    }

    /// Opens the stream. No timeouts are set: a silent device blocks the
    /// reader indefinitely.
    pub fn connect(&mut self) -> Result<()> {
        let socket_addr = format!("{}:{}", self.address, self.port);
        info!("Attempting to connect to ESP32 at {}", socket_addr);

        let socket_addr: SocketAddr = socket_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| Esp32Error::ParseError(e.to_string()))?;

        let stream = TcpStream::connect(socket_addr).map_err(|e| {
            error!("Failed to connect to ESP32 at {}: {}", socket_addr, e);
            e
        })?;

        self.connection = Some(stream);
        info!("ESP32 connected successfully at {}", socket_addr);
        Ok(())
    }

    /// Reads whatever the transport delivers in one call. `Ok(0)` is passed
    /// through untouched; callers decide what an empty read means.
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        if let Some(stream) = &mut self.connection {
            let n = stream.read(buf)?;
            debug!("Received {} bytes from ESP32", n);
            Ok(n)
        } else {
            error!("Attempted to read from ESP32 but device is not connected");
            Err(Esp32Error::NotConnected)
        }
    }

    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        match &self.connection {
            Some(stream) => Ok(ShutdownHandle {
                stream: stream.try_clone()?,
            }),
            None => Err(Esp32Error::NotConnected),
        }
    }
}

impl Read for Esp32 {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.receive(buf) {
            Ok(n) => Ok(n),
            Err(Esp32Error::IoError(e)) => Err(e),
            Err(e @ Esp32Error::NotConnected) => {
                Err(io::Error::new(io::ErrorKind::NotConnected, e.to_string()))
            }
            Err(e) => Err(io::Error::other(e.to_string())),
        }
    }
}
