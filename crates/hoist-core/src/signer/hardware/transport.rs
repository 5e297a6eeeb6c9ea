//! Device transports and scoped sessions.

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::apdu::{ApduCommand, ApduResponse};
use crate::error::{Error, Result};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Largest response payload a device may announce, status word excluded.
pub const MAX_RESPONSE_LEN: usize = 1024;

/// An open channel to a signing device.
#[async_trait]
pub trait DeviceTransport: Send {
    /// Send one framed APDU and return the raw response (data + status word).
    async fn exchange(&mut self, apdu: &[u8]) -> Result<Vec<u8>>;

    /// Give the device back. Called exactly once, from [`DeviceSession`]'s drop.
    fn release(&mut self);
}

/// Opens exclusive transports to a device.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn DeviceTransport>>;

    /// Human-readable location, for logs and error messages.
    fn describe(&self) -> String;
}

/// Scoped device acquisition. The transport is released when the session
/// drops, including early returns, errors and cancelled futures.
pub struct DeviceSession {
    transport: Option<Box<dyn DeviceTransport>>,
    timeout: Duration,
}

impl DeviceSession {
    pub async fn open(connector: &dyn DeviceConnector, timeout: Duration) -> Result<Self> {
        let transport = match tokio::time::timeout(timeout, connector.connect()).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout(timeout)),
        };
        tracing::debug!(device = %connector.describe(), "device session opened");
        Ok(Self {
            transport: Some(transport),
            timeout,
        })
    }

    /// Exchange one command, bounded by the session timeout.
    pub async fn exchange(&mut self, command: &ApduCommand) -> Result<Vec<u8>> {
        let transport = self
            .transport
            .as_mut()
            .ok_or_else(|| Error::DeviceUnavailable("session already released".to_string()))?;

        tracing::debug!(ins = command.ins, p1 = command.p1, p2 = command.p2, "apdu exchange");
        let raw = match tokio::time::timeout(self.timeout, transport.exchange(&command.to_bytes())).await {
            Ok(result) => result?,
            Err(_) => return Err(Error::Timeout(self.timeout)),
        };
        ApduResponse::parse(&raw)?.into_result()
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.release();
            tracing::debug!("device session released");
        }
    }
}

/// APDU over TCP, as exposed by device emulators and HID bridges.
///
/// Frames: request `len:u32be || apdu`; response `len:u32be || data || sw`,
/// where `len` counts `data` only.
#[derive(Debug, Clone)]
pub struct TcpDeviceConnector {
    address: String,
}

impl TcpDeviceConnector {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

#[async_trait]
impl DeviceConnector for TcpDeviceConnector {
    async fn connect(&self) -> Result<Box<dyn DeviceTransport>> {
        let stream = tokio::time::timeout(CONNECT_TIMEOUT, TcpStream::connect(&self.address))
            .await
            .map_err(|_| Error::DeviceUnavailable(format!("connect to {} timed out", self.address)))?
            .map_err(|e| Error::DeviceUnavailable(format!("{}: {}", self.address, e)))?;
        stream
            .set_nodelay(true)
            .map_err(|e| Error::DeviceUnavailable(format!("{}: {}", self.address, e)))?;
        Ok(Box::new(TcpTransport {
            address: self.address.clone(),
            stream: Some(stream),
        }))
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.address)
    }
}

struct TcpTransport {
    address: String,
    stream: Option<TcpStream>,
}

/// Write one request frame and read back its response frame.
async fn round_trip(stream: &mut TcpStream, apdu: &[u8]) -> io::Result<Vec<u8>> {
    stream.write_all(&(apdu.len() as u32).to_be_bytes()).await?;
    stream.write_all(apdu).await?;
    stream.flush().await?;

    let mut len = [0u8; 4];
    stream.read_exact(&mut len).await?;
    let len = u32::from_be_bytes(len) as usize;
    if len > MAX_RESPONSE_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("response of {len} bytes exceeds {MAX_RESPONSE_LEN}"),
        ));
    }
    let mut response = vec![0u8; len + 2];
    stream.read_exact(&mut response).await?;
    Ok(response)
}

#[async_trait]
impl DeviceTransport for TcpTransport {
    async fn exchange(&mut self, apdu: &[u8]) -> Result<Vec<u8>> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(Error::DeviceUnavailable("transport closed".to_string()));
        };
        round_trip(stream, apdu)
            .await
            .map_err(|e| Error::DeviceUnavailable(format!("{}: {}", self.address, e)))
    }

    fn release(&mut self) {
        // Dropping the stream closes the socket.
        self.stream = None;
    }
}
