//! Hardware-device signer.
//!
//! The signer only knows a derivation path. Every operation opens a
//! [`DeviceSession`], talks to the device application over APDUs and drops
//! the session before returning, so the device is released on success,
//! error, timeout and cancellation alike.
//!
//! Two signer instances must not drive the same device concurrently; callers
//! serialize their use.

pub mod apdu;
mod path;
pub mod transport;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use path::{DEFAULT_DERIVATION_PATH, DerivationPath};
pub use transport::{DeviceConnector, DeviceSession, DeviceTransport, TcpDeviceConnector};

use super::{PublicKey, Signature, SignatureScheme, Signer};
use crate::error::{Error, Result};
use crate::ledger::Network;
use crate::types::Identity;

/// Default time allowed for a single device round trip, including the
/// user's review on the device screen.
pub const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(60);

pub struct HardwareSigner {
    connector: Arc<dyn DeviceConnector>,
    path: DerivationPath,
    timeout: Duration,
    network: Network,
}

impl HardwareSigner {
    pub fn new(
        connector: Arc<dyn DeviceConnector>,
        path: DerivationPath,
        timeout: Duration,
        network: Network,
    ) -> Self {
        Self {
            connector,
            path,
            timeout,
            network,
        }
    }

    pub fn path(&self) -> &DerivationPath {
        &self.path
    }

    pub fn network(&self) -> Network {
        self.network
    }

    async fn open_session(&self) -> Result<DeviceSession> {
        DeviceSession::open(self.connector.as_ref(), self.timeout).await
    }

    async fn read_public_key(&self, session: &mut DeviceSession) -> Result<PublicKey> {
        let mut response = Vec::new();
        for command in apdu::chunked(apdu::INS_GET_PUBLIC_KEY, &self.path.to_bytes()) {
            response = session.exchange(&command).await?;
        }

        let (len, rest) = response
            .split_first()
            .ok_or_else(|| Error::InvalidKey("device returned an empty public key".to_string()))?;
        let key = rest.get(..*len as usize).ok_or_else(|| {
            Error::InvalidKey(format!(
                "device public key truncated: expected {len} bytes, got {}",
                rest.len()
            ))
        })?;
        PublicKey::from_slice(SignatureScheme::Ed25519, key)
    }
}

impl fmt::Debug for HardwareSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HardwareSigner")
            .field("device", &self.connector.describe())
            .field("path", &self.path)
            .field("timeout", &self.timeout)
            .field("network", &self.network)
            .finish()
    }
}

#[async_trait]
impl Signer for HardwareSigner {
    async fn identity(&self) -> Result<Identity> {
        Ok(self.public_key().await?.to_identity())
    }

    async fn public_key(&self) -> Result<PublicKey> {
        let mut session = self.open_session().await?;
        let key = self.read_public_key(&mut session).await?;
        tracing::debug!(identity = %key.to_identity(), path = %self.path, "read device public key");
        Ok(key)
    }

    async fn sign(&self, message: &[u8]) -> Result<Signature> {
        let mut session = self.open_session().await?;
        let public_key = self.read_public_key(&mut session).await?;

        let mut payload = self.path.to_bytes();
        payload.extend_from_slice(message);

        tracing::info!(bytes = message.len(), "waiting for confirmation on the signing device");
        let mut response = Vec::new();
        for command in apdu::chunked(apdu::INS_SIGN, &payload) {
            response = session.exchange(&command).await?;
        }
        drop(session);

        let signature = Signature::new(&response, public_key)?;
        signature.verify(message, &public_key.to_identity())?;
        Ok(signature)
    }
}
