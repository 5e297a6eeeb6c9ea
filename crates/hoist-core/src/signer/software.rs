//! In-process ed25519 signer.

use std::fmt;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::{SigningKey, Signer as _};
use zeroize::Zeroizing;

use super::{PublicKey, Signature, SignatureScheme, Signer, signing_digest};
use crate::error::{Error, Result};
use crate::ledger::Network;
use crate::types::Identity;

const SEED_LENGTH: usize = 32;

/// Holds an ed25519 secret key in memory. Signing is synchronous and local.
pub struct SoftwareSigner {
    key: SigningKey,
    public_key: PublicKey,
    network: Network,
}

impl SoftwareSigner {
    pub fn from_seed(seed: [u8; SEED_LENGTH], network: Network) -> Self {
        let seed = Zeroizing::new(seed);
        let key = SigningKey::from_bytes(&seed);
        let public_key = PublicKey::ed25519(key.verifying_key().to_bytes());
        Self {
            key,
            public_key,
            network,
        }
    }

    /// Decode secret key text as exported by common wallets.
    ///
    /// Accepts base64 or `0x`-hex of:
    /// - a 32-byte seed,
    /// - a 33-byte `flag || seed` keystore entry,
    /// - a 64-byte `seed || public key` pair (the public half must match).
    pub fn from_encoded(text: &str, network: Network) -> Result<Self> {
        let raw = Zeroizing::new(decode_key_text(text)?);

        let seed_slice = match raw.len() {
            SEED_LENGTH => &raw[..],
            33 => {
                SignatureScheme::from_flag(raw[0])?;
                &raw[1..]
            }
            64 => &raw[..SEED_LENGTH],
            other => {
                return Err(Error::InvalidKey(format!(
                    "expected 32, 33 or 64 key bytes, got {other}"
                )));
            }
        };

        let mut seed = Zeroizing::new([0u8; SEED_LENGTH]);
        seed.copy_from_slice(seed_slice);
        let signer = Self::from_seed(*seed, network);

        if raw.len() == 64 && raw[SEED_LENGTH..] != signer.public_key.as_bytes()[..] {
            return Err(Error::InvalidKey(
                "public half does not match the secret key".to_string(),
            ));
        }

        Ok(signer)
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn public_key_sync(&self) -> PublicKey {
        self.public_key
    }
}

fn decode_key_text(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    if let Some(hex_digits) = text.strip_prefix("0x") {
        return hex::decode(hex_digits).map_err(|e| Error::InvalidKey(format!("invalid hex: {e}")));
    }
    BASE64
        .decode(text)
        .map_err(|e| Error::InvalidKey(format!("invalid base64: {e}")))
}

impl fmt::Debug for SoftwareSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoftwareSigner")
            .field("identity", &self.public_key.to_identity())
            .field("network", &self.network)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Signer for SoftwareSigner {
    async fn identity(&self) -> Result<Identity> {
        Ok(self.public_key.to_identity())
    }

    async fn public_key(&self) -> Result<PublicKey> {
        Ok(self.public_key)
    }

    async fn sign(&self, message: &[u8]) -> Result<Signature> {
        let signature = self.key.sign(&signing_digest(message));
        Signature::new(&signature.to_bytes(), self.public_key)
    }
}
