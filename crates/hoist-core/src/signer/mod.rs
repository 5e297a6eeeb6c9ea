//! Signing backends.
//!
//! Every backend implements [`Signer`]: an identity, the public key that
//! identity derives from, and signatures over arbitrary bytes. Backends share
//! no state; which one to construct is decided by configuration
//! (see [`SignerKind`] and `config::SignerConfig`).
//!
//! ## Signing convention
//!
//! `sign(message)` produces an ed25519 signature over
//! `blake2b-256(message)`. The software signer hashes locally; the hardware
//! device receives the full message so the user can review it, and hashes
//! on the device.

pub mod hardware;
pub mod software;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use ed25519_dalek::Verifier;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{ADDRESS_LENGTH, Address, Identity};

pub use hardware::{DerivationPath, HardwareSigner};
pub use software::SoftwareSigner;

pub const ED25519_PUBLIC_KEY_LENGTH: usize = 32;
pub const ED25519_SIGNATURE_LENGTH: usize = 64;

/// Capability set shared by all signing backends.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Ledger address of this signer. Stable for the lifetime of the key.
    async fn identity(&self) -> Result<Identity>;

    /// Public key; `public_key().to_identity() == identity()`.
    async fn public_key(&self) -> Result<PublicKey>;

    /// Sign `message` without retaining or modifying it.
    async fn sign(&self, message: &[u8]) -> Result<Signature>;
}

/// Which backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignerKind {
    /// Key material held in process memory.
    Software,
    /// Key held on an external device, reached over an APDU transport.
    Hardware,
}

impl FromStr for SignerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "software" | "local" => Ok(Self::Software),
            "hardware" | "ledger" | "hd" => Ok(Self::Hardware),
            other => anyhow::bail!("Unknown signer kind: {} (expected software or hardware)", other),
        }
    }
}

impl fmt::Display for SignerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Software => f.write_str("software"),
            Self::Hardware => f.write_str("hardware"),
        }
    }
}

/// Signature scheme; the flag byte prefixes serialized signatures and is
/// hashed into the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureScheme {
    Ed25519,
}

impl SignatureScheme {
    pub fn flag(self) -> u8 {
        match self {
            Self::Ed25519 => 0x00,
        }
    }

    pub fn from_flag(flag: u8) -> Result<Self> {
        match flag {
            0x00 => Ok(Self::Ed25519),
            other => Err(Error::InvalidKey(format!(
                "unsupported signature scheme flag 0x{other:02x}"
            ))),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    scheme: SignatureScheme,
    bytes: [u8; ED25519_PUBLIC_KEY_LENGTH],
}

impl PublicKey {
    pub fn ed25519(bytes: [u8; ED25519_PUBLIC_KEY_LENGTH]) -> Self {
        Self {
            scheme: SignatureScheme::Ed25519,
            bytes,
        }
    }

    pub fn from_slice(scheme: SignatureScheme, bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; ED25519_PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|_| {
            Error::InvalidKey(format!(
                "public key must be {} bytes, got {}",
                ED25519_PUBLIC_KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self { scheme, bytes })
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    pub fn as_bytes(&self) -> &[u8; ED25519_PUBLIC_KEY_LENGTH] {
        &self.bytes
    }

    /// `blake2b-256(flag || public key)`.
    pub fn to_identity(&self) -> Identity {
        let mut state = blake2b_simd::Params::new()
            .hash_length(ADDRESS_LENGTH)
            .to_state();
        state.update(&[self.scheme.flag()]);
        state.update(&self.bytes);
        let hash = state.finalize();
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(hash.as_bytes());
        Address::new(bytes)
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.bytes)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({:?}, {})", self.scheme, self.to_base64())
    }
}

/// A signature together with the key that produced it.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    scheme: SignatureScheme,
    bytes: [u8; ED25519_SIGNATURE_LENGTH],
    public_key: PublicKey,
}

impl Signature {
    pub fn new(bytes: &[u8], public_key: PublicKey) -> Result<Self> {
        let bytes: [u8; ED25519_SIGNATURE_LENGTH] = bytes.try_into().map_err(|_| {
            Error::InvalidKey(format!(
                "signature must be {} bytes, got {}",
                ED25519_SIGNATURE_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self {
            scheme: public_key.scheme(),
            bytes,
            public_key,
        })
    }

    pub fn scheme(&self) -> SignatureScheme {
        self.scheme
    }

    pub fn signature_bytes(&self) -> &[u8; ED25519_SIGNATURE_LENGTH] {
        &self.bytes
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Wire form: `flag || signature || public key`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + ED25519_SIGNATURE_LENGTH + ED25519_PUBLIC_KEY_LENGTH);
        out.push(self.scheme.flag());
        out.extend_from_slice(&self.bytes);
        out.extend_from_slice(self.public_key.as_bytes());
        out
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    /// Check this signature covers `message` and was made by `identity`.
    pub fn verify(&self, message: &[u8], identity: &Identity) -> Result<()> {
        if self.public_key.to_identity() != *identity {
            return Err(Error::SignatureMismatch(identity.to_string()));
        }
        let key = ed25519_dalek::VerifyingKey::from_bytes(self.public_key.as_bytes())
            .map_err(|e| Error::InvalidKey(e.to_string()))?;
        let signature = ed25519_dalek::Signature::from_bytes(&self.bytes);
        key.verify(&signing_digest(message), &signature)
            .map_err(|_| Error::SignatureMismatch(identity.to_string()))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("scheme", &self.scheme)
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// The value actually covered by an ed25519 signature.
pub fn signing_digest(message: &[u8]) -> [u8; 32] {
    let hash = blake2b_simd::Params::new().hash_length(32).hash(message);
    let mut digest = [0u8; 32];
    digest.copy_from_slice(hash.as_bytes());
    digest
}
