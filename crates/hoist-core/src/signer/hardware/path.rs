//! BIP-32 style derivation paths.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const HARDENED: u32 = 0x8000_0000;
const MAX_DEPTH: usize = 10;

/// Default account path for ed25519 keys on the ledger (coin type 784).
pub const DEFAULT_DERIVATION_PATH: &str = "44'/784'/0'/0'/0'";

/// Sequence of child indexes; hardened components carry the high bit.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DerivationPath(Vec<u32>);

impl DerivationPath {
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// Device wire form: component count, then each component big-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(1 + self.0.len() * 4);
        out.push(self.0.len() as u8);
        for component in &self.0 {
            out.extend_from_slice(&component.to_be_bytes());
        }
        out
    }
}

impl Default for DerivationPath {
    fn default() -> Self {
        Self(vec![
            44 | HARDENED,
            784 | HARDENED,
            HARDENED,
            HARDENED,
            HARDENED,
        ])
    }
}

impl FromStr for DerivationPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidKey(format!("derivation path '{s}': {reason}"));

        let body = s.trim().strip_prefix("m/").unwrap_or(s.trim());
        if body.is_empty() {
            return Err(invalid("empty path".to_string()));
        }

        let mut components = Vec::new();
        for part in body.split('/') {
            let (digits, hardened) = match part.strip_suffix('\'').or_else(|| part.strip_suffix('h')) {
                Some(digits) => (digits, true),
                None => (part, false),
            };
            let index: u32 = digits
                .parse()
                .map_err(|_| invalid(format!("invalid component '{part}'")))?;
            if index >= HARDENED {
                return Err(invalid(format!("component '{part}' out of range")));
            }
            components.push(if hardened { index | HARDENED } else { index });
        }

        if components.len() > MAX_DEPTH {
            return Err(invalid(format!("deeper than {MAX_DEPTH} levels")));
        }
        Ok(Self(components))
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .0
            .iter()
            .map(|c| {
                if c & HARDENED != 0 {
                    format!("{}'", c & !HARDENED)
                } else {
                    c.to_string()
                }
            })
            .collect();
        f.write_str(&rendered.join("/"))
    }
}

impl fmt::Debug for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivationPath({self})")
    }
}
