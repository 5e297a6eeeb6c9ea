//! Named ledger environments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Devnet,
    Testnet,
    Mainnet,
}

impl Network {
    pub const ALL: [Network; 3] = [Network::Devnet, Network::Testnet, Network::Mainnet];

    pub fn default_rpc_url(self) -> &'static str {
        match self {
            Self::Devnet => "https://fullnode.devnet.sui.io:443",
            Self::Testnet => "https://fullnode.testnet.sui.io:443",
            Self::Mainnet => "https://fullnode.mainnet.sui.io:443",
        }
    }

    /// Environments where assets carry real value.
    pub fn is_production(self) -> bool {
        matches!(self, Self::Mainnet)
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "devnet" => Ok(Self::Devnet),
            "testnet" => Ok(Self::Testnet),
            "mainnet" => Ok(Self::Mainnet),
            other => anyhow::bail!(
                "Unknown network: {} (expected devnet, testnet or mainnet)",
                other
            ),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
            Self::Mainnet => "mainnet",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_devnet() {
        assert_eq!(Network::default(), Network::Devnet);
    }

    #[test]
    fn each_network_has_distinct_endpoint() {
        let mut urls: Vec<_> = Network::ALL.iter().map(|n| n.default_rpc_url()).collect();
        urls.dedup();
        assert_eq!(urls.len(), 3);
    }

    #[test]
    fn parse_and_display_agree() {
        for network in Network::ALL {
            assert_eq!(network.to_string().parse::<Network>().unwrap(), network);
        }
        assert!("localnet".parse::<Network>().is_err());
    }
}
