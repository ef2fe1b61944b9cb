//! Network registry - static chain metadata keyed by chain id
//!
//! The table is populated once on first access and never mutated. Lookups
//! for unknown ids never fail: `resolve` synthesizes a descriptor so the
//! session always has a name and symbol to label its balance with.
//!
//! | Chain | Id | Symbol |
//! |-------|----|--------|
//! | Ethereum Mainnet | 1 | ETH |
//! | Sepolia Testnet | 11155111 | SepoliaETH |
//! | Goerli Testnet | 5 | GoerliETH |
//! | Polygon Mainnet | 137 | MATIC |
//! | Mumbai Testnet | 80001 | MATIC |
//! | BSC Mainnet | 56 | BNB |
//! | BSC Testnet | 97 | tBNB |
//! | Arbitrum One | 42161 | ETH |
//! | Arbitrum Sepolia | 421614 | ETH |

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::core::rpc::NATIVE_DECIMALS;

pub const DEFAULT_SYMBOL: &str = "ETH";
pub const DEFAULT_EXPLORER: &str = "https://etherscan.io";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("invalid chain id '{0}'")]
    InvalidChainId(String),
}

/// Chain identifier. Accepts decimal ("137") and hex ("0x89") text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub fn hex(&self) -> String { format!("0x{:x}", self.0) }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self { Self(id) }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for ChainId {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => raw.parse::<u64>(),
        };
        parsed.map(ChainId).map_err(|_| NetworkError::InvalidChainId(s.to_string()))
    }
}

/// Immutable chain metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainDescriptor {
    pub id: ChainId,
    pub display_name: String,
    pub native_symbol: String,
    pub rpc_endpoints: Vec<String>,
    pub explorer_base_url: String,
}

impl ChainDescriptor {
    pub fn hex_id(&self) -> String { self.id.hex() }

    /// Payload for `wallet_addEthereumChain`.
    pub fn add_chain_params(&self) -> AddChainParams {
        AddChainParams {
            chain_id: self.hex_id(),
            chain_name: self.display_name.clone(),
            native_currency: NativeCurrency {
                name: self.native_symbol.clone(),
                symbol: self.native_symbol.clone(),
                decimals: NATIVE_DECIMALS,
            },
            rpc_urls: self.rpc_endpoints.clone(),
            block_explorer_urls: vec![self.explorer_base_url.clone()],
        }
    }

    pub fn explorer_tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_base_url.trim_end_matches('/'), hash)
    }

    pub fn explorer_address_url(&self, address: &str) -> String {
        format!("{}/address/{}", self.explorer_base_url.trim_end_matches('/'), address)
    }

    fn synthesized(id: ChainId) -> Self {
        Self {
            id,
            display_name: format!("Chain #{}", id),
            native_symbol: DEFAULT_SYMBOL.into(),
            rpc_endpoints: Vec::new(),
            explorer_base_url: DEFAULT_EXPLORER.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

struct KnownChain {
    id: u64,
    name: &'static str,
    symbol: &'static str,
    rpc: &'static [&'static str],
    explorer: &'static str,
}

const KNOWN_CHAINS: &[KnownChain] = &[
    KnownChain { id: 1, name: "Ethereum Mainnet", symbol: "ETH", rpc: &["https://mainnet.infura.io/v3/"], explorer: "https://etherscan.io" },
    KnownChain { id: 11155111, name: "Sepolia Testnet", symbol: "SepoliaETH", rpc: &["https://sepolia.infura.io/v3/"], explorer: "https://sepolia.etherscan.io" },
    KnownChain { id: 5, name: "Goerli Testnet", symbol: "GoerliETH", rpc: &["https://goerli.infura.io/v3/"], explorer: "https://goerli.etherscan.io" },
    KnownChain { id: 137, name: "Polygon Mainnet", symbol: "MATIC", rpc: &["https://polygon-rpc.com"], explorer: "https://polygonscan.com" },
    KnownChain { id: 80001, name: "Mumbai Testnet", symbol: "MATIC", rpc: &["https://rpc-mumbai.maticvigil.com"], explorer: "https://mumbai.polygonscan.com" },
    KnownChain { id: 56, name: "BSC Mainnet", symbol: "BNB", rpc: &["https://bsc-dataseed.binance.org"], explorer: "https://bscscan.com" },
    KnownChain { id: 97, name: "BSC Testnet", symbol: "tBNB", rpc: &["https://data-seed-prebsc-1-s1.binance.org:8545"], explorer: "https://testnet.bscscan.com" },
    KnownChain { id: 42161, name: "Arbitrum One", symbol: "ETH", rpc: &["https://arb1.arbitrum.io/rpc"], explorer: "https://arbiscan.io" },
    KnownChain { id: 421614, name: "Arbitrum Sepolia", symbol: "ETH", rpc: &["https://sepolia-rollup.arbitrum.io/rpc"], explorer: "https://sepolia.arbiscan.io" },
];

static REGISTRY: Lazy<BTreeMap<ChainId, ChainDescriptor>> = Lazy::new(|| {
    KNOWN_CHAINS
        .iter()
        .map(|c| {
            let descriptor = ChainDescriptor {
                id: ChainId(c.id),
                display_name: c.name.into(),
                native_symbol: c.symbol.into(),
                rpc_endpoints: c.rpc.iter().map(|u| (*u).into()).collect(),
                explorer_base_url: c.explorer.into(),
            };
            (descriptor.id, descriptor)
        })
        .collect()
});

/// Registered descriptor for `id`, if the table knows it.
pub fn lookup(id: ChainId) -> Option<&'static ChainDescriptor> { REGISTRY.get(&id) }

/// Registered descriptor for `id`, or a synthesized one for unknown chains.
pub fn resolve(id: ChainId) -> ChainDescriptor {
    lookup(id).cloned().unwrap_or_else(|| ChainDescriptor::synthesized(id))
}

pub fn is_known(id: ChainId) -> bool { REGISTRY.contains_key(&id) }

/// All registered chains, ordered by id.
pub fn all() -> impl Iterator<Item = &'static ChainDescriptor> { REGISTRY.values() }

pub fn native_symbol(id: ChainId) -> String {
    lookup(id).map(|c| c.native_symbol.clone()).unwrap_or_else(|| DEFAULT_SYMBOL.into())
}
