// src/blockchain/networks.rs

use serde::Serialize;

/// Native currency of a chain, used to render base units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

impl NativeCurrency {
    fn new(name: &str, symbol: &str, decimals: u32) -> Self {
        Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
        }
    }
}

/// An EVM network a signing client can be bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkDescriptor {
    pub id: u64,
    pub name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
    pub explorer_url: String,
    pub testnet: bool,
}

impl NetworkDescriptor {
    /// First configured RPC endpoint.
    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_urls.first().map(String::as_str)
    }

    pub fn with_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_urls = vec![url.into()];
        self
    }

    pub fn tx_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), hash)
    }
}

/// NeoX TestNet T4, the network the airdrop action targets.
pub fn neox_testnet() -> NetworkDescriptor {
    NetworkDescriptor {
        id: 12227332,
        name: "NeoX TestNet T4".to_string(),
        rpc_urls: vec!["https://neoxt4seed1.ngd.network/".to_string()],
        native_currency: NativeCurrency::new("GAS", "GAS", 18),
        explorer_url: "https://xt4scan.ngd.network".to_string(),
        testnet: true,
    }
}

/// A Blockscout v2 API the query actions read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplorerTarget {
    pub name: String,
    pub api_base_url: String,
    pub native_currency: NativeCurrency,
}

pub fn rootstock_explorer() -> ExplorerTarget {
    ExplorerTarget {
        name: "Rootstock".to_string(),
        api_base_url: "https://rootstock.blockscout.com/api/v2".to_string(),
        native_currency: NativeCurrency::new("Rootstock Smart Bitcoin", "RBTC", 18),
    }
}

pub fn mode_explorer() -> ExplorerTarget {
    ExplorerTarget {
        name: "Mode".to_string(),
        api_base_url: "https://explorer.mode.network/api/v2".to_string(),
        native_currency: NativeCurrency::new("Ether", "ETH", 18),
    }
}

/// A NEAR network target for deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NearNetwork {
    pub network_id: String,
    pub node_url: String,
}

impl NearNetwork {
    /// Defaults the node URL to the public RPC of `network_id`.
    pub fn new(network_id: &str, node_url: Option<String>) -> Self {
        let node_url = node_url.unwrap_or_else(|| format!("https://rpc.{}.near.org", network_id));
        Self {
            network_id: network_id.to_string(),
            node_url,
        }
    }
}

/// NEAR fungible tokens use 24 decimals (yocto).
pub const NEAR_TOKEN_DECIMALS: u32 = 24;
