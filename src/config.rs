// src/config.rs

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::blockchain::networks::{self, ExplorerTarget};
use crate::error::{ActionError, ActionResult};

/// Names of the operational settings the actions read from the host.
pub mod settings {
    pub const NEOX_PRIVATE_KEY: &str = "NEOX_PRIVATE_KEY";
    pub const AIRDROP_TOKEN_ADDRESS: &str = "AIRDROP_TOKEN_ADDRESS";
    pub const AIRDROP_AMOUNT: &str = "AIRDROP_AMOUNT";
    pub const NEOX_RPC_URL: &str = "NEOX_RPC_URL";

    pub const NEAR_SEED_PHRASE: &str = "NEAR_SEED_PHRASE";
    pub const NEAR_ACCOUNT_ID: &str = "NEAR_ACCOUNT_ID";
    pub const NEAR_NETWORK_ID: &str = "NEAR_NETWORK_ID";
    pub const NEAR_NODE_URL: &str = "NEAR_NODE_URL";
    pub const NEAR_FT_WASM_PATH: &str = "NEAR_FT_WASM_PATH";
}

/// Read-only view of the host's settings store.
pub trait SettingsProvider: Send + Sync {
    fn get_setting(&self, name: &str) -> Option<String>;
}

/// Settings backed by the process environment. Every lookup hits the
/// environment again, so edits apply to the next invocation.
#[derive(Debug, Clone, Default)]
pub struct EnvSettings;

impl SettingsProvider for EnvSettings {
    fn get_setting(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

impl SettingsProvider for HashMap<String, String> {
    fn get_setting(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Settings resolved for one invocation, in the order they were requested.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSettings {
    values: Vec<(String, String)>,
}

impl ResolvedSettings {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn require(&self, name: &str) -> ActionResult<&str> {
        self.get(name)
            .ok_or_else(|| ActionError::ConfigMissing(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(key, _)| key.as_str())
    }
}

/// Reads `names` in order and stops at the first one that is absent or blank.
pub fn resolve(names: &[&str], source: &dyn SettingsProvider) -> ActionResult<ResolvedSettings> {
    let mut values = Vec::with_capacity(names.len());
    for name in names {
        match source.get_setting(name) {
            Some(value) if !value.trim().is_empty() => {
                values.push((name.to_string(), value.trim().to_string()));
            }
            _ => return Err(ActionError::ConfigMissing(name.to_string())),
        }
    }
    Ok(ResolvedSettings { values })
}

/// Optional setting lookup; blank values count as absent.
pub fn optional(source: &dyn SettingsProvider, name: &str) -> Option<String> {
    source
        .get_setting(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// Process-level configuration, loaded once at startup from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    // Server settings
    pub port: u16,
    pub mcp_mode: bool,

    /// Upper bound on every outbound RPC / explorer request
    pub request_timeout: Duration,

    /// Explorer the query actions are bound to
    pub explorer: ExplorerTarget,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            mcp_mode: false,
            request_timeout: Duration::from_secs(30),
            explorer: networks::rootstock_explorer(),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load variables from the .env file into the environment
        dotenvy::dotenv().ok();

        let timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse::<u64>()
            .context("REQUEST_TIMEOUT_SECS must be a valid number of seconds")?;

        let mut explorer = match env::var("EXPLORER_NETWORK").ok().as_deref() {
            None | Some("") | Some("rootstock") => networks::rootstock_explorer(),
            Some("mode") => networks::mode_explorer(),
            Some(other) => anyhow::bail!("EXPLORER_NETWORK '{}' is not supported (rootstock, mode)", other),
        };
        if let Ok(url) = env::var("EXPLORER_API_URL") {
            if !url.trim().is_empty() {
                url::Url::parse(url.trim()).context("EXPLORER_API_URL must be a valid URL")?;
                explorer.api_base_url = url.trim().trim_end_matches('/').to_string();
            }
        }

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            mcp_mode: env::var("MCP_MODE").is_ok(),
            request_timeout: Duration::from_secs(timeout_secs),
            explorer,
        })
    }

    /// Shared HTTP client carrying the request timeout.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()
            .context("Failed to build HTTP client")
    }
}
