// src/lib.rs

use std::sync::Arc;

pub use ethers_core::types::{Address, H256, U256};

pub mod actions;
pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod mcp;
pub mod utils;

use actions::ActionRegistry;
use config::{Config, SettingsProvider};

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Process configuration
    pub config: Config,
    /// Every action the host can call
    pub registry: Arc<ActionRegistry>,
    /// Where actions read their operational settings on each call
    pub settings: Arc<dyn SettingsProvider>,
}

impl AppState {
    pub fn new(config: Config, registry: ActionRegistry, settings: Arc<dyn SettingsProvider>) -> Self {
        Self {
            config,
            registry: Arc::new(registry),
            settings,
        }
    }
}
