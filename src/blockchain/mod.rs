// src/blockchain/mod.rs

pub mod client;
pub mod evm_client;
pub mod explorer;
pub mod models;
pub mod near;
pub mod networks;
pub mod nonce_manager;
pub mod services;

pub use client::{ClientCache, SigningClient, SigningClientFactory};
pub use explorer::{ExplorerApi, ExplorerClient};

// Re-export commonly used types
pub use ethers_core::types::{Address, H256, U256};
