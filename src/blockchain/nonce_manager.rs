// src/blockchain/nonce_manager.rs

use dashmap::DashMap;
use ethers_core::types::{Address, U256};
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{ActionError, ActionResult, Stage};

// Hands out sequential nonces per sender so concurrent submissions from the
// same key never collide.
#[derive(Debug, Clone, Default)]
pub struct NonceManager {
    // One lock per sender; different senders proceed in parallel.
    nonces: Arc<DashMap<Address, Arc<Mutex<NonceState>>>>,
}

#[derive(Debug)]
struct NonceState {
    next_nonce: Option<U256>,
}

impl NonceManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, address: Address) -> Arc<Mutex<NonceState>> {
        self.nonces
            .entry(address)
            .or_insert_with(|| Arc::new(Mutex::new(NonceState { next_nonce: None })))
            .clone()
    }

    /// Returns the nonce to use now and reserves the following one.
    /// The first call for a sender reads `eth_getTransactionCount` (pending).
    pub async fn get_next_nonce(
        &self,
        client: &Client,
        address: Address,
        rpc_url: &str,
    ) -> ActionResult<U256> {
        let slot = self.slot(address);
        let mut state = slot.lock().await;

        let nonce_to_use = match state.next_nonce {
            Some(nonce) => nonce,
            None => {
                let payload = json!({
                    "jsonrpc": "2.0",
                    "method": "eth_getTransactionCount",
                    "params": [format!("{:?}", address), "pending"],
                    "id": 1
                });
                let resp: Value = client
                    .post(rpc_url)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| ActionError::from_http(Stage::Nonce, e))?
                    .json()
                    .await
                    .map_err(|e| ActionError::malformed(Stage::Nonce, e.to_string()))?;
                if let Some(err) = resp.get("error") {
                    return Err(ActionError::remote(Stage::Nonce, err));
                }
                let nonce_hex = resp["result"]
                    .as_str()
                    .ok_or_else(|| ActionError::malformed(Stage::Nonce, "missing 'result'"))?;
                U256::from_str_radix(nonce_hex.trim_start_matches("0x"), 16)
                    .map_err(|e| ActionError::malformed(Stage::Nonce, e.to_string()))?
            }
        };

        state.next_nonce = Some(nonce_to_use + U256::one());
        Ok(nonce_to_use)
    }

    /// Drops the cached nonce so the next call re-reads it from the node.
    /// Used after a submission fails and the reserved nonce was never spent.
    pub async fn reset(&self, address: Address) {
        let slot = self.slot(address);
        slot.lock().await.next_nonce = None;
    }
}
