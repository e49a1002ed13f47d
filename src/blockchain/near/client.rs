// src/blockchain/near/client.rs

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::keys::NearKeyPair;
use super::transaction::{NearAction, NearTransaction};
use crate::blockchain::networks::NearNetwork;
use crate::error::{ActionError, ActionResult, Stage};

/// Account-level operations a token deployment needs.
#[async_trait]
pub trait NearAccountClient: Send + Sync {
    /// The account that signs and pays.
    fn account_id(&self) -> &str;

    async fn account_exists(&self, account_id: &str) -> ActionResult<bool>;

    /// Creates `contract_id` as a sub-account funded with `deposit` yocto
    /// and deploys `code` to it. Returns the transaction hash.
    async fn deploy_contract(
        &self,
        contract_id: &str,
        code: Vec<u8>,
        deposit: u128,
    ) -> ActionResult<String>;

    async fn function_call(
        &self,
        contract_id: &str,
        method: &str,
        args: Value,
        gas: u64,
        deposit: u128,
    ) -> ActionResult<String>;
}

/// Builds account clients for a signing identity on a network.
pub trait NearClientFactory: Send + Sync {
    fn connect(
        &self,
        network: &NearNetwork,
        account_id: String,
        keys: NearKeyPair,
    ) -> ActionResult<Arc<dyn NearAccountClient>>;
}

/// Connects over NEAR JSON-RPC.
#[derive(Debug, Clone)]
pub struct NearRpcConnector {
    http: Client,
}

impl NearRpcConnector {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl NearClientFactory for NearRpcConnector {
    fn connect(
        &self,
        network: &NearNetwork,
        account_id: String,
        keys: NearKeyPair,
    ) -> ActionResult<Arc<dyn NearAccountClient>> {
        Ok(Arc::new(NearRpcClient::new(
            self.http.clone(),
            network.clone(),
            account_id,
            keys,
        )))
    }
}

#[derive(Debug, Deserialize)]
struct AccessKeyView {
    nonce: u64,
    block_hash: String,
}

pub struct NearRpcClient {
    http: Client,
    network: NearNetwork,
    account_id: String,
    keys: NearKeyPair,
    // Highest nonce this client has used; the node view can lag behind it.
    last_nonce: Mutex<u64>,
}

impl NearRpcClient {
    pub fn new(http: Client, network: NearNetwork, account_id: String, keys: NearKeyPair) -> Self {
        Self {
            http,
            network,
            account_id,
            keys,
            last_nonce: Mutex::new(0),
        }
    }

    /// One JSON-RPC call. The `error` member is returned as `Err(Ok(value))`
    /// so callers can inspect it; transport failures map to `Err(Err(_))`.
    async fn call(
        &self,
        stage: Stage,
        method: &str,
        params: Value,
    ) -> ActionResult<Result<Value, Value>> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": "dontcare",
            "method": method,
            "params": params,
        });
        let resp = self
            .http
            .post(&self.network.node_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ActionError::from_http(stage, e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ActionError::remote(stage, format!("HTTP {}: {}", status, body)));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| ActionError::malformed(stage, e.to_string()))?;
        if let Some(err) = body.get("error") {
            return Ok(Err(err.clone()));
        }
        body.get("result")
            .cloned()
            .map(Ok)
            .ok_or_else(|| ActionError::malformed(stage, "missing 'result'"))
    }

    async fn call_ok(&self, stage: Stage, method: &str, params: Value) -> ActionResult<Value> {
        self.call(stage, method, params)
            .await?
            .map_err(|err| ActionError::remote(stage, err))
    }

    async fn access_key(&self) -> ActionResult<AccessKeyView> {
        let result = self
            .call_ok(
                Stage::AccessKey,
                "query",
                json!({
                    "request_type": "view_access_key",
                    "finality": "optimistic",
                    "account_id": self.account_id,
                    "public_key": self.keys.public_key(),
                }),
            )
            .await?;
        // Query errors can come back inside the result.
        if let Some(err) = result.get("error") {
            return Err(ActionError::remote(Stage::AccessKey, err));
        }
        serde_json::from_value(result).map_err(|e| ActionError::malformed(Stage::AccessKey, e.to_string()))
    }

    /// Signs `actions` against `receiver_id` and waits for execution.
    async fn submit(
        &self,
        stage: Stage,
        receiver_id: &str,
        actions: Vec<NearAction>,
    ) -> ActionResult<String> {
        let mut last_nonce = self.last_nonce.lock().await;
        let view = self.access_key().await?;
        let nonce = view.nonce.max(*last_nonce) + 1;

        let hash_bytes = bs58::decode(&view.block_hash)
            .into_vec()
            .map_err(|e| ActionError::malformed(Stage::AccessKey, e.to_string()))?;
        let block_hash: [u8; 32] = hash_bytes
            .try_into()
            .map_err(|_| ActionError::malformed(Stage::AccessKey, "block hash is not 32 bytes"))?;

        let tx = NearTransaction {
            signer_id: self.account_id.clone(),
            public_key: self.keys.public_key_bytes(),
            nonce,
            receiver_id: receiver_id.to_string(),
            block_hash,
            actions,
        };
        let (signed, local_hash) = tx.sign(&self.keys);
        *last_nonce = nonce;
        debug!("Broadcasting {} to {} with nonce {}", local_hash, receiver_id, nonce);

        let outcome = self
            .call_ok(stage, "broadcast_tx_commit", json!([BASE64.encode(signed)]))
            .await?;
        if let Some(failure) = outcome.get("status").and_then(|s| s.get("Failure")) {
            return Err(ActionError::remote(stage, format!("transaction {} failed: {}", local_hash, failure)));
        }
        Ok(outcome["transaction"]["hash"]
            .as_str()
            .map(str::to_string)
            .unwrap_or(local_hash))
    }
}

fn is_unknown_account(err: &Value) -> bool {
    if err["cause"]["name"].as_str() == Some("UNKNOWN_ACCOUNT") {
        return true;
    }
    // Older nodes only report it in the message text.
    let text = err.to_string();
    text.contains("does not exist")
}

#[async_trait]
impl NearAccountClient for NearRpcClient {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    async fn account_exists(&self, account_id: &str) -> ActionResult<bool> {
        let response = self
            .call(
                Stage::AccountLookup,
                "query",
                json!({
                    "request_type": "view_account",
                    "finality": "final",
                    "account_id": account_id,
                }),
            )
            .await?;
        match response {
            Ok(result) => match result.get("error") {
                Some(err) if is_unknown_account(err) => Ok(false),
                Some(err) => Err(ActionError::remote(Stage::AccountLookup, err)),
                None => Ok(true),
            },
            Err(err) if is_unknown_account(&err) => Ok(false),
            Err(err) => Err(ActionError::remote(Stage::AccountLookup, err)),
        }
    }

    async fn deploy_contract(
        &self,
        contract_id: &str,
        code: Vec<u8>,
        deposit: u128,
    ) -> ActionResult<String> {
        info!("Deploying {} bytes of contract code to {}", code.len(), contract_id);
        self.submit(
            Stage::Deploy,
            contract_id,
            vec![
                NearAction::CreateAccount,
                NearAction::Transfer { deposit },
                NearAction::DeployContract { code },
            ],
        )
        .await
    }

    async fn function_call(
        &self,
        contract_id: &str,
        method: &str,
        args: Value,
        gas: u64,
        deposit: u128,
    ) -> ActionResult<String> {
        let args = serde_json::to_vec(&args)
            .map_err(|e| ActionError::invalid("function call arguments", e.to_string()))?;
        self.submit(
            Stage::Initialize,
            contract_id,
            vec![NearAction::FunctionCall {
                method_name: method.to_string(),
                args,
                gas,
                deposit,
            }],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_unknown_account_errors() {
        let structured = json!({"name": "HANDLER_ERROR", "cause": {"name": "UNKNOWN_ACCOUNT"}});
        assert!(is_unknown_account(&structured));

        let legacy = json!("account mtk-token.alice.testnet does not exist while viewing");
        assert!(is_unknown_account(&legacy));

        let other = json!({"cause": {"name": "TIMEOUT_ERROR"}});
        assert!(!is_unknown_account(&other));
    }
}
