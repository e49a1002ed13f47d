// src/blockchain/evm_client.rs

use async_trait::async_trait;
use ethers_core::abi::{decode, encode, ParamType, Token};
use ethers_core::types::{Address, Bytes, TransactionRequest, H256, U256, U64};
use ethers_core::utils::keccak256;
use ethers_signers::{LocalWallet, Signer};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use tracing::{debug, warn};

use super::client::{SigningClient, SubmittedTransaction};
use super::networks::NetworkDescriptor;
use super::nonce_manager::NonceManager;
use crate::error::{ActionError, ActionResult, Stage};

/// First four bytes of the keccak hash of a function signature.
pub fn selector(sig: &str) -> [u8; 4] {
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&keccak256(sig.as_bytes())[0..4]);
    sel
}

/// ABI-encodes a call to `sig` with `tokens` as arguments.
pub fn encode_call(sig: &str, tokens: Vec<Token>) -> Bytes {
    let mut out = selector(sig).to_vec();
    let mut tail = encode(&tokens);
    out.append(&mut tail);
    Bytes::from(out)
}

fn parse_hex_quantity(stage: Stage, value: &Value) -> ActionResult<U256> {
    let s = value
        .as_str()
        .ok_or_else(|| ActionError::malformed(stage, "expected a hex quantity"))?;
    U256::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| ActionError::malformed(stage, e.to_string()))
}

// Shape of `eth_getTransactionByHash`; nodes omit fields freely.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    hash: H256,
    from: Address,
    #[serde(default)]
    to: Option<Address>,
    #[serde(default)]
    value: U256,
    #[serde(default)]
    chain_id: Option<U64>,
    #[serde(default)]
    block_number: Option<U64>,
}

/// Signing client for EVM chains, speaking raw JSON-RPC.
pub struct EvmClient {
    http: Client,
    network: NetworkDescriptor,
    rpc_url: String,
    wallet: LocalWallet,
    nonce_manager: NonceManager,
}

impl EvmClient {
    pub fn new(
        http: Client,
        network: NetworkDescriptor,
        private_key: &SecretString,
        nonce_manager: NonceManager,
    ) -> ActionResult<Self> {
        let wallet = LocalWallet::from_str(private_key.expose_secret().trim())
            .map_err(|e| ActionError::Signing(e.to_string()))?
            .with_chain_id(network.id);
        let rpc_url = network
            .rpc_url()
            .ok_or_else(|| ActionError::invalid("network", "no RPC endpoint configured"))?
            .to_string();
        Ok(Self {
            http,
            network,
            rpc_url,
            wallet,
            nonce_manager,
        })
    }

    /// One JSON-RPC round trip. Node-side errors and missing results are
    /// reported against `stage`.
    async fn rpc(&self, stage: Stage, method: &str, params: Value) -> ActionResult<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });
        let resp = self
            .http
            .post(&self.rpc_url)
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
            return Err(ActionError::remote(stage, err));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| ActionError::malformed(stage, "missing 'result'"))
    }

    // Fills chain id, gas and gas price, then signs and broadcasts.
    async fn sign_and_send(&self, tx: TransactionRequest, nonce: U256) -> ActionResult<H256> {
        let chain_id = parse_hex_quantity(
            Stage::SubmitTransfer,
            &self.rpc(Stage::SubmitTransfer, "eth_chainId", json!([])).await?,
        )?;
        if chain_id != U256::from(self.network.id) {
            return Err(ActionError::invalid(
                "network",
                format!(
                    "endpoint reports chain {} but {} is chain {}",
                    chain_id, self.network.name, self.network.id
                ),
            ));
        }

        let mut tx = tx
            .from(self.wallet.address())
            .nonce(nonce)
            .chain_id(self.network.id);

        if tx.gas.is_none() {
            let call_obj = serde_json::to_value(&tx)
                .map_err(|e| ActionError::malformed(Stage::EstimateGas, e.to_string()))?;
            let gas = parse_hex_quantity(
                Stage::EstimateGas,
                &self.rpc(Stage::EstimateGas, "eth_estimateGas", json!([call_obj])).await?,
            )?;
            tx = tx.gas(gas);
        }

        if tx.gas_price.is_none() {
            let gas_price = parse_hex_quantity(
                Stage::GasPrice,
                &self.rpc(Stage::GasPrice, "eth_gasPrice", json!([])).await?,
            )?;
            tx = tx.gas_price(gas_price);
        }

        let signature = self
            .wallet
            .sign_transaction(&tx.clone().into())
            .await
            .map_err(|e| ActionError::Signing(e.to_string()))?;
        let raw_tx = tx.rlp_signed(&signature);

        let result = self
            .rpc(
                Stage::SubmitTransfer,
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(raw_tx))]),
            )
            .await?;
        let hash = result.as_str().ok_or_else(|| {
            ActionError::malformed(Stage::SubmitTransfer, "transaction hash is not a string")
        })?;
        H256::from_str(hash).map_err(|e| ActionError::malformed(Stage::SubmitTransfer, e.to_string()))
    }
}

#[async_trait]
impl SigningClient for EvmClient {
    fn network(&self) -> &NetworkDescriptor {
        &self.network
    }

    fn sender(&self) -> Address {
        self.wallet.address()
    }

    async fn read_contract_field(
        &self,
        contract: Address,
        signature: &str,
        output: ParamType,
    ) -> ActionResult<Token> {
        let data = encode_call(signature, vec![]);
        let result = self
            .rpc(
                Stage::ReadDecimals,
                "eth_call",
                json!([{"to": format!("{:?}", contract), "data": format!("0x{}", hex::encode(data))}, "latest"]),
            )
            .await?;
        let raw = result
            .as_str()
            .ok_or_else(|| ActionError::malformed(Stage::ReadDecimals, "eth_call result not string"))?;
        let bytes = hex::decode(raw.trim_start_matches("0x"))
            .map_err(|e| ActionError::malformed(Stage::ReadDecimals, e.to_string()))?;
        if bytes.is_empty() {
            return Err(ActionError::malformed(
                Stage::ReadDecimals,
                format!("{} returned no data; is {:?} a token contract?", signature, contract),
            ));
        }
        decode(&[output], &bytes)
            .map_err(|e| ActionError::malformed(Stage::ReadDecimals, e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| ActionError::malformed(Stage::ReadDecimals, "empty decode"))
    }

    async fn submit_call(
        &self,
        contract: Address,
        signature: &str,
        args: Vec<Token>,
    ) -> ActionResult<H256> {
        let tx = TransactionRequest::new()
            .to(contract)
            .data(encode_call(signature, args));

        let sender = self.wallet.address();
        let nonce = self
            .nonce_manager
            .get_next_nonce(&self.http, sender, &self.rpc_url)
            .await?;
        debug!("Submitting {} to {:?} with nonce {}", signature, contract, nonce);

        match self.sign_and_send(tx, nonce).await {
            Ok(hash) => Ok(hash),
            Err(e) => {
                // The reserved nonce was never spent; re-read it next time.
                warn!("Submission from {:?} failed, resetting nonce: {}", sender, e);
                self.nonce_manager.reset(sender).await;
                Err(e)
            }
        }
    }

    async fn get_by_identifier(&self, hash: H256) -> ActionResult<Option<SubmittedTransaction>> {
        let result = self
            .rpc(
                Stage::TransactionLookup,
                "eth_getTransactionByHash",
                json!([format!("{:?}", hash)]),
            )
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let tx: RpcTransaction = serde_json::from_value(result)
            .map_err(|e| ActionError::malformed(Stage::TransactionLookup, e.to_string()))?;
        Ok(Some(SubmittedTransaction {
            hash: tx.hash,
            from: tx.from,
            to: tx.to,
            value: tx.value,
            chain_id: tx.chain_id.map(|c| c.as_u64()),
            block_number: tx.block_number.map(|b| b.as_u64()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_match_erc20() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
        assert_eq!(hex::encode(selector("decimals()")), "313ce567");
    }

    #[test]
    fn transfer_calldata_layout() {
        let to = Address::from_str("0x1111111111111111111111111111111111111111").unwrap();
        let data = encode_call(
            "transfer(address,uint256)",
            vec![Token::Address(to), Token::Uint(U256::from(1000u64))],
        );
        assert_eq!(data.len(), 4 + 32 + 32);
        assert_eq!(&data[4 + 12..4 + 32], to.as_bytes());
        assert_eq!(data[4 + 63], 0xe8);
        assert_eq!(data[4 + 62], 0x03);
    }
}
