//! Read-only client for Blockscout v2 explorer APIs.

use async_trait::async_trait;
use chrono::Utc;
use ethers_core::types::U256;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::models::*;
use super::networks::{ExplorerTarget, NativeCurrency};
use crate::error::{ActionError, ActionResult, Stage};
use crate::utils::MAX_DECIMALS;

/// The explorer queries the read actions depend on. Each is a single GET;
/// nothing is retried.
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    fn target(&self) -> &ExplorerTarget;

    async fn address_balance(&self, address: &str) -> ActionResult<BalanceResult>;

    async fn latest_block(&self) -> ActionResult<BlockResult>;

    async fn transaction(&self, tx_hash: &str) -> ActionResult<TransactionResult>;

    async fn network_stats(&self) -> ActionResult<NetworkStatsResult>;

    async fn address_transactions(&self, address: &str) -> ActionResult<AddressTransactionsResult>;
}

#[derive(Debug, Clone)]
pub struct ExplorerClient {
    http: Client,
    target: ExplorerTarget,
}

impl ExplorerClient {
    pub fn new(target: ExplorerTarget, http: Client) -> Self {
        Self { http, target }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.target.api_base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T: DeserializeOwned>(&self, stage: Stage, path: &str) -> ActionResult<T> {
        let url = self.url(path);
        debug!("GET {}", url);
        let resp = self
            .http
            .get(&url)
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
        if body.is_null() {
            return Err(ActionError::malformed(stage, "empty response body"));
        }
        serde_json::from_value(body).map_err(|e| ActionError::malformed(stage, e.to_string()))
    }
}

fn opt_string(value: Option<Scalar>) -> Option<String> {
    value.map(|v| v.to_string()).filter(|s| !s.is_empty())
}

fn gas_price_label(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Precision reported by the explorer; anything beyond `MAX_DECIMALS` is
/// treated as unknown so the amount renders in raw units.
fn token_decimals(value: Option<&Scalar>) -> Option<u32> {
    value
        .and_then(Scalar::as_u32)
        .filter(|decimals| *decimals <= MAX_DECIMALS)
}

fn token_transfer(doc: TokenTransferDocument) -> TokenTransfer {
    let token = doc.token.unwrap_or_default();
    let total = doc.total.unwrap_or_default();
    TokenTransfer {
        amount: total.value.as_ref().and_then(Scalar::as_u256),
        decimals: token_decimals(total.decimals.as_ref())
            .or_else(|| token_decimals(token.decimals.as_ref())),
        symbol: token.symbol,
        name: token.name,
    }
}

/// Normalizes an explorer transaction document. The first token transfer,
/// when present, is carried alongside the native value.
pub fn transaction_result(doc: TransactionDocument, currency: &NativeCurrency) -> TransactionResult {
    let block = opt_string(doc.block_number).or_else(|| opt_string(doc.block));
    TransactionResult {
        hash: doc.hash,
        status: doc.status,
        method: doc.method,
        block,
        timestamp: doc.timestamp,
        from: doc.from.map(AddressField::resolve),
        to: doc.to.map(AddressField::resolve),
        value: doc.value.as_ref().and_then(Scalar::as_u256),
        token_transfer: doc
            .token_transfers
            .and_then(|transfers| transfers.into_iter().next())
            .map(token_transfer),
        gas_used: opt_string(doc.gas_used),
        gas_price: doc.gas_price.as_ref().and_then(Scalar::as_u256),
        currency: currency.clone(),
    }
}

#[async_trait]
impl ExplorerApi for ExplorerClient {
    fn target(&self) -> &ExplorerTarget {
        &self.target
    }

    async fn address_balance(&self, address: &str) -> ActionResult<BalanceResult> {
        let doc: AddressDocument = self
            .get_json(Stage::AddressBalance, &format!("addresses/{}", address))
            .await?;
        // Blockscout reports a never-funded address with a null balance.
        let balance_wei = match doc.coin_balance {
            None => U256::zero(),
            Some(scalar) => scalar.as_u256().ok_or_else(|| {
                ActionError::malformed(
                    Stage::AddressBalance,
                    format!("coin_balance '{}' is not an integer", scalar),
                )
            })?,
        };
        Ok(BalanceResult {
            address: address.to_string(),
            balance_wei,
            currency: self.target.native_currency.clone(),
            timestamp: Utc::now(),
        })
    }

    async fn latest_block(&self) -> ActionResult<BlockResult> {
        let page: Page<BlockDocument> = self.get_json(Stage::LatestBlock, "blocks").await?;
        let block = page
            .items
            .and_then(|items| items.into_iter().next())
            .ok_or_else(|| ActionError::malformed(Stage::LatestBlock, "no blocks in response"))?;
        Ok(BlockResult {
            height: opt_string(block.height),
            timestamp: block.timestamp,
            hash: block.hash,
        })
    }

    async fn transaction(&self, tx_hash: &str) -> ActionResult<TransactionResult> {
        let doc: TransactionDocument = self
            .get_json(Stage::TransactionDetails, &format!("transactions/{}", tx_hash))
            .await?;
        Ok(transaction_result(doc, &self.target.native_currency))
    }

    async fn network_stats(&self) -> ActionResult<NetworkStatsResult> {
        let stats: StatsDocument = self.get_json(Stage::NetworkStats, "stats").await?;
        let gas = stats.gas_prices.unwrap_or_default();
        Ok(NetworkStatsResult {
            total_addresses: opt_string(stats.total_addresses),
            total_transactions: opt_string(stats.total_transactions),
            network_utilization_percentage: opt_string(stats.network_utilization_percentage),
            average_block_time_ms: stats.average_block_time.as_ref().and_then(Scalar::as_f64),
            gas_prices: GasPrices {
                slow: gas_price_label(gas.slow),
                average: gas_price_label(gas.average),
                fast: gas_price_label(gas.fast),
            },
            coin_price_change_percentage: opt_string(stats.coin_price_change_percentage),
        })
    }

    async fn address_transactions(&self, address: &str) -> ActionResult<AddressTransactionsResult> {
        let page: Page<TransactionDocument> = self
            .get_json(
                Stage::AddressTransactions,
                &format!("addresses/{}/transactions", address),
            )
            .await?;
        let transactions = page
            .items
            .unwrap_or_default()
            .into_iter()
            .map(|doc| transaction_result(doc, &self.target.native_currency))
            .collect();
        Ok(AddressTransactionsResult {
            address: address.to_string(),
            transactions,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::networks::rootstock_explorer;
    use serde_json::json;

    #[test]
    fn token_transfer_decimals_fall_back_to_token() {
        let doc: TransactionDocument = serde_json::from_value(json!({
            "hash": "0xaa",
            "value": "0",
            "token_transfers": [{
                "token": {"name": "Tether", "symbol": "USDT", "decimals": "6"},
                "total": {"value": "2500000"}
            }]
        }))
        .unwrap();
        let result = transaction_result(doc, &rootstock_explorer().native_currency);
        let transfer = result.token_transfer.unwrap();
        assert_eq!(transfer.decimals, Some(6));
        assert_eq!(transfer.amount, Some(U256::from(2_500_000u64)));
        assert_eq!(transfer.symbol.as_deref(), Some("USDT"));
    }

    #[test]
    fn out_of_range_decimals_are_dropped() {
        let doc: TransactionDocument = serde_json::from_value(json!({
            "token_transfers": [{
                "token": {"symbol": "BAD", "decimals": "255"},
                "total": {"value": "1", "decimals": "100"}
            }]
        }))
        .unwrap();
        let result = transaction_result(doc, &rootstock_explorer().native_currency);
        assert_eq!(result.token_transfer.unwrap().decimals, None);
    }

    #[test]
    fn block_number_wins_over_block() {
        let doc: TransactionDocument =
            serde_json::from_value(json!({"block": 10, "block_number": 12})).unwrap();
        let result = transaction_result(doc, &rootstock_explorer().native_currency);
        assert_eq!(result.block.as_deref(), Some("12"));
    }

    #[test]
    fn gas_price_labels_keep_numbers_and_strings() {
        assert_eq!(gas_price_label(Some(json!(0.06))), Some("0.06".into()));
        assert_eq!(gas_price_label(Some(json!("1.2"))), Some("1.2".into()));
        assert_eq!(gas_price_label(Some(Value::Null)), None);
        assert_eq!(gas_price_label(None), None);
    }
}
