// src/blockchain/models.rs
use chrono::{DateTime, Utc};
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::networks::NativeCurrency;

// --- Explorer wire models (Blockscout v2) ---
//
// Every field is optional: explorers omit or null fields freely and the
// formatter renders placeholders instead of failing.

/// A JSON scalar that explorers send either as a string or as a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Text(String),
    Number(serde_json::Number),
}

impl Scalar {
    pub fn as_u256(&self) -> Option<U256> {
        match self {
            Scalar::Text(s) => U256::from_dec_str(s.trim()).ok(),
            Scalar::Number(n) => n.as_u64().map(U256::from),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Number(n) => n.as_f64(),
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Text(s) => f.write_str(s),
            Scalar::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Address fields arrive either as a bare hash or as an object with a hash
/// and an optional label.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AddressField {
    Raw(String),
    Named {
        hash: String,
        #[serde(default)]
        name: Option<String>,
    },
}

impl AddressField {
    pub fn resolve(self) -> AddressRef {
        match self {
            AddressField::Raw(hash) => AddressRef {
                hash,
                display_name: None,
            },
            AddressField::Named { hash, name } => AddressRef {
                hash,
                display_name: name.filter(|n| !n.is_empty()),
            },
        }
    }
}

/// Canonical address shape the formatter works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressRef {
    pub hash: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressDocument {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub coin_balance: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BlockDocument {
    #[serde(default)]
    pub height: Option<Scalar>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub items: Option<Vec<T>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenDocument {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub decimals: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenTotal {
    #[serde(default)]
    pub value: Option<Scalar>,
    #[serde(default)]
    pub decimals: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenTransferDocument {
    #[serde(default)]
    pub token: Option<TokenDocument>,
    #[serde(default)]
    pub total: Option<TokenTotal>,
    #[serde(default)]
    pub from: Option<AddressField>,
    #[serde(default)]
    pub to: Option<AddressField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionDocument {
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub from: Option<AddressField>,
    #[serde(default)]
    pub to: Option<AddressField>,
    #[serde(default)]
    pub value: Option<Scalar>,
    #[serde(default)]
    pub gas_used: Option<Scalar>,
    #[serde(default)]
    pub gas_price: Option<Scalar>,
    #[serde(default)]
    pub block: Option<Scalar>,
    #[serde(default)]
    pub block_number: Option<Scalar>,
    #[serde(default)]
    pub token_transfers: Option<Vec<TokenTransferDocument>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GasPricesDocument {
    #[serde(default)]
    pub slow: Option<Value>,
    #[serde(default)]
    pub average: Option<Value>,
    #[serde(default)]
    pub fast: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsDocument {
    #[serde(default)]
    pub average_block_time: Option<Scalar>,
    #[serde(default)]
    pub coin_price_change_percentage: Option<Scalar>,
    #[serde(default)]
    pub gas_prices: Option<GasPricesDocument>,
    #[serde(default)]
    pub network_utilization_percentage: Option<Scalar>,
    #[serde(default)]
    pub total_addresses: Option<Scalar>,
    #[serde(default)]
    pub total_transactions: Option<Scalar>,
}

// --- Chain results ---

/// Outcome of an ERC-20 transfer submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferResult {
    pub hash: String,
    /// Recipient and amount as given by the user, echoed in the report.
    pub requested_recipient: String,
    pub requested_amount: String,
    /// Checksummed recipient.
    pub recipient: String,
    pub token_address: String,
    /// Amount in token base units, with the precision read on chain.
    pub amount: U256,
    pub decimals: u32,
    pub chain_id: u64,
    pub explorer_tx_url: String,
    /// Canonical fields from the post-submit lookup; absent when degraded.
    pub from: Option<String>,
    pub to: Option<String>,
    pub value: Option<U256>,
    pub detail_error: Option<String>,
}

impl TransferResult {
    pub fn details_available(&self) -> bool {
        self.detail_error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceResult {
    pub address: String,
    pub balance_wei: U256,
    pub currency: NativeCurrency,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockResult {
    pub height: Option<String>,
    pub timestamp: Option<String>,
    pub hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenTransfer {
    pub amount: Option<U256>,
    /// Precision reported alongside the amount; `None` means raw units.
    pub decimals: Option<u32>,
    pub symbol: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionResult {
    pub hash: Option<String>,
    pub status: Option<String>,
    pub method: Option<String>,
    pub block: Option<String>,
    pub timestamp: Option<String>,
    pub from: Option<AddressRef>,
    pub to: Option<AddressRef>,
    pub value: Option<U256>,
    pub token_transfer: Option<TokenTransfer>,
    pub gas_used: Option<String>,
    pub gas_price: Option<U256>,
    pub currency: NativeCurrency,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GasPrices {
    pub slow: Option<String>,
    pub average: Option<String>,
    pub fast: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkStatsResult {
    pub total_addresses: Option<String>,
    pub total_transactions: Option<String>,
    pub network_utilization_percentage: Option<String>,
    pub average_block_time_ms: Option<f64>,
    pub gas_prices: GasPrices,
    pub coin_price_change_percentage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressTransactionsResult {
    pub address: String,
    pub transactions: Vec<TransactionResult>,
    pub timestamp: DateTime<Utc>,
}

/// Fungible-token metadata passed to the NEAR `new` initializer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub spec: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployResult {
    pub contract_id: String,
    pub owner_id: String,
    pub total_supply: String,
    pub metadata: TokenMetadata,
    pub deploy_tx: String,
    pub init_tx: String,
}

/// Raw result of one chain operation, handed to the formatter.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainResult {
    Transfer(TransferResult),
    Balance(BalanceResult),
    Block(BlockResult),
    Transaction(TransactionResult),
    NetworkStats(NetworkStatsResult),
    AddressTransactions(AddressTransactionsResult),
    Deploy(DeployResult),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn address_fields_accept_both_shapes() {
        let raw: AddressField = serde_json::from_value(json!("0xabc")).unwrap();
        assert_eq!(
            raw.resolve(),
            AddressRef {
                hash: "0xabc".into(),
                display_name: None
            }
        );

        let named: AddressField = serde_json::from_value(json!({
            "hash": "0xdef",
            "name": "Bridge",
            "is_contract": true
        }))
        .unwrap();
        assert_eq!(named.resolve().display_name.as_deref(), Some("Bridge"));

        let unnamed: AddressField =
            serde_json::from_value(json!({ "hash": "0xdef", "name": null })).unwrap();
        assert_eq!(unnamed.resolve().display_name, None);
    }

    #[test]
    fn transaction_document_tolerates_missing_fields() {
        let doc: TransactionDocument = serde_json::from_value(json!({
            "hash": "0x01",
            "to": null,
            "block": 5
        }))
        .unwrap();
        assert!(doc.to.is_none());
        assert_eq!(doc.block.unwrap().to_string(), "5");
        assert!(doc.token_transfers.is_none());
    }

    #[test]
    fn scalars_parse_from_text_or_number() {
        assert_eq!(
            Scalar::Text("1000".into()).as_u256(),
            Some(U256::from(1000u64))
        );
        let n: Scalar = serde_json::from_value(json!(2500)).unwrap();
        assert_eq!(n.as_f64(), Some(2500.0));
        assert_eq!(Scalar::Text("x".into()).as_u256(), None);
    }
}
