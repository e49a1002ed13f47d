//! Fixed text templates for chain results. Missing fields render as a
//! placeholder; nothing is ever dropped from a template.

use serde_json::{json, Value};

use super::ActionOutcome;
use crate::blockchain::models::*;
use crate::error::ActionError;
use crate::utils::{format_units, format_units_fixed, group_thousands};

const UNKNOWN: &str = "Unknown";
const NOT_AVAILABLE: &str = "N/A";

/// Most transactions shown by the address listing.
pub const MAX_LISTED_TRANSACTIONS: usize = 10;

const BALANCE_PLACES: u32 = 5;
const GWEI_DECIMALS: u32 = 9;

fn or_placeholder(value: Option<&str>, placeholder: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => placeholder.to_string(),
    }
}

fn success(text: String, payload: Value) -> ActionOutcome {
    ActionOutcome {
        success: true,
        text,
        payload: Some(payload),
    }
}

pub fn failure(err: &ActionError) -> ActionOutcome {
    ActionOutcome {
        success: false,
        text: format!("Error: {}", err),
        payload: Some(json!({ "error": err.to_string(), "kind": err.kind() })),
    }
}

pub fn format(result: &ChainResult) -> ActionOutcome {
    match result {
        ChainResult::Transfer(r) => transfer(r),
        ChainResult::Balance(r) => balance(r),
        ChainResult::Block(r) => block(r),
        ChainResult::Transaction(r) => success(transaction_text(r), json!(r)),
        ChainResult::NetworkStats(r) => network_stats(r),
        ChainResult::AddressTransactions(r) => address_transactions(r),
        ChainResult::Deploy(r) => deploy(r),
    }
}

fn transfer(r: &TransferResult) -> ActionOutcome {
    let mut text = format!(
        "Successfully airdropped {} tokens to {}\nTransaction Hash: {}\nView on Explorer: {}",
        r.requested_amount, r.requested_recipient, r.hash, r.explorer_tx_url
    );
    if let Some(cause) = &r.detail_error {
        text.push_str(&format!("\nNote: transaction details unavailable ({})", cause));
    }
    success(
        text,
        json!({
            "success": true,
            "hash": r.hash,
            "address": r.recipient,
            "amount": r.requested_amount,
            "baseUnits": r.amount.to_string(),
            "from": r.from,
            "to": r.to,
            "value": r.value.map(|v| v.to_string()),
            "chainId": r.chain_id,
            "explorerUrl": r.explorer_tx_url,
            "detailsAvailable": r.details_available(),
        }),
    )
}

fn balance(r: &BalanceResult) -> ActionOutcome {
    let shown = format_units_fixed(r.balance_wei, r.currency.decimals, BALANCE_PLACES);
    success(
        format!("The balance for {} is {} {}", r.address, shown, r.currency.symbol),
        json!({
            "address": r.address,
            "balance": shown,
            "balanceWei": r.balance_wei.to_string(),
            "symbol": r.currency.symbol,
            "timestamp": r.timestamp.to_rfc3339(),
        }),
    )
}

fn block(r: &BlockResult) -> ActionOutcome {
    success(
        format!(
            "Latest block:\nNumber: {}\nTimestamp: {}\nHash: {}",
            or_placeholder(r.height.as_deref(), NOT_AVAILABLE),
            or_placeholder(r.timestamp.as_deref(), NOT_AVAILABLE),
            or_placeholder(r.hash.as_deref(), NOT_AVAILABLE),
        ),
        json!(r),
    )
}

fn address_line(address: &Option<AddressRef>) -> String {
    match address {
        Some(a) => match &a.display_name {
            Some(name) => format!("{} ({})", or_placeholder(Some(&a.hash), UNKNOWN), name),
            None => or_placeholder(Some(&a.hash), UNKNOWN),
        },
        None => UNKNOWN.to_string(),
    }
}

/// Token transfers take precedence over the native value.
fn transaction_text(r: &TransactionResult) -> String {
    let mut lines = vec![
        "Transaction Details:".to_string(),
        format!("Hash: {}", or_placeholder(r.hash.as_deref(), UNKNOWN)),
        format!("Status: {}", or_placeholder(r.status.as_deref(), UNKNOWN)),
        format!("Block: {}", or_placeholder(r.block.as_deref(), UNKNOWN)),
        format!("Timestamp: {}", or_placeholder(r.timestamp.as_deref(), UNKNOWN)),
        format!("From: {}", address_line(&r.from)),
        format!("To: {}", address_line(&r.to)),
    ];

    match &r.token_transfer {
        Some(transfer) => {
            let amount = match (transfer.amount, transfer.decimals) {
                (Some(amount), Some(decimals)) => format_units(amount, decimals),
                (Some(amount), None) => amount.to_string(),
                (None, _) => UNKNOWN.to_string(),
            };
            let symbol = or_placeholder(transfer.symbol.as_deref(), UNKNOWN);
            lines.push(format!("Token Transfer: {} {}", amount, symbol));
            lines.push(format!(
                "Token Contract: {} ({})",
                or_placeholder(transfer.name.as_deref(), UNKNOWN),
                symbol
            ));
        }
        None => {
            let value = r
                .value
                .map(|v| format_units(v, r.currency.decimals))
                .unwrap_or_else(|| UNKNOWN.to_string());
            lines.push(format!("Value: {} {}", value, r.currency.symbol));
        }
    }

    lines.push(format!("Gas Used: {}", or_placeholder(r.gas_used.as_deref(), UNKNOWN)));
    lines.push(format!(
        "Gas Price: {}",
        r.gas_price
            .map(|p| format!("{} Gwei", format_units(p, GWEI_DECIMALS)))
            .unwrap_or_else(|| UNKNOWN.to_string())
    ));
    lines.join("\n")
}

fn network_stats(r: &NetworkStatsResult) -> ActionOutcome {
    let count = |v: &Option<String>| v.as_deref().map(group_thousands).unwrap_or_else(|| UNKNOWN.to_string());
    let percent = |v: &Option<String>| {
        v.as_deref()
            .map(|p| format!("{}%", p))
            .unwrap_or_else(|| UNKNOWN.to_string())
    };
    let block_time = r
        .average_block_time_ms
        .map(|ms| format!("{:.2} seconds", ms / 1000.0))
        .unwrap_or_else(|| UNKNOWN.to_string());

    let text = [
        "📊 Network Statistics:".to_string(),
        String::new(),
        "📈 Activity:".to_string(),
        format!("• Total Addresses: {}", count(&r.total_addresses)),
        format!("• Total Transactions: {}", count(&r.total_transactions)),
        format!("• Network Utilization: {}", percent(&r.network_utilization_percentage)),
        String::new(),
        "⚡ Performance:".to_string(),
        format!("• Average Block Time: {}", block_time),
        String::new(),
        "⛽ Gas Prices (Gwei):".to_string(),
        format!("• Slow: {}", or_placeholder(r.gas_prices.slow.as_deref(), UNKNOWN)),
        format!("• Average: {}", or_placeholder(r.gas_prices.average.as_deref(), UNKNOWN)),
        format!("• Fast: {}", or_placeholder(r.gas_prices.fast.as_deref(), UNKNOWN)),
        String::new(),
        "💰 Token:".to_string(),
        format!("• Price Change (24h): {}", percent(&r.coin_price_change_percentage)),
    ]
    .join("\n");
    success(text, json!(r))
}

fn address_transactions(r: &AddressTransactionsResult) -> ActionOutcome {
    let mut lines = Vec::new();
    if r.transactions.is_empty() {
        lines.push(format!("No transactions found for {}", r.address));
    } else {
        lines.push(format!(
            "Recent transactions for {} (showing {} of {}):",
            r.address,
            r.transactions.len().min(MAX_LISTED_TRANSACTIONS),
            r.transactions.len()
        ));
        for (i, tx) in r.transactions.iter().take(MAX_LISTED_TRANSACTIONS).enumerate() {
            let amount = match &tx.token_transfer {
                Some(t) => format!(
                    "{} {}",
                    match (t.amount, t.decimals) {
                        (Some(a), Some(d)) => format_units(a, d),
                        (Some(a), None) => a.to_string(),
                        (None, _) => UNKNOWN.to_string(),
                    },
                    or_placeholder(t.symbol.as_deref(), UNKNOWN)
                ),
                None => format!(
                    "{} {}",
                    tx.value
                        .map(|v| format_units(v, tx.currency.decimals))
                        .unwrap_or_else(|| UNKNOWN.to_string()),
                    tx.currency.symbol
                ),
            };
            lines.push(format!(
                "{}. {} | {} -> {} | {} | {}",
                i + 1,
                or_placeholder(tx.hash.as_deref(), UNKNOWN),
                address_line(&tx.from),
                address_line(&tx.to),
                amount,
                or_placeholder(tx.status.as_deref(), UNKNOWN),
            ));
        }
    }
    success(
        lines.join("\n"),
        json!({
            "address": r.address,
            "count": r.transactions.len(),
            "transactions": r.transactions.iter().take(MAX_LISTED_TRANSACTIONS).collect::<Vec<_>>(),
            "timestamp": r.timestamp.to_rfc3339(),
        }),
    )
}

fn deploy(r: &DeployResult) -> ActionOutcome {
    success(
        format!(
            "Token {} ({}) deployed to {}\nTotal Supply: {}\nDeploy Transaction: {}\nInit Transaction: {}",
            r.metadata.name, r.metadata.symbol, r.contract_id, r.total_supply, r.deploy_tx, r.init_tx
        ),
        json!({
            "contractId": r.contract_id,
            "ownerId": r.owner_id,
            "spec": r.metadata.spec,
            "name": r.metadata.name,
            "symbol": r.metadata.symbol,
            "decimals": r.metadata.decimals,
            "icon": r.metadata.icon,
            "totalSupply": r.total_supply,
            "deployTransaction": r.deploy_tx,
            "initTransaction": r.init_tx,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::networks::rootstock_explorer;
    use crate::error::Stage;
    use chrono::Utc;
    use ethers_core::types::U256;

    fn rbtc() -> crate::blockchain::networks::NativeCurrency {
        rootstock_explorer().native_currency
    }

    fn empty_tx() -> TransactionResult {
        TransactionResult {
            hash: None,
            status: None,
            method: None,
            block: None,
            timestamp: None,
            from: None,
            to: None,
            value: None,
            token_transfer: None,
            gas_used: None,
            gas_price: None,
            currency: rbtc(),
        }
    }

    #[test]
    fn balance_uses_five_exact_places() {
        let outcome = format(&ChainResult::Balance(BalanceResult {
            address: "0xabc".into(),
            balance_wei: U256::from_dec_str("1500000000000000000").unwrap(),
            currency: rbtc(),
            timestamp: Utc::now(),
        }));
        assert!(outcome.success);
        assert_eq!(outcome.text, "The balance for 0xabc is 1.50000 RBTC");
    }

    #[test]
    fn token_transfer_wins_over_native_value() {
        let mut tx = empty_tx();
        tx.value = Some(U256::exp10(18));
        tx.token_transfer = Some(TokenTransfer {
            amount: Some(U256::from(2_500_000u64)),
            decimals: Some(6),
            symbol: Some("USDT".into()),
            name: Some("Tether".into()),
        });
        let text = format(&ChainResult::Transaction(tx)).text;
        assert!(text.contains("Token Transfer: 2.5 USDT"));
        assert!(text.contains("Token Contract: Tether (USDT)"));
        assert!(!text.contains("Value:"));
    }

    #[test]
    fn missing_transaction_fields_render_unknown() {
        let text = format(&ChainResult::Transaction(empty_tx())).text;
        assert_eq!(
            text,
            "Transaction Details:\nHash: Unknown\nStatus: Unknown\nBlock: Unknown\nTimestamp: Unknown\nFrom: Unknown\nTo: Unknown\nValue: Unknown RBTC\nGas Used: Unknown\nGas Price: Unknown"
        );
    }

    #[test]
    fn named_recipient_and_gwei_price() {
        let mut tx = empty_tx();
        tx.to = Some(AddressRef {
            hash: "0xdef".into(),
            display_name: Some("Bridge".into()),
        });
        tx.gas_price = Some(U256::from(60_000_000u64));
        let text = format(&ChainResult::Transaction(tx)).text;
        assert!(text.contains("To: 0xdef (Bridge)"));
        assert!(text.contains("Gas Price: 0.06 Gwei"));
    }

    #[test]
    fn block_placeholders_are_na() {
        let outcome = format(&ChainResult::Block(BlockResult {
            height: Some("6543210".into()),
            timestamp: None,
            hash: None,
        }));
        assert_eq!(outcome.text, "Latest block:\nNumber: 6543210\nTimestamp: N/A\nHash: N/A");
    }

    #[test]
    fn stats_group_thousands_and_convert_block_time() {
        let outcome = format(&ChainResult::NetworkStats(NetworkStatsResult {
            total_addresses: Some("2456789".into()),
            total_transactions: None,
            network_utilization_percentage: Some("12.5".into()),
            average_block_time_ms: Some(25_340.0),
            gas_prices: GasPrices {
                slow: Some("0.06".into()),
                average: None,
                fast: None,
            },
            coin_price_change_percentage: None,
        }));
        assert!(outcome.text.contains("• Total Addresses: 2,456,789"));
        assert!(outcome.text.contains("• Total Transactions: Unknown"));
        assert!(outcome.text.contains("• Network Utilization: 12.5%"));
        assert!(outcome.text.contains("• Average Block Time: 25.34 seconds"));
        assert!(outcome.text.contains("• Slow: 0.06"));
        assert!(outcome.text.contains("• Average: Unknown"));
    }

    #[test]
    fn degraded_transfer_still_succeeds_with_a_note() {
        let outcome = format(&ChainResult::Transfer(TransferResult {
            hash: "0x11".into(),
            requested_recipient: "0x742d35cc6634c0532925a3b844bc454e4438f44e".into(),
            requested_amount: "10.0".into(),
            recipient: "0x742d35Cc6634C0532925a3b844Bc454e4438f44e".into(),
            token_address: "0x22".into(),
            amount: U256::exp10(19),
            decimals: 18,
            chain_id: 12227332,
            explorer_tx_url: "https://xt4scan.ngd.network/tx/0x11".into(),
            from: None,
            to: None,
            value: None,
            detail_error: Some("timeout".into()),
        }));
        assert!(outcome.success);
        assert!(outcome.text.starts_with(
            "Successfully airdropped 10.0 tokens to 0x742d35cc6634c0532925a3b844bc454e4438f44e\nTransaction Hash: 0x11"
        ));
        assert!(outcome.text.ends_with("Note: transaction details unavailable (timeout)"));
        let payload = outcome.payload.unwrap();
        assert_eq!(payload["detailsAvailable"], json!(false));
        assert_eq!(payload["address"], json!("0x742d35Cc6634C0532925a3b844Bc454e4438f44e"));
        assert_eq!(payload["baseUnits"], json!("10000000000000000000"));
    }

    #[test]
    fn failures_carry_the_error_verbatim() {
        let outcome = failure(&ActionError::remote(Stage::NetworkStats, "HTTP 500: boom"));
        assert!(!outcome.success);
        assert_eq!(outcome.text, "Error: fetching network statistics failed: HTTP 500: boom");
        assert_eq!(outcome.payload.unwrap()["kind"], json!("remote_call_failure"));
    }
}
