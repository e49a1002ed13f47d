// src/actions/query.rs

use std::sync::Arc;

use async_trait::async_trait;

use super::extract::{extract, ADDRESS_SCHEMA, TX_HASH_SCHEMA};
use super::{Action, ActionExample, ActionRequest};
use crate::blockchain::explorer::ExplorerApi;
use crate::blockchain::models::ChainResult;
use crate::config::SettingsProvider;
use crate::error::ActionResult;

/// The read-only explorer lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Balance,
    LatestBlock,
    Transaction,
    NetworkStats,
    AddressTransactions,
}

impl QueryKind {
    pub const ALL: [QueryKind; 5] = [
        QueryKind::Balance,
        QueryKind::LatestBlock,
        QueryKind::Transaction,
        QueryKind::NetworkStats,
        QueryKind::AddressTransactions,
    ];
}

/// One explorer lookup exposed as an action. Queries need no settings.
pub struct QueryAction {
    kind: QueryKind,
    explorer: Arc<dyn ExplorerApi>,
}

impl QueryAction {
    pub fn new(kind: QueryKind, explorer: Arc<dyn ExplorerApi>) -> Self {
        Self { kind, explorer }
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }
}

#[async_trait]
impl Action for QueryAction {
    fn name(&self) -> &'static str {
        match self.kind {
            QueryKind::Balance => "GET_ROOTSTOCK_BALANCE",
            QueryKind::LatestBlock => "GET_ROOTSTOCK_BLOCK",
            QueryKind::Transaction => "GET_ROOTSTOCK_TRANSACTIONS",
            QueryKind::NetworkStats => "GET_NETWORK_STATS",
            QueryKind::AddressTransactions => "GET_ADDRESS_TRANSACTIONS",
        }
    }

    fn similes(&self) -> &'static [&'static str] {
        match self.kind {
            QueryKind::Balance => &["CHECK_ROOTSTOCK_BALANCE", "FETCH_ROOTSTOCK_BALANCE"],
            QueryKind::LatestBlock => &["CHECK_ROOTSTOCK_BLOCK", "FETCH_ROOTSTOCK_BLOCK"],
            QueryKind::Transaction => &["CHECK_ROOTSTOCK_TRANSACTIONS", "FETCH_ROOTSTOCK_TRANSACTIONS"],
            QueryKind::NetworkStats => &["CHECK_NETWORK_STATS", "FETCH_NETWORK_STATS"],
            QueryKind::AddressTransactions => &["LIST_ADDRESS_TRANSACTIONS", "FETCH_ADDRESS_TRANSACTIONS"],
        }
    }

    fn description(&self) -> &'static str {
        match self.kind {
            QueryKind::Balance => "Get the balance of a Rootstock network address",
            QueryKind::LatestBlock => "Get the latest block information from Rootstock network",
            QueryKind::Transaction => "Get transaction details by hash",
            QueryKind::NetworkStats => {
                "Get Rootstock network statistics including total addresses, transactions, and average block time"
            }
            QueryKind::AddressTransactions => "List the most recent transactions of an address",
        }
    }

    fn examples(&self) -> Vec<ActionExample> {
        let (user, agent) = match self.kind {
            QueryKind::Balance => (
                "What's the balance of 0x742d35Cc6634C0532925a3b844Bc454e4438f44e?",
                "Let me check the balance for that address.",
            ),
            QueryKind::LatestBlock => (
                "What's the latest block on Rootstock?",
                "I'll check the latest block information.",
            ),
            QueryKind::Transaction => (
                "Show me details for transaction 0x1234567890abcdef1234567890abcdef1234567890abcdef1234567890abcdef",
                "Let me fetch that transaction details for you.",
            ),
            QueryKind::NetworkStats => (
                "What are the current network statistics?",
                "I'll check the current network statistics for you.",
            ),
            QueryKind::AddressTransactions => (
                "List the transactions of 0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
                "Here are the latest transactions for that address.",
            ),
        };
        vec![ActionExample { user, agent }]
    }

    async fn run(
        &self,
        request: &ActionRequest,
        _settings: &dyn SettingsProvider,
    ) -> ActionResult<ChainResult> {
        let explorer = self.explorer.as_ref();
        Ok(match self.kind {
            QueryKind::Balance => {
                let params = extract(request, &ADDRESS_SCHEMA)?;
                ChainResult::Balance(explorer.address_balance(params.require("address")?).await?)
            }
            QueryKind::LatestBlock => ChainResult::Block(explorer.latest_block().await?),
            QueryKind::Transaction => {
                let params = extract(request, &TX_HASH_SCHEMA)?;
                ChainResult::Transaction(explorer.transaction(params.require("tx_hash")?).await?)
            }
            QueryKind::NetworkStats => ChainResult::NetworkStats(explorer.network_stats().await?),
            QueryKind::AddressTransactions => {
                let params = extract(request, &ADDRESS_SCHEMA)?;
                ChainResult::AddressTransactions(
                    explorer.address_transactions(params.require("address")?).await?,
                )
            }
        })
    }
}
