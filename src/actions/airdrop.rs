// src/actions/airdrop.rs

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use ethers_core::types::Address;
use secrecy::SecretString;
use tracing::debug;

use super::extract::{extract, RECIPIENT_SCHEMA};
use super::{Action, ActionExample, ActionRequest};
use crate::blockchain::client::SigningClientFactory;
use crate::blockchain::models::ChainResult;
use crate::blockchain::networks::NetworkDescriptor;
use crate::blockchain::services::transfer::{execute_transfer, TransferRequest};
use crate::config::{self, settings, SettingsProvider};
use crate::error::{ActionError, ActionResult};
use crate::utils::{is_address, is_amount};

const REQUIRED: &[&str] = &[
    settings::NEOX_PRIVATE_KEY,
    settings::AIRDROP_TOKEN_ADDRESS,
    settings::AIRDROP_AMOUNT,
];

const SIMILES: &[&str] = &[
    "AIRDROP",
    "DROP_TOKENS",
    "SEND_AIRDROP",
    "AIRDROP_ME",
    "SEND_ME",
    "AIRDROP_AI_NEO",
    "SEND_AI_NEO",
    "GET_AIRDROP",
];

/// Sends the configured ERC-20 amount to the address named in the message.
pub struct AirdropAction {
    factory: Arc<dyn SigningClientFactory>,
    network: NetworkDescriptor,
}

impl AirdropAction {
    pub fn new(factory: Arc<dyn SigningClientFactory>, network: NetworkDescriptor) -> Self {
        Self { factory, network }
    }
}

fn parse_address(field: &str, value: &str) -> ActionResult<Address> {
    if !is_address(value) {
        return Err(ActionError::invalid(field, format!("'{}' is not a 0x address", value)));
    }
    Address::from_str(value).map_err(|e| ActionError::invalid(field, e.to_string()))
}

#[async_trait]
impl Action for AirdropAction {
    fn name(&self) -> &'static str {
        "AIRDROP_TOKENS"
    }

    fn similes(&self) -> &'static [&'static str] {
        SIMILES
    }

    fn description(&self) -> &'static str {
        "Airdrop ERC20 tokens to a specified address on Neox chain"
    }

    fn examples(&self) -> Vec<ActionExample> {
        vec![ActionExample {
            user: "Please airdrop AI NEO tokens to 0x742d35Cc6634C0532925a3b844Bc454e4438f44e",
            agent: "I'll airdrop some AI NEO tokens to your address.",
        }]
    }

    fn required_settings(&self) -> &'static [&'static str] {
        REQUIRED
    }

    async fn run(
        &self,
        request: &ActionRequest,
        source: &dyn SettingsProvider,
    ) -> ActionResult<ChainResult> {
        let params = extract(request, &RECIPIENT_SCHEMA)?;
        let resolved = config::resolve(REQUIRED, source)?;

        // Explicit options override the configured token and amount; a
        // number in the message text never does.
        let token_address = match request.option_str("tokenAddress") {
            Some(value) => value,
            None => resolved.require(settings::AIRDROP_TOKEN_ADDRESS)?.to_string(),
        };
        let amount = match request.option_str("amount") {
            Some(value) => value,
            None => resolved.require(settings::AIRDROP_AMOUNT)?.to_string(),
        };
        if !is_amount(&amount) {
            return Err(ActionError::invalid("amount", format!("'{}' is not a decimal number", amount)));
        }

        let recipient_text = params.require("to_address")?.to_string();
        let transfer = TransferRequest {
            token: parse_address("token address", &token_address)?,
            recipient: parse_address("recipient", &recipient_text)?,
            recipient_text,
            amount,
        };

        let network = match config::optional(source, settings::NEOX_RPC_URL) {
            Some(url) => self.network.clone().with_rpc_url(url),
            None => self.network.clone(),
        };
        debug!("Airdrop on {} via {:?}", network.name, network.rpc_url());

        let key = SecretString::new(resolved.require(settings::NEOX_PRIVATE_KEY)?.to_string());
        let client = self.factory.bind(&key, &network)?;
        let result = execute_transfer(client.as_ref(), &transfer).await?;
        Ok(ChainResult::Transfer(result))
    }
}
