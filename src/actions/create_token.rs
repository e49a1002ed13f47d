// src/actions/create_token.rs

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::extract::extract_token_spec;
use super::{Action, ActionExample, ActionRequest};
use crate::blockchain::models::ChainResult;
use crate::blockchain::near::{AccountIdentity, ImplicitAccount, NamedAccount, NearClientFactory, NearKeyPair};
use crate::blockchain::networks::NearNetwork;
use crate::blockchain::services::deploy::{deploy_token, FsContractSource, DEFAULT_WASM_PATH};
use crate::config::{self, settings, SettingsProvider};
use crate::error::ActionResult;

const REQUIRED: &[&str] = &[settings::NEAR_SEED_PHRASE];

const SIMILES: &[&str] = &[
    "CREATE TOKEN",
    "CREATE A TOKEN",
    "MAKE A TOKEN",
    "MAKE TOKEN",
    "DEPLOY A TOKEN",
    "CREATE NEW TOKEN",
    "DEPLOY NEW TOKEN",
    "HELP ME CREATE A TOKEN",
    "HELP CREATE TOKEN",
];

const DEFAULT_NETWORK_ID: &str = "testnet";

/// Deploys a NEP-141 fungible token contract described in the message.
pub struct CreateTokenAction {
    connector: Arc<dyn NearClientFactory>,
}

impl CreateTokenAction {
    pub fn new(connector: Arc<dyn NearClientFactory>) -> Self {
        Self { connector }
    }
}

/// Named account when `NEAR_ACCOUNT_ID` is set, the key's implicit account
/// otherwise.
fn identity_for(source: &dyn SettingsProvider) -> Box<dyn AccountIdentity> {
    match config::optional(source, settings::NEAR_ACCOUNT_ID) {
        Some(account_id) => Box::new(NamedAccount(account_id)),
        None => Box::new(ImplicitAccount),
    }
}

#[async_trait]
impl Action for CreateTokenAction {
    fn name(&self) -> &'static str {
        "CREATE_TOKEN"
    }

    fn similes(&self) -> &'static [&'static str] {
        SIMILES
    }

    fn description(&self) -> &'static str {
        "Create a new token on NEAR Protocol"
    }

    fn examples(&self) -> Vec<ActionExample> {
        vec![ActionExample {
            user: "Create a new token called MyToken with symbol MTK and total supply of 1 million tokens",
            agent: "Deploying MYTOKEN (MTK) to mtk-token.<your account>.",
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
        let token = extract_token_spec(request)?;
        let resolved = config::resolve(REQUIRED, source)?;

        let keys = NearKeyPair::from_setting(resolved.require(settings::NEAR_SEED_PHRASE)?)?;
        let account_id = identity_for(source).resolve(&keys)?;

        let network_id = config::optional(source, settings::NEAR_NETWORK_ID)
            .unwrap_or_else(|| DEFAULT_NETWORK_ID.to_string());
        let network = NearNetwork::new(&network_id, config::optional(source, settings::NEAR_NODE_URL));
        debug!("Deploying as {} on {} ({})", account_id, network.network_id, network.node_url);

        let contract = FsContractSource::new(
            config::optional(source, settings::NEAR_FT_WASM_PATH).unwrap_or_else(|| DEFAULT_WASM_PATH.to_string()),
        );
        let client = self.connector.connect(&network, account_id, keys)?;
        let result = deploy_token(client.as_ref(), &contract, &token).await?;
        Ok(ChainResult::Deploy(result))
    }
}
