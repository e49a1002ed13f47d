// src/blockchain/services/deploy.rs

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::blockchain::models::{DeployResult, TokenMetadata};
use crate::blockchain::near::keys::is_valid_account_id;
use crate::blockchain::near::NearAccountClient;
use crate::error::{ActionError, ActionResult};

/// Balance moved into the new token account to pay for its storage (5 NEAR).
pub const STORAGE_DEPOSIT_YOCTO: u128 = 5 * 10u128.pow(24);

/// Gas attached to the `new` initializer (300 TGas).
pub const INIT_GAS: u64 = 300_000_000_000_000;

pub const FT_METADATA_SPEC: &str = "ft-1.0.0";

pub const DEFAULT_WASM_PATH: &str = "contracts/ft.wasm";

/// Where the fungible-token contract binary comes from.
#[async_trait]
pub trait ContractSource: Send + Sync {
    fn describe(&self) -> String;

    async fn load(&self) -> ActionResult<Vec<u8>>;
}

/// Reads the contract binary from the local filesystem on every deployment.
#[derive(Debug, Clone)]
pub struct FsContractSource {
    path: PathBuf,
}

impl FsContractSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ContractSource for FsContractSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> ActionResult<Vec<u8>> {
        let code = tokio::fs::read(&self.path)
            .await
            .map_err(|e| ActionError::BinaryUnavailable {
                path: self.describe(),
                cause: e.to_string(),
            })?;
        if code.is_empty() {
            return Err(ActionError::BinaryUnavailable {
                path: self.describe(),
                cause: "file is empty".to_string(),
            });
        }
        Ok(code)
    }
}

/// Token parameters after extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSpec {
    pub name: String,
    pub symbol: String,
    /// Total supply in base units.
    pub total_supply: String,
    pub decimals: u32,
    pub icon: Option<String>,
}

impl TokenSpec {
    pub fn metadata(&self) -> TokenMetadata {
        TokenMetadata {
            spec: FT_METADATA_SPEC.to_string(),
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            icon: self.icon.clone(),
        }
    }
}

/// `<lowercased symbol>-token.<account>`; the same inputs always give the
/// same id.
pub fn derive_contract_id(symbol: &str, account_id: &str) -> ActionResult<String> {
    let contract_id = format!("{}-token.{}", symbol.trim().to_lowercase(), account_id);
    if !is_valid_account_id(&contract_id) {
        return Err(ActionError::invalid(
            "symbol",
            format!("'{}' does not produce a valid contract account ({})", symbol, contract_id),
        ));
    }
    Ok(contract_id)
}

/// Deploys and initializes a fungible-token contract owned by the client's
/// account. An existing contract account is never overwritten.
pub async fn deploy_token(
    client: &dyn NearAccountClient,
    source: &dyn ContractSource,
    token: &TokenSpec,
) -> ActionResult<DeployResult> {
    let owner_id = client.account_id().to_string();
    let contract_id = derive_contract_id(&token.symbol, &owner_id)?;
    info!("Deploying token {} ({}) to {}", token.name, token.symbol, contract_id);

    if client.account_exists(&contract_id).await? {
        return Err(ActionError::DeploymentConflict { contract_id });
    }

    let code = source.load().await?;
    debug!("Loaded {} bytes from {}", code.len(), source.describe());

    let deploy_tx = client
        .deploy_contract(&contract_id, code, STORAGE_DEPOSIT_YOCTO)
        .await?;
    info!("Contract deployed to {} in {}", contract_id, deploy_tx);

    let metadata = token.metadata();
    let init_tx = client
        .function_call(
            &contract_id,
            "new",
            json!({
                "owner_id": owner_id,
                "total_supply": token.total_supply,
                "metadata": {
                    "spec": metadata.spec,
                    "name": metadata.name,
                    "symbol": metadata.symbol,
                    "decimals": metadata.decimals,
                    "icon": metadata.icon,
                },
            }),
            INIT_GAS,
            0,
        )
        .await?;
    info!("Token contract {} initialized in {}", contract_id, init_tx);

    Ok(DeployResult {
        contract_id,
        owner_id,
        total_supply: token.total_supply.clone(),
        metadata,
        deploy_tx,
        init_tx,
    })
}
