// src/blockchain/services/transfer.rs

use ethers_core::abi::{ParamType, Token};
use ethers_core::types::{Address, U256};
use ethers_core::utils::to_checksum;
use tracing::{debug, info, warn};

use crate::blockchain::client::SigningClient;
use crate::blockchain::models::TransferResult;
use crate::error::{ActionError, ActionResult, Stage};
use crate::utils::parse_units;

/// What to send, before the token's precision is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub token: Address,
    pub recipient: Address,
    /// The recipient exactly as the user wrote it.
    pub recipient_text: String,
    /// Human decimal amount, e.g. "10" or "0.5".
    pub amount: String,
}

/// Reads the token's `decimals()`; never cached since a proxy can change it.
pub async fn read_decimals(client: &dyn SigningClient, token: Address) -> ActionResult<u32> {
    match client
        .read_contract_field(token, "decimals()", ParamType::Uint(8))
        .await?
    {
        Token::Uint(value) if value <= U256::from(u8::MAX) => Ok(value.as_u32()),
        other => Err(ActionError::malformed(
            Stage::ReadDecimals,
            format!("unexpected decimals() output: {:?}", other),
        )),
    }
}

/// Runs an ERC-20 transfer end to end:
/// decimals read, amount parsed, transfer submitted, transaction looked up.
///
/// A failing post-submit lookup does not fail the transfer; the result is
/// returned with `detail_error` set.
pub async fn execute_transfer(
    client: &dyn SigningClient,
    request: &TransferRequest,
) -> ActionResult<TransferResult> {
    let network = client.network().clone();
    info!(
        "Transfer of {} from token {:?} to {:?} on {}",
        request.amount, request.token, request.recipient, network.name
    );

    let decimals = read_decimals(client, request.token).await?;
    debug!("Token {:?} uses {} decimals", request.token, decimals);

    let amount = parse_units(&request.amount, decimals)?;
    debug!("Parsed amount {} into {} base units", request.amount, amount);

    let hash = client
        .submit_call(
            request.token,
            "transfer(address,uint256)",
            vec![Token::Address(request.recipient), Token::Uint(amount)],
        )
        .await?;
    let hash_hex = format!("{:?}", hash);
    info!("Transfer submitted: {}", hash_hex);

    let mut result = TransferResult {
        hash: hash_hex.clone(),
        requested_recipient: request.recipient_text.clone(),
        requested_amount: request.amount.clone(),
        recipient: to_checksum(&request.recipient, None),
        token_address: to_checksum(&request.token, None),
        amount,
        decimals,
        chain_id: network.id,
        explorer_tx_url: network.tx_url(&hash_hex),
        from: None,
        to: None,
        value: None,
        detail_error: None,
    };

    match client.get_by_identifier(hash).await {
        Ok(Some(tx)) => {
            debug!("Transaction {} confirmed by lookup", hash_hex);
            result.from = Some(to_checksum(&tx.from, None));
            result.to = tx.to.map(|to| to_checksum(&to, None));
            result.value = Some(tx.value);
            if let Some(chain_id) = tx.chain_id {
                result.chain_id = chain_id;
            }
        }
        Ok(None) => {
            warn!("Transaction {} not yet visible to the node", hash_hex);
            result.detail_error = Some("transaction not found by the node yet".to_string());
        }
        Err(e) => {
            warn!("Lookup of transaction {} failed: {}", hash_hex, e);
            result.detail_error = Some(e.to_string());
        }
    }

    Ok(result)
}
