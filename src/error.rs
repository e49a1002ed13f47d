// src/error.rs

use std::fmt;
use thiserror::Error;

/// The remote step an error came from. Rendered into every remote failure
/// message so an operator can tell which call in a sequence broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ReadDecimals,
    EstimateGas,
    GasPrice,
    Nonce,
    SubmitTransfer,
    TransactionLookup,
    AddressBalance,
    LatestBlock,
    TransactionDetails,
    NetworkStats,
    AddressTransactions,
    AccountLookup,
    AccessKey,
    Deploy,
    Initialize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::ReadDecimals => "reading token decimals",
            Stage::EstimateGas => "estimating gas",
            Stage::GasPrice => "fetching gas price",
            Stage::Nonce => "fetching sender nonce",
            Stage::SubmitTransfer => "submitting transfer",
            Stage::TransactionLookup => "looking up submitted transaction",
            Stage::AddressBalance => "fetching address balance",
            Stage::LatestBlock => "fetching latest block",
            Stage::TransactionDetails => "fetching transaction details",
            Stage::NetworkStats => "fetching network statistics",
            Stage::AddressTransactions => "fetching address transactions",
            Stage::AccountLookup => "looking up account",
            Stage::AccessKey => "fetching access key",
            Stage::Deploy => "deploying contract",
            Stage::Initialize => "initializing contract",
        };
        f.write_str(label)
    }
}

/// Every way an action can fail. The dispatcher turns any of these into a
/// failure outcome; nothing here ever reaches the host as a raised error.
#[derive(Error, Debug)]
pub enum ActionError {
    #[error("could not find {field} in the message. {hint}")]
    Extraction { field: String, hint: String },
    #[error("invalid {field}: {reason}")]
    InvalidParameter { field: String, reason: String },
    #[error("{0} not configured")]
    ConfigMissing(String),
    #[error("{stage} failed: {cause}")]
    RemoteCall { stage: Stage, cause: String },
    #[error("{stage} returned a malformed response: {detail}")]
    MalformedResponse { stage: Stage, detail: String },
    #[error("token contract {contract_id} already exists; pick another symbol")]
    DeploymentConflict { contract_id: String },
    #[error("contract binary {path} unavailable: {cause}")]
    BinaryUnavailable { path: String, cause: String },
    #[error("invalid signing credential: {0}")]
    Signing(String),
}

pub type ActionResult<T> = Result<T, ActionError>;

impl ActionError {
    pub fn extraction(field: impl Into<String>, hint: impl Into<String>) -> Self {
        ActionError::Extraction {
            field: field.into(),
            hint: hint.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ActionError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn remote(stage: Stage, cause: impl fmt::Display) -> Self {
        ActionError::RemoteCall {
            stage,
            cause: cause.to_string(),
        }
    }

    pub fn malformed(stage: Stage, detail: impl Into<String>) -> Self {
        ActionError::MalformedResponse {
            stage,
            detail: detail.into(),
        }
    }

    /// Maps a transport error, calling out timeouts explicitly.
    pub fn from_http(stage: Stage, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ActionError::remote(stage, format!("request timed out ({})", err))
        } else {
            ActionError::remote(stage, err)
        }
    }

    /// Stable machine-readable tag, surfaced in failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::Extraction { .. } => "extraction_failure",
            ActionError::InvalidParameter { .. } => "invalid_parameter",
            ActionError::ConfigMissing(_) => "config_missing",
            ActionError::RemoteCall { .. } => "remote_call_failure",
            ActionError::MalformedResponse { .. } => "malformed_response",
            ActionError::DeploymentConflict { .. } => "deployment_conflict",
            ActionError::BinaryUnavailable { .. } => "binary_unavailable",
            ActionError::Signing(_) => "signing_error",
        }
    }
}
