//! Signing-client seam for write operations.
//!
//! Actions never talk to an RPC endpoint directly: they ask a
//! [`SigningClientFactory`] for a client bound to one credential and one
//! network, then drive it through the narrow [`SigningClient`] interface.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use ethers_core::abi::{ParamType, Token};
use ethers_core::types::{Address, H256, U256};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use tracing::debug;

use super::evm_client::EvmClient;
use super::networks::NetworkDescriptor;
use super::nonce_manager::NonceManager;
use crate::error::ActionResult;

/// Canonical fields of a submitted transaction, as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransaction {
    pub hash: H256,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub chain_id: Option<u64>,
    pub block_number: Option<u64>,
}

/// A client holding one signing credential, bound to one network.
#[async_trait]
pub trait SigningClient: Send + Sync {
    fn network(&self) -> &NetworkDescriptor;

    /// Address derived from the bound credential.
    fn sender(&self) -> Address;

    /// Calls a view function (e.g. `decimals()`) and decodes its single output.
    async fn read_contract_field(
        &self,
        contract: Address,
        signature: &str,
        output: ParamType,
    ) -> ActionResult<Token>;

    /// Signs and submits a state-changing call; returns the transaction hash.
    async fn submit_call(
        &self,
        contract: Address,
        signature: &str,
        args: Vec<Token>,
    ) -> ActionResult<H256>;

    /// Looks a submitted transaction up again. `Ok(None)` means the node does
    /// not know the hash (yet).
    async fn get_by_identifier(&self, hash: H256) -> ActionResult<Option<SubmittedTransaction>>;
}

/// Produces signing clients bound to a credential/network pair.
pub trait SigningClientFactory: Send + Sync {
    fn bind(
        &self,
        private_key: &SecretString,
        network: &NetworkDescriptor,
    ) -> ActionResult<Arc<dyn SigningClient>>;
}

/// Caches one bound client per (credential, network, endpoint). A cached
/// client is never re-bound; a different pair always gets its own client.
#[derive(Clone)]
pub struct ClientCache {
    http: Client,
    clients: Arc<DashMap<(String, u64, String), Arc<dyn SigningClient>>>,
}

impl ClientCache {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            clients: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Short digest identifying a credential without retaining it in the key.
fn credential_fingerprint(private_key: &SecretString) -> String {
    let digest = Sha256::digest(private_key.expose_secret().trim().as_bytes());
    hex::encode(&digest[..16])
}

impl SigningClientFactory for ClientCache {
    fn bind(
        &self,
        private_key: &SecretString,
        network: &NetworkDescriptor,
    ) -> ActionResult<Arc<dyn SigningClient>> {
        let key = (
            credential_fingerprint(private_key),
            network.id,
            network.rpc_url().unwrap_or_default().to_string(),
        );
        if let Some(client) = self.clients.get(&key) {
            return Ok(client.clone());
        }

        let client: Arc<dyn SigningClient> = Arc::new(EvmClient::new(
            self.http.clone(),
            network.clone(),
            private_key,
            // Nonces are per chain, so each bound client tracks its own.
            NonceManager::new(),
        )?);
        debug!(
            "Bound signing client for {:?} on chain {}",
            client.sender(),
            network.id
        );
        Ok(self.clients.entry(key).or_insert(client).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::networks::neox_testnet;

    const KEY_A: &str = "0x4f3edf983ac636a65a842ce7c78d9aa706d3b113bce9c46f30d7d21715b23b1d";
    const KEY_B: &str = "0x6cbed15c793ce57650b9877cf6fa156fbef513c4e6134f022a85b1ffdd59b2a1";

    #[test]
    fn reuses_clients_per_credential_and_network() {
        let cache = ClientCache::new(Client::new());
        let net = neox_testnet();
        let a1 = cache.bind(&SecretString::new(KEY_A.into()), &net).unwrap();
        let a2 = cache.bind(&SecretString::new(KEY_A.into()), &net).unwrap();
        assert!(Arc::ptr_eq(&a1, &a2));

        let b = cache.bind(&SecretString::new(KEY_B.into()), &net).unwrap();
        assert!(!Arc::ptr_eq(&a1, &b));

        let other_net = net.clone().with_rpc_url("http://127.0.0.1:8545");
        let a3 = cache.bind(&SecretString::new(KEY_A.into()), &other_net).unwrap();
        assert!(!Arc::ptr_eq(&a1, &a3));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn sender_is_derived_from_the_key() {
        let cache = ClientCache::new(Client::new());
        let client = cache
            .bind(&SecretString::new(KEY_A.into()), &neox_testnet())
            .unwrap();
        assert_eq!(
            format!("{:?}", client.sender()),
            "0x90f8bf6a479f320ead074411a4b0e7944ea8c9c1"
        );
    }

    #[test]
    fn rejects_unparseable_keys() {
        let cache = ClientCache::new(Client::new());
        let err = cache
            .bind(&SecretString::new("not-a-key".into()), &neox_testnet())
            .err()
            .unwrap();
        assert_eq!(err.kind(), "signing_error");
        assert!(cache.is_empty());
    }
}
