// src/actions/registry.rs

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;

use super::airdrop::AirdropAction;
use super::create_token::CreateTokenAction;
use super::query::{QueryAction, QueryKind};
use super::{Action, ActionExample};
use crate::blockchain::client::ClientCache;
use crate::blockchain::explorer::{ExplorerApi, ExplorerClient};
use crate::blockchain::near::NearRpcConnector;
use crate::blockchain::networks::neox_testnet;
use crate::config::Config;

/// All actions the host can route to.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: Vec<Arc<dyn Action>>,
}

/// Host-facing description of one action.
#[derive(Debug, Clone, Serialize)]
pub struct ActionInfo {
    pub name: &'static str,
    pub similes: &'static [&'static str],
    pub description: &'static str,
    pub required_settings: &'static [&'static str],
    pub examples: Vec<ActionExample>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: Arc<dyn Action>) -> &mut Self {
        self.actions.push(action);
        self
    }

    /// Every action wired to its production backend.
    pub fn standard(config: &Config) -> Result<Self> {
        let http = config.http_client()?;
        let explorer: Arc<dyn ExplorerApi> =
            Arc::new(ExplorerClient::new(config.explorer.clone(), http.clone()));

        let mut registry = Self::new();
        registry.register(Arc::new(AirdropAction::new(
            Arc::new(ClientCache::new(http.clone())),
            neox_testnet(),
        )));
        for kind in QueryKind::ALL {
            registry.register(Arc::new(QueryAction::new(kind, explorer.clone())));
        }
        registry.register(Arc::new(CreateTokenAction::new(Arc::new(NearRpcConnector::new(http)))));
        Ok(registry)
    }

    /// Looks an action up by name or simile.
    pub fn find(&self, name: &str) -> Option<Arc<dyn Action>> {
        self.actions.iter().find(|a| a.answers_to(name)).cloned()
    }

    pub fn describe(&self) -> Vec<ActionInfo> {
        self.actions
            .iter()
            .map(|a| ActionInfo {
                name: a.name(),
                similes: a.similes(),
                description: a.description(),
                required_settings: a.required_settings(),
                examples: a.examples(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_routes_names_and_similes() {
        let registry = ActionRegistry::standard(&Config::default()).unwrap();
        assert_eq!(registry.len(), 7);

        assert_eq!(registry.find("AIRDROP_TOKENS").unwrap().name(), "AIRDROP_TOKENS");
        assert_eq!(registry.find("send_airdrop").unwrap().name(), "AIRDROP_TOKENS");
        assert_eq!(registry.find("help me create a token").unwrap().name(), "CREATE_TOKEN");
        assert_eq!(registry.find("FETCH_NETWORK_STATS").unwrap().name(), "GET_NETWORK_STATS");
        assert_eq!(
            registry.find("LIST_ADDRESS_TRANSACTIONS").unwrap().name(),
            "GET_ADDRESS_TRANSACTIONS"
        );
        assert!(registry.find("SELL_EVERYTHING").is_none());
    }

    #[test]
    fn names_and_similes_never_collide() {
        let registry = ActionRegistry::standard(&Config::default()).unwrap();
        let infos = registry.describe();
        for info in &infos {
            let owner = registry.find(info.name).unwrap();
            assert_eq!(owner.name(), info.name);
            for simile in info.similes {
                assert_eq!(registry.find(simile).unwrap().name(), info.name);
            }
        }
    }
}
